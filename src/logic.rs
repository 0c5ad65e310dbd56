/*
Task-list semantics: construction, edits, completion with recurrence,
filters, sorts, reminder evaluation.
Module was independently written from HTTP / Axum for testing.
*/

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApplicationError, Result};
use crate::models::{Priority, Recurrence, SortKey, Task};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// Build a task from raw user input.
//
// Rules:
// - Empty description rejects the whole add
// - Out-of-enum priority/recurrence coerce to their defaults
// - Malformed due date rejects the whole add
// - Malformed reminder time nulls only that field
pub fn build_task(
    description: &str,
    priority: Option<&str>,
    due_date: Option<&str>,
    recurrence: Option<&str>,
    reminder_time: Option<&str>,
) -> Result<Task> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ApplicationError::BadRequest("description required".into()));
    }

    let due_date = match due_date.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| ApplicationError::BadRequest("invalid due date".into()))?,
        ),
        None => None,
    };

    let reminder_time = reminder_time
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|raw| match NaiveTime::parse_from_str(raw, TIME_FORMAT) {
            Ok(t) => Some(t),
            Err(_) => {
                warn!(input = raw, "invalid reminder time, dropping field");
                None
            }
        });

    Ok(Task {
        id: Uuid::new_v4(),
        description: description.to_string(),
        done: false,
        priority: priority.map(Priority::coerce).unwrap_or_default(),
        due_date,
        recurrence: recurrence.map(Recurrence::coerce).unwrap_or_default(),
        reminder_time,
    })
}

/// Field replacements for an edit. `None` or an empty string means
/// "keep the existing value".
#[derive(Debug, Default, Clone)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub reminder_time: Option<String>,
}

fn supplied(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// Unlike add, an out-of-enum or malformed replacement here is rejected
// with the prior value retained; nothing is substituted.
pub fn apply_edit(task: &mut Task, edit: &TaskEdit) {
    if let Some(desc) = supplied(&edit.description) {
        task.description = desc.to_string();
    }
    if let Some(raw) = supplied(&edit.priority) {
        match Priority::parse(raw) {
            Some(p) => task.priority = p,
            None => warn!(input = raw, "invalid priority, keeping previous value"),
        }
    }
    if let Some(raw) = supplied(&edit.due_date) {
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(d) => task.due_date = Some(d),
            Err(_) => warn!(input = raw, "invalid due date, keeping previous value"),
        }
    }
    if let Some(raw) = supplied(&edit.recurrence) {
        match Recurrence::parse(raw) {
            Some(r) => task.recurrence = r,
            None => warn!(input = raw, "invalid recurrence, keeping previous value"),
        }
    }
    if let Some(raw) = supplied(&edit.reminder_time) {
        match NaiveTime::parse_from_str(raw, TIME_FORMAT) {
            Ok(t) => task.reminder_time = Some(t),
            Err(_) => warn!(input = raw, "invalid reminder time, keeping previous value"),
        }
    }
}

/// Next due date for a recurring task, if it has both a rule and a
/// current due date.
pub fn next_due_date(task: &Task) -> Option<NaiveDate> {
    let offset = task.recurrence.offset_days()?;
    let due = task.due_date?;
    Some(due + Duration::days(offset))
}

#[derive(Debug, Clone)]
pub struct CompleteOutcome {
    pub task: Task,
    pub spawned: Option<Task>,
}

// Mark the task done. Completion effects run only on the false->true
// transition: re-marking a finished task never spawns another clone.
pub fn complete(tasks: &mut Vec<Task>, id: Uuid) -> Option<CompleteOutcome> {
    let index = tasks.iter().position(|t| t.id == id)?;
    if tasks[index].done {
        return Some(CompleteOutcome { task: tasks[index].clone(), spawned: None });
    }

    tasks[index].done = true;
    let spawned = next_due_date(&tasks[index]).map(|next| {
        let original = &tasks[index];
        Task {
            id: Uuid::new_v4(),
            description: original.description.clone(),
            done: false,
            priority: original.priority,
            due_date: Some(next),
            recurrence: original.recurrence,
            reminder_time: original.reminder_time,
        }
    });

    if let Some(clone) = spawned.clone() {
        tasks.push(clone);
    }

    Some(CompleteOutcome { task: tasks[index].clone(), spawned })
}

pub fn remove(tasks: &mut Vec<Task>, id: Uuid) -> Option<Task> {
    let index = tasks.iter().position(|t| t.id == id)?;
    Some(tasks.remove(index))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Done,
    Pending,
    Keyword,
    DueToday,
    Overdue,
}

fn matches_filter(task: &Task, filter: FilterKind, keyword: Option<&str>, today: NaiveDate) -> bool {
    match filter {
        FilterKind::Done => task.done,
        FilterKind::Pending => !task.done,
        FilterKind::Keyword => match keyword {
            Some(needle) => task.description.to_lowercase().contains(needle),
            None => false,
        },
        FilterKind::DueToday => task.due_date == Some(today),
        FilterKind::Overdue => {
            !task.done && task.due_date.is_some_and(|due| due < today)
        }
    }
}

/// Lazy, restartable pass over the list. Keyword matching is a
/// case-insensitive substring search.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    filter: FilterKind,
    keyword: Option<&str>,
    today: NaiveDate,
) -> impl Iterator<Item = &'a Task> + 'a {
    let needle = keyword.map(str::to_lowercase);
    tasks
        .iter()
        .filter(move |t| matches_filter(t, filter, needle.as_deref(), today))
}

// Stable sort, so ties keep insertion order.
//
// - priority: High before Medium before Low
// - due_date: tasks without a due date sort last in both directions
// - status: pending before done
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, reverse: bool) {
    match key {
        SortKey::Priority => tasks.sort_by(|a, b| {
            let ord = a.priority.cmp(&b.priority);
            if reverse { ord.reverse() } else { ord }
        }),
        SortKey::Status => tasks.sort_by(|a, b| {
            let ord = a.done.cmp(&b.done);
            if reverse { ord.reverse() } else { ord }
        }),
        SortKey::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(da), Some(db)) => {
                if reverse { db.cmp(&da) } else { da.cmp(&db) }
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    DueToday,
    Overdue,
}

#[derive(Debug, Clone)]
pub struct Reminder {
    pub task_id: Uuid,
    pub description: String,
    pub due_date: NaiveDate,
    pub kind: ReminderKind,
}

/// Drop ids whose task is no longer overdue (done, removed, or
/// re-dated), so a task that slips again notifies again.
pub fn prune_seen_overdue(seen: &mut HashSet<Uuid>, tasks: &[Task], today: NaiveDate) {
    seen.retain(|id| {
        tasks
            .iter()
            .any(|t| t.id == *id && !t.done && t.due_date.is_some_and(|due| due < today))
    });
}

// Evaluate one poll cycle.
//
// Due-today reminders fire on exact HH:MM equality with the task's
// reminder time. Overdue reminders fire once per task: ids already in
// `seen_overdue` are skipped until they leave the overdue state.
pub fn due_reminders(
    tasks: &[Task],
    today: NaiveDate,
    minute: NaiveTime,
    seen_overdue: &HashSet<Uuid>,
) -> Vec<Reminder> {
    let mut reminders = Vec::new();
    for task in tasks.iter().filter(|t| !t.done) {
        let Some(due) = task.due_date else { continue };

        if due == today && task.reminder_time == Some(minute) {
            reminders.push(Reminder {
                task_id: task.id,
                description: task.description.clone(),
                due_date: due,
                kind: ReminderKind::DueToday,
            });
        } else if due < today && !seen_overdue.contains(&task.id) {
            reminders.push(Reminder {
                task_id: task.id,
                description: task.description.clone(),
                due_date: due,
                kind: ReminderKind::Overdue,
            });
        }
    }
    reminders
}
