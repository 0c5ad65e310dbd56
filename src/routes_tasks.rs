// --------------------------------------------------
// Handles API endpoints related to task CRUD operations.
//
// Responsibilities:
// - Create / read / update / delete tasks
// - Mark tasks done (with recurrence roll-over)
// - Filtered / sorted listing with display ordinals
// -------------------------------------------------

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApplicationError, Result};
use crate::logic::{self, FilterKind, TaskEdit};
use crate::models::{SortKey, Task};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<FilterKind>,
    pub keyword: Option<String>,
    pub sort: Option<SortKey>,
    pub reverse: Option<bool>,
    pub view: Option<String>,
}

// Ordinals are 1-based positions in the filtered/sorted result. They
// are display-only; stable addressing goes through the task id.
#[derive(Debug, Serialize)]
pub struct ListItem {
    pub ordinal: usize,
    #[serde(flatten)]
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub total: usize,
    pub tasks: Vec<ListItem>,
}

// -----------------------------
// GET /api/tasks
// Lists tasks, optionally filtered, sorted, or shaped by a saved view
// -----------------------------
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<TasksResponse>> {
    let tasks = state.store.load_tasks()?;
    let today = chrono::Local::now().date_naive();

    let sort = match q.view {
        Some(name) => {
            let views = state.store.load_views()?;
            let view = views.get(&name).ok_or(ApplicationError::NotFound("view"))?;
            Some((view.sort_by, view.reverse))
        }
        None => q.sort.map(|key| (key, q.reverse.unwrap_or(false))),
    };

    let mut listed: Vec<Task> = match q.filter {
        Some(FilterKind::Keyword) => {
            let keyword = required_keyword(q.keyword.as_deref())?;
            logic::filter_tasks(&tasks, FilterKind::Keyword, Some(keyword), today)
                .cloned()
                .collect()
        }
        Some(filter) => logic::filter_tasks(&tasks, filter, None, today).cloned().collect(),
        None => tasks,
    };

    if let Some((key, reverse)) = sort {
        logic::sort_tasks(&mut listed, key, reverse);
    }

    let tasks: Vec<ListItem> = listed
        .into_iter()
        .enumerate()
        .map(|(i, task)| ListItem { ordinal: i + 1, task })
        .collect();

    Ok(Json(TasksResponse { total: tasks.len(), tasks }))
}

// A keyword filter needs an actual needle; blank counts as missing.
fn required_keyword(keyword: Option<&str>) -> Result<&str> {
    keyword
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApplicationError::BadRequest("keyword required".into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskInput {
    pub description: String,
    pub priority: Option<String>,
    pub due_date: Option<String>,      // "YYYY-MM-DD"
    pub recurrence: Option<String>,
    pub reminder_time: Option<String>, // "HH:MM"
}

// -----------------------------
// POST /api/tasks
// Creates a new task and appends it to the task file
// -----------------------------
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateTaskInput>,
) -> Result<Json<Task>> {
    let task = logic::build_task(
        &input.description,
        input.priority.as_deref(),
        input.due_date.as_deref(),
        input.recurrence.as_deref(),
        input.reminder_time.as_deref(),
    )?;

    let mut tasks = state.store.load_tasks()?;
    tasks.push(task.clone());
    state.store.save_tasks(&tasks)?;

    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskInput {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub reminder_time: Option<String>,
}

// -----------------------------
// PUT /api/tasks/:id
// Updates an existing task; absent or empty fields keep their value
// ----------------------------
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>> {
    let mut tasks = state.store.load_tasks()?;

    let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
        return Err(ApplicationError::NotFound("task"));
    };

    logic::apply_edit(
        task,
        &TaskEdit {
            description: input.description,
            priority: input.priority,
            due_date: input.due_date,
            recurrence: input.recurrence,
            reminder_time: input.reminder_time,
        },
    );
    let updated = task.clone();

    state.store.save_tasks(&tasks)?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub task: Task,
    /// Successor appended when a recurring task rolls over.
    pub spawned: Option<Task>,
}

// -----------------------------
// POST /api/tasks/:id/done
// Marks a task done; a recurring task with a due date spawns its
// next occurrence
// -----------------------------
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompleteResponse>> {
    let mut tasks = state.store.load_tasks()?;

    let outcome = logic::complete(&mut tasks, id).ok_or(ApplicationError::NotFound("task"))?;

    state.store.save_tasks(&tasks)?;
    Ok(Json(CompleteResponse { task: outcome.task, spawned: outcome.spawned }))
}

// -----------------------------
// DELETE /api/tasks/:id
// Removes a task permanently
// -----------------------------
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut tasks = state.store.load_tasks()?;

    if logic::remove(&mut tasks, id).is_none() {
        return Err(ApplicationError::NotFound("task"));
    }

    state.store.save_tasks(&tasks)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
