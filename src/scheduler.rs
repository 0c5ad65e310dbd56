use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::logic::{self, ReminderKind};
use crate::models::NotifyConfig;
use crate::notify;
use crate::store::Store;

/// Background reminder loop. Reviews the task file on a fixed cadence
/// and dispatches due-today / overdue notifications until told to stop.
pub struct Scheduler {
    store: Store,
    config: Arc<RwLock<NotifyConfig>>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(store: Store, config: Arc<RwLock<NotifyConfig>>, interval: Duration) -> Self {
        Scheduler { store, config, interval }
    }

    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // Overdue tasks notify once; ids stay here while they remain
            // overdue and are pruned when they stop being so, letting a
            // re-slipped task notify again.
            let mut seen_overdue: HashSet<Uuid> = HashSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.poll(&mut seen_overdue).await,
                    _ = shutdown.changed() => {
                        info!("reminder scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }

    async fn poll(&self, seen_overdue: &mut HashSet<Uuid>) {
        let tasks = match self.store.load_tasks() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!("Error loading tasks during reminder poll: {}", err);
                return;
            }
        };

        let now = Local::now();
        let today = now.date_naive();
        let minute = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
            .unwrap_or_else(|| now.time());

        logic::prune_seen_overdue(seen_overdue, &tasks, today);

        let reminders = logic::due_reminders(&tasks, today, minute, seen_overdue);
        if reminders.is_empty() {
            debug!("reminder poll: nothing due");
            return;
        }

        let config = match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                error!("notification config lock poisoned, skipping cycle");
                return;
            }
        };

        for reminder in reminders {
            if reminder.kind == ReminderKind::Overdue {
                seen_overdue.insert(reminder.task_id);
            }
            notify::dispatch(&config, &reminder).await;
        }
    }
}
