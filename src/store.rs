use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::{Serialize, de::DeserializeOwned};

use crate::models::{CustomView, NotifyConfig, Task};

/// Persistent storage for the three data files. Paths are fixed at
/// construction; nothing in here is global.
#[derive(Debug, Clone)]
pub struct Store {
    tasks_path: PathBuf,
    views_path: PathBuf,
    notify_path: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        Store {
            tasks_path: dir.join("tasks.json"),
            views_path: dir.join("views.json"),
            notify_path: dir.join("notify.json"),
        }
    }

    // A missing file is not an error on first run: it reads back as the
    // empty collection / default config.
    fn load<T: DeserializeOwned + Default>(path: &Path) -> io::Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    // Write to a sibling tmp file, then rename over the target, so a
    // crash mid-write never leaves a truncated file behind.
    fn save<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load_tasks(&self) -> io::Result<Vec<Task>> {
        Self::load(&self.tasks_path)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> io::Result<()> {
        Self::save(&self.tasks_path, &tasks)
    }

    pub fn load_views(&self) -> io::Result<BTreeMap<String, CustomView>> {
        Self::load(&self.views_path)
    }

    pub fn save_views(&self, views: &BTreeMap<String, CustomView>) -> io::Result<()> {
        Self::save(&self.views_path, views)
    }

    pub fn load_notify_config(&self) -> io::Result<NotifyConfig> {
        Self::load(&self.notify_path)
    }

    pub fn save_notify_config(&self, config: &NotifyConfig) -> io::Result<()> {
        Self::save(&self.notify_path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotifyMethod, Priority, Recurrence, SortKey};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample_task(description: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            description: description.into(),
            done: false,
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            recurrence: Recurrence::Weekly,
            reminder_time: None,
        }
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_tasks().unwrap().is_empty());
        assert!(store.load_views().unwrap().is_empty());
        assert_eq!(store.load_notify_config().unwrap().method, NotifyMethod::System);
    }

    #[test]
    fn tasks_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let tasks = vec![sample_task("one"), sample_task("two")];
        store.save_tasks(&tasks).unwrap();

        let loaded = store.load_tasks().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, tasks[0].id);
        assert_eq!(loaded[1].description, "two");
        assert_eq!(loaded[0].recurrence, Recurrence::Weekly);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_tasks(&[sample_task("old")]).unwrap();
        store.save_tasks(&[sample_task("new")]).unwrap();

        let loaded = store.load_tasks().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].description, "new");
    }

    #[test]
    fn views_and_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut views = BTreeMap::new();
        views.insert(
            "urgent first".to_string(),
            CustomView { sort_by: SortKey::Priority, reverse: false },
        );
        store.save_views(&views).unwrap();
        let loaded = store.load_views().unwrap();
        assert_eq!(loaded["urgent first"].sort_by, SortKey::Priority);

        let config = NotifyConfig {
            method: NotifyMethod::Both,
            email: "me@example.com".into(),
            smtp: "smtp.example.com".into(),
            password: "hunter2".into(),
        };
        store.save_notify_config(&config).unwrap();
        let loaded = store.load_notify_config().unwrap();
        assert_eq!(loaded.method, NotifyMethod::Both);
        assert_eq!(loaded.smtp, "smtp.example.com");
    }

    #[test]
    fn corrupt_task_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tasks.json"), "not json").unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_tasks().is_err());
    }
}
