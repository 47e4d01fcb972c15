//! Command handlers. Each one loads the store, applies a single change,
//! saves when something changed and reports the outcome to `out`.
//!
//! Refused changes (duplicate title, unknown id, empty store) are reported
//! and return `Ok`; only failures to save or to write output are errors.

use crate::render;
use crate::store::{StoreError, TaskStore};
use crate::{ListFilter, RepositoryError, TaskChanges, TaskRepository};
use chrono::Utc;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, info};

const NOT_FOUND: &str = "Task not found!";
const NO_TASKS: &str = "Tasks not found!";
const LIST_HEADER: &str = "------TASKS-------";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T = ()> = std::result::Result<T, CommandError>;

pub fn add(
    store: &TaskStore,
    out: &mut impl Write,
    title: String,
    description: Option<String>,
) -> Result {
    let mut repository = TaskRepository::from_tasks(store.load());
    let task = match repository.add(title, description.unwrap_or_default(), Utc::now()) {
        Ok(task) => task.clone(),
        Err(refused) => return report(out, refused),
    };

    store.save(repository.tasks())?;
    info!(id = task.id, title = %task.title, "task added");
    writeln!(out, "Task added:")?;
    writeln!(out, "{}", render::table([&task]))?;
    Ok(())
}

pub fn update(store: &TaskStore, out: &mut impl Write, id: &str, changes: &TaskChanges) -> Result {
    let Some(id) = parse_id(id) else {
        return report(out, RepositoryError::NotFound);
    };

    let mut repository = TaskRepository::from_tasks(store.load());
    let task = match repository.update(id, changes, Utc::now()) {
        Ok(task) => task.clone(),
        Err(refused) => return report(out, refused),
    };

    store.save(repository.tasks())?;
    info!(id, "task updated");
    writeln!(out, "Task updated:")?;
    writeln!(out, "{}", render::table([&task]))?;
    Ok(())
}

pub fn delete(store: &TaskStore, out: &mut impl Write, id: &str) -> Result {
    let Some(id) = parse_id(id) else {
        return report(out, RepositoryError::NotFound);
    };

    let mut repository = TaskRepository::from_tasks(store.load());
    if let Err(refused) = repository.delete(id) {
        return report(out, refused);
    }

    store.save(repository.tasks())?;
    info!(id, "task deleted");
    writeln!(out, "Task deleted.")?;
    Ok(())
}

pub fn list(store: &TaskStore, out: &mut impl Write, filter: ListFilter) -> Result {
    let repository = TaskRepository::from_tasks(store.load());
    if repository.is_empty() {
        writeln!(out, "{NO_TASKS}")?;
        return Ok(());
    }

    writeln!(out, "{LIST_HEADER}")?;
    writeln!(out, "{}", render::table(repository.select(filter)))?;
    Ok(())
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn report(out: &mut impl Write, refused: RepositoryError) -> Result {
    match &refused {
        RepositoryError::NotFound => writeln!(out, "{NOT_FOUND}")?,
        other => {
            debug!(reason = %other, "change refused");
            writeln!(out, "{other}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Status, Task};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: TaskStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = TaskStore::new(dir.path().join("tasks.json"));
            Self { _dir: dir, store }
        }

        fn with_titles(titles: &[&str]) -> Self {
            let fixture = Self::new();
            for title in titles {
                fixture.run(|store, out| add(store, out, title.to_string(), None));
            }
            fixture
        }

        fn run(&self, command: impl FnOnce(&TaskStore, &mut Vec<u8>) -> Result) -> String {
            let mut out = Vec::new();
            command(&self.store, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        }

        fn tasks(&self) -> Vec<Task> {
            self.store.load()
        }

        fn raw(&self) -> Vec<u8> {
            fs::read(self.store.path()).unwrap()
        }
    }

    fn status_change(status: &str) -> TaskChanges {
        TaskChanges {
            status: Some(status.to_string()),
            ..TaskChanges::default()
        }
    }

    #[test]
    fn test_add_to_empty_store() {
        // Arrange
        let fixture = Fixture::new();

        // Act
        let output = fixture.run(|store, out| add(store, out, "Buy milk".to_string(), None));

        // Assert
        let tasks = fixture.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(tasks[0].description, "");
        assert_eq!(tasks[0].status, Status::Pending);
        assert_eq!(tasks[0].updated, None);
        assert!(output.starts_with("Task added:"));
        assert!(output.contains("Buy milk"));
    }

    #[test]
    fn test_add_with_description() {
        let fixture = Fixture::new();

        fixture.run(|store, out| {
            add(store, out, "Walk dog".to_string(), Some("around the park".to_string()))
        });

        assert_eq!(fixture.tasks()[0].description, "around the park");
    }

    #[test]
    fn test_add_duplicate_does_not_write() {
        // Arrange
        let fixture = Fixture::with_titles(&["Buy milk"]);
        let before = fixture.raw();

        // Act
        let output = fixture.run(|store, out| add(store, out, "Buy milk".to_string(), None));

        // Assert
        assert_eq!(output, "Task title should be unique: Buy milk\n");
        assert_eq!(fixture.raw(), before);
    }

    #[test]
    fn test_add_empty_title_does_not_create_store() {
        let fixture = Fixture::new();

        let output = fixture.run(|store, out| add(store, out, String::new(), None));

        assert_eq!(output, "Task title must not be empty\n");
        assert!(!fixture.store.path().exists());
    }

    #[test]
    fn test_update_status() {
        // Arrange
        let fixture = Fixture::with_titles(&["Buy milk"]);

        // Act
        let output =
            fixture.run(|store, out| update(store, out, "1", &status_change("Completed")));

        // Assert
        let task = &fixture.tasks()[0];
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(task.updated.is_some());
        assert!(output.starts_with("Task updated:"));
    }

    #[test]
    fn test_update_without_changes_sets_timestamp() {
        let fixture = Fixture::with_titles(&["Buy milk"]);

        fixture.run(|store, out| update(store, out, "1", &TaskChanges::default()));

        let task = &fixture.tasks()[0];
        assert!(task.updated.is_some());
        assert!(task.updated.unwrap() >= task.created);
    }

    #[test]
    fn test_update_missing_id() {
        let fixture = Fixture::with_titles(&["Buy milk"]);
        let before = fixture.raw();

        let output = fixture.run(|store, out| update(store, out, "7", &status_change("started")));

        assert_eq!(output, "Task not found!\n");
        assert_eq!(fixture.raw(), before);
    }

    #[test]
    fn test_update_non_numeric_id_is_not_found() {
        let fixture = Fixture::with_titles(&["Buy milk"]);

        let output = fixture.run(|store, out| update(store, out, "one", &TaskChanges::default()));

        assert_eq!(output, "Task not found!\n");
        assert_eq!(fixture.tasks()[0].updated, None);
    }

    #[test]
    fn test_id_with_trailing_text_is_not_found() {
        let fixture = Fixture::with_titles(&["One", "Two"]);
        let before = fixture.raw();

        let deleted = fixture.run(|store, out| delete(store, out, "2abc"));
        let updated = fixture.run(|store, out| update(store, out, "2abc", &status_change("started")));

        assert_eq!(deleted, "Task not found!\n");
        assert_eq!(updated, "Task not found!\n");
        assert_eq!(fixture.raw(), before);
    }

    #[test]
    fn test_add_after_highest_possible_id_does_not_write() {
        // Arrange
        let fixture = Fixture::new();
        let last = Task::new(u64::MAX, "Last".to_string(), String::new(), Utc::now());
        fixture.store.save(&[last]).unwrap();
        let before = fixture.raw();

        // Act
        let output = fixture.run(|store, out| add(store, out, "Next".to_string(), None));

        // Assert
        assert_eq!(output, format!("No task id is left after {}\n", u64::MAX));
        assert_eq!(fixture.raw(), before);
    }

    #[test]
    fn test_delete_keeps_order() {
        // Arrange
        let fixture = Fixture::with_titles(&["One", "Two", "Three"]);

        // Act
        let output = fixture.run(|store, out| delete(store, out, "2"));

        // Assert
        let ids: Vec<u64> = fixture.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(output, "Task deleted.\n");
    }

    #[test]
    fn test_delete_miss_leaves_document_untouched() {
        let fixture = Fixture::with_titles(&["One", "Two"]);
        let before = fixture.raw();

        let output = fixture.run(|store, out| delete(store, out, "5"));

        assert_eq!(output, "Task not found!\n");
        assert_eq!(fixture.raw(), before);
    }

    #[test]
    fn test_delete_on_missing_store() {
        let fixture = Fixture::new();

        let output = fixture.run(|store, out| delete(store, out, "1"));

        assert_eq!(output, "Task not found!\n");
        assert!(!fixture.store.path().exists());
    }

    #[test]
    fn test_list_empty_store() {
        let fixture = Fixture::new();

        let output = fixture.run(|store, out| {
            list(store, out, ListFilter { all: true, ..ListFilter::default() })
        });

        assert_eq!(output, "Tasks not found!\n");
    }

    #[test]
    fn test_list_last_filter_wins() {
        // Arrange
        let fixture = Fixture::with_titles(&["Pending one", "Started one", "Completed one"]);
        fixture.run(|store, out| update(store, out, "2", &status_change("started")));
        fixture.run(|store, out| update(store, out, "3", &status_change("completed")));
        let before = fixture.raw();

        // Act
        let output = fixture.run(|store, out| {
            list(
                store,
                out,
                ListFilter {
                    pending: true,
                    started: true,
                    ..ListFilter::default()
                },
            )
        });

        // Assert
        assert!(output.starts_with("------TASKS-------\n"));
        assert!(output.contains("Started one"));
        assert!(!output.contains("Pending one"));
        assert!(!output.contains("Completed one"));
        assert_eq!(fixture.raw(), before, "list must not write");
    }

    #[test]
    fn test_list_without_flags_shows_empty_table() {
        let fixture = Fixture::with_titles(&["Buy milk"]);

        let output = fixture.run(|store, out| list(store, out, ListFilter::default()));

        assert!(output.starts_with("------TASKS-------\n"));
        assert!(!output.contains("Buy milk"));
    }

    #[test]
    fn test_save_failure_is_reported() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path());
        let mut out = Vec::new();

        // Act
        let result = add(&store, &mut out, "Buy milk".to_string(), None);

        // Assert
        assert!(matches!(result, Err(CommandError::Store(_))));
        assert!(out.is_empty());
    }
}
