pub mod commands;
pub mod config;
mod render;
pub mod store;
mod task;

pub use crate::store::{StoreError, TaskStore};
pub use crate::task::{Status, Task};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Conditions under which a mutation is refused. None of these are fatal;
/// the command reports them and leaves the store untouched.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RepositoryError {
    #[error("Task title must not be empty")]
    EmptyTitle,
    #[error("Task title should be unique: {0}")]
    DuplicateTitle(String),
    #[error("Task not found!")]
    NotFound,
    #[error("No task id is left after {0}")]
    IdsExhausted(u64),
}

/// Field changes requested by `update`. Empty strings count as "not supplied".
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl TaskChanges {
    fn supplied(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|value| !value.is_empty())
    }
}

/// Which tasks `list` shows.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct ListFilter {
    pub all: bool,
    pub pending: bool,
    pub started: bool,
    pub completed: bool,
}

/// The task collection held in memory for the duration of one command.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TaskRepository {
    tasks: Vec<Task>,
}

impl TaskRepository {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// One past the highest id in the collection, so ids are never reused
    /// while the highest task still exists.
    pub fn next_id(&self) -> Result<u64, RepositoryError> {
        let highest = self.tasks.iter().map(|task| task.id).max().unwrap_or(0);
        highest
            .checked_add(1)
            .ok_or(RepositoryError::IdsExhausted(highest))
    }

    pub fn add(
        &mut self,
        title: String,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<&Task, RepositoryError> {
        if title.is_empty() {
            return Err(RepositoryError::EmptyTitle);
        }
        if self.tasks.iter().any(|task| task.title == title) {
            return Err(RepositoryError::DuplicateTitle(title));
        }

        let task = Task::new(self.next_id()?, title, description, now);
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Applies `changes` to the task with `id`. The `updated` timestamp is
    /// refreshed even when no change was supplied.
    pub fn update(
        &mut self,
        id: u64,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> Result<&Task, RepositoryError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(RepositoryError::NotFound)?;

        let title = TaskChanges::supplied(&changes.title);
        if let Some(title) = title {
            if self.tasks.iter().any(|task| task.id != id && task.title == title) {
                return Err(RepositoryError::DuplicateTitle(title.to_string()));
            }
        }

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title.to_string();
        }
        if let Some(description) = TaskChanges::supplied(&changes.description) {
            task.description = description.to_string();
        }
        if let Some(status) = TaskChanges::supplied(&changes.status) {
            task.status = Status::normalized(status);
        }
        task.updated = Some(match task.updated {
            Some(previous) if previous > now => previous,
            _ => now,
        });
        Ok(&self.tasks[index])
    }

    pub fn delete(&mut self, id: u64) -> Result<Task, RepositoryError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(self.tasks.remove(index))
    }

    /// Status filters run in the order pending, started, completed and each
    /// one that is set replaces the previous selection.
    pub fn select(&self, filter: ListFilter) -> Vec<&Task> {
        if filter.all {
            return self.tasks.iter().collect();
        }

        let mut selected = Vec::new();
        for (set, status) in [
            (filter.pending, Status::Pending),
            (filter.started, Status::Started),
            (filter.completed, Status::Completed),
        ] {
            if set {
                selected = self
                    .tasks
                    .iter()
                    .filter(|task| task.status == status)
                    .collect();
            }
        }
        selected
    }
}
