use crate::task::Task;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot write task file: {0}")]
    Io(#[from] io::Error),
    #[error("cannot serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot replace task file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// The JSON document holding every task.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every task. A missing, empty or unreadable document yields an
    /// empty collection.
    pub fn load(&self) -> Vec<Task> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "task file does not exist yet");
                return Vec::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read task file");
                return Vec::new();
            }
        };

        if contents.trim().is_empty() {
            return Vec::new();
        }

        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
            Ok(records) => records,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unparseable task file");
                return Vec::new();
            }
        };

        // A malformed record is skipped on its own so the others survive.
        let tasks: Vec<Task> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(path = %self.path.display(), index, error = %err, "skipping unreadable task");
                    None
                }
            })
            .collect();
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        tasks
    }

    /// Overwrites the document with `tasks`.
    ///
    /// The JSON is written to a sibling temporary file which is then renamed
    /// over the target, so readers see either the old or the new document.
    /// A symlinked target is followed, and an existing file keeps its
    /// permissions.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut json = serde_json::to_string_pretty(tasks)?;
        json.push('\n');

        let mut file = NamedTempFile::new_in(dir)?;
        if let Ok(existing) = fs::metadata(&target) {
            file.as_file().set_permissions(existing.permissions())?;
        }
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&target)?;

        debug!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}
