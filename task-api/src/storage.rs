use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::task::Task;

/// Custom error type for task file operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Represents a filesystem failure while reading or writing the task file.
    #[error("I/O error on task file: {0}")]
    Io(#[from] std::io::Error),
    /// Represents a task file that does not hold a JSON array of tasks.
    #[error("Malformed task file: {0}")]
    Decode(#[source] serde_json::Error),
    /// Represents a failure to serialize the task list.
    #[error("Failed to encode tasks: {0}")]
    Encode(#[source] serde_json::Error),
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    NotFound(i64),
    /// Represents a store whose highest ID leaves no room for another task.
    #[error("No task ID left after {0}")]
    IdsExhausted(i64),
}

/// File-backed task store.
///
/// The whole collection lives in one file as a pretty-printed JSON array.
/// Nothing is cached: every operation goes back to disk, and all access is
/// serialized through a single reader/writer lock owned by this instance.
/// Build one per process and share it behind an `Arc`.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every task from disk, in file order.
    ///
    /// A missing or empty file is an empty collection.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored tasks, or a `Decode` error if the file is not a JSON array of tasks.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read_all(&self) -> Result<Vec<Task>, StorageError> {
        let _guard = self.lock.read().await;
        load(&self.path).await
    }

    /// Replaces the file's contents with `tasks`.
    ///
    /// # Arguments
    ///
    /// * `tasks` - The complete collection to persist.
    #[tracing::instrument(skip(self, tasks), fields(path = %self.path.display(), count = tasks.len()))]
    pub async fn write_all(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let _guard = self.lock.write().await;
        store(&self.path, tasks).await
    }

    /// Finds a task by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the matching `Task`, or `StorageError::NotFound` if no task has that ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Task, StorageError> {
        self.read_all()
            .await?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(StorageError::NotFound(id))
    }

    /// Returns the ID the next created task should receive.
    ///
    /// The lock is released before this returns, so the value can go stale
    /// before a later `write_all`. Allocate inside [`JsonStorage::modify`]
    /// when the ID has to be persisted.
    #[tracing::instrument(skip(self))]
    pub async fn next_id(&self) -> Result<i64, StorageError> {
        let tasks = self.read_all().await?;
        next_id_of(&tasks)
    }

    /// Runs a read-modify-write cycle on the collection as one critical section.
    ///
    /// The exclusive lock is held from the read until the rewritten file is in
    /// place, so concurrent composite operations cannot overwrite each other.
    /// `read_all` and `write_all` each lock on their own; chaining them leaves a
    /// window where another writer's update is lost.
    ///
    /// The file is rewritten only when `mutate` succeeds.
    ///
    /// # Arguments
    ///
    /// * `mutate` - Closure applied to the loaded collection.
    ///
    /// # Returns
    ///
    /// A `Result` containing the closure's value once the collection has been persisted.
    #[tracing::instrument(skip(self, mutate), fields(path = %self.path.display()))]
    pub async fn modify<T, F>(&self, mutate: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T, StorageError>,
    {
        let _guard = self.lock.write().await;
        let mut tasks = load(&self.path).await?;
        let outcome = mutate(&mut tasks)?;
        store(&self.path, &tasks).await?;
        Ok(outcome)
    }
}

/// Computes the next free ID for `tasks`: one past the highest ID, and never below 1.
pub fn next_id_of(tasks: &[Task]) -> Result<i64, StorageError> {
    let max_id = tasks.iter().map(|task| task.id).fold(0, i64::max);
    max_id
        .checked_add(1)
        .ok_or(StorageError::IdsExhausted(max_id))
}

async fn load(path: &Path) -> Result<Vec<Task>, StorageError> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&data).map_err(StorageError::Decode)
}

async fn store(path: &Path, tasks: &[Task]) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(tasks).map_err(StorageError::Encode)?;

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Rename over the target so readers never observe a half-written array.
    let staging = staging_path(path);
    tokio::fs::write(&staging, &data).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

/// `path` is expected to name a file; the staging file is that name plus `.tmp`.
fn staging_path(path: &Path) -> PathBuf {
    let mut staging = OsString::from(path.as_os_str());
    staging.push(".tmp");
    PathBuf::from(staging)
}
