use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{JsonStorage, StorageError, next_id_of};

pub mod api;

/// A to-do item, as persisted in the task file and returned by the API.
///
/// Members missing from a stored record load as empty values; a record
/// without `createdAt` reads back as the Unix epoch.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Unique identifier, assigned by the server
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Creation time, assigned by the server and never changed afterwards
    pub created_at: DateTime<Utc>,
}

/// Client-supplied fields of a task, used by create and update.
///
/// Missing members default to empty values. `id` and `createdAt` members
/// are accepted and ignored.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl TaskInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>, completed: bool) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            completed,
        }
    }

    fn into_task(self, id: i64, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            created_at,
        }
    }
}

pub struct TaskService<'a> {
    storage: &'a JsonStorage,
}

impl TaskService<'_> {
    pub fn new(storage: &JsonStorage) -> TaskService<'_> {
        TaskService { storage }
    }

    /// Retrieves all tasks in stored order.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.storage.read_all().await
    }

    /// Retrieves a single task.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task`, or `StorageError::NotFound` if no task has that ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: i64) -> Result<Task, StorageError> {
        self.storage.get_by_id(id).await
    }

    /// Creates a new task.
    ///
    /// The ID is one past the highest stored ID and `created_at` is the current time.
    /// Fails with `StorageError::IdsExhausted` when the highest ID is `i64::MAX`.
    /// Allocation, append and write happen under one storage lock.
    ///
    /// # Arguments
    ///
    /// * `input` - The client-supplied fields.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, input: TaskInput) -> Result<Task, StorageError> {
        let created_at = Utc::now();
        let task = self
            .storage
            .modify(|tasks| {
                let task = input.into_task(next_id_of(tasks)?, created_at);
                tasks.push(task.clone());
                Ok(task)
            })
            .await?;
        tracing::info!("Created task {}", task.id);
        Ok(task)
    }

    /// Replaces every client-editable field of a task.
    ///
    /// The stored `id` and `created_at` are kept.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `input` - The replacement fields.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, or `StorageError::NotFound` if no task has that ID.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: i64, input: TaskInput) -> Result<Task, StorageError> {
        self.storage
            .modify(|tasks| {
                let stored = tasks
                    .iter_mut()
                    .find(|task| task.id == id)
                    .ok_or(StorageError::NotFound(id))?;
                *stored = input.into_task(id, stored.created_at);
                Ok(stored.clone())
            })
            .await
    }

    /// Deletes a task permanently.
    ///
    /// # Returns
    ///
    /// `StorageError::NotFound` if no task has that ID; the file is then left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i64) -> Result<(), StorageError> {
        self.storage
            .modify(|tasks| {
                let before = tasks.len();
                tasks.retain(|task| task.id != id);
                if tasks.len() == before {
                    return Err(StorageError::NotFound(id));
                }
                Ok(())
            })
            .await?;
        tracing::info!("Deleted task {}", id);
        Ok(())
    }
}
