use async_trait::async_trait;

use crate::error::RemoteError;
use crate::store::TaskMap;
use crate::task::{DayKey, NotifyRequest, Task, TaskDraft, TaskId, TaskUpdate};

/// A remote planner service, that is the source of truth for the tasks.
///
/// This is usually a [`Client`](crate::client::Client), but can be mocked (see [`MockRemote`](crate::mock::MockRemote)).
#[async_trait]
pub trait PlannerRemote {
    /// Returns every task the service knows about
    async fn list_all(&self) -> Result<TaskMap, RemoteError>;

    /// Create a task. The returned task carries its final, server-assigned id
    async fn create(&self, draft: &TaskDraft) -> Result<Task, RemoteError>;

    /// Change some fields of a task
    async fn update(&self, date: &DayKey, id: &TaskId, fields: &TaskUpdate) -> Result<Task, RemoteError>;

    async fn delete(&self, date: &DayKey, id: &TaskId) -> Result<(), RemoteError>;

    /// Move a task to another day
    async fn move_task(&self, id: &TaskId, destination: &DayKey) -> Result<(), RemoteError>;

    /// Send a reminder about a task
    async fn notify(&self, id: &TaskId, request: &NotifyRequest) -> Result<(), RemoteError>;

    /// Returns a file payload that contains every task
    async fn export_all(&self) -> Result<Vec<u8>, RemoteError>;

    /// Replace every task of the service
    async fn import_all(&self, tasks: &TaskMap) -> Result<(), RemoteError>;
}
