//! An in-memory planner service, that can be used in place of a real server in tests

pub mod behaviour;
pub use behaviour::MockBehaviour;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::store::TaskMap;
use crate::task::{DayKey, NotifyRequest, Task, TaskDraft, TaskId, TaskUpdate};
use crate::traits::PlannerRemote;

/// A call received by a [`MockRemote`]
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteCall {
    ListAll,
    Create(TaskDraft),
    Update(DayKey, TaskId, TaskUpdate),
    Delete(DayKey, TaskId),
    Move(TaskId, DayKey),
    Notify(TaskId, NotifyRequest),
    ExportAll,
    ImportAll,
}

#[derive(Default)]
struct MockState {
    data: TaskMap,
    behaviour: MockBehaviour,
    calls: Vec<RemoteCall>,
    last_id: u64,
    latency: Option<Duration>,
    scripted_latencies: VecDeque<Duration>,
}

/// A planner service that keeps its tasks in memory.
///
/// Created tasks get string ids (`srv-1`, `srv-2`...), so that they cannot be mistaken for temporary ids.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mocked service that already contains some tasks
    pub fn with_data(data: TaskMap) -> Self {
        let remote = Self::new();
        remote.state().data = data;
        remote
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.state().behaviour = behaviour;
    }

    /// Make every call wait for some time before being processed
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state().latency = latency;
    }

    /// Give the next calls their own latencies (one per call, in order). Further calls use the latency set by [`Self::set_latency`]
    pub fn script_latencies(&self, latencies: Vec<Duration>) {
        self.state().scripted_latencies = latencies.into();
    }

    /// The tasks this service currently holds
    pub fn data(&self) -> TaskMap {
        self.state().data.clone()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    pub fn notify_count(&self) -> usize {
        self.state().calls.iter()
            .filter(|call| matches!(call, RemoteCall::Notify(..)))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call, and tell whether it is allowed to succeed
    async fn receive<F>(&self, call: RemoteCall, check: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), RemoteError>,
    {
        let latency = {
            let mut state = self.state();
            state.calls.push(call);
            state.scripted_latencies.pop_front().or(state.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        check(&mut self.state().behaviour)
    }
}

#[async_trait]
impl PlannerRemote for MockRemote {
    async fn list_all(&self) -> Result<TaskMap, RemoteError> {
        self.receive(RemoteCall::ListAll, MockBehaviour::can_list).await?;
        Ok(self.data())
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, RemoteError> {
        self.receive(RemoteCall::Create(draft.clone()), MockBehaviour::can_create).await?;

        let mut state = self.state();
        state.last_id += 1;
        let id = TaskId::Text(format!("srv-{}", state.last_id));
        let task = Task::new_with_parameters(id, draft.subject.clone(), draft.priority, draft.date, draft.notes.clone(), false, false);
        state.data.entry(draft.date).or_insert_with(Vec::new).push(task.clone());
        Ok(task)
    }

    async fn update(&self, date: &DayKey, id: &TaskId, fields: &TaskUpdate) -> Result<Task, RemoteError> {
        self.receive(RemoteCall::Update(*date, id.clone(), fields.clone()), MockBehaviour::can_update).await?;

        let mut state = self.state();
        let task = state.data.get_mut(date)
            .and_then(|list| list.iter_mut().find(|t| t.id() == id))
            .ok_or_else(|| format!("No task {} on {}", id, date))?;
        if let Some(completed) = fields.completed {
            task.set_completed(completed);
        }
        task.apply_patch(&fields.patch);
        Ok(task.clone())
    }

    async fn delete(&self, date: &DayKey, id: &TaskId) -> Result<(), RemoteError> {
        self.receive(RemoteCall::Delete(*date, id.clone()), MockBehaviour::can_delete).await?;

        let mut state = self.state();
        let list = state.data.get_mut(date).ok_or_else(|| format!("No task on {}", date))?;
        let before = list.len();
        list.retain(|t| t.id() != id);
        if list.len() == before {
            return Err(format!("No task {} on {}", id, date).into());
        }
        Ok(())
    }

    async fn move_task(&self, id: &TaskId, destination: &DayKey) -> Result<(), RemoteError> {
        self.receive(RemoteCall::Move(id.clone(), *destination), MockBehaviour::can_move).await?;

        let mut state = self.state();
        let mut moved = None;
        for list in state.data.values_mut() {
            if let Some(index) = list.iter().position(|t| t.id() == id) {
                moved = Some(list.remove(index));
                break;
            }
        }
        let mut task = moved.ok_or_else(|| format!("No task {}", id))?;
        task.set_date(*destination);
        state.data.entry(*destination).or_insert_with(Vec::new).push(task);
        Ok(())
    }

    async fn notify(&self, id: &TaskId, request: &NotifyRequest) -> Result<(), RemoteError> {
        self.receive(RemoteCall::Notify(id.clone(), request.clone()), MockBehaviour::can_notify).await?;

        let mut state = self.state();
        if let Some(task) = state.data.get_mut(&request.date).and_then(|list| list.iter_mut().find(|t| t.id() == id)) {
            task.set_notified(true);
        }
        Ok(())
    }

    async fn export_all(&self) -> Result<Vec<u8>, RemoteError> {
        self.receive(RemoteCall::ExportAll, MockBehaviour::can_export).await?;
        let payload = serde_json::to_vec_pretty(&self.state().data)?;
        Ok(payload)
    }

    async fn import_all(&self, tasks: &TaskMap) -> Result<(), RemoteError> {
        self.receive(RemoteCall::ImportAll, MockBehaviour::can_import).await?;
        self.state().data = tasks.clone();
        Ok(())
    }
}
