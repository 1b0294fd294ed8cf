//! The planner owns the task store, and keeps it in sync with a remote planner service
//!
//! Every change is applied to the local store first, so that it can be displayed right away.
//! The remote service is then asked to persist it. If it refuses, the local change is rolled back.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{Operation, PlannerError};
use crate::store::TaskStore;
use crate::task::{DayKey, NotifyRequest, Task, TaskDraft, TaskId, TaskPatch, TaskUpdate};
use crate::traits::PlannerRemote;
use crate::view::DayStats;

pub mod drag;
pub mod feedback;
mod optimistic;

use feedback::{Feedback, NoticeSender};
use optimistic::Outcome;

/// What happened to a reminder request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// A reminder had already been sent for this task. Nothing has been sent this time.
    AlreadyNotified,
}


/// A study planner, that keeps a local task store in sync with a remote planner service.
///
/// The local store is the only state displays should read (see [`Self::read`]). It is only modified by the methods of this struct.
///
/// Methods take `&self`, so that several operations can be in flight at the same time (e.g. a toggle on a task while another task is being added).
/// However, a task cannot be changed while another change of the same task is waiting for the remote: this is refused with [`PlannerError::TaskBusy`].
pub struct Planner<R: PlannerRemote> {
    remote: R,
    store: Mutex<TaskStore>,
    /// Tasks that have a remote call pending
    in_flight: Mutex<HashSet<TaskId>>,
    feedback: Feedback,
}

/// Marks a task as having a remote call pending, until it is dropped
struct InFlight<'a> {
    tasks: &'a Mutex<HashSet<TaskId>>,
    id: TaskId,
}

impl<'a> Drop for InFlight<'a> {
    fn drop(&mut self) {
        lock_set(self.tasks).remove(&self.id);
    }
}

fn lock_set(set: &Mutex<HashSet<TaskId>>) -> MutexGuard<'_, HashSet<TaskId>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(date: &DayKey, id: &TaskId) -> PlannerError {
    PlannerError::TaskNotFound{ date: *date, id: id.clone() }
}


impl<R: PlannerRemote> Planner<R> {
    /// Create a planner with an empty store. You will probably want to [`load`](Self::load) it.
    pub fn new(remote: R) -> Self {
        Self::new_with_feedback(remote, Feedback::new())
    }

    /// Create a planner that sends user-visible notices to a [`notice_channel`](feedback::notice_channel)
    pub fn new_with_notices(remote: R, notices: NoticeSender) -> Self {
        Self::new_with_feedback(remote, Feedback::new_with_channel(notices))
    }

    fn new_with_feedback(remote: R, feedback: Feedback) -> Self {
        Self {
            remote,
            store: Mutex::new(TaskStore::new()),
            in_flight: Mutex::new(HashSet::new()),
            feedback,
        }
    }

    /// Returns the remote service.
    ///
    /// Apart from tests, there are very few (if any) reasons to access it directly.
    pub fn remote(&self) -> &R { &self.remote }

    /// Read the local store
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&TaskStore) -> T,
    {
        f(&*optimistic::lock(&self.store))
    }

    /// A copy of the local store
    pub fn snapshot(&self) -> TaskStore {
        self.read(|store| store.clone())
    }

    /// The ordered tasks of a day
    pub fn day(&self, date: &DayKey) -> Vec<Task> {
        self.read(|store| store.get_day(date).to_vec())
    }

    pub fn day_stats(&self, date: &DayKey) -> DayStats {
        self.read(|store| store.day_stats(date))
    }

    /// Whether a task has a remote call pending
    pub fn is_in_flight(&self, id: &TaskId) -> bool {
        lock_set(&self.in_flight).contains(id)
    }

    fn claim(&self, id: &TaskId) -> Result<InFlight<'_>, PlannerError> {
        let mut in_flight = lock_set(&self.in_flight);
        if in_flight.insert(id.clone()) == false {
            self.feedback.warn(&format!("Task {} is still being saved, please retry", id));
            return Err(PlannerError::TaskBusy(id.clone()));
        }
        Ok(InFlight{ tasks: &self.in_flight, id: id.clone() })
    }



    /// Replace the local store with the content of the remote.
    ///
    /// In case of failure, the local store is left untouched.
    pub async fn load(&self) -> Result<(), PlannerError> {
        self.feedback.debug("Loading tasks from the remote");
        let tasks = match self.remote.list_all().await {
            Ok(tasks) => tasks,
            Err(err) => {
                self.feedback.error("Unable to load the tasks", &err);
                return Err(PlannerError::Fetch(err));
            },
        };

        let store = match TaskStore::from_map(tasks) {
            Ok(store) => store,
            Err(err) => {
                self.feedback.error("The planner service returned invalid tasks", &err);
                return Err(err);
            }
        };
        self.feedback.debug(&format!("Loaded {} tasks", store.len()));
        *optimistic::lock(&self.store) = store;
        Ok(())
    }


    /// Add a task.
    ///
    /// It is displayed right away with a temporary id, that is replaced by the id the server assigns.
    /// The confirmed task is returned.
    pub async fn add_task(&self, draft: TaskDraft) -> Result<Task, PlannerError> {
        if let Err(err) = draft.validate() {
            self.feedback.warn("Subject and date are required");
            return Err(err);
        }

        let optimistic_task = Task::from_draft(&draft);
        let temporary_id = optimistic_task.id().clone();
        let _in_flight = self.claim(&temporary_id)?;

        let outcome = optimistic::run(&self.store,
            |store| {
                store.push(optimistic_task);
                Ok(((), ()))
            },
            |()| self.remote.create(&draft),
            |store, saved: Task| {
                if store.replace_or_append(&temporary_id, saved.clone()) == false {
                    log::debug!("Temporary task {} was not there anymore, appending {}", temporary_id, saved.id());
                }
                saved
            },
            |store, ()| {
                store.remove_anywhere(&temporary_id);
            },
        ).await?;

        match outcome {
            Outcome::Confirmed(saved) => {
                self.feedback.success(&format!("Task \"{}\" added", saved.subject()));
                Ok(saved)
            },
            Outcome::RolledBack(err) => {
                self.feedback.error("Unable to add the task", &err);
                Err(PlannerError::persistence(Operation::Add, err))
            },
        }
    }


    /// Flip the completion status of a task
    pub async fn toggle_complete(&self, date: &DayKey, id: &TaskId) -> Result<(), PlannerError> {
        let _in_flight = self.claim(id)?;

        let outcome = optimistic::run(&self.store,
            |store| {
                let task = store.task_mut(date, id).ok_or_else(|| not_found(date, id))?;
                let previous = task.completed();
                task.set_completed(previous == false);
                Ok((previous == false, previous))
            },
            |completed| async move {
                self.remote.update(date, id, &TaskUpdate::completion(completed)).await
            },
            |_, _| (),
            |store, previous| {
                if let Some(task) = store.find_mut(id) {
                    task.set_completed(previous);
                }
            },
        ).await?;

        match outcome {
            Outcome::Confirmed(()) => Ok(()),
            Outcome::RolledBack(err) => {
                self.feedback.error("Unable to update the task", &err);
                Err(PlannerError::persistence(Operation::Toggle, err))
            },
        }
    }


    /// Change the subject, priority or notes of a task
    pub async fn edit_task(&self, date: &DayKey, id: &TaskId, patch: TaskPatch) -> Result<(), PlannerError> {
        if let Some(subject) = &patch.subject {
            if subject.trim().is_empty() {
                self.feedback.warn("Subject is required");
                return Err(PlannerError::InvalidDraft("a subject is required".to_string()));
            }
        }
        if patch.is_empty() {
            return Ok(());
        }
        let _in_flight = self.claim(id)?;

        let update = TaskUpdate::patch(patch);
        let outcome = optimistic::run(&self.store,
            |store| {
                let task = store.task_mut(date, id).ok_or_else(|| not_found(date, id))?;
                let previous = task.clone();
                task.apply_patch(&update.patch);
                Ok(((), previous))
            },
            |()| self.remote.update(date, id, &update),
            |_, _| (),
            |store, previous| {
                if let Some(task) = store.find_mut(id) {
                    *task = previous;
                }
            },
        ).await?;

        match outcome {
            Outcome::Confirmed(()) => {
                self.feedback.success("Task updated");
                Ok(())
            },
            Outcome::RolledBack(err) => {
                self.feedback.error("Unable to update the task", &err);
                Err(PlannerError::persistence(Operation::Edit, err))
            },
        }
    }


    /// Delete a task, and return it.
    ///
    /// In case the server refuses, the task is put back at the end of its day (not necessarily at its former position).
    pub async fn delete_task(&self, date: &DayKey, id: &TaskId) -> Result<Task, PlannerError> {
        let _in_flight = self.claim(id)?;

        let outcome = optimistic::run(&self.store,
            |store| {
                let removed = store.remove(date, id).ok_or_else(|| not_found(date, id))?;
                Ok((removed.clone(), removed))
            },
            |removed| async move {
                self.remote.delete(date, id).await.map(|()| removed)
            },
            |_, removed| removed,
            |store, removed| store.push(removed),
        ).await?;

        match outcome {
            Outcome::Confirmed(removed) => {
                self.feedback.success(&format!("Task \"{}\" deleted", removed.subject()));
                Ok(removed)
            },
            Outcome::RolledBack(err) => {
                self.feedback.error("Unable to delete the task", &err);
                Err(PlannerError::persistence(Operation::Delete, err))
            },
        }
    }


    /// Send a reminder about a task.
    ///
    /// This is a no-op in case a reminder has already been sent, so that a task is never notified twice.
    /// In case of failure, the task is still considered as not notified, so that the reminder can be sent again.
    pub async fn send_notification(&self, date: &DayKey, id: &TaskId) -> Result<NotifyOutcome, PlannerError> {
        let request = match self.read(|store| store.get_task(date, id).map(|t| (t.notified(), t.subject().to_string()))) {
            None => return Err(not_found(date, id)),
            Some((true, _)) => {
                self.feedback.info("A reminder has already been sent for this task");
                return Ok(NotifyOutcome::AlreadyNotified);
            },
            Some((false, subject)) => NotifyRequest{ subject, date: *date },
        };
        let _in_flight = self.claim(id)?;

        match self.remote.notify(id, &request).await {
            Ok(()) => {
                if let Some(task) = optimistic::lock(&self.store).find_mut(id) {
                    task.set_notified(true);
                }
                self.feedback.success("Reminder sent");
                Ok(NotifyOutcome::Sent)
            },
            Err(err) => {
                self.feedback.error("Unable to send the reminder", &err);
                Err(PlannerError::Notify{ id: id.clone(), source: err })
            },
        }
    }


    /// Replace every task, locally and on the remote, with the content of a JSON value (see [`TaskStore::from_json_value`] for the expected format).
    ///
    /// Invalid values are refused with [`PlannerError::InvalidFormat`]. In case of any failure, the local store is left untouched.
    pub async fn import_value(&self, value: Value) -> Result<(), PlannerError> {
        let imported = match TaskStore::from_json_value(value) {
            Ok(store) => store,
            Err(err) => {
                self.feedback.error("Invalid planner file", &err);
                return Err(err);
            },
        };

        if let Err(err) = self.remote.import_all(imported.as_map()).await {
            self.feedback.error("Unable to import the tasks", &err);
            return Err(PlannerError::persistence(Operation::Import, err));
        }

        let count = imported.len();
        *optimistic::lock(&self.store) = imported;
        self.feedback.success(&format!("Imported {} tasks", count));
        Ok(())
    }

    /// See [`Self::import_value`]
    pub async fn import_json(&self, text: &str) -> Result<(), PlannerError> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.import_value(value).await,
            Err(err) => {
                self.feedback.error("Invalid planner file", &err);
                Err(PlannerError::InvalidFormat(format!("not valid JSON: {}", err)))
            },
        }
    }

    /// Import the content of a JSON file. See [`Self::import_value`]
    pub async fn import_file(&self, path: &Path) -> Result<(), PlannerError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.feedback.error(&format!("Unable to read {:?}", path), &err);
                return Err(err.into());
            },
        };
        self.import_json(&text).await
    }


    /// Ask the remote for an export of every task
    pub async fn export(&self) -> Result<Vec<u8>, PlannerError> {
        match self.remote.export_all().await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                self.feedback.error("Unable to export the tasks", &err);
                Err(PlannerError::Fetch(err))
            },
        }
    }

    /// Export every task into a file
    pub async fn export_to_file(&self, path: &Path) -> Result<(), PlannerError> {
        let payload = self.export().await?;
        if let Err(err) = std::fs::write(path, &payload) {
            self.feedback.error(&format!("Unable to write {:?}", path), &err);
            return Err(err.into());
        }
        self.feedback.success(&format!("Tasks exported to {:?}", path));
        Ok(())
    }
}
