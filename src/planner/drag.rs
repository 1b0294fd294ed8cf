//! Drag and drop: moving a task within a day, or to another day

use crate::error::{Operation, PlannerError};
use crate::store::TaskStore;
use crate::task::{DayKey, Task, TaskId};
use crate::traits::PlannerRemote;

use super::Planner;
use super::optimistic::{self, Outcome};

/// A position in a day bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropLocation {
    pub day: DayKey,
    /// The position in the bucket. When a view is filtered, see [`DayView::bucket_index`](crate::view::DayView::bucket_index)
    pub index: usize,
}

impl DropLocation {
    pub fn new(day: DayKey, index: usize) -> Self {
        Self { day, index }
    }
}

/// The end of a drag gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragGesture {
    pub source: DropLocation,
    /// `None` when the task has been dropped outside of any day
    pub destination: Option<DropLocation>,
}

impl DragGesture {
    pub fn new(source: DropLocation, destination: Option<DropLocation>) -> Self {
        Self { source, destination }
    }

    /// Whether this gesture leaves everything in place
    pub fn is_noop(&self) -> bool {
        match &self.destination {
            None => true,
            Some(destination) => destination == &self.source,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
    /// Nothing had to be done
    Ignored,
    /// The task has been moved, and the server agreed
    Moved(Task),
}


/// What is needed to undo a move.
///
/// Only the moved task is put back. Other tasks of both days are left as they are.
struct MoveUndo {
    id: TaskId,
    source: DropLocation,
    /// The destination day, in case its bucket has been created by the move
    created_bucket: Option<DayKey>,
}

impl MoveUndo {
    fn apply(self, store: &mut TaskStore) {
        if store.put_back(&self.id, &self.source.day, self.source.index) == false {
            log::warn!("Task {} disappeared before its move could be rolled back", self.id);
        }
        if let Some(day) = self.created_bucket {
            store.drop_empty_bucket(&day);
        }
    }
}


impl<R: PlannerRemote> Planner<R> {
    /// Handle the end of a drag gesture.
    ///
    /// The task is moved locally right away, then the server is told about the new day.
    /// In case the server refuses, the task is put back at its former position, and both days are as they were before the move (apart from changes of other tasks that happened meanwhile).
    pub async fn on_drag_end(&self, gesture: DragGesture) -> Result<DragOutcome, PlannerError> {
        let (source, destination) = match gesture.destination {
            Some(destination) if gesture.is_noop() == false => (gesture.source, destination),
            _ => {
                self.feedback.debug("Drag gesture without any effect, ignoring it");
                return Ok(DragOutcome::Ignored);
            },
        };

        let moved_id = match self.read(|store| store.get_day(&source.day).get(source.index).map(|t| t.id().clone())) {
            Some(id) => id,
            None => return Err(PlannerError::InvalidPosition{ date: source.day, index: source.index }),
        };
        let _in_flight = self.claim(&moved_id)?;

        let outcome = optimistic::run(&self.store,
            |store| {
                let created_bucket = if store.has_bucket(&destination.day) { None } else { Some(destination.day) };
                // The bucket may have changed since the id was read
                let moved = store.relocate(&moved_id, &source.day, source.index, &destination.day, destination.index)?;
                Ok((moved, MoveUndo{ id: moved_id.clone(), source, created_bucket }))
            },
            |moved| async move {
                self.remote.move_task(moved.id(), moved.date()).await.map(|()| moved)
            },
            |_, moved| moved,
            |store, undo| undo.apply(store),
        ).await?;

        match outcome {
            Outcome::Confirmed(moved) => {
                self.feedback.success(&format!("Moved \"{}\" to {}", moved.subject(), moved.date()));
                Ok(DragOutcome::Moved(moved))
            },
            Outcome::RolledBack(err) => {
                self.feedback.error("Unable to move the task", &err);
                Err(PlannerError::persistence(Operation::Move, err))
            },
        }
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    fn location(day: &str, index: usize) -> DropLocation {
        DropLocation::new(DayKey::parse(day).unwrap(), index)
    }

    #[test]
    fn noop_gestures() {
        assert!(DragGesture::new(location("2025-01-10", 0), None).is_noop());
        assert!(DragGesture::new(location("2025-01-10", 1), Some(location("2025-01-10", 1))).is_noop());
        assert!(DragGesture::new(location("2025-01-10", 1), Some(location("2025-01-10", 0))).is_noop() == false);
        assert!(DragGesture::new(location("2025-01-10", 0), Some(location("2025-01-11", 0))).is_noop() == false);
    }
}
