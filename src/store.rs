//! The in-memory task store: every planned day, and its ordered list of tasks
//!
//! The order of a day's tasks is meaningful: it is the order they are displayed in, and the order the user dragged them into.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlannerError;
use crate::task::{DayKey, Task, TaskId};
use crate::view::DayStats;

/// The raw form of a store: every day, mapped to its ordered list of tasks
pub type TaskMap = BTreeMap<DayKey, Vec<Task>>;

/// The tasks of every day.
///
/// Invariants:
/// * every task is stored in the bucket of its own `date`
/// * ids are unique within a bucket
///
/// Reading is public. Writing is restricted to this crate (see [`Planner`](crate::Planner)), apart from [`Self::replace_all`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    days: TaskMap,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a day-to-tasks map, checking the store invariants
    pub fn from_map(days: TaskMap) -> Result<Self, PlannerError> {
        let store = Self { days };
        store.check_consistency()?;
        Ok(store)
    }

    /// Parse a JSON value into a store.
    ///
    /// The value must be an object, that maps `yyyy-MM-dd` keys to arrays of task records.
    pub fn from_json_value(value: Value) -> Result<Self, PlannerError> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(PlannerError::InvalidFormat(format!("expected a map of days to tasks, got {}", json_kind(&other)))),
        };

        let mut days = TaskMap::new();
        for (key, list) in object {
            let day = DayKey::parse(&key)?;
            if list.is_array() == false {
                return Err(PlannerError::InvalidFormat(format!("tasks of {} are not a list", key)));
            }
            let tasks: Vec<Task> = serde_json::from_value(list)
                .map_err(|err| PlannerError::InvalidFormat(format!("invalid task on {}: {}", key, err)))?;
            days.insert(day, tasks);
        }
        Self::from_map(days)
    }

    /// Parse a JSON text into a store. See [`Self::from_json_value`]
    pub fn from_json_str(text: &str) -> Result<Self, PlannerError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| PlannerError::InvalidFormat(format!("not valid JSON: {}", err)))?;
        Self::from_json_value(value)
    }

    /// Replace the whole content of this store.
    ///
    /// In case `value` is not a valid mapping, this returns `InvalidFormat` and the store is left untouched.
    pub fn replace_all(&mut self, value: Value) -> Result<(), PlannerError> {
        let new_store = Self::from_json_value(value)?;
        *self = new_store;
        Ok(())
    }

    /// The ordered tasks of a day. Days without tasks return an empty slice.
    pub fn get_day(&self, date: &DayKey) -> &[Task] {
        match self.days.get(date) {
            Some(list) => list,
            None => &[],
        }
    }

    /// Every day that has a bucket, in chronological order. Buckets may be empty.
    pub fn days(&self) -> impl Iterator<Item = (&DayKey, &Vec<Task>)> {
        self.days.iter()
    }

    /// Look for a task in every bucket. Returns the bucket key and the position of the task in this bucket
    pub fn find(&self, id: &TaskId) -> Option<(DayKey, usize)> {
        self.days.iter()
            .find_map(|(day, list)| {
                list.iter()
                    .position(|task| task.id() == id)
                    .map(|index| (*day, index))
            })
    }

    /// Look for a task in a given bucket
    pub fn get_task(&self, date: &DayKey, id: &TaskId) -> Option<&Task> {
        self.get_day(date).iter().find(|task| task.id() == id)
    }

    pub fn day_stats(&self, date: &DayKey) -> DayStats {
        DayStats::of(self.get_day(date))
    }

    /// The total count of tasks
    pub fn len(&self) -> usize {
        self.days.values().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_map(&self) -> &TaskMap {
        &self.days
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.days)
    }

    /// Check the store invariants hold, and return the first violation otherwise
    pub fn check_consistency(&self) -> Result<(), PlannerError> {
        let mut seen: HashMap<&TaskId, &DayKey> = HashMap::new();
        for (day, list) in &self.days {
            for task in list {
                if task.date() != day {
                    return Err(PlannerError::InvalidFormat(format!("task {} is dated {} but listed under {}", task.id(), task.date(), day)));
                }
                if let Some(first) = seen.insert(task.id(), day) {
                    return Err(PlannerError::InvalidFormat(format!("task {} is listed under both {} and {}", task.id(), first, day)));
                }
            }
        }
        Ok(())
    }



    //
    // Mutations. Only the planner may use them
    //

    /// Append a task to the bucket of its date. A task with the same id in this bucket is replaced instead
    pub(crate) fn push(&mut self, task: Task) {
        let list = self.days.entry(*task.date()).or_insert_with(Vec::new);
        match list.iter().position(|t| t.id() == task.id()) {
            Some(index) => list[index] = task,
            None => list.push(task),
        }
    }

    pub(crate) fn task_mut(&mut self, date: &DayKey, id: &TaskId) -> Option<&mut Task> {
        self.days.get_mut(date)?
            .iter_mut()
            .find(|task| task.id() == id)
    }

    /// Look for a task in every bucket
    pub(crate) fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.days.values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|task| task.id() == id)
    }

    /// Remove a task from a bucket, and return it
    pub(crate) fn remove(&mut self, date: &DayKey, id: &TaskId) -> Option<Task> {
        let list = self.days.get_mut(date)?;
        let index = list.iter().position(|task| task.id() == id)?;
        Some(list.remove(index))
    }

    /// Remove a task, wherever it is
    pub(crate) fn remove_anywhere(&mut self, id: &TaskId) -> Option<Task> {
        let (day, _) = self.find(id)?;
        self.remove(&day, id)
    }

    /// Replace the task `old_id` with `task`.
    ///
    /// `task` takes the place of `old_id` if both are in the same bucket. Otherwise, `old_id` is removed from wherever it is, and `task` is appended to the bucket of its date.
    /// Returns whether `old_id` was found.
    pub(crate) fn replace_or_append(&mut self, old_id: &TaskId, task: Task) -> bool {
        let date = *task.date();
        if let Some(list) = self.days.get_mut(&date) {
            if let Some(index) = list.iter().position(|t| t.id() == old_id) {
                // The new id may already be in the list (e.g. after a reload)
                list.retain(|t| t.id() != task.id() || t.id() == old_id);
                let index = list.iter().position(|t| t.id() == old_id).unwrap_or(index);
                list[index] = task;
                return true;
            }
        }

        let found = self.remove_anywhere(old_id).is_some();
        self.push(task);
        found
    }

    /// Whether a bucket exists, even empty
    pub(crate) fn has_bucket(&self, date: &DayKey) -> bool {
        self.days.contains_key(date)
    }

    /// Remove a bucket, provided it is empty
    pub(crate) fn drop_empty_bucket(&mut self, date: &DayKey) {
        if self.days.get(date).map(|list| list.is_empty()) == Some(true) {
            self.days.remove(date);
        }
    }

    /// Move the task at `from_index` of day `from` to position `to_index` of day `to`.
    ///
    /// The task at `from_index` must be `id`, otherwise nothing is moved and `InvalidPosition` is returned.
    /// `to_index` is clamped to the length of the destination bucket (after the task has been removed from its source). The task date is updated to `to`.
    pub(crate) fn relocate(&mut self, id: &TaskId, from: &DayKey, from_index: usize, to: &DayKey, to_index: usize) -> Result<Task, PlannerError> {
        let source = match self.days.get_mut(from) {
            Some(list) if list.get(from_index).map(Task::id) == Some(id) => list,
            _ => return Err(PlannerError::InvalidPosition{ date: *from, index: from_index }),
        };
        let mut moved = source.remove(from_index);
        moved.set_date(*to);

        let destination = self.days.entry(*to).or_insert_with(Vec::new);
        let to_index = to_index.min(destination.len());
        destination.insert(to_index, moved.clone());
        Ok(moved)
    }

    /// Put task `id` back at position `index` of day `date`, wherever it currently is.
    ///
    /// `index` is clamped to the length of the bucket. Returns `false` (and changes nothing) if the task is not in the store anymore.
    pub(crate) fn put_back(&mut self, id: &TaskId, date: &DayKey, index: usize) -> bool {
        let mut task = match self.remove_anywhere(id) {
            Some(task) => task,
            None => return false,
        };
        task.set_date(*date);
        let list = self.days.entry(*date).or_insert_with(Vec::new);
        let index = index.min(list.len());
        list.insert(index, task);
        true
    }
}

impl From<TaskStore> for TaskMap {
    fn from(store: TaskStore) -> TaskMap {
        store.days
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::task::Priority;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    fn task(id: i64, subject: &str, date: &str) -> Task {
        Task::new_with_parameters(TaskId::Number(id), subject.to_string(), Priority::Medium, day(date), None, false, false)
    }

    fn subjects(store: &TaskStore, date: &str) -> Vec<String> {
        store.get_day(&day(date)).iter().map(|t| t.subject().to_string()).collect()
    }

    #[test]
    fn empty_days() {
        let store = TaskStore::new();
        assert!(store.get_day(&day("2025-01-10")).is_empty());
        assert_eq!(store.day_stats(&day("2025-01-10")).percentage, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn import_format() {
        let value = json!({"2025-02-01": [
            {"id": 1, "subject": "Biology", "priority": "Low", "date": "2025-02-01", "completed": false, "notified": false}
        ]});
        let store = TaskStore::from_json_value(value.clone()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.to_json().unwrap(), value);

        assert!(TaskStore::from_json_value(json!([1, 2, 3])).is_err());
        assert!(TaskStore::from_json_value(json!("tasks")).is_err());
        assert!(TaskStore::from_json_value(json!(null)).is_err());
        assert!(TaskStore::from_json_value(json!({"2025-02-01": {"id": 1}})).is_err());
        assert!(TaskStore::from_json_value(json!({"someday": []})).is_err());
        assert!(TaskStore::from_json_value(json!({"2025-02-01": [{"subject": "no id"}]})).is_err());
        assert!(TaskStore::from_json_str("{ not json").is_err());
    }

    #[test]
    fn import_checks_invariants() {
        let misfiled = json!({"2025-02-01": [
            {"id": 1, "subject": "Biology", "priority": "Low", "date": "2025-02-02"}
        ]});
        assert!(matches!(TaskStore::from_json_value(misfiled), Err(PlannerError::InvalidFormat(_))));

        let duplicated = json!({"2025-02-01": [
            {"id": 1, "subject": "Biology", "priority": "Low", "date": "2025-02-01"},
            {"id": 1, "subject": "Chemistry", "priority": "Low", "date": "2025-02-01"}
        ]});
        assert!(matches!(TaskStore::from_json_value(duplicated), Err(PlannerError::InvalidFormat(_))));

        let on_two_days = json!({
            "2025-02-01": [{"id": 1, "subject": "Biology", "priority": "Low", "date": "2025-02-01"}],
            "2025-02-02": [{"id": 1, "subject": "Biology", "priority": "Low", "date": "2025-02-02"}],
        });
        assert!(matches!(TaskStore::from_json_value(on_two_days), Err(PlannerError::InvalidFormat(_))));
    }

    #[test]
    fn ids_are_unique_across_days() {
        let mut store = TaskStore::new();
        store.push(task(1, "Algebra", "2025-01-10"));
        store.push(task(2, "Biology", "2025-01-11"));
        store.check_consistency().unwrap();

        store.push(task(1, "Algebra", "2025-01-12"));
        assert!(matches!(store.check_consistency(), Err(PlannerError::InvalidFormat(_))));
        assert!(TaskStore::from_map(store.as_map().clone()).is_err());
    }

    #[test]
    fn failed_replace_leaves_store_untouched() {
        let mut store = TaskStore::new();
        store.push(task(1, "Algebra", "2025-01-10"));
        let before = store.clone();

        assert!(store.replace_all(json!(42)).is_err());
        assert_eq!(store, before);

        store.replace_all(json!({})).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn relocation() {
        let mut store = TaskStore::new();
        store.push(task(1, "T", "2025-01-10"));
        store.push(task(2, "X", "2025-01-10"));
        store.push(task(3, "Y", "2025-01-11"));
        store.push(task(4, "Z", "2025-01-11"));

        let moved = store.relocate(&TaskId::Number(1), &day("2025-01-10"), 0, &day("2025-01-11"), 2).unwrap();
        assert_eq!(moved.date(), &day("2025-01-11"));
        assert_eq!(subjects(&store, "2025-01-10"), vec!["X"]);
        assert_eq!(subjects(&store, "2025-01-11"), vec!["Y", "Z", "T"]);

        // Within a bucket
        store.relocate(&TaskId::Number(1), &day("2025-01-11"), 2, &day("2025-01-11"), 1).unwrap();
        assert_eq!(subjects(&store, "2025-01-11"), vec!["Y", "T", "Z"]);

        // Out of range destinations are clamped
        store.relocate(&TaskId::Number(3), &day("2025-01-11"), 0, &day("2025-01-12"), 99).unwrap();
        assert_eq!(subjects(&store, "2025-01-12"), vec!["Y"]);

        assert!(store.relocate(&TaskId::Number(2), &day("2025-01-10"), 5, &day("2025-01-11"), 0).is_err());
        assert!(store.relocate(&TaskId::Number(2), &day("2025-03-01"), 0, &day("2025-01-11"), 0).is_err());
        store.check_consistency().unwrap();
    }

    #[test]
    fn relocation_checks_the_task_at_the_source() {
        let mut store = TaskStore::new();
        store.push(task(1, "T", "2025-01-10"));
        store.push(task(2, "X", "2025-01-10"));

        // Task 1 was at index 0, but it has been deleted meanwhile: X must not be moved in its place
        store.remove(&day("2025-01-10"), &TaskId::Number(1));
        let result = store.relocate(&TaskId::Number(1), &day("2025-01-10"), 0, &day("2025-01-11"), 0);
        assert!(matches!(result, Err(PlannerError::InvalidPosition{ index: 0, .. })));
        assert_eq!(subjects(&store, "2025-01-10"), vec!["X"]);
        assert!(store.get_day(&day("2025-01-11")).is_empty());
    }

    #[test]
    fn replacing_temporary_tasks() {
        let mut store = TaskStore::new();
        store.push(task(1, "first", "2025-01-10"));
        store.push(task(2, "temporary", "2025-01-10"));
        store.push(task(3, "last", "2025-01-10"));

        let saved = Task::new_with_parameters(TaskId::from("srv-1"), "temporary".to_string(), Priority::High, day("2025-01-10"), None, false, false);
        assert!(store.replace_or_append(&TaskId::Number(2), saved));
        assert_eq!(store.get_day(&day("2025-01-10"))[1].id(), &TaskId::from("srv-1"));

        // The temporary task is gone already: the saved task is appended
        let saved = Task::new_with_parameters(TaskId::from("srv-2"), "gone".to_string(), Priority::High, day("2025-01-10"), None, false, false);
        assert!(store.replace_or_append(&TaskId::Number(42), saved) == false);
        assert_eq!(subjects(&store, "2025-01-10"), vec!["first", "temporary", "last", "gone"]);

        // The server moved the task to another day
        store.push(task(5, "elsewhere", "2025-01-10"));
        let saved = Task::new_with_parameters(TaskId::from("srv-3"), "elsewhere".to_string(), Priority::High, day("2025-01-12"), None, false, false);
        assert!(store.replace_or_append(&TaskId::Number(5), saved));
        assert_eq!(subjects(&store, "2025-01-12"), vec!["elsewhere"]);
        assert_eq!(store.get_day(&day("2025-01-10")).len(), 4);
        store.check_consistency().unwrap();
    }

    #[test]
    fn putting_moved_tasks_back() {
        let mut store = TaskStore::new();
        store.push(task(1, "T", "2025-01-10"));
        store.push(task(2, "X", "2025-01-10"));
        store.push(task(3, "Y", "2025-01-11"));
        let before = store.clone();

        store.relocate(&TaskId::Number(1), &day("2025-01-10"), 0, &day("2025-01-11"), 0).unwrap();
        assert!(store.put_back(&TaskId::Number(1), &day("2025-01-10"), 0));
        assert_eq!(store, before);

        // Only the moved task is put back: other changes of the buckets are kept
        store.relocate(&TaskId::Number(1), &day("2025-01-10"), 0, &day("2025-01-12"), 0).unwrap();
        store.remove(&day("2025-01-10"), &TaskId::Number(2));
        assert!(store.put_back(&TaskId::Number(1), &day("2025-01-10"), 0));
        assert_eq!(subjects(&store, "2025-01-10"), vec!["T"]);
        assert_eq!(store.get_day(&day("2025-01-10"))[0].date(), &day("2025-01-10"));
        store.drop_empty_bucket(&day("2025-01-12"));
        assert!(store.has_bucket(&day("2025-01-12")) == false);
        store.check_consistency().unwrap();

        // Positions are clamped, and gone tasks are not resurrected
        store.relocate(&TaskId::Number(3), &day("2025-01-11"), 0, &day("2025-01-10"), 1).unwrap();
        assert!(store.put_back(&TaskId::Number(3), &day("2025-01-11"), 7));
        assert_eq!(subjects(&store, "2025-01-11"), vec!["Y"]);
        store.remove(&day("2025-01-11"), &TaskId::Number(3));
        assert!(store.put_back(&TaskId::Number(3), &day("2025-01-11"), 0) == false);
        assert!(store.get_day(&day("2025-01-11")).is_empty());
    }
}
