//! Planner tasks, and the identifiers they are stored under

use std::fmt::{Display, Formatter};
use std::convert::TryFrom;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, Utc};

use crate::error::PlannerError;

/// The format of a [`DayKey`]
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Last temporary id handed out by [`TaskId::temporary`]
static LAST_TEMPORARY_ID: AtomicI64 = AtomicI64::new(0);


/// A calendar day, in its `yyyy-MM-dd` form.
///
/// This is both a task's `date` and the key of the bucket that task is stored in.
/// Keys sort chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey {
    date: NaiveDate,
}

impl DayKey {
    /// Parse a `yyyy-MM-dd` string
    pub fn parse(s: &str) -> Result<Self, PlannerError> {
        match NaiveDate::parse_from_str(s, DAY_KEY_FORMAT) {
            Ok(date) => Ok(Self::from(date)),
            Err(err) => Err(PlannerError::InvalidFormat(format!("{:?} is not a yyyy-MM-dd day ({})", s, err))),
        }
    }

    /// The day this key stands for
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Today, in UTC
    pub fn today() -> Self {
        Self::from(Utc::now().naive_utc().date())
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self { date }
    }
}
impl TryFrom<String> for DayKey {
    type Error = PlannerError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
impl From<DayKey> for String {
    fn from(key: DayKey) -> String {
        key.to_string()
    }
}
impl FromStr for DayKey {
    type Err = PlannerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.date.format(DAY_KEY_FORMAT))
    }
}



/// Identifies a task.
///
/// Tasks that have not been confirmed by the server yet have a temporary, numeric, time-based id.
/// Servers may use either numbers or strings, both are kept as they were received.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl TaskId {
    /// Generate a new temporary id, from the current time (in milliseconds).
    ///
    /// Ids handed out by this function are strictly increasing within a process, even when called several times within the same millisecond.
    pub fn temporary() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_TEMPORARY_ID.load(Ordering::SeqCst);
        loop {
            let candidate = if now > last { now } else { last + 1 };
            match LAST_TEMPORARY_ID.compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return TaskId::Number(candidate),
                Err(current) => last = current,
            }
        }
    }
}

impl From<i64> for TaskId {
    fn from(n: i64) -> Self {
        TaskId::Number(n)
    }
}
impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId::Text(s.to_string())
    }
}
impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId::Text(s)
    }
}
impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}



#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn all() -> [Priority; 3] {
        [Priority::High, Priority::Medium, Priority::Low]
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Priority {
    type Err = PlannerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(PlannerError::InvalidFormat(format!("unknown priority {:?}", other))),
        }
    }
}



/// A study task, planned for a given day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    subject: String,
    priority: Priority,
    /// The day this task is planned for. This is also the key of the bucket the task is stored in.
    date: DayKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    completed: bool,
    /// Whether a reminder has already been sent for this task
    #[serde(default)]
    notified: bool,
}

impl Task {
    /// Create a task with every field given
    pub fn new_with_parameters(id: TaskId, subject: String, priority: Priority, date: DayKey,
                               notes: Option<String>, completed: bool, notified: bool) -> Self
    {
        Self { id, subject, priority, date, notes, completed, notified }
    }

    /// Create the optimistic version of a draft: it gets a temporary id, and is neither completed nor notified
    pub fn from_draft(draft: &TaskDraft) -> Self {
        Self::new_with_parameters(
            TaskId::temporary(),
            draft.subject.clone(),
            draft.priority,
            draft.date,
            draft.notes.clone(),
            false,
            false,
        )
    }

    pub fn id(&self) -> &TaskId         { &self.id       }
    pub fn subject(&self) -> &str       { &self.subject  }
    pub fn priority(&self) -> Priority  { self.priority  }
    pub fn date(&self) -> &DayKey       { &self.date     }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn completed(&self) -> bool     { self.completed }
    pub fn notified(&self) -> bool      { self.notified  }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
    pub(crate) fn set_notified(&mut self, notified: bool) {
        self.notified = notified;
    }
    /// Only the store may call this, since the date must stay equal to the bucket key
    pub(crate) fn set_date(&mut self, date: DayKey) {
        self.date = date;
    }

    /// Apply the fields that are set in a patch
    pub(crate) fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(subject) = &patch.subject {
            self.subject = subject.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(notes) = &patch.notes {
            self.notes = if notes.is_empty() { None } else { Some(notes.clone()) };
        }
    }
}



/// What the user fills in before adding a task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub subject: String,
    #[serde(default)]
    pub priority: Priority,
    pub date: DayKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskDraft {
    pub fn new<S: ToString>(subject: S, priority: Priority, date: DayKey) -> Self {
        Self { subject: subject.to_string(), priority, date, notes: None }
    }

    pub fn with_notes<S: ToString>(mut self, notes: S) -> Self {
        let notes = notes.to_string();
        self.notes = if notes.is_empty() { None } else { Some(notes) };
        self
    }

    /// Subject is required
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.subject.trim().is_empty() {
            return Err(PlannerError::InvalidDraft("a subject is required".to_string()));
        }
        Ok(())
    }
}


/// An edit of the user-editable fields of a task. Fields left to `None` are not changed.
///
/// Setting `notes` to an empty string clears the notes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.priority.is_none() && self.notes.is_none()
    }
}


/// The partial fields sent along a remote `update`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub patch: TaskPatch,
}

impl TaskUpdate {
    pub fn completion(completed: bool) -> Self {
        Self { completed: Some(completed), patch: TaskPatch::default() }
    }

    pub fn patch(patch: TaskPatch) -> Self {
        Self { completed: None, patch }
    }
}


/// The payload of a reminder request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub subject: String,
    pub date: DayKey,
}
