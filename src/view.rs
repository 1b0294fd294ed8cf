//! Read-only projections of a [`TaskStore`]: statistics, filters, pages of days, dashboards
//!
//! Nothing in this module mutates the store.

use chrono::{Datelike, Duration, NaiveDate};

use crate::config::DAYS_PER_PAGE;
use crate::store::TaskStore;
use crate::task::{DayKey, Priority, Task};

/// Completion statistics of a single day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayStats {
    pub total: usize,
    pub completed: usize,
    /// Rounded completion percentage. This is 0 for days without tasks.
    pub percentage: u8,
}

impl DayStats {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed()).count();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self { total, completed, percentage }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}



/// Which tasks should be displayed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilter {
    /// Only show tasks of this priority. `None` shows every priority
    pub priority: Option<Priority>,
    /// Only show tasks whose subject contains this text (case-insensitive). An empty text shows every task
    pub search: String,
}

impl TaskFilter {
    pub fn new(priority: Option<Priority>, search: &str) -> Self {
        Self { priority, search: search.to_string() }
    }

    pub fn matches(&self, task: &Task) -> bool {
        let priority_ok = match self.priority {
            None => true,
            Some(p) => task.priority() == p,
        };
        let search_ok = self.search.is_empty()
            || task.subject().to_lowercase().contains(&self.search.to_lowercase());
        priority_ok && search_ok
    }
}


/// A task as displayed in a (filtered) day
#[derive(Clone, Copy, Debug)]
pub struct DayEntry<'a> {
    /// The position of the task in its bucket, regardless of filtering.
    /// This is the index that must be used in a [`DragGesture`](crate::planner::drag::DragGesture)
    pub bucket_index: usize,
    pub task: &'a Task,
}

/// The tasks of a day, as they should be displayed
#[derive(Clone, Debug)]
pub struct DayView<'a> {
    pub date: DayKey,
    pub stats: DayStats,
    pub entries: Vec<DayEntry<'a>>,
}

impl<'a> DayView<'a> {
    /// Build the view of a day. Statistics always account for every task of the day, filtered-out ones included.
    pub fn new(store: &'a TaskStore, date: DayKey, filter: &TaskFilter) -> Self {
        let tasks = store.get_day(&date);
        let entries = tasks.iter()
            .enumerate()
            .filter(|(_, task)| filter.matches(task))
            .map(|(bucket_index, task)| DayEntry{ bucket_index, task })
            .collect();
        Self { date, stats: DayStats::of(tasks), entries }
    }

    /// Translate a position in this (filtered) view into a position in the bucket.
    ///
    /// A position just after the last visible entry maps to the end of the bucket
    pub fn bucket_index(&self, view_index: usize) -> usize {
        match self.entries.get(view_index) {
            Some(entry) => entry.bucket_index,
            None => self.entries.last().map(|e| e.bucket_index + 1).unwrap_or(self.stats.total),
        }
    }
}



/// Every day of the month `date` belongs to
pub fn month_days(date: NaiveDate) -> Vec<DayKey> {
    let mut days = Vec::new();
    let mut current = date.with_day(1).unwrap_or(date);
    while current.month() == date.month() {
        days.push(DayKey::from(current));
        current = current + Duration::days(1);
    }
    days
}


/// Splits an ordered list of days into pages
#[derive(Clone, Debug)]
pub struct Pagination {
    days: Vec<DayKey>,
    per_page: usize,
}

impl Pagination {
    /// A page size of 0 is bumped to 1
    pub fn new(days: Vec<DayKey>, per_page: usize) -> Self {
        Self { days, per_page: per_page.max(1) }
    }

    /// Pages over the month of `date`, with the default page size
    pub fn month_of(date: NaiveDate) -> Self {
        Self::new(month_days(date), DAYS_PER_PAGE)
    }

    pub fn total_pages(&self) -> usize {
        (self.days.len() + self.per_page - 1) / self.per_page
    }

    /// Clamp a page index into `[0, total_pages - 1]`
    pub fn clamp(&self, page: usize) -> usize {
        page.min(self.total_pages().saturating_sub(1))
    }

    /// The days of a page. Out of range pages are clamped
    pub fn page(&self, page: usize) -> &[DayKey] {
        let start = self.clamp(page) * self.per_page;
        let end = (start + self.per_page).min(self.days.len());
        &self.days[start.min(end)..end]
    }

    pub fn days(&self) -> &[DayKey] {
        &self.days
    }
}



/// One row of the planner dashboard: task counts of a day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardRow {
    pub date: DayKey,
    pub completed: usize,
    pub pending: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// One row per day of the store, in chronological order
pub fn dashboard(store: &TaskStore) -> Vec<DashboardRow> {
    store.days()
        .map(|(date, tasks)| DashboardRow {
            date: *date,
            completed: count(tasks, |t| t.completed()),
            pending: count(tasks, |t| t.completed() == false),
            high: count(tasks, |t| t.priority() == Priority::High),
            medium: count(tasks, |t| t.priority() == Priority::Medium),
            low: count(tasks, |t| t.priority() == Priority::Low),
        })
        .collect()
}

fn count<F: Fn(&Task) -> bool>(tasks: &[Task], predicate: F) -> usize {
    tasks.iter().filter(|t| predicate(t)).count()
}
