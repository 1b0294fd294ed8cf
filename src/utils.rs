//! Some utility functions

use crate::store::TaskStore;
use crate::task::Task;

/// A debug utility that pretty-prints a store
pub fn print_store(store: &TaskStore) {
    for (day, tasks) in store.days() {
        let stats = store.day_stats(day);
        println!("DAY {} ({}/{}, {}%)", day, stats.completed, stats.total, stats.percentage);
        for task in tasks {
            print_task(task);
        }
    }
}

pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let notified = if task.notified() { "@" } else { " " };
    println!("    {}{} [{}] {}\t{}", completion, notified, task.priority(), task.subject(), task.id());
}
