//! This crate provides the task-management core of a monthly study planner.
//!
//! Tasks are stored in a local [`TaskStore`](store::TaskStore), that maps every day to its ordered list of tasks. \
//! The source of truth is a remote planner service, abstracted by the [`PlannerRemote`](traits::PlannerRemote) trait.
//! This crate provides a REST client for such services in the [`client`] module, and an in-memory mock in the [`mock`] module.
//!
//! These two are used together in a [`Planner`](planner::Planner). \
//! A `Planner` applies every change to the local store right away (so that it can be displayed immediately), then persists it to the remote service.
//! In case the remote refuses the change, the local store is rolled back.
//!
//! The [`view`] module provides what displays need: day statistics, filters, pagination and dashboards.

pub mod traits;

pub mod error;
pub use error::PlannerError;
pub mod task;
pub use task::{DayKey, Priority, Task, TaskDraft, TaskId, TaskPatch};
pub mod store;
pub use store::TaskStore;
pub mod planner;
pub use planner::Planner;
pub mod view;

pub mod client;
pub mod mock;

pub mod config;
pub mod utils;
