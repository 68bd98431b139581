//! # Schedule Sync
//!
//! Client-side synchronization engine for a course planning grid.
//!
//! Students place courses into a fixed grid of terms (7, 8, 9) and periods
//! (1, 2), drag them between cells and remove them. Every change is applied
//! to the local grid immediately, confirmed against the remote schedule
//! service asynchronously, and rolled back with an authoritative refetch when
//! the remote call fails or never answers.
//!
//! ## Features
//!
//! - **Validation**: placement rules for term transitions and intrinsic periods
//! - **State machine**: a pure reducer with optimistic, trigger, success and revert actions
//! - **Synchronization**: remote calls, rollback, refetch and a staleness watchdog
//! - **Drag coordination**: gesture events turned into validated moves
//!
//! ## Architecture
//!
//! - [`api`]: wire DTOs exchanged with the schedule service
//! - [`models`]: grid, courses, enrollments and operation types
//! - [`remote`]: the schedule service trait and its implementations
//! - [`services`]: the engine itself
//! - [`config`]: TOML and environment configuration
//!
//! ## Cargo features
//!
//! - `local-service` (default): in-memory [`remote::LocalScheduleService`]
//! - `http-client`: REST client backed by `reqwest`
//! - `cli` (default): the `schedule-planner` demo binary

// ServiceError carries a full ErrorContext for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod models;
pub mod remote;
pub mod services;

pub use config::EngineConfig;
pub use services::ScheduleEngine;
