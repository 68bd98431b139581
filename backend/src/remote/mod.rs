//! Remote schedule service seam.
//!
//! The engine talks to the enrollment backend only through the
//! [`ScheduleService`] trait, so the backend can be swapped:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Synchronization controller (services::sync)  │
//! └───────────────────┬──────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────┐
//! │  ScheduleService trait                        │
//! └───────────────────┬──────────────────────────┘
//!           ┌─────────┴──────────┐
//!   LocalScheduleService   HttpScheduleService
//!      (in-memory)        (reqwest, http-client)
//! ```

#[cfg(not(any(feature = "local-service", feature = "http-client")))]
compile_error!("Enable at least one schedule service backend feature.");

pub mod error;
pub mod factory;
#[cfg(feature = "http-client")]
pub mod http;
#[cfg(feature = "local-service")]
pub mod local;
pub mod service;

pub use error::{ErrorContext, ServiceError, ServiceResult};
pub use factory::{ServiceFactory, ServiceType};
#[cfg(feature = "http-client")]
pub use http::HttpScheduleService;
#[cfg(feature = "local-service")]
pub use local::{CallCounts, LocalScheduleService, LocalSeed, SeedEnrollment};
pub use service::ScheduleService;
