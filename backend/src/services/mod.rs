//! Schedule synchronization engine.
//!
//! - [`validation`]: placement rules
//! - [`reducer`]: pure state machine over the grid
//! - [`grouping`]: fetched rows → grid
//! - [`store`]: dispatch, snapshots and the effect queue
//! - [`sync`]: remote calls, reconciliation and the staleness watchdog
//! - [`drag`]: gesture events → validated moves
//! - [`notifications`]: transient user-facing messages
//! - [`engine`]: wires everything together

pub mod drag;
pub mod engine;
pub mod grouping;
pub mod notifications;
pub mod reducer;
pub mod store;
pub mod sync;
pub mod validation;

pub use drag::{DragCoordinator, DropHint, DropOutcome};
pub use engine::ScheduleEngine;
pub use grouping::build_grid;
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
pub use reducer::{apply_move, reduce, Action, MoveRejection, ScheduleState};
pub use store::{Clock, EffectQueue, ManualClock, ScheduleStore, SystemClock};
pub use sync::{is_stale, SyncController, SyncHandle};
pub use validation::{can_place, check_placement, check_transition, PlacementViolation};
