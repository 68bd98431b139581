//! Engine container.
//!
//! Wires the store, synchronization controller, drag coordinator and
//! notification center together and runs the controller loop. This is the
//! surface a rendering layer talks to.

use log::debug;
use std::sync::Arc;

use super::drag::DragCoordinator;
use super::notifications::NotificationCenter;
use super::reducer::{Action, ScheduleState};
use super::store::{Clock, ScheduleStore, SystemClock};
use super::sync::{SyncController, SyncHandle};
use crate::config::EngineConfig;
use crate::models::{CorrelationId, EnrollmentId, RemoveOperation, RemovedCourse, ScheduleGrid};
use crate::remote::{ScheduleService, ServiceResult};

pub struct ScheduleEngine {
    store: ScheduleStore,
    controller: SyncController,
    drag: DragCoordinator,
    notifications: NotificationCenter,
    handle: SyncHandle,
}

impl ScheduleEngine {
    /// Start an engine on the current tokio runtime.
    pub fn start(service: Arc<dyn ScheduleService>, config: &EngineConfig) -> Self {
        Self::with_clock(service, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        service: Arc<dyn ScheduleService>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (store, effects) = ScheduleStore::new(clock);
        let notifications = NotificationCenter::new(config.notifications.capacity);
        let controller = SyncController::new(
            store.clone(),
            service,
            notifications.clone(),
            config.user_id,
            config.sync.clone(),
        );
        let handle = controller.spawn(effects);
        debug!("schedule engine started for user {}", config.user_id);

        Self {
            drag: DragCoordinator::new(store.clone()),
            store,
            controller,
            notifications,
            handle,
        }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn drag(&self) -> &DragCoordinator {
        &self.drag
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub fn dispatch(&self, action: Action) -> Arc<ScheduleState> {
        self.store.dispatch(action)
    }

    pub fn state(&self) -> Arc<ScheduleState> {
        self.store.snapshot()
    }

    /// Read-only copy of the current grid.
    pub fn grid(&self) -> ScheduleGrid {
        self.store.grid()
    }

    pub async fn load_schedule(&self) -> ServiceResult<()> {
        self.controller.load_schedule().await
    }

    pub async fn refresh_schedule(&self) -> ServiceResult<()> {
        self.controller.refresh_schedule().await
    }

    /// Remove an enrollment optimistically. The undo snapshot is captured
    /// from the grid before the removal; `None` when the enrollment is not
    /// on the grid.
    pub fn remove_course(&self, enrollment_id: EnrollmentId) -> Option<CorrelationId> {
        let snapshot = {
            let state = self.store.snapshot();
            let entry = state.grid.find_enrollment(enrollment_id)?;
            RemovedCourse {
                course: entry.clone(),
                term: entry.term(),
                periods: entry.periods().to_vec(),
            }
        };
        let correlation_id = CorrelationId::generate();
        self.store.dispatch(Action::RemoveCourseOptimistic {
            correlation_id,
            payload: RemoveOperation { enrollment_id },
        });
        self.store.dispatch(Action::RemoveCourse {
            correlation_id,
            snapshot,
        });
        Some(correlation_id)
    }

    /// Stop the controller loop. Remote calls already running finish on
    /// their own tasks.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}
