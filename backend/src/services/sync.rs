//! Synchronization controller.
//!
//! Reacts to the trigger actions the store forwards, performs the matching
//! remote call and feeds the outcome back as a success or revert action.
//! A watchdog forces a full refresh when optimistic changes stay unconfirmed
//! past the idle threshold.
//!
//! ```text
//! drag/remove ──► store.dispatch(optimistic) ──► grid updated
//!            └──► store.dispatch(trigger) ──► EffectQueue ──► SyncController
//!                                                               │
//!                             success / revert + refresh ◄──────┘
//! ```

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::grouping::build_grid;
use super::notifications::NotificationCenter;
use super::reducer::{Action, ScheduleState};
use super::store::{EffectQueue, ScheduleStore};
use crate::api::UpdateCourseScheduleRequest;
use crate::config::SyncSettings;
use crate::models::{CorrelationId, CourseId, MoveOperation, RemovedCourse, ScheduleGrid, UserId};
use crate::remote::{ScheduleService, ServiceError, ServiceResult};

struct CachedFetch {
    grid: ScheduleGrid,
    fetched_at: DateTime<Utc>,
}

struct ControllerInner {
    store: ScheduleStore,
    service: Arc<dyn ScheduleService>,
    notifications: NotificationCenter,
    user_id: UserId,
    settings: SyncSettings,
    cache: Mutex<Option<CachedFetch>>,
    refreshing: AtomicBool,
}

#[derive(Clone)]
pub struct SyncController {
    inner: Arc<ControllerInner>,
}

/// Running controller loop. Dropping the handle leaves the loop running.
pub struct SyncHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the loop and wait for it. Calls already in flight keep running.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!("sync loop ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// True when optimistic changes have waited longer than `threshold`.
///
/// Age is measured from the later of the last confirmation and the oldest
/// pending operation, so a gesture made after a long idle stretch still gets
/// a full threshold to be confirmed.
pub fn is_stale(state: &ScheduleState, now: DateTime<Utc>, threshold: std::time::Duration) -> bool {
    let Some(oldest) = state.pending_operations.values().map(|p| p.started_at).min() else {
        return false;
    };
    let since = match state.last_updated {
        Some(updated) => updated.max(oldest),
        None => oldest,
    };
    now.signed_duration_since(since)
        .to_std()
        .map(|age| age > threshold)
        .unwrap_or(false)
}

fn distinct_course_ids(grid: &ScheduleGrid) -> Vec<CourseId> {
    let mut ids: Vec<CourseId> = grid
        .enrolled_courses()
        .iter()
        .map(|entry| entry.course_id())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

impl SyncController {
    pub fn new(
        store: ScheduleStore,
        service: Arc<dyn ScheduleService>,
        notifications: NotificationCenter,
        user_id: UserId,
        settings: SyncSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                store,
                service,
                notifications,
                user_id,
                settings,
                cache: Mutex::new(None),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.inner.store
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    /// Run the remote side of a trigger action. Other actions are ignored.
    pub async fn handle_action(&self, action: &Action) {
        match action {
            Action::MoveCourse {
                correlation_id,
                payload,
            } => self.sync_move(*correlation_id, payload).await,
            Action::RemoveCourse {
                correlation_id,
                snapshot,
            } => self.sync_remove(*correlation_id, snapshot).await,
            _ => {}
        }
    }

    /// Load the schedule, serving a cached grid while it is fresh and no
    /// optimistic change is waiting.
    pub async fn load_schedule(&self) -> ServiceResult<()> {
        let store = &self.inner.store;
        if !store.snapshot().has_pending() {
            if let Some(grid) = self.cached_grid() {
                debug!("serving schedule for user {} from cache", self.inner.user_id);
                let course_ids = distinct_course_ids(&grid);
                store.dispatch(Action::FetchSuccess { grid });
                self.load_reviews(&course_ids).await;
                return Ok(());
            }
        }
        self.fetch().await
    }

    /// Drop the cache and fetch the authoritative schedule.
    pub async fn refresh_schedule(&self) -> ServiceResult<()> {
        self.invalidate_cache();
        self.fetch().await
    }

    pub fn invalidate_cache(&self) {
        self.inner.cache.lock().take();
    }

    fn cached_grid(&self) -> Option<ScheduleGrid> {
        let ttl = self.inner.settings.cache_ttl()?;
        let ttl = chrono::Duration::from_std(ttl).ok()?;
        let now = self.inner.store.now();
        self.inner
            .cache
            .lock()
            .as_ref()
            .filter(|cached| now.signed_duration_since(cached.fetched_at) <= ttl)
            .map(|cached| cached.grid.clone())
    }

    async fn fetch(&self) -> ServiceResult<()> {
        let store = &self.inner.store;
        let user_id = self.inner.user_id;
        store.dispatch(Action::FetchStart);
        debug!("fetching schedule for user {}", user_id);

        let response = match self.inner.service.fetch_schedule(user_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!("schedule fetch failed: {}", e);
                self.inner
                    .notifications
                    .error(format!("Could not load your schedule: {}", e.summary()));
                store.dispatch(Action::FetchError {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let grid = build_grid(&response.enrollments, user_id);
        let course_ids = distinct_course_ids(&grid);

        if self.inner.settings.cache_ttl().is_some() {
            *self.inner.cache.lock() = Some(CachedFetch {
                grid: grid.clone(),
                fetched_at: store.now(),
            });
        }
        info!(
            "loaded {} course(s) for user {}",
            course_ids.len(),
            user_id
        );
        store.dispatch(Action::FetchSuccess { grid });

        self.load_reviews(&course_ids).await;
        Ok(())
    }

    async fn load_reviews(&self, course_ids: &[CourseId]) {
        if course_ids.is_empty() {
            return;
        }
        match self.inner.service.fetch_review_stats(course_ids).await {
            Ok(stats) if !stats.is_empty() => {
                self.inner
                    .store
                    .dispatch(Action::UpdateCourseReviews { stats });
            }
            Ok(_) => {}
            Err(e) => warn!("review stats unavailable: {}", e),
        }
    }

    async fn sync_move(&self, correlation_id: CorrelationId, payload: &MoveOperation) {
        let store = &self.inner.store;
        let state = store.snapshot();

        // The server derives the full placement from the catalog.
        let period = state
            .grid
            .find_course(payload.course_id)
            .and_then(|entry| entry.course.first_period())
            .or_else(|| payload.to_periods.iter().min().copied());
        let Some(period) = period else {
            self.fail_move(
                correlation_id,
                payload,
                ServiceError::internal(format!(
                    "No destination period for course {}",
                    payload.course_id
                )),
            )
            .await;
            return;
        };
        let request = UpdateCourseScheduleRequest {
            course_id: payload.course_id,
            semester: payload.to_term.number(),
            period: period.number(),
        };

        debug!(
            "moving course {} to term {} ({})",
            payload.course_id, payload.to_term, correlation_id
        );
        match self.inner.service.update_course_schedule(&request).await {
            Ok(course) => {
                self.invalidate_cache();
                let superseded = !store.snapshot().is_pending(correlation_id);
                store.dispatch(Action::MoveCourseSuccess {
                    correlation_id,
                    course_id: payload.course_id,
                    course,
                });
                if superseded {
                    self.catch_up(correlation_id).await;
                }
            }
            Err(e) => self.fail_move(correlation_id, payload, e).await,
        }
    }

    /// A refresh replaced the grid while `correlation_id` was in flight, so
    /// the confirmed change is not visible yet.
    async fn catch_up(&self, correlation_id: CorrelationId) {
        debug!("{} confirmed after a refresh, refetching", correlation_id);
        if let Err(e) = self.refresh_schedule().await {
            warn!("refresh after {} failed: {}", correlation_id, e);
        }
    }

    async fn fail_move(&self, correlation_id: CorrelationId, payload: &MoveOperation, error: ServiceError) {
        let store = &self.inner.store;
        warn!("move {} failed: {}", correlation_id, error);

        // A refresh that landed meanwhile already replaced the optimistic grid.
        if store.snapshot().is_pending(correlation_id) {
            store.dispatch(Action::MoveCourseRevert {
                correlation_id,
                payload: payload.clone(),
            });
        }
        self.inner
            .notifications
            .error(format!("Could not move the course: {}", error.summary()));
        store.dispatch(Action::ClearError);

        if let Err(e) = self.refresh_schedule().await {
            warn!("refresh after failed move {} also failed: {}", correlation_id, e);
        }
    }

    async fn sync_remove(&self, correlation_id: CorrelationId, snapshot: &RemovedCourse) {
        let store = &self.inner.store;
        let enrollment_id = snapshot.enrollment_id();

        debug!("removing enrollment {} ({})", enrollment_id, correlation_id);
        let outcome = match self
            .inner
            .service
            .remove_course_from_schedule(enrollment_id)
            .await
        {
            Ok(response) if response.success => {
                if response.was_already_removed() {
                    debug!("enrollment {} was already removed", enrollment_id);
                }
                Ok(())
            }
            Ok(_) => Err(ServiceError::rejected("The service declined the removal")
                .with_operation("remove_course_from_schedule")
                .with_entity("enrollment", enrollment_id)),
            Err(e) if e.is_not_found() => {
                debug!("enrollment {} not found remotely, treating as removed", enrollment_id);
                Ok(())
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                self.invalidate_cache();
                let superseded = !store.snapshot().is_pending(correlation_id);
                store.dispatch(Action::RemoveCourseSuccess {
                    correlation_id,
                    enrollment_id,
                });
                if superseded {
                    self.catch_up(correlation_id).await;
                }
            }
            Err(error) => {
                warn!("removal {} failed: {}", correlation_id, error);
                if store.snapshot().is_pending(correlation_id) {
                    store.dispatch(Action::RemoveCourseRevert {
                        correlation_id,
                        snapshot: snapshot.clone(),
                    });
                }
                self.inner.notifications.error(format!(
                    "Could not remove {}: {}",
                    snapshot.course.course.code,
                    error.summary()
                ));
                store.dispatch(Action::ClearError);

                if let Err(e) = self.refresh_schedule().await {
                    warn!("refresh after failed removal {} also failed: {}", correlation_id, e);
                }
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        is_stale(
            &self.inner.store.snapshot(),
            self.inner.store.now(),
            self.inner.settings.idle_threshold(),
        )
    }

    /// Force a refresh when pending changes went unconfirmed for too long.
    /// Returns true when a refresh ran.
    pub async fn check_staleness(&self) -> bool {
        if !self.is_stale() {
            return false;
        }
        if self
            .inner
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let pending = self.inner.store.snapshot().pending_operations.len();
        warn!(
            "{} operation(s) unconfirmed past {:?}, forcing refresh",
            pending,
            self.inner.settings.idle_threshold()
        );
        if let Err(e) = self.refresh_schedule().await {
            warn!("watchdog refresh failed: {}", e);
        }
        self.inner.refreshing.store(false, Ordering::Release);
        true
    }

    /// Drive the controller: every trigger from `effects` runs on its own
    /// task, and the watchdog ticks every `watchdog_interval`.
    pub fn spawn(&self, mut effects: EffectQueue) -> SyncHandle {
        let controller = self.clone();
        let (shutdown, mut stop) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut watchdog = tokio::time::interval(controller.inner.settings.watchdog_interval());
            watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    action = effects.next() => {
                        let Some(action) = action else { break };
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            controller.handle_action(&action).await;
                        });
                    }
                    _ = watchdog.tick() => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            controller.check_staleness().await;
                        });
                    }
                }
            }
            debug!("sync loop stopped");
        });

        SyncHandle {
            shutdown: Some(shutdown),
            task,
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
