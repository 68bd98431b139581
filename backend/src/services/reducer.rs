//! Schedule state machine.
//!
//! [`reduce`] maps `(state, action, now)` to a new state. It is synchronous and
//! free of side effects: network calls live in [`crate::services::sync`], which
//! observes the dispatched actions and feeds confirmations or reverts back in.
//!
//! Observable phases: uninitialized (empty grid, not loading) → loading →
//! ready → ready-with-error (grid unchanged) → loading again on refresh.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::BTreeMap;

use super::validation::{check_transition, PlacementViolation};
use crate::models::{
    CorrelationId, CourseId, CourseWithEnrollment, EnrollmentId, MoveOperation, OperationPayload,
    PendingOperation, RemoveOperation, RemovedCourse, ReviewStats, ScheduleGrid, Term,
};

/// The action catalog.
///
/// Optimistic changes come in four parts sharing one correlation id: the
/// optimistic mutation, the trigger the controller reacts to, and either a
/// success or a revert once the remote call settles.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchStart,
    FetchSuccess {
        grid: ScheduleGrid,
    },
    FetchError {
        message: String,
    },
    SetDragState {
        is_dragging: bool,
        dragged_course: Option<CourseWithEnrollment>,
    },
    /// Trigger only; the grid already reflects the move.
    MoveCourse {
        correlation_id: CorrelationId,
        payload: MoveOperation,
    },
    MoveCourseOptimistic {
        correlation_id: CorrelationId,
        payload: MoveOperation,
    },
    MoveCourseSuccess {
        correlation_id: CorrelationId,
        course_id: CourseId,
        course: CourseWithEnrollment,
    },
    /// Undo of the carried move; the reducer applies its inverse.
    MoveCourseRevert {
        correlation_id: CorrelationId,
        payload: MoveOperation,
    },
    RemoveCourseOptimistic {
        correlation_id: CorrelationId,
        payload: RemoveOperation,
    },
    /// Trigger only; carries the undo snapshot for a possible revert.
    RemoveCourse {
        correlation_id: CorrelationId,
        snapshot: RemovedCourse,
    },
    RemoveCourseSuccess {
        correlation_id: CorrelationId,
        enrollment_id: EnrollmentId,
    },
    RemoveCourseRevert {
        correlation_id: CorrelationId,
        snapshot: RemovedCourse,
    },
    UpdateCourseReviews {
        stats: Vec<ReviewStats>,
    },
    ClearError,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::FetchStart => "fetch-start",
            Action::FetchSuccess { .. } => "fetch-success",
            Action::FetchError { .. } => "fetch-error",
            Action::SetDragState { .. } => "set-drag-state",
            Action::MoveCourse { .. } => "move-course",
            Action::MoveCourseOptimistic { .. } => "move-course-optimistic",
            Action::MoveCourseSuccess { .. } => "move-course-success",
            Action::MoveCourseRevert { .. } => "move-course-revert",
            Action::RemoveCourseOptimistic { .. } => "remove-course-optimistic",
            Action::RemoveCourse { .. } => "remove-course",
            Action::RemoveCourseSuccess { .. } => "remove-course-success",
            Action::RemoveCourseRevert { .. } => "remove-course-revert",
            Action::UpdateCourseReviews { .. } => "update-course-reviews",
            Action::ClearError => "clear-error",
        }
    }

    /// True for the trigger actions that need a network round trip.
    pub fn requires_sync(&self) -> bool {
        matches!(self, Action::MoveCourse { .. } | Action::RemoveCourse { .. })
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Action::MoveCourse { correlation_id, .. }
            | Action::MoveCourseOptimistic { correlation_id, .. }
            | Action::MoveCourseSuccess { correlation_id, .. }
            | Action::MoveCourseRevert { correlation_id, .. }
            | Action::RemoveCourseOptimistic { correlation_id, .. }
            | Action::RemoveCourse { correlation_id, .. }
            | Action::RemoveCourseSuccess { correlation_id, .. }
            | Action::RemoveCourseRevert { correlation_id, .. } => Some(*correlation_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleState {
    pub grid: ScheduleGrid,
    pub loading: bool,
    pub error: Option<String>,
    pub is_dragging: bool,
    pub dragged_course: Option<CourseWithEnrollment>,
    /// Last time the grid was confirmed by the service.
    pub last_updated: Option<DateTime<Utc>>,
    pub last_action: Option<Action>,
    pub pending_operations: BTreeMap<CorrelationId, PendingOperation>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_operations.is_empty()
    }

    pub fn is_pending(&self, correlation_id: CorrelationId) -> bool {
        self.pending_operations.contains_key(&correlation_id)
    }

    pub fn apply(&self, action: &Action, now: DateTime<Utc>) -> Self {
        reduce(self, action, now)
    }
}

/// Why the move algorithm left the grid untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("course {course_id} not found in term {term}")]
    CourseNotFound {
        course_id: CourseId,
        term: Term,
    },
    #[error("move of course {course_id} names no destination period")]
    NoDestination { course_id: CourseId },
    #[error(transparent)]
    Illegal(#[from] PlacementViolation),
}

/// Apply a move to a grid.
///
/// Multi-period courses leave every source-term period and land in every
/// destination-term period they run in. Single-period courses land in the
/// requested destination periods, which must all be intrinsic.
pub fn apply_move(grid: &ScheduleGrid, op: &MoveOperation) -> Result<ScheduleGrid, MoveRejection> {
    let found = grid
        .find_course_in_term(op.course_id, op.from_term)
        .cloned()
        .ok_or(MoveRejection::CourseNotFound {
            course_id: op.course_id,
            term: op.from_term,
        })?;

    check_transition(op.from_term, op.to_term)?;

    let destination = if found.is_multi_period() {
        found.course.periods.clone()
    } else {
        if op.to_periods.is_empty() {
            return Err(MoveRejection::NoDestination {
                course_id: op.course_id,
            });
        }
        if let Some(period) = op.to_periods.iter().find(|p| !found.course.runs_in(**p)) {
            return Err(PlacementViolation::PeriodNotOffered {
                course_code: found.course.code.clone(),
                period: *period,
            }
            .into());
        }
        op.to_periods.clone()
    };

    let mut next = grid.clone();
    next.remove_course_from_term(op.course_id, op.from_term);
    let moved = found.placed_at(op.to_term, &destination);
    for period in &destination {
        next.insert(op.to_term, *period, moved.clone());
    }
    Ok(next)
}

fn move_or_keep(grid: &ScheduleGrid, op: &MoveOperation, action: &Action) -> ScheduleGrid {
    match apply_move(grid, op) {
        Ok(next) => next,
        Err(rejection) => {
            warn!(
                "{} left the grid unchanged: {} (client may be out of sync)",
                action.name(),
                rejection
            );
            grid.clone()
        }
    }
}

fn restore_removed(grid: &mut ScheduleGrid, snapshot: &RemovedCourse) {
    let restored = snapshot.course.placed_at(snapshot.term, &snapshot.periods);
    for period in &snapshot.periods {
        grid.insert(snapshot.term, *period, restored.clone());
    }
}

/// Pure state transition.
pub fn reduce(state: &ScheduleState, action: &Action, now: DateTime<Utc>) -> ScheduleState {
    let mut next = state.clone();

    match action {
        Action::FetchStart => {
            next.loading = true;
            next.error = None;
        }
        Action::FetchSuccess { grid } => {
            next.grid = grid.clone();
            next.loading = false;
            next.error = None;
            next.last_updated = Some(now);
            next.last_action = None;
            if !next.pending_operations.is_empty() {
                debug!(
                    "fresh schedule supersedes {} pending operation(s)",
                    next.pending_operations.len()
                );
            }
            next.pending_operations.clear();
        }
        Action::FetchError { message } => {
            next.loading = false;
            next.error = Some(message.clone());
        }
        Action::SetDragState {
            is_dragging,
            dragged_course,
        } => {
            next.is_dragging = *is_dragging;
            next.dragged_course = dragged_course.clone();
        }
        Action::MoveCourse { .. } | Action::RemoveCourse { .. } => {
            next.last_action = Some(action.clone());
        }
        Action::MoveCourseOptimistic {
            correlation_id,
            payload,
        } => match apply_move(&state.grid, payload) {
            Ok(grid) => {
                next.grid = grid;
                next.pending_operations.insert(
                    *correlation_id,
                    PendingOperation {
                        correlation_id: *correlation_id,
                        payload: OperationPayload::Move(payload.clone()),
                        started_at: now,
                    },
                );
                next.last_action = Some(action.clone());
            }
            Err(rejection) => {
                // No pending entry; callers must not dispatch the matching trigger.
                warn!("optimistic move {} rejected: {}", correlation_id, rejection);
            }
        },
        Action::MoveCourseSuccess {
            correlation_id,
            course_id,
            course,
        } => {
            next.grid.for_each_entry_mut(|entry| {
                if entry.course_id() == *course_id {
                    let (term, periods) = (entry.term(), entry.periods().to_vec());
                    let mut confirmed = course.placed_at(term, &periods);
                    if confirmed.reviews.is_none() {
                        confirmed.reviews = entry.reviews.take();
                    }
                    *entry = confirmed;
                }
            });
            next.pending_operations.remove(correlation_id);
            next.last_action = None;
            next.last_updated = Some(now);
        }
        Action::MoveCourseRevert {
            correlation_id,
            payload,
        } => {
            next.grid = move_or_keep(&state.grid, &payload.inverse(), action);
            next.pending_operations.remove(correlation_id);
            next.last_action = None;
        }
        Action::RemoveCourseOptimistic {
            correlation_id,
            payload,
        } => {
            if !next.grid.remove_enrollment(payload.enrollment_id) {
                debug!("enrollment {} was not on the grid", payload.enrollment_id);
            }
            next.pending_operations.insert(
                *correlation_id,
                PendingOperation {
                    correlation_id: *correlation_id,
                    payload: OperationPayload::Remove(*payload),
                    started_at: now,
                },
            );
            next.last_action = Some(action.clone());
        }
        Action::RemoveCourseSuccess { correlation_id, .. } => {
            next.pending_operations.remove(correlation_id);
            next.last_action = None;
            next.last_updated = Some(now);
        }
        Action::RemoveCourseRevert {
            correlation_id,
            snapshot,
        } => {
            restore_removed(&mut next.grid, snapshot);
            next.pending_operations.remove(correlation_id);
            next.last_action = None;
        }
        Action::UpdateCourseReviews { stats } => {
            let by_course: BTreeMap<CourseId, &ReviewStats> =
                stats.iter().map(|s| (s.course_id, s)).collect();
            next.grid.for_each_entry_mut(|entry| {
                if let Some(stat) = by_course.get(&entry.course_id()) {
                    entry.reviews = Some((*stat).clone());
                }
            });
        }
        Action::ClearError => {
            next.error = None;
        }
    }

    next
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod reducer_tests;
