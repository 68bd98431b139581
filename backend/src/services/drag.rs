//! Drag coordinator: turns gesture events into validated move requests.
//!
//! The gesture library is external; it reports a drag start on a course
//! card, the drop zone currently hovered, and the zone the card was
//! released over. Zones are identified as `term{N}-period{N}`.

use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use super::reducer::Action;
use super::store::ScheduleStore;
use super::validation::{check_placement, PlacementViolation};
use crate::models::{CorrelationId, CourseId, CourseWithEnrollment, DropZone, MoveOperation};

/// Advisory highlight for the hovered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropHint {
    Valid,
    Invalid,
    NoTarget,
}

/// What a release did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    NoActiveDrag,
    NoTarget,
    SameSlot,
    MalformedZone(String),
    Rejected(PlacementViolation),
    /// The grid refused the move after it passed the gate, usually because
    /// a refresh landed during the gesture.
    NotApplied,
    Dispatched(CorrelationId),
}

#[derive(Clone)]
pub struct DragCoordinator {
    store: ScheduleStore,
    active: Arc<Mutex<Option<CourseWithEnrollment>>>,
}

impl DragCoordinator {
    pub fn new(store: ScheduleStore) -> Self {
        Self {
            store,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// The course being dragged, resolved when the drag started.
    pub fn active_course(&self) -> Option<CourseWithEnrollment> {
        self.active.lock().clone()
    }

    /// Pick up a course. Unknown ids are ignored and return false.
    pub fn drag_started(&self, course_id: CourseId) -> bool {
        let Some(course) = self.store.snapshot().grid.find_course(course_id).cloned() else {
            debug!("drag started on unknown course {}", course_id);
            return false;
        };
        *self.active.lock() = Some(course.clone());
        self.store.dispatch(Action::SetDragState {
            is_dragging: true,
            dragged_course: Some(course),
        });
        true
    }

    pub fn drag_over(&self, zone: Option<&str>) -> DropHint {
        let Some(zone) = zone else {
            return DropHint::NoTarget;
        };
        let Some(course) = self.active_course() else {
            return DropHint::NoTarget;
        };
        match zone.parse::<DropZone>() {
            Ok(zone) if check_placement(&course, zone.term, zone.period).is_ok() => DropHint::Valid,
            Ok(_) => DropHint::Invalid,
            Err(_) => DropHint::NoTarget,
        }
    }

    /// Release the dragged course over `zone` (or over nothing).
    pub fn drag_ended(&self, zone: Option<&str>) -> DropOutcome {
        let active = self.active.lock().take();
        self.store.dispatch(Action::SetDragState {
            is_dragging: false,
            dragged_course: None,
        });

        let Some(course) = active else {
            return DropOutcome::NoActiveDrag;
        };
        let Some(zone) = zone else {
            return DropOutcome::NoTarget;
        };
        let zone = match zone.parse::<DropZone>() {
            Ok(zone) => zone,
            Err(e) => {
                warn!("ignoring drop on malformed zone: {}", e);
                return DropOutcome::MalformedZone(zone.to_string());
            }
        };

        if zone.term == course.term() && course.periods().contains(&zone.period) {
            return DropOutcome::SameSlot;
        }
        if let Err(violation) = check_placement(&course, zone.term, zone.period) {
            debug!("drop of {} on {} rejected: {}", course.course.code, zone, violation);
            return DropOutcome::Rejected(violation);
        }

        let to_periods = if course.is_multi_period() {
            course.course.periods.clone()
        } else {
            vec![zone.period]
        };
        let payload = MoveOperation {
            course_id: course.course_id(),
            from_term: course.term(),
            from_periods: course.periods().to_vec(),
            to_term: zone.term,
            to_periods,
        };
        let correlation_id = CorrelationId::generate();

        let state = self.store.dispatch(Action::MoveCourseOptimistic {
            correlation_id,
            payload: payload.clone(),
        });
        if !state.is_pending(correlation_id) {
            return DropOutcome::NotApplied;
        }
        self.store.dispatch(Action::MoveCourse {
            correlation_id,
            payload,
        });
        DropOutcome::Dispatched(correlation_id)
    }
}
