//! Placement operations and the bookkeeping that tracks them in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::{CourseId, CourseWithEnrollment, EnrollmentId};
use super::slot::{Period, Term};

crate::define_id_type!(uuid::Uuid, CorrelationId);

impl CorrelationId {
    pub fn generate() -> Self {
        CorrelationId(uuid::Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOperation {
    pub course_id: CourseId,
    pub from_term: Term,
    pub from_periods: Vec<Period>,
    pub to_term: Term,
    pub to_periods: Vec<Period>,
}

impl MoveOperation {
    /// The same move with source and destination swapped.
    pub fn inverse(&self) -> Self {
        Self {
            course_id: self.course_id,
            from_term: self.to_term,
            from_periods: self.to_periods.clone(),
            to_term: self.from_term,
            to_periods: self.from_periods.clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOperation {
    pub enrollment_id: EnrollmentId,
}

/// Undo data for a removal, captured from the grid before the entry is filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCourse {
    pub course: CourseWithEnrollment,
    pub term: Term,
    pub periods: Vec<Period>,
}

impl RemovedCourse {
    pub fn enrollment_id(&self) -> EnrollmentId {
        self.course.enrollment_id()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Move,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationPayload {
    Move(MoveOperation),
    Remove(RemoveOperation),
}

/// An optimistic change whose confirmation has not arrived yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub correlation_id: CorrelationId,
    pub payload: OperationPayload,
    pub started_at: DateTime<Utc>,
}

impl PendingOperation {
    pub fn kind(&self) -> PendingKind {
        match self.payload {
            OperationPayload::Move(_) => PendingKind::Move,
            OperationPayload::Remove(_) => PendingKind::Remove,
        }
    }
}
