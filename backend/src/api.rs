//! Public API surface for the schedule synchronization engine.
//!
//! This file consolidates the wire DTOs exchanged with the remote schedule
//! service and re-exports the domain types a rendering layer needs.
//! All wire types derive Serialize/Deserialize and use camelCase field names.

pub use crate::models::{
    Course, CourseId, CourseWithEnrollment, CorrelationId, DropZone, Enrollment, EnrollmentId,
    EnrollmentStatus, MoveOperation, Period, RemoveOperation, RemovedCourse, ReviewStats,
    ScheduleGrid, Term, UserId,
};
pub use crate::services::reducer::{Action, ScheduleState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One enrollment row as returned by `fetchSchedule`.
///
/// `semester` and `period` are raw numbers: rows outside the planning grid are
/// dropped while grouping, not rejected while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    pub id: EnrollmentId,
    pub semester: i64,
    #[serde(default)]
    pub period: Option<i64>,
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub grade: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchScheduleResponse {
    #[serde(default)]
    pub enrollments: Vec<EnrollmentRecord>,
}

/// Body of `updateCourseSchedule`. The server derives the full placement
/// from the catalog, so `period` is the course's first intrinsic period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseScheduleRequest {
    pub course_id: CourseId,
    pub semester: u8,
    pub period: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCourseResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_removed: Option<bool>,
}

impl RemoveCourseResponse {
    pub fn removed() -> Self {
        Self {
            success: true,
            already_removed: None,
        }
    }

    /// The shape a 404 on delete is normalized to.
    pub fn already_removed() -> Self {
        Self {
            success: true,
            already_removed: Some(true),
        }
    }

    pub fn was_already_removed(&self) -> bool {
        self.already_removed.unwrap_or(false)
    }
}
