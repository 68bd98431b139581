//! Schedule service trait: the contract of the remote enrollment API.

use async_trait::async_trait;

use super::error::ServiceResult;
use crate::api::{
    CourseId, CourseWithEnrollment, EnrollmentId, FetchScheduleResponse, RemoveCourseResponse,
    ReviewStats, UpdateCourseScheduleRequest, UserId,
};

/// Remote operations the synchronization controller depends on.
///
/// Request timeouts are the implementation's concern; the engine never
/// cancels a call in flight.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ScheduleService: Send + Sync {
    /// Fetch every enrollment of a user.
    async fn fetch_schedule(&self, user_id: UserId) -> ServiceResult<FetchScheduleResponse>;

    /// Move a course to another term. Returns the server's canonical entry.
    async fn update_course_schedule(
        &self,
        request: &UpdateCourseScheduleRequest,
    ) -> ServiceResult<CourseWithEnrollment>;

    /// Delete an enrollment.
    ///
    /// A 404 is reported as `Ok` with `already_removed = Some(true)`.
    async fn remove_course_from_schedule(
        &self,
        enrollment_id: EnrollmentId,
    ) -> ServiceResult<RemoveCourseResponse>;

    /// Aggregate ratings for the given courses. Unknown ids are omitted.
    async fn fetch_review_stats(&self, course_ids: &[CourseId]) -> ServiceResult<Vec<ReviewStats>>;

    /// Check that the service is reachable.
    async fn health_check(&self) -> ServiceResult<bool>;
}
