//! In-memory schedule service.
//!
//! This module provides a local implementation of [`ScheduleService`] suitable
//! for unit tests, demos, and offline development. Catalog and enrollments live
//! in memory; failures, latency, and lost responses can be scripted per call
//! so the synchronization paths can be exercised deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ErrorContext, ServiceError, ServiceResult};
use super::service::ScheduleService;
use crate::api::{
    Course, CourseId, CourseWithEnrollment, Enrollment, EnrollmentId, EnrollmentRecord,
    EnrollmentStatus, FetchScheduleResponse, Period, RemoveCourseResponse, ReviewStats, Term,
    UpdateCourseScheduleRequest, UserId,
};

/// Seed data for a local service, usually loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSeed {
    pub user_id: UserId,
    #[serde(default)]
    pub catalog: Vec<Course>,
    #[serde(default)]
    pub enrollments: Vec<SeedEnrollment>,
    #[serde(default)]
    pub reviews: Vec<ReviewStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEnrollment {
    pub course_id: CourseId,
    pub semester: i64,
    #[serde(default)]
    pub period: Option<i64>,
    #[serde(default)]
    pub status: EnrollmentStatus,
}

/// How often each remote operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch: usize,
    pub update: usize,
    pub remove: usize,
    pub reviews: usize,
}

#[derive(Debug, Clone)]
struct StoredEnrollment {
    id: EnrollmentId,
    user_id: UserId,
    course_id: CourseId,
    semester: i64,
    period: Option<i64>,
    status: EnrollmentStatus,
    grade: Option<String>,
    enrolled_at: DateTime<Utc>,
}

#[derive(Default)]
struct Scripted {
    fetch: VecDeque<ServiceError>,
    update: VecDeque<ServiceError>,
    remove: VecDeque<ServiceError>,
    stalled_updates: usize,
}

struct LocalData {
    catalog: HashMap<CourseId, Course>,
    enrollments: BTreeMap<EnrollmentId, StoredEnrollment>,
    reviews: HashMap<CourseId, ReviewStats>,
    next_enrollment_id: i64,
    latency: Option<Duration>,
    scripted: Scripted,
    calls: CallCounts,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            catalog: HashMap::new(),
            enrollments: BTreeMap::new(),
            reviews: HashMap::new(),
            next_enrollment_id: 1,
            latency: None,
            scripted: Scripted::default(),
            calls: CallCounts::default(),
            is_healthy: true,
        }
    }
}

/// In-memory schedule service.
#[derive(Clone, Default)]
pub struct LocalScheduleService {
    data: Arc<RwLock<LocalData>>,
}

impl LocalScheduleService {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a service from seed data. Seed enrollments referencing unknown
    /// courses are kept so a fetch reports them without a course payload.
    pub fn from_seed(seed: LocalSeed) -> Self {
        let service = Self::new();
        for course in seed.catalog {
            service.add_course(course);
        }
        for enrollment in seed.enrollments {
            let id = service.insert_enrollment_unchecked(
                seed.user_id,
                enrollment.course_id,
                enrollment.semester,
                enrollment.period,
            );
            if let Some(stored) = service.data.write().enrollments.get_mut(&id) {
                stored.status = enrollment.status;
            }
        }
        service.set_review_stats(seed.reviews);
        service
    }

    pub fn from_json_str(json: &str) -> ServiceResult<Self> {
        let seed: LocalSeed = serde_json::from_str(json).map_err(|e| {
            ServiceError::configuration(format!("Failed to parse seed data: {}", e))
        })?;
        Ok(Self::from_seed(seed))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ServiceError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn add_course(&self, course: Course) {
        self.data.write().catalog.insert(course.id, course);
    }

    /// Enroll a user in a catalog course at a grid position.
    pub fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
        term: Term,
        period: Period,
    ) -> ServiceResult<EnrollmentId> {
        if !self.data.read().catalog.contains_key(&course_id) {
            return Err(ServiceError::not_found_with_context(
                "Course not in catalog",
                ErrorContext::new("enroll")
                    .with_entity("course")
                    .with_entity_id(course_id),
            ));
        }
        Ok(self.insert_enrollment_unchecked(
            user_id,
            course_id,
            term.number() as i64,
            Some(period.number() as i64),
        ))
    }

    /// Insert an enrollment row verbatim, without catalog or range checks.
    pub fn insert_enrollment_unchecked(
        &self,
        user_id: UserId,
        course_id: CourseId,
        semester: i64,
        period: Option<i64>,
    ) -> EnrollmentId {
        let mut data = self.data.write();
        let id = EnrollmentId::new(data.next_enrollment_id);
        data.next_enrollment_id += 1;
        data.enrollments.insert(
            id,
            StoredEnrollment {
                id,
                user_id,
                course_id,
                semester,
                period,
                status: EnrollmentStatus::Planned,
                grade: None,
                enrolled_at: Utc::now(),
            },
        );
        id
    }

    pub fn set_review_stats(&self, stats: Vec<ReviewStats>) {
        let mut data = self.data.write();
        for stat in stats {
            data.reviews.insert(stat.course_id, stat);
        }
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.data.write().latency = latency;
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    pub fn fail_next_fetch(&self, error: ServiceError) {
        self.data.write().scripted.fetch.push_back(error);
    }

    pub fn fail_next_update(&self, error: ServiceError) {
        self.data.write().scripted.update.push_back(error);
    }

    pub fn fail_next_remove(&self, error: ServiceError) {
        self.data.write().scripted.remove.push_back(error);
    }

    /// The next update call never returns, as if its response were lost.
    pub fn stall_next_update(&self) {
        self.data.write().scripted.stalled_updates += 1;
    }

    pub fn call_counts(&self) -> CallCounts {
        self.data.read().calls
    }

    /// Stored (semester, period) of an enrollment, if it still exists.
    pub fn placement_of(&self, enrollment_id: EnrollmentId) -> Option<(i64, Option<i64>)> {
        self.data
            .read()
            .enrollments
            .get(&enrollment_id)
            .map(|e| (e.semester, e.period))
    }

    async fn simulate_latency(&self) {
        let latency = self.data.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn join(data: &LocalData, stored: &StoredEnrollment) -> ServiceResult<CourseWithEnrollment> {
        let course = data.catalog.get(&stored.course_id).cloned().ok_or_else(|| {
            ServiceError::not_found_with_context(
                "Course not in catalog",
                ErrorContext::new("join")
                    .with_entity("course")
                    .with_entity_id(stored.course_id),
            )
        })?;
        let term = Term::from_number(stored.semester).ok_or_else(|| {
            ServiceError::internal(format!(
                "Enrollment {} has semester {} outside the planning grid",
                stored.id, stored.semester
            ))
        })?;
        let periods = if course.is_multi_period() {
            course.periods.clone()
        } else {
            stored
                .period
                .and_then(Period::from_number)
                .or_else(|| course.first_period())
                .into_iter()
                .collect()
        };
        let enrollment = Enrollment {
            id: stored.id,
            user_id: stored.user_id,
            course_id: stored.course_id,
            term,
            periods,
            status: stored.status,
            grade: stored.grade.clone(),
            enrolled_at: stored.enrolled_at,
        };
        let mut joined = CourseWithEnrollment::new(course, enrollment);
        joined.reviews = data.reviews.get(&stored.course_id).cloned();
        Ok(joined)
    }
}

#[async_trait]
impl ScheduleService for LocalScheduleService {
    async fn fetch_schedule(&self, user_id: UserId) -> ServiceResult<FetchScheduleResponse> {
        self.simulate_latency().await;

        let mut data = self.data.write();
        data.calls.fetch += 1;
        if let Some(err) = data.scripted.fetch.pop_front() {
            return Err(err.with_operation("fetch_schedule"));
        }

        let enrollments = data
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| EnrollmentRecord {
                id: e.id,
                semester: e.semester,
                period: e.period,
                course: data.catalog.get(&e.course_id).cloned(),
                status: e.status,
                grade: e.grade.clone(),
                enrolled_at: e.enrolled_at,
            })
            .collect();

        Ok(FetchScheduleResponse { enrollments })
    }

    async fn update_course_schedule(
        &self,
        request: &UpdateCourseScheduleRequest,
    ) -> ServiceResult<CourseWithEnrollment> {
        self.simulate_latency().await;

        let stalled = {
            let mut data = self.data.write();
            data.calls.update += 1;
            if let Some(err) = data.scripted.update.pop_front() {
                return Err(err
                    .with_operation("update_course_schedule")
                    .with_entity("course", request.course_id));
            }
            if data.scripted.stalled_updates > 0 {
                data.scripted.stalled_updates -= 1;
                true
            } else {
                false
            }
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut data = self.data.write();
        let context = || {
            ErrorContext::new("update_course_schedule")
                .with_entity("course")
                .with_entity_id(request.course_id)
        };

        let course = data
            .catalog
            .get(&request.course_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found_with_context("Course not in catalog", context()))?;
        let term = Term::from_number(request.semester as i64).ok_or_else(|| {
            ServiceError::rejected_with_context(
                format!("Semester {} is not plannable", request.semester),
                context(),
            )
        })?;
        let period = Period::from_number(request.period as i64)
            .filter(|p| course.runs_in(*p))
            .ok_or_else(|| {
                ServiceError::rejected_with_context(
                    format!("{} does not run in period {}", course.code, request.period),
                    context(),
                )
            })?;

        let stored = data
            .enrollments
            .values_mut()
            .find(|e| e.course_id == request.course_id)
            .ok_or_else(|| ServiceError::not_found_with_context("Course is not enrolled", context()))?;
        stored.semester = term.number() as i64;
        stored.period = Some(period.number() as i64);
        let stored = stored.clone();

        Self::join(&data, &stored)
    }

    async fn remove_course_from_schedule(
        &self,
        enrollment_id: EnrollmentId,
    ) -> ServiceResult<RemoveCourseResponse> {
        self.simulate_latency().await;

        let mut data = self.data.write();
        data.calls.remove += 1;
        if let Some(err) = data.scripted.remove.pop_front() {
            return Err(err
                .with_operation("remove_course_from_schedule")
                .with_entity("enrollment", enrollment_id));
        }

        Ok(match data.enrollments.remove(&enrollment_id) {
            Some(_) => RemoveCourseResponse::removed(),
            None => RemoveCourseResponse::already_removed(),
        })
    }

    async fn fetch_review_stats(&self, course_ids: &[CourseId]) -> ServiceResult<Vec<ReviewStats>> {
        let mut data = self.data.write();
        data.calls.reviews += 1;
        Ok(course_ids
            .iter()
            .filter_map(|id| data.reviews.get(id).cloned())
            .collect())
    }

    async fn health_check(&self) -> ServiceResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod local_tests;
