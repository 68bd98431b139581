//! Catalog courses, enrollments, and their join.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slot::{Period, Term};

crate::define_id_type!(i64, CourseId);
crate::define_id_type!(i64, EnrollmentId);
crate::define_id_type!(i64, UserId);

/// A catalog course as offered, independent of any student's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub credits: f64,
    /// Terms the course is offered in.
    #[serde(default)]
    pub terms: Vec<Term>,
    /// Periods the course runs in within an offered term.
    pub periods: Vec<Period>,
    #[serde(default)]
    pub advanced: bool,
    #[serde(default)]
    pub main_fields: Vec<String>,
    /// Codes of courses that cannot be combined with this one.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl Course {
    /// True when the course must be mirrored into more than one period.
    pub fn is_multi_period(&self) -> bool {
        self.periods.len() > 1
    }

    pub fn runs_in(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }

    pub fn first_period(&self) -> Option<Period> {
        self.periods.iter().min().copied()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    Planned,
    Enrolled,
    Completed,
    Dropped,
}

/// Join record binding a user, a course, and its placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub term: Term,
    pub periods: Vec<Period>,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub grade: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

/// Aggregate rating data shown next to a course card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub course_id: CourseId,
    pub average_rating: f64,
    pub review_count: u32,
}

/// A catalog course joined with the enrollment that places it on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithEnrollment {
    pub course: Course,
    pub enrollment: Enrollment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<ReviewStats>,
}

impl CourseWithEnrollment {
    pub fn new(course: Course, enrollment: Enrollment) -> Self {
        Self {
            course,
            enrollment,
            reviews: None,
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course.id
    }

    pub fn enrollment_id(&self) -> EnrollmentId {
        self.enrollment.id
    }

    pub fn term(&self) -> Term {
        self.enrollment.term
    }

    pub fn periods(&self) -> &[Period] {
        &self.enrollment.periods
    }

    pub fn is_multi_period(&self) -> bool {
        self.course.is_multi_period()
    }

    /// Copy of this entry re-stamped with a new placement.
    pub fn placed_at(&self, term: Term, periods: &[Period]) -> Self {
        let mut placed = self.clone();
        placed.enrollment.term = term;
        placed.enrollment.periods = periods.to_vec();
        placed
    }
}
