//! Grid fixtures shared by unit tests.

use chrono::{TimeZone, Utc};

use super::*;

pub fn course(id: i64, code: &str, periods: &[Period]) -> Course {
    Course {
        id: CourseId::new(id),
        code: code.to_string(),
        name: format!("{code} course"),
        credits: 7.5,
        terms: Term::ALL.to_vec(),
        periods: periods.to_vec(),
        advanced: false,
        main_fields: vec!["Computer Science".to_string()],
        exclusions: vec![],
    }
}

/// A course enrolled at `term`, placed in every intrinsic period for
/// multi-period courses and in `periods[0]` otherwise.
pub fn placed(id: i64, code: &str, periods: &[Period], term: Term) -> CourseWithEnrollment {
    let course = course(id, code, periods);
    let placement = if course.is_multi_period() {
        course.periods.clone()
    } else {
        vec![periods[0]]
    };
    let enrollment = Enrollment {
        id: EnrollmentId::new(id * 100),
        user_id: UserId::new(1),
        course_id: course.id,
        term,
        periods: placement,
        status: EnrollmentStatus::Planned,
        grade: None,
        enrolled_at: Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(),
    };
    CourseWithEnrollment::new(course, enrollment)
}

pub fn grid_with(entries: &[CourseWithEnrollment]) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new();
    for entry in entries {
        for period in entry.periods() {
            grid.insert(entry.term(), *period, entry.clone());
        }
    }
    grid
}
