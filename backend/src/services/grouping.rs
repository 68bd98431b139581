//! Grouping of fetched enrollment rows into the term/period grid.

use log::{debug, warn};

use crate::api::EnrollmentRecord;
use crate::models::{CourseWithEnrollment, Enrollment, Period, ScheduleGrid, Term, UserId};

/// Build a grid from the rows returned by `fetch_schedule`.
///
/// Rows outside terms 7–9 and rows without a course payload are skipped.
/// Multi-period courses are mirrored into every intrinsic period; a
/// single-period course keeps its recorded period when the course runs in
/// it and falls back to its first intrinsic period otherwise.
pub fn build_grid(records: &[EnrollmentRecord], user_id: UserId) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new();
    for record in records {
        if let Some(entry) = to_entry(record, user_id) {
            for period in entry.periods() {
                grid.insert(entry.term(), *period, entry.clone());
            }
        }
    }
    grid
}

fn to_entry(record: &EnrollmentRecord, user_id: UserId) -> Option<CourseWithEnrollment> {
    let Some(term) = Term::from_number(record.semester) else {
        debug!(
            "enrollment {} is in semester {}, outside the planning grid",
            record.id, record.semester
        );
        return None;
    };
    let Some(course) = record.course.clone() else {
        warn!("enrollment {} has no course payload, skipping", record.id);
        return None;
    };

    let periods: Vec<Period> = if course.is_multi_period() {
        course.periods.clone()
    } else {
        let recorded = record.period.and_then(Period::from_number);
        match recorded.filter(|p| course.runs_in(*p)) {
            Some(period) => vec![period],
            None => match course.first_period() {
                Some(fallback) => {
                    warn!(
                        "enrollment {} of {} recorded in period {:?}, placing in period {}",
                        record.id, course.code, record.period, fallback
                    );
                    vec![fallback]
                }
                None => {
                    warn!("course {} runs in no period, skipping", course.code);
                    return None;
                }
            },
        }
    };

    let enrollment = Enrollment {
        id: record.id,
        user_id,
        course_id: course.id,
        term,
        periods,
        status: record.status,
        grade: record.grade.clone(),
        enrolled_at: record.enrolled_at,
    };
    Some(CourseWithEnrollment::new(course, enrollment))
}
