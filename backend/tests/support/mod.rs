#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use schedule_sync::api::{
    Course, CourseId, CourseWithEnrollment, Enrollment, EnrollmentId, EnrollmentStatus, Period,
    ScheduleGrid, Term, UserId,
};
use schedule_sync::remote::LocalScheduleService;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub const STUDENT: UserId = UserId(1);

pub fn catalog_course(id: i64, code: &str, periods: &[Period]) -> Course {
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

/// A grid entry for `course` at `term`, in every intrinsic period for
/// multi-period courses and in the first one otherwise.
pub fn entry(course: Course, enrollment_id: i64, term: Term) -> CourseWithEnrollment {
    let periods = if course.is_multi_period() {
        course.periods.clone()
    } else {
        course.periods.iter().take(1).copied().collect()
    };
    let enrollment = Enrollment {
        id: EnrollmentId::new(enrollment_id),
        user_id: STUDENT,
        course_id: course.id,
        term,
        periods,
        status: EnrollmentStatus::Planned,
        grade: None,
        enrolled_at: Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(),
    };
    CourseWithEnrollment::new(course, enrollment)
}

pub fn grid_of(entries: &[CourseWithEnrollment]) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new();
    for e in entries {
        for period in e.periods() {
            grid.insert(e.term(), *period, e.clone());
        }
    }
    grid
}

/// Ids of the courses enrolled by [`seeded_service`].
pub struct Seeded {
    /// Single-period (period 1), term 7.
    pub x: EnrollmentId,
    /// Runs in both periods, term 9.
    pub both: EnrollmentId,
    /// Single-period (period 2), term 8.
    pub locked: EnrollmentId,
}

pub fn seeded_service() -> (LocalScheduleService, Seeded) {
    let service = LocalScheduleService::new();
    service.add_course(catalog_course(1, "DD1351", &[Period::First]));
    service.add_course(catalog_course(2, "DD2380", &[Period::First, Period::Second]));
    service.add_course(catalog_course(3, "SF1624", &[Period::Second]));
    service.add_course(catalog_course(4, "EP1200", &[Period::First]));

    let x = service
        .enroll(STUDENT, CourseId::new(1), Term::Seventh, Period::First)
        .unwrap();
    let both = service
        .enroll(STUDENT, CourseId::new(2), Term::Ninth, Period::First)
        .unwrap();
    let locked = service
        .enroll(STUDENT, CourseId::new(3), Term::Eighth, Period::Second)
        .unwrap();
    // Another student's plan must never leak into ours.
    service
        .enroll(UserId::new(2), CourseId::new(4), Term::Seventh, Period::First)
        .unwrap();

    (service, Seeded { x, both, locked })
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .unwrap()
}
