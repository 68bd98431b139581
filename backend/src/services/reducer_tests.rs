use super::*;
use crate::models::fixtures::{grid_with, placed};
use crate::models::{Period, Term};
use chrono::{Duration, TimeZone};

const P1: Period = Period::First;
const P2: Period = Period::Second;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
}

fn ready_state(entries: &[CourseWithEnrollment]) -> ScheduleState {
    ScheduleState::new().apply(
        &Action::FetchSuccess {
            grid: grid_with(entries),
        },
        now(),
    )
}

fn move_op(course: &CourseWithEnrollment, to_term: Term, to_periods: &[Period]) -> MoveOperation {
    MoveOperation {
        course_id: course.course_id(),
        from_term: course.term(),
        from_periods: course.periods().to_vec(),
        to_term,
        to_periods: to_periods.to_vec(),
    }
}

#[test]
fn test_fetch_lifecycle() {
    let state = ScheduleState::new();
    assert!(!state.loading);
    assert!(state.grid.is_empty());

    let loading = state.apply(&Action::FetchStart, now());
    assert!(loading.loading);
    assert_eq!(loading.error, None);

    let failed = loading.apply(
        &Action::FetchError {
            message: "offline".to_string(),
        },
        now(),
    );
    assert!(!failed.loading);
    assert_eq!(failed.error.as_deref(), Some("offline"));
    assert_eq!(failed.grid, loading.grid);

    let reloading = failed.apply(&Action::FetchStart, now());
    assert!(reloading.loading);
    assert_eq!(reloading.error, None);

    let x = placed(1, "X", &[P1], Term::Seventh);
    let ready = reloading.apply(
        &Action::FetchSuccess {
            grid: grid_with(&[x]),
        },
        now(),
    );
    assert!(!ready.loading);
    assert_eq!(ready.last_updated, Some(now()));
    assert_eq!(ready.grid.len(), 1);
}

#[test]
fn test_fetch_success_clears_pending() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x.clone()]).apply(
        &Action::MoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: move_op(&x, Term::Ninth, &[P1]),
        },
        now(),
    );
    assert!(state.has_pending());

    let later = now() + Duration::seconds(30);
    let refreshed = state.apply(
        &Action::FetchSuccess {
            grid: grid_with(&[x]),
        },
        later,
    );
    assert!(!refreshed.has_pending());
    assert_eq!(refreshed.last_updated, Some(later));
    assert_eq!(refreshed.last_action, None);
}

#[test]
fn test_drag_state_does_not_touch_grid() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x.clone()]);
    let dragging = state.apply(
        &Action::SetDragState {
            is_dragging: true,
            dragged_course: Some(x.clone()),
        },
        now(),
    );
    assert!(dragging.is_dragging);
    assert_eq!(dragging.dragged_course, Some(x));
    assert_eq!(dragging.grid, state.grid);
}

#[test]
fn test_trigger_only_records_last_action() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x.clone()]);
    let trigger = Action::MoveCourse {
        correlation_id: CorrelationId::generate(),
        payload: move_op(&x, Term::Ninth, &[P1]),
    };
    let next = state.apply(&trigger, now());
    assert_eq!(next.grid, state.grid);
    assert_eq!(next.last_action, Some(trigger));
    assert!(!next.has_pending());
}

#[test]
fn test_optimistic_move_single_period() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let id = CorrelationId::generate();
    let next = ready_state(&[x.clone()]).apply(
        &Action::MoveCourseOptimistic {
            correlation_id: id,
            payload: move_op(&x, Term::Ninth, &[P1]),
        },
        now(),
    );

    assert!(next.grid.cell(Term::Seventh, P1).is_empty());
    let moved = &next.grid.cell(Term::Ninth, P1)[0];
    assert_eq!(moved.term(), Term::Ninth);
    assert_eq!(moved.periods(), &[P1]);
    assert!(next.is_pending(id));
    assert_eq!(next.pending_operations[&id].kind(), crate::models::PendingKind::Move);
    assert!(matches!(
        next.last_action,
        Some(Action::MoveCourseOptimistic { .. })
    ));
}

#[test]
fn test_multi_period_mirroring() {
    let multi = placed(1, "BOTH", &[P1, P2], Term::Seventh);
    let next = ready_state(&[multi.clone()]).apply(
        &Action::MoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: move_op(&multi, Term::Ninth, &[P1]),
        },
        now(),
    );

    assert!(next.grid.cell(Term::Seventh, P1).is_empty());
    assert!(next.grid.cell(Term::Seventh, P2).is_empty());
    assert_eq!(next.grid.cell(Term::Ninth, P1).len(), 1);
    assert_eq!(next.grid.cell(Term::Ninth, P2).len(), 1);
    assert!(next.grid.check_invariants().is_ok());
}

#[test]
fn test_move_round_trip() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let multi = placed(2, "BOTH", &[P1, P2], Term::Ninth);
    let other = placed(3, "Y", &[P1], Term::Ninth);
    let before = ready_state(&[x.clone(), multi.clone(), other]);

    for op in [
        move_op(&x, Term::Ninth, &[P1]),
        move_op(&multi, Term::Seventh, &[P2]),
    ] {
        let id = CorrelationId::generate();
        let moved = before.apply(
            &Action::MoveCourseOptimistic {
                correlation_id: id,
                payload: op.clone(),
            },
            now(),
        );
        assert_ne!(moved.grid, before.grid);

        let reverted = moved.apply(
            &Action::MoveCourseRevert {
                correlation_id: id,
                payload: op,
            },
            now(),
        );
        assert_eq!(reverted.grid, before.grid);
        assert!(!reverted.has_pending());
        assert_eq!(reverted.last_action, None);
    }
}

#[test]
fn test_term_eight_never_moves() {
    let y = placed(1, "Y", &[P1, P2], Term::Eighth);
    let state = ready_state(&[y.clone()]);

    for term in Term::ALL {
        let next = state.apply(
            &Action::MoveCourseOptimistic {
                correlation_id: CorrelationId::generate(),
                payload: move_op(&y, term, &[P1]),
            },
            now(),
        );
        assert_eq!(next.grid, state.grid);
        assert!(!next.has_pending());
    }
}

#[test]
fn test_reducer_rejects_foreign_period_and_closed_term() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x.clone()]);

    let to_period_two = state.apply(
        &Action::MoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: move_op(&x, Term::Ninth, &[P2]),
        },
        now(),
    );
    assert_eq!(to_period_two.grid, state.grid);

    let to_term_eight = state.apply(
        &Action::MoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: move_op(&x, Term::Eighth, &[P1]),
        },
        now(),
    );
    assert_eq!(to_term_eight.grid, state.grid);
}

#[test]
fn test_move_of_missing_course_is_noop() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x.clone()]);
    let mut op = move_op(&x, Term::Ninth, &[P1]);
    op.from_term = Term::Ninth;

    assert!(matches!(
        apply_move(&state.grid, &op),
        Err(MoveRejection::CourseNotFound { .. })
    ));
    let next = state.apply(
        &Action::MoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: op,
        },
        now(),
    );
    assert_eq!(next, state);
}

#[test]
fn test_move_success_replaces_with_server_data() {
    let multi = placed(1, "BOTH", &[P1, P2], Term::Seventh);
    let id = CorrelationId::generate();
    let moved = ready_state(&[multi.clone()]).apply(
        &Action::MoveCourseOptimistic {
            correlation_id: id,
            payload: move_op(&multi, Term::Ninth, &[P1]),
        },
        now(),
    );

    let mut server = multi.placed_at(Term::Ninth, &[P1]);
    server.enrollment.status = crate::models::EnrollmentStatus::Enrolled;
    let later = now() + Duration::seconds(2);
    let confirmed = moved.apply(
        &Action::MoveCourseSuccess {
            correlation_id: id,
            course_id: multi.course_id(),
            course: server,
        },
        later,
    );

    for period in [P1, P2] {
        let entry = &confirmed.grid.cell(Term::Ninth, period)[0];
        assert_eq!(entry.enrollment.status, crate::models::EnrollmentStatus::Enrolled);
        assert_eq!(entry.periods(), &[P1, P2]);
    }
    assert!(!confirmed.has_pending());
    assert_eq!(confirmed.last_action, None);
    assert_eq!(confirmed.last_updated, Some(later));
}

#[test]
fn test_move_success_keeps_review_stats() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let stats = ReviewStats {
        course_id: x.course_id(),
        average_rating: 3.9,
        review_count: 5,
    };
    let id = CorrelationId::generate();
    let moved = ready_state(&[x.clone()])
        .apply(
            &Action::UpdateCourseReviews {
                stats: vec![stats.clone()],
            },
            now(),
        )
        .apply(
            &Action::MoveCourseOptimistic {
                correlation_id: id,
                payload: move_op(&x, Term::Ninth, &[P1]),
            },
            now(),
        );

    // The update endpoint returns the entry without ratings.
    let confirmed = moved.apply(
        &Action::MoveCourseSuccess {
            correlation_id: id,
            course_id: x.course_id(),
            course: x.placed_at(Term::Ninth, &[P1]),
        },
        now(),
    );
    assert_eq!(confirmed.grid.cell(Term::Ninth, P1)[0].reviews, Some(stats.clone()));

    let fresher = ReviewStats {
        review_count: 6,
        ..stats
    };
    let mut server = x.placed_at(Term::Ninth, &[P1]);
    server.reviews = Some(fresher.clone());
    let replaced = confirmed.apply(
        &Action::MoveCourseSuccess {
            correlation_id: CorrelationId::generate(),
            course_id: x.course_id(),
            course: server,
        },
        now(),
    );
    assert_eq!(replaced.grid.cell(Term::Ninth, P1)[0].reviews, Some(fresher));
}

#[test]
fn test_confirmations_match_by_correlation_out_of_order() {
    let a = placed(1, "A", &[P1], Term::Seventh);
    let b = placed(2, "B", &[P2], Term::Ninth);
    let (id_a, id_b) = (CorrelationId::generate(), CorrelationId::generate());
    let op_a = move_op(&a, Term::Ninth, &[P1]);
    let op_b = move_op(&b, Term::Seventh, &[P2]);

    let state = ready_state(&[a.clone(), b.clone()])
        .apply(
            &Action::MoveCourseOptimistic {
                correlation_id: id_a,
                payload: op_a.clone(),
            },
            now(),
        )
        .apply(
            &Action::MoveCourseOptimistic {
                correlation_id: id_b,
                payload: op_b,
            },
            now(),
        );
    assert_eq!(state.pending_operations.len(), 2);

    let after_b = state.apply(
        &Action::MoveCourseSuccess {
            correlation_id: id_b,
            course_id: b.course_id(),
            course: b.placed_at(Term::Seventh, &[P2]),
        },
        now(),
    );
    assert!(after_b.is_pending(id_a));
    assert!(!after_b.is_pending(id_b));

    let after_a = after_b.apply(
        &Action::MoveCourseRevert {
            correlation_id: id_a,
            payload: op_a,
        },
        now(),
    );
    assert!(!after_a.has_pending());
    assert_eq!(after_a.grid.cell(Term::Seventh, P1).len(), 1);
    assert_eq!(after_a.grid.cell(Term::Seventh, P2).len(), 1);
}

#[test]
fn test_remove_is_idempotent() {
    let multi = placed(1, "BOTH", &[P1, P2], Term::Ninth);
    let x = placed(2, "X", &[P1], Term::Seventh);
    let state = ready_state(&[multi.clone(), x]);
    let remove = |state: &ScheduleState| {
        state.apply(
            &Action::RemoveCourseOptimistic {
                correlation_id: CorrelationId::generate(),
                payload: RemoveOperation {
                    enrollment_id: multi.enrollment_id(),
                },
            },
            now(),
        )
    };

    let once = remove(&state);
    let twice = remove(&once);
    assert_eq!(once.grid, twice.grid);
    assert!(once.grid.find_enrollment(multi.enrollment_id()).is_none());
    assert_eq!(once.grid.len(), 1);
}

#[test]
fn test_remove_missing_enrollment_is_noop() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let state = ready_state(&[x]);
    let next = state.apply(
        &Action::RemoveCourseOptimistic {
            correlation_id: CorrelationId::generate(),
            payload: RemoveOperation {
                enrollment_id: EnrollmentId::new(999),
            },
        },
        now(),
    );
    assert_eq!(next.grid, state.grid);
}

#[test]
fn test_remove_revert_restores_snapshot() {
    let multi = placed(1, "BOTH", &[P1, P2], Term::Ninth);
    let state = ready_state(&[multi.clone()]);
    let id = CorrelationId::generate();
    let snapshot = RemovedCourse {
        course: multi.clone(),
        term: Term::Ninth,
        periods: vec![P1, P2],
    };

    let removed = state
        .apply(
            &Action::RemoveCourseOptimistic {
                correlation_id: id,
                payload: RemoveOperation {
                    enrollment_id: multi.enrollment_id(),
                },
            },
            now(),
        )
        .apply(
            &Action::RemoveCourse {
                correlation_id: id,
                snapshot: snapshot.clone(),
            },
            now(),
        );
    assert!(removed.grid.is_empty());
    assert!(removed.is_pending(id));

    let restored = removed.apply(
        &Action::RemoveCourseRevert {
            correlation_id: id,
            snapshot,
        },
        now(),
    );
    assert_eq!(restored.grid, state.grid);
    assert!(!restored.has_pending());
}

#[test]
fn test_remove_success_settles_pending() {
    let x = placed(1, "X", &[P1], Term::Seventh);
    let id = CorrelationId::generate();
    let removed = ready_state(&[x.clone()]).apply(
        &Action::RemoveCourseOptimistic {
            correlation_id: id,
            payload: RemoveOperation {
                enrollment_id: x.enrollment_id(),
            },
        },
        now(),
    );
    let later = now() + Duration::seconds(1);
    let settled = removed.apply(
        &Action::RemoveCourseSuccess {
            correlation_id: id,
            enrollment_id: x.enrollment_id(),
        },
        later,
    );
    assert!(!settled.has_pending());
    assert!(settled.grid.is_empty());
    assert_eq!(settled.last_updated, Some(later));
}

#[test]
fn test_update_reviews_annotates_matches() {
    let multi = placed(1, "BOTH", &[P1, P2], Term::Ninth);
    let x = placed(2, "X", &[P1], Term::Seventh);
    let state = ready_state(&[multi.clone(), x.clone()]);
    let stats = ReviewStats {
        course_id: multi.course_id(),
        average_rating: 4.2,
        review_count: 17,
    };

    let next = state.apply(
        &Action::UpdateCourseReviews {
            stats: vec![stats.clone()],
        },
        now(),
    );
    assert_eq!(next.grid.cell(Term::Ninth, P1)[0].reviews, Some(stats.clone()));
    assert_eq!(next.grid.cell(Term::Ninth, P2)[0].reviews, Some(stats));
    assert_eq!(next.grid.cell(Term::Seventh, P1)[0].reviews, None);
}

#[test]
fn test_clear_error() {
    let state = ScheduleState::new().apply(
        &Action::FetchError {
            message: "x".to_string(),
        },
        now(),
    );
    assert!(state.apply(&Action::ClearError, now()).error.is_none());
}

#[test]
fn test_action_metadata() {
    let id = CorrelationId::generate();
    let x = placed(1, "X", &[P1], Term::Seventh);
    let trigger = Action::MoveCourse {
        correlation_id: id,
        payload: move_op(&x, Term::Ninth, &[P1]),
    };
    assert!(trigger.requires_sync());
    assert_eq!(trigger.correlation_id(), Some(id));
    assert_eq!(trigger.name(), "move-course");
    assert!(!Action::FetchStart.requires_sync());
    assert_eq!(Action::FetchStart.correlation_id(), None);
}
