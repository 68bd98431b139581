//! Placement rules.
//!
//! Rules, evaluated in order:
//! 1. A course enrolled in term 8 never moves.
//! 2. A course enrolled in term 7 or 9 may only go to term 7 or 9.
//! 3. The target period must be one of the course's intrinsic periods.
//!
//! These are pure functions; the drag coordinator uses them as a gate and
//! as hover feedback, and the reducer re-checks them before mutating the grid.

use crate::models::{CourseWithEnrollment, Period, Term};

/// Why a placement is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementViolation {
    #[error("courses in term {term} cannot be moved")]
    TermLocked { term: Term },
    #[error("a course in term {from} cannot be moved to term {to}")]
    TermNotInterchangeable { from: Term, to: Term },
    #[error("{course_code} does not run in period {period}")]
    PeriodNotOffered { course_code: String, period: Period },
}

/// Term-transition rules (1 and 2).
pub fn check_transition(from: Term, to: Term) -> Result<(), PlacementViolation> {
    match (from, to) {
        (Term::Eighth, _) => Err(PlacementViolation::TermLocked { term: from }),
        (Term::Seventh | Term::Ninth, Term::Eighth) => {
            Err(PlacementViolation::TermNotInterchangeable { from, to })
        }
        _ => Ok(()),
    }
}

/// All three rules for one target cell.
pub fn check_placement(
    course: &CourseWithEnrollment,
    target_term: Term,
    target_period: Period,
) -> Result<(), PlacementViolation> {
    check_transition(course.term(), target_term)?;
    if !course.course.runs_in(target_period) {
        return Err(PlacementViolation::PeriodNotOffered {
            course_code: course.course.code.clone(),
            period: target_period,
        });
    }
    Ok(())
}

pub fn can_place(course: &CourseWithEnrollment, target_term: Term, target_period: Period) -> bool {
    check_placement(course, target_term, target_period).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::placed;

    const P1: Period = Period::First;
    const P2: Period = Period::Second;

    #[test]
    fn test_term_eight_is_locked() {
        let course = placed(1, "LOCKED", &[P1, P2], Term::Eighth);
        for term in Term::ALL {
            for period in Period::ALL {
                assert_eq!(
                    check_placement(&course, term, period),
                    Err(PlacementViolation::TermLocked { term: Term::Eighth })
                );
            }
        }
    }

    #[test]
    fn test_seven_and_nine_interchange() {
        let course = placed(1, "SWAP", &[P1], Term::Seventh);
        assert!(can_place(&course, Term::Ninth, P1));
        assert!(can_place(&course, Term::Seventh, P1));
        assert_eq!(
            check_placement(&course, Term::Eighth, P1),
            Err(PlacementViolation::TermNotInterchangeable {
                from: Term::Seventh,
                to: Term::Eighth
            })
        );

        let course = placed(2, "SWAP2", &[P2], Term::Ninth);
        assert!(can_place(&course, Term::Seventh, P2));
        assert!(!can_place(&course, Term::Eighth, P2));
    }

    #[test]
    fn test_period_must_be_intrinsic() {
        let course = placed(1, "P1ONLY", &[P1], Term::Seventh);
        let err = check_placement(&course, Term::Ninth, P2).unwrap_err();
        assert_eq!(err.to_string(), "P1ONLY does not run in period 2");

        let multi = placed(2, "BOTH", &[P1, P2], Term::Seventh);
        assert!(can_place(&multi, Term::Ninth, P2));
    }

    #[test]
    fn test_rules_apply_in_order() {
        // A term-8 course with a foreign period reports the lock, not the period.
        let course = placed(1, "LOCKED", &[P1], Term::Eighth);
        assert!(matches!(
            check_placement(&course, Term::Seventh, P2),
            Err(PlacementViolation::TermLocked { .. })
        ));
    }
}
