//! The fixed 3 × 2 schedule grid.
//!
//! Cells are keyed by [`Term`] and [`Period`]. Entries inside a cell are kept
//! ordered by enrollment id so two grids with the same membership compare equal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::course::{CourseId, CourseWithEnrollment, EnrollmentId};
use super::slot::{Period, Term};

/// Courses placed in the two periods of one term.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSlots {
    pub period1: Vec<CourseWithEnrollment>,
    pub period2: Vec<CourseWithEnrollment>,
}

impl TermSlots {
    fn period(&self, period: Period) -> &Vec<CourseWithEnrollment> {
        match period {
            Period::First => &self.period1,
            Period::Second => &self.period2,
        }
    }

    fn period_mut(&mut self, period: Period) -> &mut Vec<CourseWithEnrollment> {
        match period {
            Period::First => &mut self.period1,
            Period::Second => &mut self.period2,
        }
    }
}

/// A grid invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridInvariantError {
    #[error("enrollment {enrollment_id} is placed in more than one term: {terms:?}")]
    SplitAcrossTerms {
        enrollment_id: EnrollmentId,
        terms: Vec<Term>,
    },
    #[error("enrollment {enrollment_id} sits in term {term} period {period}, which its course does not run in")]
    OutsideIntrinsicPeriods {
        enrollment_id: EnrollmentId,
        term: Term,
        period: Period,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGrid {
    pub term7: TermSlots,
    pub term8: TermSlots,
    pub term9: TermSlots,
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn term(&self, term: Term) -> &TermSlots {
        match term {
            Term::Seventh => &self.term7,
            Term::Eighth => &self.term8,
            Term::Ninth => &self.term9,
        }
    }

    fn term_mut(&mut self, term: Term) -> &mut TermSlots {
        match term {
            Term::Seventh => &mut self.term7,
            Term::Eighth => &mut self.term8,
            Term::Ninth => &mut self.term9,
        }
    }

    pub fn cell(&self, term: Term, period: Period) -> &[CourseWithEnrollment] {
        self.term(term).period(period)
    }

    /// Iterate all six cells in term-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Term, Period, &[CourseWithEnrollment])> + '_ {
        Term::ALL.into_iter().flat_map(move |term| {
            Period::ALL
                .into_iter()
                .map(move |period| (term, period, self.cell(term, period)))
        })
    }

    /// Insert an entry, replacing any entry with the same enrollment id in that cell.
    pub fn insert(&mut self, term: Term, period: Period, entry: CourseWithEnrollment) {
        let cell = self.term_mut(term).period_mut(period);
        match cell.binary_search_by_key(&entry.enrollment_id(), |c| c.enrollment_id()) {
            Ok(idx) => cell[idx] = entry,
            Err(idx) => cell.insert(idx, entry),
        }
    }

    /// Remove a course from every period of one term. Returns how many entries left.
    pub fn remove_course_from_term(&mut self, course_id: CourseId, term: Term) -> usize {
        let slots = self.term_mut(term);
        let mut removed = 0;
        for period in Period::ALL {
            let cell = slots.period_mut(period);
            let before = cell.len();
            cell.retain(|c| c.course_id() != course_id);
            removed += before - cell.len();
        }
        removed
    }

    /// Filter an enrollment out of all six cells. Returns true if anything matched.
    pub fn remove_enrollment(&mut self, enrollment_id: EnrollmentId) -> bool {
        let mut removed = false;
        for term in Term::ALL {
            for period in Period::ALL {
                let cell = self.term_mut(term).period_mut(period);
                let before = cell.len();
                cell.retain(|c| c.enrollment_id() != enrollment_id);
                removed |= cell.len() != before;
            }
        }
        removed
    }

    pub fn find_course(&self, course_id: CourseId) -> Option<&CourseWithEnrollment> {
        self.cells()
            .flat_map(|(_, _, cell)| cell.iter())
            .find(|c| c.course_id() == course_id)
    }

    pub fn find_course_in_term(&self, course_id: CourseId, term: Term) -> Option<&CourseWithEnrollment> {
        Period::ALL
            .into_iter()
            .flat_map(|period| self.cell(term, period).iter())
            .find(|c| c.course_id() == course_id)
    }

    pub fn find_enrollment(&self, enrollment_id: EnrollmentId) -> Option<&CourseWithEnrollment> {
        self.cells()
            .flat_map(|(_, _, cell)| cell.iter())
            .find(|c| c.enrollment_id() == enrollment_id)
    }

    /// Every (term, period) cell an enrollment currently occupies.
    pub fn positions_of(&self, enrollment_id: EnrollmentId) -> Vec<(Term, Period)> {
        self.cells()
            .filter(|(_, _, cell)| cell.iter().any(|c| c.enrollment_id() == enrollment_id))
            .map(|(term, period, _)| (term, period))
            .collect()
    }

    /// Derived flat view of the placed courses, one entry per enrollment.
    pub fn enrolled_courses(&self) -> Vec<&CourseWithEnrollment> {
        let mut seen = BTreeSet::new();
        self.cells()
            .flat_map(|(_, _, cell)| cell.iter())
            .filter(|c| seen.insert(c.enrollment_id()))
            .collect()
    }

    /// Sum of credits placed in a term, counting mirrored courses once.
    pub fn credits_in_term(&self, term: Term) -> f64 {
        let mut seen = BTreeSet::new();
        Period::ALL
            .into_iter()
            .flat_map(|period| self.cell(term, period).iter())
            .filter(|c| seen.insert(c.enrollment_id()))
            .map(|c| c.course.credits)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.enrolled_courses().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().all(|(_, _, cell)| cell.is_empty())
    }

    /// Apply a function to every entry in every cell.
    pub fn for_each_entry_mut(&mut self, mut f: impl FnMut(&mut CourseWithEnrollment)) {
        for term in Term::ALL {
            for period in Period::ALL {
                self.term_mut(term).period_mut(period).iter_mut().for_each(&mut f);
            }
        }
    }

    /// Check that each enrollment sits in exactly one term and only in
    /// periods its course runs in.
    pub fn check_invariants(&self) -> Result<(), GridInvariantError> {
        let mut terms_by_enrollment: BTreeMap<EnrollmentId, BTreeSet<Term>> = BTreeMap::new();

        for (term, period, cell) in self.cells() {
            for entry in cell {
                if !entry.course.runs_in(period) {
                    return Err(GridInvariantError::OutsideIntrinsicPeriods {
                        enrollment_id: entry.enrollment_id(),
                        term,
                        period,
                    });
                }
                terms_by_enrollment
                    .entry(entry.enrollment_id())
                    .or_default()
                    .insert(term);
            }
        }

        match terms_by_enrollment.into_iter().find(|(_, terms)| terms.len() > 1) {
            Some((enrollment_id, terms)) => Err(GridInvariantError::SplitAcrossTerms {
                enrollment_id,
                terms: terms.into_iter().collect(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod grid_tests;
