//! Term and period coordinates of the planning grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A coordinate value that does not exist in the 3 × 2 planning grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{axis} {value} is outside the planning grid")]
pub struct OutOfGrid {
    pub axis: &'static str,
    pub value: i64,
}

/// Academic term (semester) slot in the planning horizon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Term {
    Seventh = 7,
    Eighth = 8,
    Ninth = 9,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Seventh, Term::Eighth, Term::Ninth];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Map a raw semester number; anything outside 7–9 yields `None`.
    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            7 => Some(Term::Seventh),
            8 => Some(Term::Eighth),
            9 => Some(Term::Ninth),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Term {
    type Error = OutOfGrid;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Term::from_number(value as i64).ok_or(OutOfGrid {
            axis: "term",
            value: value as i64,
        })
    }
}

impl From<Term> for u8 {
    fn from(term: Term) -> Self {
        term.number()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Sub-slot within a term in which a course meets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Period {
    First = 1,
    Second = 2,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::First, Period::Second];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            1 => Some(Period::First),
            2 => Some(Period::Second),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Period {
    type Error = OutOfGrid;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Period::from_number(value as i64).ok_or(OutOfGrid {
            axis: "period",
            value: value as i64,
        })
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.number()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Failure to parse a drop-zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropZoneParseError {
    #[error("drop zone '{0}' does not match term{{N}}-period{{N}}")]
    Malformed(String),
    #[error("drop zone '{zone}': {source}")]
    OutOfGrid {
        zone: String,
        #[source]
        source: OutOfGrid,
    },
}

/// A droppable grid cell, encoded on the wire as `term{N}-period{N}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DropZone {
    pub term: Term,
    pub period: Period,
}

impl DropZone {
    pub fn new(term: Term, period: Period) -> Self {
        Self { term, period }
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term{}-period{}", self.term, self.period)
    }
}

impl FromStr for DropZone {
    type Err = DropZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DropZoneParseError::Malformed(s.to_string());

        let (term_part, period_part) = s.trim().split_once('-').ok_or_else(malformed)?;
        let term_raw: u8 = term_part
            .strip_prefix("term")
            .and_then(|n| n.parse().ok())
            .ok_or_else(malformed)?;
        let period_raw: u8 = period_part
            .strip_prefix("period")
            .and_then(|n| n.parse().ok())
            .ok_or_else(malformed)?;

        let out_of_grid = |source| DropZoneParseError::OutOfGrid {
            zone: s.to_string(),
            source,
        };
        let term = Term::try_from(term_raw).map_err(out_of_grid)?;
        let period = Period::try_from(period_raw).map_err(out_of_grid)?;

        Ok(Self { term, period })
    }
}
