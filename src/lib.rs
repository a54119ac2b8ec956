//! Two-term course timetabling: assign students, lecturers, rooms and time
//! blocks for an academic program by formulating the request data as a binary
//! integer program and extracting a consistent timetable from the solution.

pub mod engine;
pub mod io;
pub mod milp;
pub mod model;
pub mod schedule;
pub mod stats;

use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two sequential academic scheduling periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    First,
    Second,
}

impl Term {
    /// Both terms, in chronological order.
    pub const BOTH: [Term; 2] = [Term::First, Term::Second];

    pub fn number(self) -> u8 {
        match self {
            Term::First => 1,
            Term::Second => 2,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "term{}", self.number())
    }
}

/// A teaching weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s)
            .ok_or_else(|| format!("'{}' is not a weekday", s))
    }
}

/// Daily teaching slot of 90–120 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] =
        [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    fn name(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("'{}' is not a time of day", s))
    }
}

/// A calendar slot, i.e. a weekday combined with a time of day. Blocks are
/// totally ordered by day first, then time of day, and render as
/// `Monday-Morning` everywhere (log output, tables, persisted schedules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Block {
    pub day: Day,
    pub time: TimeOfDay,
}

impl Block {
    /// Number of blocks available per term.
    pub const PER_TERM: usize = 15;

    /// All blocks of a term, in order.
    pub fn calendar() -> impl Iterator<Item = Block> {
        Day::ALL
            .iter()
            .flat_map(|d| TimeOfDay::ALL.iter().map(move |t| Block { day: *d, time: *t }))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.time)
    }
}

impl FromStr for Block {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, time) = s
            .split_once('-')
            .ok_or_else(|| format!("'{}' is not a day-time block", s))?;
        Ok(Block {
            day: day.parse()?,
            time: time.parse()?,
        })
    }
}

impl From<Block> for String {
    fn from(block: Block) -> String {
        block.to_string()
    }
}

impl TryFrom<String> for Block {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A pair of per-term values, serialized with explicit `term1`/`term2` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermPair<T> {
    pub term1: T,
    pub term2: T,
}

impl<T> TermPair<T> {
    pub fn get(&self, term: Term) -> &T {
        match term {
            Term::First => &self.term1,
            Term::Second => &self.term2,
        }
    }

    pub fn get_mut(&mut self, term: Term) -> &mut T {
        match term {
            Term::First => &mut self.term1,
            Term::Second => &mut self.term2,
        }
    }
}

/// Priority class of a course, deciding its weight in the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoursePriority {
    Core,
    Elective,
}

impl CoursePriority {
    /// Normalize the free-form priority column of the course catalog.
    pub fn from_raw(raw: &str) -> CoursePriority {
        if raw.trim() == "Core course" {
            CoursePriority::Core
        } else {
            CoursePriority::Elective
        }
    }

    /// Objective weight of one satisfied request for a course of this class.
    pub fn weight(self) -> f64 {
        match self {
            CoursePriority::Core => 100.0,
            CoursePriority::Elective => 50.0,
        }
    }
}

/// A student's request for one course. The request priority is kept verbatim
/// for traceability; it does not influence the optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRequest {
    pub course: String,
    pub priority: String,
}

/// A student together with their ordered course requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub requests: Vec<CourseRequest>,
}

/// An offered course from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Course code, the primary key used throughout the pipeline
    pub code: String,
    /// Human readable course title
    pub title: String,
    /// Priority class (core or elective)
    pub priority: CoursePriority,
    /// Minimum viable section size
    pub min_size: u32,
    /// Maximum number of students per section
    pub max_size: u32,
    /// Number of sections that may be offered per term
    pub sections: u32,
    /// Blocks the course may be taught in, after token cleaning
    pub eligible_blocks: Vec<Block>,
}

/// A lecturer and the set of courses they teach.
#[derive(Debug, Clone, PartialEq)]
pub struct Lecturer {
    pub id: String,
    pub courses: BTreeSet<String>,
}

/// Crate-wide error type. The solver and extraction conditions are kept as
/// distinct variants so callers can tell an over-constrained model from a
/// corrupted one, and a missing schedule from a broken file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input data: {0}")]
    Input(#[from] serde_json::Error),

    #[error("nothing to schedule: {0}")]
    EmptyProblem(String),

    #[error("the requests cannot be scheduled under the given constraints")]
    Infeasible,

    #[error("solver terminated without a usable schedule: {0}")]
    NoIncumbent(String),

    #[error("inconsistent schedule: {0}")]
    InconsistentSchedule(String),

    #[error("no schedule available yet ({path}: {reason})")]
    NoSchedule { path: String, reason: String },

    #[error("unknown {kind} '{id}' in schedule")]
    UnknownEntity { kind: &'static str, id: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn block_parsing_and_display() {
        let block: Block = "Wednesday-Evening".parse().unwrap();
        assert_eq!(block.day, Day::Wednesday);
        assert_eq!(block.time, TimeOfDay::Evening);
        assert_eq!(block.to_string(), "Wednesday-Evening");

        assert!("Wednesday".parse::<Block>().is_err());
        assert!("Funday-Morning".parse::<Block>().is_err());
        assert!("Monday-Midnight".parse::<Block>().is_err());
    }

    #[test]
    fn block_ordering_is_day_major() {
        let blocks: Vec<Block> = Block::calendar().collect();
        assert_eq!(blocks.len(), Block::PER_TERM);
        let mut sorted = blocks.clone();
        sorted.sort();
        assert_eq!(sorted, blocks);
        let monday_evening: Block = "Monday-Evening".parse().unwrap();
        let tuesday_morning: Block = "Tuesday-Morning".parse().unwrap();
        assert!(monday_evening < tuesday_morning);
    }

    #[test]
    fn block_serde_uses_string_labels() {
        let block: Block = "Friday-Afternoon".parse().unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, "\"Friday-Afternoon\"");
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn priority_normalization() {
        assert_eq!(CoursePriority::from_raw("Core course"), CoursePriority::Core);
        assert_eq!(
            CoursePriority::from_raw("Elective course"),
            CoursePriority::Elective
        );
        assert_eq!(CoursePriority::from_raw(""), CoursePriority::Elective);
        assert_eq!(CoursePriority::Core.weight(), 100.0);
        assert_eq!(CoursePriority::Elective.weight(), 50.0);
    }
}
