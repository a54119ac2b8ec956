//! Normalization of the four raw roster datasets into the typed domain model.
//!
//! This is the single ingestion boundary: every missing-column, blank-cell and
//! malformed-token policy lives here. Downstream components only ever see the
//! cleaned [`InputModel`].

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use serde::Deserialize;

use crate::{Block, Course, CoursePriority, CourseRequest, Lecturer, Student};

/// One row of the lecturer roster.
#[derive(Debug, Clone, Deserialize)]
pub struct LecturerRecord {
    pub lecturer_id: String,
    pub course_code: String,
    pub start_term: u32,
    pub length: u32,
}

/// One row of the room roster, pinning a course section to a room.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomRecord {
    pub course_code: String,
    pub section_number: u32,
    pub room_number: String,
}

/// One row of the course catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseRecord {
    pub course_code: String,
    pub title: String,
    pub priority: String,
    /// Comma separated `Day-TimeOfDay` tokens; may be blank or absent
    #[serde(default)]
    pub available_blocks: Option<String>,
    pub maximum_section_size: u32,
    pub minimum_section_size: u32,
    pub number_of_sections: u32,
}

/// One row of the student request roster.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestRecord {
    pub student_id: String,
    pub course_code: String,
    #[serde(default)]
    pub priority: String,
}

/// The four raw datasets as handed over by the ingestion frontend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterSet {
    #[serde(default)]
    pub lecturers: Vec<LecturerRecord>,
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
}

/// Start term and length of a course run, taken from the lecturer roster.
/// Retained for traceability; the optimizer places courses on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRun {
    pub start_term: u32,
    pub length: u32,
}

/// The normalized, immutable input snapshot that one scheduling run works on.
#[derive(Debug, Clone)]
pub struct InputModel {
    /// All students with at least one request, sorted by id
    pub students: Vec<Student>,
    /// The course catalog, keyed by course code
    pub courses: BTreeMap<String, Course>,
    /// All lecturers, sorted by id
    pub lecturers: Vec<Lecturer>,
    /// All known rooms, sorted and deduplicated
    pub rooms: Vec<String>,
    /// (course code, section number) to room, from the room roster
    pub room_assignments: BTreeMap<(String, u32), String>,
    /// Course code to its run (start term, length)
    pub course_runs: BTreeMap<String, CourseRun>,
}

impl InputModel {
    /// Build the domain model from the raw rosters.
    ///
    /// Data-quality issues are resolved here and logged, never deferred:
    /// unknown availability tokens are dropped, a course whose token list is
    /// blank or entirely invalid falls back to the full calendar, and
    /// duplicate catalog rows are resolved in favour of the last one.
    pub fn from_rosters(rosters: RosterSet) -> InputModel {
        let mut courses = BTreeMap::new();
        for record in rosters.courses {
            let eligible_blocks =
                clean_available_blocks(&record.course_code, record.available_blocks.as_deref());
            let course = Course {
                code: record.course_code.clone(),
                title: record.title,
                priority: CoursePriority::from_raw(&record.priority),
                min_size: record.minimum_section_size,
                max_size: record.maximum_section_size,
                sections: record.number_of_sections,
                eligible_blocks,
            };
            if courses.insert(record.course_code.clone(), course).is_some() {
                warn!(
                    "Duplicate catalog entry for course {}, keeping the last one",
                    record.course_code
                );
            }
        }

        let mut requests_by_student: BTreeMap<String, Vec<CourseRequest>> = BTreeMap::new();
        for record in rosters.requests {
            if !courses.contains_key(&record.course_code) {
                warn!(
                    "Student {} requests unknown course {}",
                    record.student_id, record.course_code
                );
            }
            requests_by_student
                .entry(record.student_id)
                .or_default()
                .push(CourseRequest {
                    course: record.course_code,
                    priority: record.priority,
                });
        }
        let students: Vec<Student> = requests_by_student
            .into_iter()
            .map(|(id, requests)| Student { id, requests })
            .collect();

        let mut courses_by_lecturer: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut course_runs = BTreeMap::new();
        for record in rosters.lecturers {
            courses_by_lecturer
                .entry(record.lecturer_id)
                .or_default()
                .insert(record.course_code.clone());
            course_runs.insert(
                record.course_code,
                CourseRun {
                    start_term: record.start_term,
                    length: record.length,
                },
            );
        }
        let lecturers: Vec<Lecturer> = courses_by_lecturer
            .into_iter()
            .map(|(id, courses)| Lecturer { id, courses })
            .collect();

        let mut room_set = BTreeSet::new();
        let mut room_assignments = BTreeMap::new();
        for record in rosters.rooms {
            room_set.insert(record.room_number.clone());
            room_assignments.insert(
                (record.course_code, record.section_number),
                record.room_number,
            );
        }
        let rooms: Vec<String> = room_set.into_iter().collect();

        info!(
            "Normalized rosters: {} students, {} courses, {} lecturers, {} rooms",
            students.len(),
            courses.len(),
            lecturers.len(),
            rooms.len()
        );

        InputModel {
            students,
            courses,
            lecturers,
            rooms,
            room_assignments,
            course_runs,
        }
    }
}

/// Clean the availability token list of one course. Tokens that do not match
/// a canonical `Day-TimeOfDay` pair are dropped; a blank, missing or entirely
/// invalid list reverts the course to the full calendar.
fn clean_available_blocks(course: &str, raw: Option<&str>) -> Vec<Block> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Block::calendar().collect(),
    };

    let mut blocks = BTreeSet::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<Block>() {
            Ok(block) => {
                blocks.insert(block);
            }
            Err(_) => warn!(
                "Dropping unrecognized availability token '{}' of course {}",
                token, course
            ),
        }
    }

    if blocks.is_empty() {
        warn!(
            "Course {} has no valid availability tokens, assuming the full calendar",
            course
        );
        Block::calendar().collect()
    } else {
        blocks.into_iter().collect()
    }
}
