//! Extraction of the solved assignment into the persisted timetable views.
//!
//! The artifact holds the same schedule three times: per student, per course
//! and per room. All three are derived from one [`MilpSolution`] in a single
//! deterministic pass, so they can only disagree if the solution itself
//! references entities missing from the model; that case fails the run
//! instead of papering over it with placeholder values.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::milp::MilpSolution;
use crate::model::InputModel;
use crate::{Block, Error, Term, TermPair, TimeOfDay};

/// Reference from a student's block to the course section taught there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRef {
    pub course: String,
    pub section: u32,
    pub title: String,
}

/// One scheduled section of a course: block, room and head count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub section: u32,
    pub block: Block,
    pub room: String,
    pub students: usize,
}

/// One course occupying a block in a room's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub course: String,
    pub section: u32,
    pub students: usize,
}

/// Provenance of a persisted schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// RFC 3339 timestamp of the extraction
    pub generated_at: String,
    /// Objective value of the accepted incumbent
    pub objective: f64,
    /// Engine outcome that produced the schedule
    pub solver_status: String,
}

/// The complete, immutable result of one scheduling run. Students and rooms
/// without any assignment are present with empty per-term maps; absence of a
/// key therefore always means "unknown entity", never "nothing scheduled".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleArtifact {
    pub meta: ArtifactMeta,
    pub student_schedules: BTreeMap<String, TermPair<BTreeMap<Block, SectionRef>>>,
    pub course_sections: BTreeMap<String, TermPair<Vec<SectionRecord>>>,
    pub room_schedules: BTreeMap<String, TermPair<BTreeMap<Block, Vec<RoomEntry>>>>,
}

/// Build the three timetable views from the solved assignment.
///
/// Rooms are not part of the optimization; they are handed out here by a
/// single round-robin counter over all known rooms, wrapping at the end of
/// the list. Scheduling happens at day granularity, so every extracted block
/// carries the fixed `Morning` label, and every entry is labeled section 1;
/// a course occupying several days of a term shows up as several section-1
/// records.
pub fn extract(model: &InputModel, solution: &MilpSolution) -> Result<ScheduleArtifact, Error> {
    let mut student_schedules: BTreeMap<String, TermPair<BTreeMap<Block, SectionRef>>> = model
        .students
        .iter()
        .map(|s| (s.id.clone(), TermPair::default()))
        .collect();
    let mut course_sections: BTreeMap<String, TermPair<Vec<SectionRecord>>> = solution
        .active_courses
        .iter()
        .map(|c| (c.clone(), TermPair::default()))
        .collect();
    let mut room_schedules: BTreeMap<String, TermPair<BTreeMap<Block, Vec<RoomEntry>>>> = model
        .rooms
        .iter()
        .map(|r| (r.clone(), TermPair::default()))
        .collect();

    let mut room_idx = 0usize;
    for course_code in &solution.active_courses {
        for term in Term::BOTH.iter().copied() {
            for day in solution.scheduled_days(course_code, term) {
                let students = solution.enrolled_count(course_code, term);
                if model.rooms.is_empty() {
                    return Err(Error::InconsistentSchedule(format!(
                        "course {} is scheduled but no rooms are known",
                        course_code
                    )));
                }
                let room = model.rooms[room_idx % model.rooms.len()].clone();
                room_idx += 1;

                let block = Block {
                    day,
                    time: TimeOfDay::Morning,
                };
                course_sections
                    .get_mut(course_code)
                    .ok_or_else(|| {
                        Error::InconsistentSchedule(format!(
                            "scheduled course {} is not active",
                            course_code
                        ))
                    })?
                    .get_mut(term)
                    .push(SectionRecord {
                        section: 1,
                        block,
                        room: room.clone(),
                        students,
                    });
                room_schedules
                    .get_mut(&room)
                    .ok_or_else(|| {
                        Error::InconsistentSchedule(format!("room {} is not in the roster", room))
                    })?
                    .get_mut(term)
                    .entry(block)
                    .or_insert_with(Vec::new)
                    .push(RoomEntry {
                        course: course_code.clone(),
                        section: 1,
                        students,
                    });
            }
        }
    }

    for (student, course_code, term) in &solution.enrollments {
        let course = model.courses.get(course_code).ok_or_else(|| {
            Error::InconsistentSchedule(format!(
                "enrollment references course {} missing from the catalog",
                course_code
            ))
        })?;
        if !course_sections.contains_key(course_code) {
            return Err(Error::InconsistentSchedule(format!(
                "enrollment references inactive course {}",
                course_code
            )));
        }
        let per_student = student_schedules.get_mut(student).ok_or_else(|| {
            Error::InconsistentSchedule(format!(
                "enrollment references student {} missing from the roster",
                student
            ))
        })?;
        for day in solution.scheduled_days(course_code, *term) {
            per_student.get_mut(*term).insert(
                Block {
                    day,
                    time: TimeOfDay::Morning,
                },
                SectionRef {
                    course: course_code.clone(),
                    section: 1,
                    title: course.title.clone(),
                },
            );
        }
    }

    Ok(ScheduleArtifact {
        meta: ArtifactMeta {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            objective: solution.objective,
            solver_status: solution.status.clone(),
        },
        student_schedules,
        course_sections,
        room_schedules,
    })
}

/// Cross-check the three views of an artifact against each other.
///
/// Every section record must have its exact mirror entry in the room view
/// and vice versa, and each record's head count must equal the number of
/// students whose per-term schedule references the course. Any mismatch is
/// reported as an inconsistent-schedule condition.
pub fn verify(artifact: &ScheduleArtifact) -> Result<(), Error> {
    let mut room_entries = 0usize;
    for (room, terms) in &artifact.room_schedules {
        for term in Term::BOTH.iter().copied() {
            for (block, entries) in terms.get(term) {
                for entry in entries {
                    room_entries += 1;
                    let mirrored = artifact
                        .course_sections
                        .get(&entry.course)
                        .map(|t| t.get(term))
                        .map(|records| {
                            records.iter().any(|r| {
                                r.block == *block
                                    && r.room == *room
                                    && r.section == entry.section
                                    && r.students == entry.students
                            })
                        })
                        .unwrap_or(false);
                    if !mirrored {
                        return Err(Error::InconsistentSchedule(format!(
                            "room {} lists course {} at {} {} without a matching section record",
                            room, entry.course, term, block
                        )));
                    }
                }
            }
        }
    }

    let mut section_records = 0usize;
    for (course, terms) in &artifact.course_sections {
        for term in Term::BOTH.iter().copied() {
            let records = terms.get(term);
            let referencing_students = artifact
                .student_schedules
                .values()
                .filter(|schedule| {
                    schedule
                        .get(term)
                        .values()
                        .any(|section| section.course == *course)
                })
                .count();
            for record in records {
                section_records += 1;
                if record.students != referencing_students {
                    return Err(Error::InconsistentSchedule(format!(
                        "course {} counts {} students in {} but {} student schedules reference it",
                        course, record.students, term, referencing_students
                    )));
                }
            }
        }
    }

    // Both views list the same number of scheduled sections.
    if room_entries != section_records {
        return Err(Error::InconsistentSchedule(
            "room schedules and course sections differ in size".into(),
        ));
    }

    Ok(())
}
