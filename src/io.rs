//! IO functionality: roster ingestion, artifact persistence and the
//! plain-text rendering used by the read-only viewer.

pub mod artifact;
pub mod rosters;

use std::fmt::Write;

use crate::schedule::ScheduleArtifact;
use crate::stats::Statistics;
use crate::{Block, Error, Term};

fn selected_terms(term: Option<Term>) -> Vec<Term> {
    match term {
        Some(t) => vec![t],
        None => Term::BOTH.to_vec(),
    }
}

/// Format the statistics report printed after a run (and by the viewer).
pub fn format_report(stats: &Statistics) -> String {
    let mut out = String::new();
    write!(out, "\n=== SCHEDULE AND STATISTICS REPORT ===\n\n").unwrap();

    write!(out, "ROOM UTILIZATION:\n{}\n", "-".repeat(60)).unwrap();
    for (room, utilization) in &stats.room_utilization {
        write!(out, "Room {}:\n", room).unwrap();
        for term in Term::BOTH.iter().copied() {
            write!(
                out,
                "  Term {}: {:.1}% utilized\n",
                term.number(),
                utilization.get(term)
            )
            .unwrap();
        }
    }

    write!(out, "\nSECTION SIZE DISTRIBUTION:\n{}\n", "-".repeat(60)).unwrap();
    for (course, sizes) in &stats.section_sizes {
        write!(out, "\n{}:\n", course).unwrap();
        for term in Term::BOTH.iter().copied() {
            let sizes = sizes.get(term);
            if !sizes.is_empty() {
                let avg = sizes.iter().sum::<usize>() as f64 / sizes.len() as f64;
                write!(
                    out,
                    "  Term {}: {} sections, avg size: {:.1}\n",
                    term.number(),
                    sizes.len(),
                    avg
                )
                .unwrap();
            }
        }
    }

    write!(out, "\nTERM SUMMARY:\n{}\n", "-".repeat(60)).unwrap();
    for term in Term::BOTH.iter().copied() {
        let summary = stats.term_summary.get(term);
        write!(out, "\n{}:\n", term.to_string().to_uppercase()).unwrap();
        write!(out, "  Total sections: {}\n", summary.total_sections).unwrap();
        write!(out, "  Total students enrolled: {}\n", summary.total_students).unwrap();
        if let Some(avg) = summary.average_section_size() {
            write!(out, "  Average section size: {:.1}\n", avg).unwrap();
        }
    }

    out
}

/// Format the block-by-block timetable of one student.
pub fn format_student_schedule(
    artifact: &ScheduleArtifact,
    student: &str,
    term: Option<Term>,
) -> Result<String, Error> {
    let schedule = artifact
        .student_schedules
        .get(student)
        .ok_or_else(|| Error::UnknownEntity {
            kind: "student",
            id: student.to_string(),
        })?;

    let mut out = String::new();
    write!(out, "\n=== Schedule for student {} ===\n", student).unwrap();
    for term in selected_terms(term) {
        write!(out, "\n{}\n{}\n", term.to_string().to_uppercase(), "-".repeat(80)).unwrap();
        write!(
            out,
            "{:<20} {:<15} {:<35} {:<10}\n{}\n",
            "Block",
            "Course",
            "Title",
            "Section",
            "-".repeat(80)
        )
        .unwrap();
        let blocks = schedule.get(term);
        for block in Block::calendar() {
            match blocks.get(&block) {
                Some(section) => write!(
                    out,
                    "{:<20} {:<15} {:<35} {:<10}\n",
                    block.to_string(),
                    section.course,
                    section.title,
                    section.section
                )
                .unwrap(),
                None => write!(
                    out,
                    "{:<20} {:<15} {:<35} {:<10}\n",
                    block.to_string(),
                    "---",
                    "---",
                    "---"
                )
                .unwrap(),
            }
        }
    }

    Ok(out)
}

/// Format the scheduled sections of one course.
pub fn format_course_schedule(
    artifact: &ScheduleArtifact,
    course: &str,
    term: Option<Term>,
) -> Result<String, Error> {
    let sections = artifact
        .course_sections
        .get(course)
        .ok_or_else(|| Error::UnknownEntity {
            kind: "course",
            id: course.to_string(),
        })?;

    let mut out = String::new();
    write!(out, "\n=== Schedule for course {} ===\n", course).unwrap();
    for term in selected_terms(term) {
        write!(out, "\n{}\n{}\n", term.to_string().to_uppercase(), "-".repeat(60)).unwrap();
        let records = sections.get(term);
        if records.is_empty() {
            write!(out, "(not scheduled)\n").unwrap();
        }
        for record in records {
            write!(
                out,
                "section {}  {:<20} room {:<10} {} students\n",
                record.section,
                record.block.to_string(),
                record.room,
                record.students
            )
            .unwrap();
        }
    }

    Ok(out)
}

/// Format the block-by-block occupancy of one room.
pub fn format_room_schedule(
    artifact: &ScheduleArtifact,
    room: &str,
    term: Option<Term>,
) -> Result<String, Error> {
    let schedule = artifact
        .room_schedules
        .get(room)
        .ok_or_else(|| Error::UnknownEntity {
            kind: "room",
            id: room.to_string(),
        })?;

    let mut out = String::new();
    write!(out, "\n=== Schedule for room {} ===\n", room).unwrap();
    for term in selected_terms(term) {
        write!(out, "\n{}\n{}\n", term.to_string().to_uppercase(), "-".repeat(60)).unwrap();
        let blocks = schedule.get(term);
        for block in Block::calendar() {
            let rendered = match blocks.get(&block) {
                Some(entries) => entries
                    .iter()
                    .map(|e| format!("{} ({} students)", e.course, e.students))
                    .collect::<Vec<String>>()
                    .join(", "),
                None => "---".to_string(),
            };
            write!(out, "{:<20} {}\n", block.to_string(), rendered).unwrap();
        }
    }

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::milp::MilpSolution;
    use crate::model::{CourseRecord, InputModel, RequestRecord, RoomRecord, RosterSet};
    use crate::{schedule, Day};

    fn sample_artifact() -> ScheduleArtifact {
        let model = InputModel::from_rosters(RosterSet {
            rooms: vec![RoomRecord {
                course_code: "ALG".into(),
                section_number: 1,
                room_number: "R1".into(),
            }],
            courses: vec![CourseRecord {
                course_code: "ALG".into(),
                title: "Algebra".into(),
                priority: "Core course".into(),
                available_blocks: None,
                maximum_section_size: 10,
                minimum_section_size: 1,
                number_of_sections: 1,
            }],
            requests: vec![RequestRecord {
                student_id: "S1".into(),
                course_code: "ALG".into(),
                priority: "1".into(),
            }],
            ..Default::default()
        });
        let solution = MilpSolution {
            objective: 100.0,
            status: "test".into(),
            active_courses: vec!["ALG".into()],
            enrollments: vec![("S1".to_string(), "ALG".to_string(), Term::First)]
                .into_iter()
                .collect(),
            scheduled: vec![("ALG".to_string(), Day::Monday, Term::First)]
                .into_iter()
                .collect(),
        };
        schedule::extract(&model, &solution).unwrap()
    }

    #[test]
    fn student_table_lists_all_blocks() {
        let artifact = sample_artifact();
        let table = format_student_schedule(&artifact, "S1", Some(Term::First)).unwrap();
        assert!(table.contains("Monday-Morning"));
        assert!(table.contains("Algebra"));
        assert!(table.contains("Friday-Evening"));
        assert!(table.contains("---"));
        // one line per calendar block plus headers
        assert!(table.lines().count() > Block::PER_TERM);
    }

    #[test]
    fn unknown_entities_are_reported_distinctly() {
        let artifact = sample_artifact();
        assert!(matches!(
            format_student_schedule(&artifact, "NOBODY", None),
            Err(Error::UnknownEntity { kind: "student", .. })
        ));
        assert!(matches!(
            format_course_schedule(&artifact, "NONE", None),
            Err(Error::UnknownEntity { kind: "course", .. })
        ));
        assert!(matches!(
            format_room_schedule(&artifact, "R9", None),
            Err(Error::UnknownEntity { kind: "room", .. })
        ));
    }

    #[test]
    fn report_contains_all_three_sections() {
        let artifact = sample_artifact();
        let stats = crate::stats::generate(&artifact);
        let report = format_report(&stats);
        assert!(report.contains("ROOM UTILIZATION"));
        assert!(report.contains("SECTION SIZE DISTRIBUTION"));
        assert!(report.contains("TERM SUMMARY"));
        assert!(report.contains("TERM1"));
    }
}
