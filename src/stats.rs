//! Summary statistics over an extracted schedule.

use std::collections::BTreeMap;

use crate::schedule::ScheduleArtifact;
use crate::{Block, Term, TermPair};

/// Totals of one term.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TermSummary {
    pub total_sections: usize,
    pub total_students: usize,
}

impl TermSummary {
    /// Average section size, or `None` for a term without sections.
    pub fn average_section_size(&self) -> Option<f64> {
        if self.total_sections == 0 {
            None
        } else {
            Some(self.total_students as f64 / self.total_sections as f64)
        }
    }
}

/// Utilization, section-size distribution and per-term totals of a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Percentage of occupied blocks per room and term, against the full
    /// 15-block calendar
    pub room_utilization: BTreeMap<String, TermPair<f64>>,
    /// Enrolled count of every scheduled section, per course and term
    pub section_sizes: BTreeMap<String, TermPair<Vec<usize>>>,
    pub term_summary: TermPair<TermSummary>,
}

/// Compute all statistics from a completed artifact.
pub fn generate(artifact: &ScheduleArtifact) -> Statistics {
    let mut room_utilization = BTreeMap::new();
    for (room, terms) in &artifact.room_schedules {
        let mut utilization = TermPair::default();
        for term in Term::BOTH.iter().copied() {
            let occupied = terms.get(term).len();
            *utilization.get_mut(term) = occupied as f64 / Block::PER_TERM as f64 * 100.0;
        }
        room_utilization.insert(room.clone(), utilization);
    }

    let mut section_sizes = BTreeMap::new();
    let mut term_summary: TermPair<TermSummary> = TermPair::default();
    for (course, terms) in &artifact.course_sections {
        let mut sizes: TermPair<Vec<usize>> = TermPair::default();
        for term in Term::BOTH.iter().copied() {
            for record in terms.get(term) {
                sizes.get_mut(term).push(record.students);
                let summary = term_summary.get_mut(term);
                summary.total_sections += 1;
                summary.total_students += record.students;
            }
        }
        section_sizes.insert(course.clone(), sizes);
    }

    Statistics {
        room_utilization,
        section_sizes,
        term_summary,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schedule::{ArtifactMeta, RoomEntry, ScheduleArtifact, SectionRecord};
    use assert_float_eq::assert_f64_near;

    fn artifact_with_three_alg_sections() -> ScheduleArtifact {
        let mut artifact = ScheduleArtifact {
            meta: ArtifactMeta {
                generated_at: "2026-01-01T00:00:00Z".into(),
                objective: 500.0,
                solver_status: "test".into(),
            },
            student_schedules: BTreeMap::new(),
            course_sections: BTreeMap::new(),
            room_schedules: BTreeMap::new(),
        };

        let record = |block: &str, room: &str, students: usize| SectionRecord {
            section: 1,
            block: block.parse().unwrap(),
            room: room.into(),
            students,
        };
        let mut alg = TermPair::default();
        alg.term1 = vec![
            record("Monday-Morning", "R1", 8),
            record("Wednesday-Morning", "R1", 8),
        ];
        alg.term2 = vec![record("Tuesday-Morning", "R2", 5)];
        artifact.course_sections.insert("ALG".into(), alg);

        let entry = |students: usize| RoomEntry {
            course: "ALG".into(),
            section: 1,
            students,
        };
        let mut r1 = TermPair::default();
        r1.term1
            .insert("Monday-Morning".parse().unwrap(), vec![entry(8)]);
        r1.term1
            .insert("Wednesday-Morning".parse().unwrap(), vec![entry(8)]);
        artifact.room_schedules.insert("R1".into(), r1);
        let mut r2 = TermPair::default();
        r2.term2
            .insert("Tuesday-Morning".parse().unwrap(), vec![entry(5)]);
        artifact.room_schedules.insert("R2".into(), r2);

        artifact
    }

    #[test]
    fn utilization_uses_the_full_calendar() {
        let stats = generate(&artifact_with_three_alg_sections());
        // 2 of 15 blocks occupied in term 1, none in term 2
        assert_f64_near!(stats.room_utilization["R1"].term1, 2.0 / 15.0 * 100.0);
        assert_f64_near!(stats.room_utilization["R1"].term2, 0.0);
        assert_f64_near!(stats.room_utilization["R2"].term2, 1.0 / 15.0 * 100.0);
    }

    #[test]
    fn section_sizes_and_summary() {
        let stats = generate(&artifact_with_three_alg_sections());
        assert_eq!(stats.section_sizes["ALG"].term1, vec![8, 8]);
        assert_eq!(stats.section_sizes["ALG"].term2, vec![5]);

        assert_eq!(stats.term_summary.term1.total_sections, 2);
        assert_eq!(stats.term_summary.term1.total_students, 16);
        assert_f64_near!(stats.term_summary.term1.average_section_size().unwrap(), 8.0);
        assert_eq!(stats.term_summary.term2.total_sections, 1);
    }

    #[test]
    fn average_is_guarded_against_empty_terms() {
        let summary = TermSummary::default();
        assert_eq!(summary.average_section_size(), None);
    }
}
