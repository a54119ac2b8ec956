//! Atomic persistence of schedule artifacts.
//!
//! A schedule is written to a temporary file in the target directory and
//! renamed into place, so a concurrently reading viewer either sees the
//! previous complete schedule or the new complete one, never a torn write.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::info;

use crate::schedule::ScheduleArtifact;
use crate::Error;

/// Persist an artifact to `path`, atomically replacing any previous one.
pub fn store(path: &Path, artifact: &ScheduleArtifact) -> Result<(), Error> {
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), artifact)?;
    fs::rename(&tmp_path, path)?;
    info!("Schedule artifact written to {}", path.display());
    Ok(())
}

/// Load a previously persisted artifact.
///
/// A missing or unreadable file is reported as the dedicated
/// [`Error::NoSchedule`] condition so the viewer can tell "no run has
/// completed yet" apart from an internal failure.
pub fn load(path: &Path) -> Result<ScheduleArtifact, Error> {
    let file = File::open(path).map_err(|err| Error::NoSchedule {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| Error::NoSchedule {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schedule::{ArtifactMeta, RoomEntry, SectionRecord, SectionRef};
    use crate::{Term, TermPair};
    use std::collections::BTreeMap;
    use std::io::Write;

    fn sample_artifact() -> ScheduleArtifact {
        let mut student_schedules = BTreeMap::new();
        let mut s1: TermPair<BTreeMap<_, _>> = TermPair::default();
        s1.get_mut(Term::First).insert(
            "Monday-Morning".parse().unwrap(),
            SectionRef {
                course: "ALG".into(),
                section: 1,
                title: "Algebra".into(),
            },
        );
        student_schedules.insert("S1".to_string(), s1);
        student_schedules.insert("S2".to_string(), TermPair::default());

        let mut course_sections = BTreeMap::new();
        let mut alg: TermPair<Vec<SectionRecord>> = TermPair::default();
        alg.term1.push(SectionRecord {
            section: 1,
            block: "Monday-Morning".parse().unwrap(),
            room: "R1".into(),
            students: 1,
        });
        course_sections.insert("ALG".to_string(), alg);

        let mut room_schedules = BTreeMap::new();
        let mut r1: TermPair<BTreeMap<_, Vec<RoomEntry>>> = TermPair::default();
        r1.term1.insert(
            "Monday-Morning".parse().unwrap(),
            vec![RoomEntry {
                course: "ALG".into(),
                section: 1,
                students: 1,
            }],
        );
        room_schedules.insert("R1".to_string(), r1);

        ScheduleArtifact {
            meta: ArtifactMeta {
                generated_at: "2026-01-01T00:00:00Z".into(),
                objective: 100.0,
                solver_status: "test".into(),
            },
            student_schedules,
            course_sections,
            room_schedules,
        }
    }

    #[test]
    fn round_trip_is_structurally_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let artifact = sample_artifact();

        store(&path, &artifact).unwrap();
        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded, artifact);

        // no temporary file is left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn missing_artifact_is_a_distinct_condition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing-here.json");
        match load(&path) {
            Err(Error::NoSchedule { .. }) => (),
            other => panic!("expected the no-schedule condition, got {:?}", other),
        }
    }

    #[test]
    fn corrupt_artifact_is_a_distinct_condition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"{ not json").unwrap();
        drop(file);
        assert!(matches!(load(&path), Err(Error::NoSchedule { .. })));
    }

    #[test]
    fn store_replaces_the_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");

        let mut artifact = sample_artifact();
        store(&path, &artifact).unwrap();
        artifact.meta.objective = 250.0;
        store(&path, &artifact).unwrap();

        assert_eq!(load(&path).unwrap().meta.objective, 250.0);
    }
}
