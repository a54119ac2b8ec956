//! Reading the four roster datasets from their JSON representation.
//!
//! The ingestion frontend (spreadsheet export tooling) produces one JSON
//! document with the `lecturers`, `rooms`, `courses` and `requests` arrays;
//! this module only deserializes it into plain records. All normalization
//! happens in [`crate::model`].

use crate::model::RosterSet;
use crate::Error;

/// Read a roster file from a reader (e.g. an open file handle).
pub fn read<R: std::io::Read>(reader: R) -> Result<RosterSet, Error> {
    let rosters: RosterSet = serde_json::from_reader(reader)?;
    Ok(rosters)
}

#[cfg(test)]
mod test {
    #[test]
    fn parse_roster_file() {
        let data = include_bytes!("test_ressources/rosters_example.json");
        let rosters = super::read(&data[..]).unwrap();

        assert_eq!(rosters.lecturers.len(), 3);
        assert_eq!(rosters.rooms.len(), 3);
        assert_eq!(rosters.courses.len(), 3);
        assert_eq!(rosters.requests.len(), 4);

        assert_eq!(rosters.lecturers[0].lecturer_id, "L-01");
        assert_eq!(rosters.lecturers[0].start_term, 1);
        assert_eq!(rosters.rooms[1].room_number, "R-200");
        assert_eq!(rosters.courses[0].title, "Calculus I");
        assert_eq!(
            rosters.courses[0].available_blocks.as_deref(),
            Some("Monday-Morning, Wednesday-Morning")
        );
        // a null availability cell deserializes as absent
        assert_eq!(rosters.courses[1].available_blocks, None);
        assert_eq!(rosters.requests[3].student_id, "S-002");
    }
}
