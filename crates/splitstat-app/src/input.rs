// Input loading: the raw event CSV and the combinations manifest.
//
// Both loaders are split into a reader-based function (tested against inline
// CSV) and a path-based wrapper that attaches the file path to errors.

use serde::Deserialize;
use splitstat_core::event::{HITTER_SIDE, PITCHER_SIDE};
use splitstat_core::{Counts, Event, EventTable, Hand, Request};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every event CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    PITCHER_SIDE,
    HITTER_SIDE,
    "PA",
    "H",
    "AB",
    "HBP",
    "BB",
    "SF",
    "TB",
];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Problems found while reading CSV content.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Read { path: String, source: ReadError },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Typed view of the columns the stats need. Any other column is ignored by
/// serde and picked up separately as a grouping attribute.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawEvent {
    PitcherSide: String,
    HitterSide: String,
    PA: u32,
    H: u32,
    AB: u32,
    HBP: u32,
    BB: u32,
    SF: u32,
    TB: u32,
}

impl RawEvent {
    fn counts(&self) -> Counts {
        Counts {
            pa: self.PA,
            h: self.H,
            ab: self.AB,
            hbp: self.HBP,
            bb: self.BB,
            sf: self.SF,
            tb: self.TB,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Parse one side of an event. An unrecognized code keeps the event but
/// leaves it out of that side's splits; the raw text is still groupable.
fn parse_hand(
    value: &str,
    column: &str,
    line: u64,
    attributes: &mut HashMap<String, String>,
) -> Option<Hand> {
    let hand = Hand::from_str_hand(value);
    if hand.is_none() {
        warn!(
            "line {}: unrecognized {} `{}`, event left out of its splits",
            line, column, value
        );
        attributes.insert(column.to_string(), value.to_string());
    }
    hand
}

fn load_events_from_reader<R: Read>(rdr: R) -> Result<EventTable, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let headers = reader.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ReadError::MissingColumn(column.to_string()));
        }
    }

    // Everything besides the counting columns is a candidate subject column.
    let attribute_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !REQUIRED_COLUMNS.contains(h))
        .collect();

    let mut events = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let raw: RawEvent = record.deserialize(Some(&headers))?;

        let mut attributes: HashMap<String, String> = attribute_columns
            .iter()
            .filter_map(|(i, name)| record.get(*i).map(|v| (name.to_string(), v.to_string())))
            .collect();
        let pitcher_side = parse_hand(&raw.PitcherSide, PITCHER_SIDE, line, &mut attributes);
        let hitter_side = parse_hand(&raw.HitterSide, HITTER_SIDE, line, &mut attributes);

        events.push(Event {
            pitcher_side,
            hitter_side,
            counts: raw.counts(),
            attributes,
        });
    }

    let columns = attribute_columns.iter().map(|(_, name)| name.to_string());
    Ok(EventTable::new(columns, events))
}

/// Read manifest requests. The first line is a header and is skipped
/// whatever it says; each remaining non-blank line is `Stat,Subject,Split`.
fn load_manifest_from_reader<R: Read>(rdr: R) -> Result<Vec<Request>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut requests = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line()) as usize;
        let (stat, subject, split): (String, String, String) = record.deserialize(None)?;
        requests.push(Request {
            line,
            stat,
            subject,
            split,
        });
    }
    Ok(requests)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the raw event table from a CSV file.
pub fn load_events(path: &Path) -> Result<EventTable, LoadError> {
    let table = load_events_from_reader(open(path)?).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    info!(
        "Loaded {} events from {} (subject columns: {})",
        table.len(),
        path.display(),
        table.subject_columns().collect::<Vec<_>>().join(", ")
    );
    Ok(table)
}

/// Load the combinations manifest.
pub fn load_manifest(path: &Path) -> Result<Vec<Request>, LoadError> {
    let requests = load_manifest_from_reader(open(path)?).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("Loaded {} requests from {}", requests.len(), path.display());
    Ok(requests)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use splitstat_core::Split;

    // -- Event CSV --

    #[test]
    fn event_csv_roundtrip() {
        let csv_data = "\
GameId,HitterId,PitcherSide,HitterSide,PA,AB,H,HR,TB,BB,SF,HBP
G1,123,R,L,1,1,1,0,2,0,0,0
G1,456,L,R,1,0,0,0,0,1,0,0";

        let table = load_events_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.events()[0];
        assert_eq!(first.pitcher_side, Some(Hand::Right));
        assert_eq!(first.hitter_side, Some(Hand::Left));
        assert_eq!(first.counts.pa, 1);
        assert_eq!(first.counts.tb, 2);
        assert_eq!(first.key("HitterId"), Some("123"));
        assert_eq!(first.key("GameId"), Some("G1"));

        let second = &table.events()[1];
        assert_eq!(second.pitcher_side, Some(Hand::Left));
        assert_eq!(second.counts.bb, 1);
    }

    #[test]
    fn non_count_columns_become_subject_columns() {
        let csv_data = "\
HitterId,HitterTeamId,PitcherSide,HitterSide,PA,AB,H,HR,TB,BB,SF,HBP";

        let table = load_events_from_reader(csv_data.as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("HitterId"));
        assert!(table.has_column("HitterTeamId"));
        // HR is not a required column, so it is kept like any other attribute.
        assert!(table.has_column("HR"));
        assert!(!table.has_column("PA"));
    }

    #[test]
    fn ids_keep_their_exact_text() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,SF,HBP
007,R,R,1,1,0,0,0,0,0";

        let table = load_events_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.events()[0].key("HitterId"), Some("007"));
    }

    #[test]
    fn fields_are_trimmed() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,SF,HBP
  P1  , r , l ,1,1,1,1,0,0,0";

        let table = load_events_from_reader(csv_data.as_bytes()).unwrap();
        let event = &table.events()[0];
        assert_eq!(event.key("HitterId"), Some("P1"));
        assert_eq!(event.pitcher_side, Some(Hand::Right));
        assert_eq!(event.hitter_side, Some(Hand::Left));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,HBP
P1,R,L,1,1,1,1,0,0";

        match load_events_from_reader(csv_data.as_bytes()) {
            Err(ReadError::MissingColumn(column)) => assert_eq!(column, "SF"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn unknown_handedness_keeps_the_event_outside_that_side() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,SF,HBP
P1,R,L,1,1,1,1,0,0,0
P2,S,L,1,1,1,1,0,0,0
P3,L,,1,1,1,1,0,0,0";

        let table = load_events_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let switch = &table.events()[1];
        assert_eq!(switch.pitcher_side, None);
        assert_eq!(switch.hitter_side, Some(Hand::Left));
        assert_eq!(switch.key("PitcherSide"), Some("S"));

        let blank = &table.events()[2];
        assert_eq!(blank.pitcher_side, Some(Hand::Left));
        assert_eq!(blank.hitter_side, None);
        assert_eq!(blank.key("HitterSide"), Some(""));

        let subjects = |split: Split| {
            splitstat_core::split(&table, "HitterId", split)
                .unwrap()
                .iter()
                .map(|(k, _)| k.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(subjects(Split::VsRhp), vec!["P1"]);
        assert_eq!(subjects(Split::VsLhp), vec!["P3"]);
        assert_eq!(subjects(Split::VsLhh), vec!["P1", "P2"]);
        assert!(subjects(Split::VsRhh).is_empty());
    }

    #[test]
    fn non_numeric_count_is_a_csv_error() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,SF,HBP
P1,R,L,one,1,1,1,0,0,0";

        assert!(matches!(
            load_events_from_reader(csv_data.as_bytes()),
            Err(ReadError::Csv(_))
        ));
    }

    #[test]
    fn negative_count_is_rejected() {
        let csv_data = "\
HitterId,PitcherSide,HitterSide,PA,AB,H,TB,BB,SF,HBP
P1,R,L,-1,1,1,1,0,0,0";

        assert!(load_events_from_reader(csv_data.as_bytes()).is_err());
    }

    // -- Manifest --

    #[test]
    fn manifest_lines_are_numbered_from_the_file() {
        let csv_data = "\
Stat,Subject,Split
AVG,HitterId,vs RHP
OPS,PitcherTeamId,vs LHH
";

        let requests = load_manifest_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(
            requests,
            vec![
                Request::new(2, "AVG", "HitterId", "vs RHP"),
                Request::new(3, "OPS", "PitcherTeamId", "vs LHH"),
            ]
        );
    }

    #[test]
    fn manifest_header_text_is_ignored() {
        let csv_data = "\
whatever,goes,here
SLG,HitterId,vs RHH";

        let requests = load_manifest_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(requests, vec![Request::new(2, "SLG", "HitterId", "vs RHH")]);
    }

    #[test]
    fn manifest_blank_lines_and_padding_skipped() {
        let csv_data = "\
Stat,Subject,Split

 AVG , HitterId , vs LHP

OBP,HitterId,vs RHP
";

        let requests = load_manifest_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], Request::new(3, "AVG", "HitterId", "vs LHP"));
        assert_eq!(requests[1].line, 5);
    }

    #[test]
    fn manifest_names_are_not_validated_on_load() {
        let csv_data = "\
Stat,Subject,Split
WAR,HitterId,vs SHP";

        let requests = load_manifest_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(requests[0].stat, "WAR");
    }

    #[test]
    fn manifest_with_wrong_field_count_fails() {
        let csv_data = "\
Stat,Subject,Split
AVG,HitterId";

        assert!(load_manifest_from_reader(csv_data.as_bytes()).is_err());
    }

    #[test]
    fn empty_manifest_is_empty() {
        let requests = load_manifest_from_reader("Stat,Subject,Split\n".as_bytes()).unwrap();
        assert!(requests.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("splitstat_missing/events.csv");
        assert!(matches!(load_events(&path), Err(LoadError::Io { .. })));
    }
}
