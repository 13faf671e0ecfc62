// Event records: one row of per-plate-appearance input and the table that holds them.

use crate::error::SchemaError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Header name of the pitcher handedness column.
pub const PITCHER_SIDE: &str = "PitcherSide";

/// Header name of the hitter handedness column.
pub const HITTER_SIDE: &str = "HitterSide";

// ---------------------------------------------------------------------------
// Handedness
// ---------------------------------------------------------------------------

/// Throwing hand of a pitcher or batting side of a hitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Parse a handedness code ("L" / "R", case-insensitive, surrounding
    /// whitespace ignored).
    pub fn from_str_hand(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "L" => Some(Hand::Left),
            "R" => Some(Hand::Right),
            _ => None,
        }
    }

    /// The single-letter code used in the raw data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "L",
            Hand::Right => "R",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Counting columns
// ---------------------------------------------------------------------------

/// The counting columns every event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CountColumn {
    PA,
    H,
    AB,
    HBP,
    BB,
    SF,
    TB,
}

impl CountColumn {
    pub const ALL: [CountColumn; 7] = [
        CountColumn::PA,
        CountColumn::H,
        CountColumn::AB,
        CountColumn::HBP,
        CountColumn::BB,
        CountColumn::SF,
        CountColumn::TB,
    ];

    /// Header name of the column in the raw data.
    pub fn name(&self) -> &'static str {
        match self {
            CountColumn::PA => "PA",
            CountColumn::H => "H",
            CountColumn::AB => "AB",
            CountColumn::HBP => "HBP",
            CountColumn::BB => "BB",
            CountColumn::SF => "SF",
            CountColumn::TB => "TB",
        }
    }

    /// The count column with header `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        CountColumn::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Position of this column in [`CountColumn::ALL`].
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CountColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counting stats recorded for a single event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub pa: u32,
    pub h: u32,
    pub ab: u32,
    pub hbp: u32,
    pub bb: u32,
    pub sf: u32,
    pub tb: u32,
}

impl Counts {
    pub fn get(&self, column: CountColumn) -> u32 {
        match column {
            CountColumn::PA => self.pa,
            CountColumn::H => self.h,
            CountColumn::AB => self.ab,
            CountColumn::HBP => self.hbp,
            CountColumn::BB => self.bb,
            CountColumn::SF => self.sf,
            CountColumn::TB => self.tb,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One immutable input row.
///
/// Besides handedness and counts, an event keeps every other column of its
/// source row verbatim in `attributes`; those are the columns a request may
/// group by (player ids, team ids, ...).
///
/// A side is `None` when the raw code was neither `L` nor `R`. Such an event
/// is outside both splits on that side but still counts toward the other two.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub pitcher_side: Option<Hand>,
    pub hitter_side: Option<Hand>,
    pub counts: Counts,
    pub attributes: HashMap<String, String>,
}

impl Event {
    pub fn new(pitcher_side: Hand, hitter_side: Hand, counts: Counts) -> Self {
        Event {
            pitcher_side: Some(pitcher_side),
            hitter_side: Some(hitter_side),
            counts,
            attributes: HashMap::new(),
        }
    }

    /// Builder-style helper to attach a grouping attribute.
    pub fn with_attribute(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    /// Value of `column` for this event.
    ///
    /// A recognized handedness resolves to its single-letter code; an
    /// unrecognized one falls back to the raw text kept in `attributes`.
    /// Returns `None` when the event has no value for the column.
    pub fn key(&self, column: &str) -> Option<&str> {
        let hand = match column {
            PITCHER_SIDE => self.pitcher_side,
            HITTER_SIDE => self.hitter_side,
            _ => None,
        };
        match hand {
            Some(hand) => Some(hand.as_str()),
            None => self.attributes.get(column).map(String::as_str),
        }
    }
}

// ---------------------------------------------------------------------------
// EventTable
// ---------------------------------------------------------------------------

/// The full raw input: the events plus the set of columns they can be
/// grouped by.
///
/// The column set is tracked separately from the events so that an empty
/// table still knows its schema.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    columns: BTreeSet<String>,
    events: Vec<Event>,
}

impl EventTable {
    /// Build a table from its groupable column names and events. The two
    /// handedness columns are always groupable.
    pub fn new<I, S>(columns: I, events: Vec<Event>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: BTreeSet<String> = columns.into_iter().map(Into::into).collect();
        columns.insert(PITCHER_SIDE.to_string());
        columns.insert(HITTER_SIDE.to_string());
        EventTable { columns, events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether `column` can be used as a subject column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Check that events can be grouped by `column`.
    ///
    /// Count columns are reported separately from unknown ones: they exist in
    /// the raw data but are summed, never grouped.
    pub fn check_subject_column(&self, column: &str) -> Result<(), SchemaError> {
        if self.has_column(column) {
            Ok(())
        } else if CountColumn::from_name(column).is_some() {
            Err(SchemaError::CountColumn {
                column: column.to_string(),
            })
        } else {
            Err(SchemaError::MissingColumn {
                column: column.to_string(),
            })
        }
    }

    /// Groupable column names in ascending order.
    pub fn subject_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}
