// Handedness splits and subject grouping.

use crate::error::{NameKind, SchemaError, UnsupportedError};
use crate::event::{Event, EventTable, Hand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A handedness matchup filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Split {
    #[serde(rename = "vs RHP")]
    VsRhp,
    #[serde(rename = "vs LHP")]
    VsLhp,
    #[serde(rename = "vs LHH")]
    VsLhh,
    #[serde(rename = "vs RHH")]
    VsRhh,
}

impl Split {
    pub const ALL: [Split; 4] = [Split::VsRhp, Split::VsLhp, Split::VsLhh, Split::VsRhh];

    /// Display name as it appears in manifests and output.
    pub fn name(&self) -> &'static str {
        match self {
            Split::VsRhp => "vs RHP",
            Split::VsLhp => "vs LHP",
            Split::VsLhh => "vs LHH",
            Split::VsRhh => "vs RHH",
        }
    }

    /// Whether `event` falls inside this split.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Split::VsRhp => event.pitcher_side == Some(Hand::Right),
            Split::VsLhp => event.pitcher_side == Some(Hand::Left),
            Split::VsLhh => event.hitter_side == Some(Hand::Left),
            Split::VsRhh => event.hitter_side == Some(Hand::Right),
        }
    }
}

impl FromStr for Split {
    type Err = UnsupportedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Split::ALL
            .into_iter()
            .find(|split| split.name() == s)
            .ok_or_else(|| UnsupportedError {
                kind: NameKind::Split,
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Events of one split partitioned by subject value.
///
/// Holds references into the event table only; nothing is summed until a
/// stat is computed over it.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    subject_column: String,
    groups: BTreeMap<&'a str, Vec<&'a Event>>,
}

impl<'a> Grouping<'a> {
    /// Name of the column the events were grouped by.
    pub fn subject_column(&self) -> &str {
        &self.subject_column
    }

    /// Number of distinct subject values.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Events recorded for one subject value.
    pub fn get(&self, subject: &str) -> Option<&[&'a Event]> {
        self.groups.get(subject).map(Vec::as_slice)
    }

    /// Iterate `(subject value, events)` pairs in ascending subject order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &[&'a Event])> + '_ {
        self.groups.iter().map(|(key, events)| (*key, events.as_slice()))
    }
}

/// Filter `table` to the events inside `split` and group the survivors by
/// the value of `subject_column`.
///
/// Events without a value (or with an empty value) for the column are left
/// out of every group.
pub fn split<'a>(
    table: &'a EventTable,
    subject_column: &str,
    split: Split,
) -> Result<Grouping<'a>, SchemaError> {
    table.check_subject_column(subject_column)?;

    let mut groups: BTreeMap<&'a str, Vec<&'a Event>> = BTreeMap::new();
    for event in table.events().iter().filter(|e| split.matches(e)) {
        match event.key(subject_column) {
            Some(key) if !key.is_empty() => groups.entry(key).or_default().push(event),
            _ => {}
        }
    }

    Ok(Grouping {
        subject_column: subject_column.to_string(),
        groups,
    })
}
