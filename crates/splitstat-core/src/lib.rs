// Handedness-split batting stats.
//
// `split` filters events to one handedness matchup and groups them by a
// subject column, `stat` sums each group and applies a rate formula, and
// `assemble` runs a manifest of (stat, subject, split) requests and merges
// the results into a single sorted table.

pub mod assemble;
pub mod error;
pub mod event;
pub mod split;
pub mod stat;

pub use assemble::{assemble, Assembler, Combination, Request, ResultRow, ResultTable, SubjectOrder};
pub use error::{AssemblyError, NameKind, SchemaError, UnsupportedError};
pub use event::{Counts, CountColumn, Event, EventTable, Hand};
pub use split::{split, Grouping, Split};
pub use stat::{compute_stat, compute_stat_with_threshold, Stat, StatValue, Totals, MIN_PLATE_APPEARANCES};
