// Result assembly: evaluate manifest requests and merge them into one
// sorted, SubjectId-keyed table.

use crate::error::AssemblyError;
use crate::event::EventTable;
use crate::split::{self, Split};
use crate::stat::{self, Stat, MIN_PLATE_APPEARANCES};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One manifest entry as read, before its names are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Manifest line the entry came from.
    pub line: usize,
    pub stat: String,
    pub subject: String,
    pub split: String,
}

impl Request {
    pub fn new(
        line: usize,
        stat: impl Into<String>,
        subject: impl Into<String>,
        split: impl Into<String>,
    ) -> Self {
        Request {
            line,
            stat: stat.into(),
            subject: subject.into(),
            split: split.into(),
        }
    }

    /// Check the stat, split and subject column of this request against
    /// `table`.
    pub fn resolve(&self, table: &EventTable) -> Result<Combination, AssemblyError> {
        let unsupported = |source| AssemblyError::Unsupported {
            line: self.line,
            source,
        };
        let stat: Stat = self.stat.parse().map_err(unsupported)?;
        let split: Split = self.split.parse().map_err(unsupported)?;
        table
            .check_subject_column(&self.subject)
            .map_err(|source| AssemblyError::Schema {
                line: self.line,
                source,
            })?;
        Ok(Combination {
            line: self.line,
            stat,
            subject: self.subject.clone(),
            split,
        })
    }
}

/// A request whose names are known to be valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub line: usize,
    pub stat: Stat,
    pub subject: String,
    pub split: Split,
}

// ---------------------------------------------------------------------------
// Result rows and table
// ---------------------------------------------------------------------------

/// One output row. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRow {
    pub subject_id: String,
    pub stat: Stat,
    pub split: Split,
    pub subject: String,
    pub value: Option<f64>,
}

/// How SubjectIds compare when sorting the result table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectOrder {
    /// Plain string ordering.
    #[default]
    Lexical,
    /// Integer ids come first, in numeric order; every other id follows
    /// them in string order.
    Numeric,
}

impl SubjectOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            SubjectOrder::Lexical => a.cmp(b),
            SubjectOrder::Numeric => {
                let key = |id: &str| id.trim().parse::<i64>().ok();
                match (key(a), key(b)) {
                    (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => a.cmp(b),
                }
            }
        }
    }

    fn compare_rows(&self, a: &ResultRow, b: &ResultRow) -> Ordering {
        self.compare(&a.subject_id, &b.subject_id)
            .then_with(|| a.stat.name().cmp(b.stat.name()))
            .then_with(|| a.split.name().cmp(b.split.name()))
            .then_with(|| a.subject.cmp(&b.subject))
    }
}

/// The merged output, sorted by (SubjectId, Stat, Split, Subject) and
/// looked up by SubjectId.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
    order: SubjectOrder,
}

impl ResultTable {
    /// Concatenate per-request row sets once and sort once.
    pub fn from_parts<I>(parts: I, order: SubjectOrder) -> Self
    where
        I: IntoIterator<Item = Vec<ResultRow>>,
    {
        let mut rows: Vec<ResultRow> = parts.into_iter().flatten().collect();
        rows.sort_by(|a, b| order.compare_rows(a, b));
        ResultTable { rows, order }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn subject_order(&self) -> SubjectOrder {
        self.order
    }

    /// All rows keyed by `subject_id`. Empty if the id is absent.
    pub fn get(&self, subject_id: &str) -> &[ResultRow] {
        let start = self
            .rows
            .partition_point(|r| self.order.compare(&r.subject_id, subject_id) == Ordering::Less);
        let end = self
            .rows
            .partition_point(|r| self.order.compare(&r.subject_id, subject_id) != Ordering::Greater);
        &self.rows[start..end]
    }

    /// Distinct SubjectIds in table order.
    pub fn subject_ids(&self) -> impl Iterator<Item = &str> {
        self.rows
            .chunk_by(|a, b| a.subject_id == b.subject_id)
            .map(|chunk| chunk[0].subject_id.as_str())
    }

    /// Whether the rows are in table order. Re-sorting a sorted table is a
    /// no-op, so this holds for every table built through `from_parts`.
    pub fn is_sorted(&self) -> bool {
        self.rows
            .windows(2)
            .all(|w| self.order.compare_rows(&w[0], &w[1]) != Ordering::Greater)
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Evaluates manifest requests against an event table.
#[derive(Debug, Clone, Copy)]
pub struct Assembler {
    min_pa: u32,
    order: SubjectOrder,
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler {
            min_pa: MIN_PLATE_APPEARANCES,
            order: SubjectOrder::Lexical,
        }
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_pa(mut self, min_pa: u32) -> Self {
        self.min_pa = min_pa;
        self
    }

    pub fn with_subject_order(mut self, order: SubjectOrder) -> Self {
        self.order = order;
        self
    }

    pub fn min_pa(&self) -> u32 {
        self.min_pa
    }

    pub fn subject_order(&self) -> SubjectOrder {
        self.order
    }

    /// Resolve every request up front. The first bad request, in manifest
    /// order, fails the whole batch.
    pub fn validate(
        &self,
        requests: &[Request],
        table: &EventTable,
    ) -> Result<Vec<Combination>, AssemblyError> {
        requests.iter().map(|r| r.resolve(table)).collect()
    }

    /// Rows for a single validated combination.
    pub fn evaluate(
        &self,
        combination: &Combination,
        table: &EventTable,
    ) -> Result<Vec<ResultRow>, AssemblyError> {
        let grouping = split::split(table, &combination.subject, combination.split).map_err(
            |source| AssemblyError::Schema {
                line: combination.line,
                source,
            },
        )?;
        let rows: Vec<ResultRow> =
            stat::compute_stat_with_threshold(combination.stat, &grouping, self.min_pa)
                .into_iter()
                .map(|v| ResultRow {
                    subject_id: v.subject,
                    stat: combination.stat,
                    split: combination.split,
                    subject: combination.subject.clone(),
                    value: v.value,
                })
                .collect();

        if rows.is_empty() {
            warn!(
                "line {}: {} {} by {} produced no qualifying subjects",
                combination.line, combination.stat, combination.split, combination.subject
            );
        } else {
            debug!(
                "line {}: {} {} by {} -> {} rows ({} groups)",
                combination.line,
                combination.stat,
                combination.split,
                combination.subject,
                rows.len(),
                grouping.len()
            );
        }
        Ok(rows)
    }

    /// Merge per-combination row sets into the final table.
    pub fn finish<I>(&self, parts: I) -> ResultTable
    where
        I: IntoIterator<Item = Vec<ResultRow>>,
    {
        ResultTable::from_parts(parts, self.order)
    }

    /// Validate and evaluate all requests, then merge. Either every request
    /// succeeds or nothing is returned.
    pub fn assemble(
        &self,
        requests: &[Request],
        table: &EventTable,
    ) -> Result<ResultTable, AssemblyError> {
        let combinations = self.validate(requests, table)?;
        let parts = combinations
            .iter()
            .map(|c| self.evaluate(c, table))
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.finish(parts);
        info!(
            "assembled {} rows from {} requests over {} events",
            result.len(),
            combinations.len(),
            table.len()
        );
        Ok(result)
    }
}

/// Assemble with the default threshold and lexical SubjectId ordering.
pub fn assemble(requests: &[Request], table: &EventTable) -> Result<ResultTable, AssemblyError> {
    Assembler::default().assemble(requests, table)
}
