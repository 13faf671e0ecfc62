// Rate stat formulas over grouped events.

use crate::error::{NameKind, UnsupportedError};
use crate::event::{CountColumn, Event};
use crate::split::Grouping;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Subjects with fewer summed plate appearances than this are left out.
pub const MIN_PLATE_APPEARANCES: u32 = 25;

/// Supported rate stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stat {
    AVG,
    OBP,
    SLG,
    OPS,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::AVG, Stat::OBP, Stat::SLG, Stat::OPS];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::AVG => "AVG",
            Stat::OBP => "OBP",
            Stat::SLG => "SLG",
            Stat::OPS => "OPS",
        }
    }

    /// The columns summed per subject for this stat. PA is always included
    /// because it drives the qualifying threshold.
    pub fn required_columns(&self) -> &'static [CountColumn] {
        use CountColumn::*;
        match self {
            Stat::AVG => &[PA, H, AB],
            Stat::OBP => &[H, HBP, AB, BB, SF, PA],
            Stat::SLG => &[TB, AB, PA],
            Stat::OPS => &[H, HBP, AB, BB, SF, PA, TB],
        }
    }

    /// Apply the formula to summed totals, rounded to three decimals.
    ///
    /// Returns `None` when a denominator sums to zero.
    pub fn evaluate(&self, totals: &Totals) -> Option<f64> {
        let raw = match self {
            Stat::AVG => ratio(totals.value(CountColumn::H), totals.value(CountColumn::AB)),
            Stat::OBP => on_base(totals),
            Stat::SLG => slugging(totals),
            Stat::OPS => Some(on_base(totals)? + slugging(totals)?),
        };
        raw.map(round3)
    }
}

impl FromStr for Stat {
    type Err = UnsupportedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| UnsupportedError {
                kind: NameKind::Stat,
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

/// `(H + BB + HBP) / (AB + BB + HBP + SF)`
fn on_base(t: &Totals) -> Option<f64> {
    use CountColumn::*;
    ratio(
        t.value(H) + t.value(BB) + t.value(HBP),
        t.value(AB) + t.value(BB) + t.value(HBP) + t.value(SF),
    )
}

/// `TB / AB`
fn slugging(t: &Totals) -> Option<f64> {
    ratio(t.value(CountColumn::TB), t.value(CountColumn::AB))
}

/// Round to three decimals, ties to even.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Per-subject column sums. Only the columns asked for are summed; every
/// other column reads as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    sums: [Option<u64>; CountColumn::ALL.len()],
}

impl Totals {
    /// Sum `columns` over `events`.
    pub fn sum<'e, I>(events: I, columns: &[CountColumn]) -> Self
    where
        I: IntoIterator<Item = &'e Event>,
    {
        let mut sums = [None; CountColumn::ALL.len()];
        for column in columns {
            sums[column.index()] = Some(0u64);
        }
        for event in events {
            for column in columns {
                if let Some(sum) = sums[column.index()].as_mut() {
                    *sum += u64::from(event.counts.get(*column));
                }
            }
        }
        Totals { sums }
    }

    /// Summed value of `column`, or `None` if it was not summed.
    pub fn get(&self, column: CountColumn) -> Option<u64> {
        self.sums[column.index()]
    }

    fn value(&self, column: CountColumn) -> u64 {
        self.get(column).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Stat computation
// ---------------------------------------------------------------------------

/// One qualifying subject's result.
#[derive(Debug, Clone, PartialEq)]
pub struct StatValue {
    pub subject: String,
    pub totals: Totals,
    /// `None` when the formula's denominator is zero.
    pub value: Option<f64>,
}

/// Compute `stat` for every subject in `grouping` with the default
/// qualifying threshold.
pub fn compute_stat(stat: Stat, grouping: &Grouping<'_>) -> Vec<StatValue> {
    compute_stat_with_threshold(stat, grouping, MIN_PLATE_APPEARANCES)
}

/// Compute `stat` for every subject in `grouping` whose summed PA is at
/// least `min_pa`. Output is in ascending subject order.
pub fn compute_stat_with_threshold(
    stat: Stat,
    grouping: &Grouping<'_>,
    min_pa: u32,
) -> Vec<StatValue> {
    let columns = stat.required_columns();
    grouping
        .iter()
        .filter_map(|(subject, events)| {
            let totals = Totals::sum(events.iter().copied(), columns);
            if totals.value(CountColumn::PA) < u64::from(min_pa) {
                return None;
            }
            let value = stat.evaluate(&totals);
            if value.is_none() {
                debug!(
                    "{} undefined for {} `{}`: zero denominator",
                    stat,
                    grouping.subject_column(),
                    subject
                );
            }
            Some(StatValue {
                subject: subject.to_string(),
                totals,
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Counts, EventTable, Hand};
    use crate::split::{split, Split};

    fn counts(pa: u32, h: u32, ab: u32, hbp: u32, bb: u32, sf: u32, tb: u32) -> Counts {
        Counts {
            pa,
            h,
            ab,
            hbp,
            bb,
            sf,
            tb,
        }
    }

    fn table(rows: &[(&str, Counts)]) -> EventTable {
        let events = rows
            .iter()
            .map(|(subject, c)| {
                Event::new(Hand::Right, Hand::Left, *c).with_attribute("Subject", *subject)
            })
            .collect();
        EventTable::new(["Subject"], events)
    }

    fn values(stat: Stat, table: &EventTable) -> Vec<(String, Option<f64>)> {
        let grouping = split(table, "Subject", Split::VsRhp).unwrap();
        compute_stat(stat, &grouping)
            .into_iter()
            .map(|v| (v.subject, v.value))
            .collect()
    }

    fn has_three_decimals(v: f64) -> bool {
        let scaled = v * 1000.0;
        (scaled - scaled.round()).abs() < 1e-6
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for stat in Stat::ALL {
            assert_eq!(stat.name().parse::<Stat>(), Ok(stat));
        }
        let err = "ERA".parse::<Stat>().unwrap_err();
        assert_eq!(err.kind, NameKind::Stat);
        assert_eq!(err.to_string(), "unsupported stat `ERA`");
    }

    #[test]
    fn avg_is_hits_over_at_bats() {
        let t = table(&[("P1", counts(30, 10, 25, 0, 5, 0, 15))]);
        assert_eq!(values(Stat::AVG, &t), vec![("P1".to_string(), Some(0.4))]);
    }

    #[test]
    fn obp_formula() {
        // (10 + 5 + 2) / (25 + 5 + 2 + 1) = 17 / 33
        let t = table(&[("P1", counts(33, 10, 25, 2, 5, 1, 15))]);
        assert_eq!(values(Stat::OBP, &t), vec![("P1".to_string(), Some(0.515))]);
    }

    #[test]
    fn slg_formula() {
        let t = table(&[("P1", counts(30, 10, 25, 0, 5, 0, 15))]);
        assert_eq!(values(Stat::SLG, &t), vec![("P1".to_string(), Some(0.6))]);
    }

    #[test]
    fn ops_rounds_once_after_summing() {
        // OBP = 1/3, SLG = 1/3: rounding each first would give 0.666, the
        // single rounding gives 0.667.
        let t = table(&[("P1", counts(30, 10, 30, 0, 0, 0, 10))]);
        let ops = values(Stat::OPS, &t)[0].1.unwrap();
        assert_eq!(ops, 0.667);
        let obp = values(Stat::OBP, &t)[0].1.unwrap();
        let slg = values(Stat::SLG, &t)[0].1.unwrap();
        assert!((ops - (obp + slg)).abs() <= 0.001 + 1e-9);
    }

    #[test]
    fn sums_across_events_before_dividing() {
        let t = table(&[
            ("P1", counts(15, 3, 12, 0, 3, 0, 5)),
            ("P1", counts(15, 4, 13, 0, 2, 0, 6)),
        ]);
        // 7 / 25
        assert_eq!(values(Stat::AVG, &t), vec![("P1".to_string(), Some(0.28))]);
    }

    #[test]
    fn below_threshold_subjects_are_excluded() {
        let t = table(&[
            ("P1", counts(20, 5, 18, 0, 2, 0, 7)),
            ("P2", counts(25, 5, 20, 0, 5, 0, 7)),
        ]);
        let out = values(Stat::AVG, &t);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "P2");
    }

    #[test]
    fn custom_threshold_is_respected() {
        let t = table(&[("P1", counts(20, 5, 18, 0, 2, 0, 7))]);
        let grouping = split(&t, "Subject", Split::VsRhp).unwrap();
        assert!(compute_stat(Stat::AVG, &grouping).is_empty());
        assert_eq!(compute_stat_with_threshold(Stat::AVG, &grouping, 20).len(), 1);
    }

    #[test]
    fn zero_at_bats_leaves_value_undefined() {
        // All walks: qualifies on PA but AVG/SLG have no denominator.
        let t = table(&[("P1", counts(30, 0, 0, 0, 30, 0, 0))]);
        assert_eq!(values(Stat::AVG, &t), vec![("P1".to_string(), None)]);
        assert_eq!(values(Stat::SLG, &t), vec![("P1".to_string(), None)]);
        assert_eq!(values(Stat::OBP, &t), vec![("P1".to_string(), Some(1.0))]);
        assert_eq!(values(Stat::OPS, &t), vec![("P1".to_string(), None)]);
    }

    #[test]
    fn zero_obp_denominator_leaves_obp_and_ops_undefined() {
        // 25 PA with no AB, BB, HBP or SF: qualifies, but OBP is 0/0.
        let t = table(&[("P1", counts(25, 0, 0, 0, 0, 0, 0))]);
        for stat in Stat::ALL {
            assert_eq!(values(stat, &t), vec![("P1".to_string(), None)], "{stat}");
        }

        let grouping = split(&t, "Subject", Split::VsRhp).unwrap();
        let out = compute_stat(Stat::OBP, &grouping);
        assert_eq!(out[0].totals.get(CountColumn::PA), Some(25));
        assert_eq!(out[0].totals.get(CountColumn::AB), Some(0));
    }

    #[test]
    fn only_required_columns_are_summed() {
        let t = table(&[("P1", counts(30, 10, 25, 1, 5, 0, 15))]);
        let grouping = split(&t, "Subject", Split::VsRhp).unwrap();
        let out = compute_stat(Stat::AVG, &grouping);
        let totals = out[0].totals;
        assert_eq!(totals.get(CountColumn::PA), Some(30));
        assert_eq!(totals.get(CountColumn::H), Some(10));
        assert_eq!(totals.get(CountColumn::AB), Some(25));
        assert_eq!(totals.get(CountColumn::HBP), None);
        assert_eq!(totals.get(CountColumn::TB), None);
    }

    #[test]
    fn every_stat_yields_three_decimal_values() {
        let t = table(&[
            ("P1", counts(31, 7, 27, 1, 3, 0, 11)),
            ("P2", counts(47, 13, 41, 2, 3, 1, 23)),
            ("P3", counts(29, 9, 26, 0, 2, 1, 17)),
        ]);
        for stat in Stat::ALL {
            for (_, value) in values(stat, &t) {
                assert!(has_three_decimals(value.unwrap()), "{stat} value {value:?}");
            }
        }
    }

    #[test]
    fn round3_breaks_ties_to_even() {
        assert_eq!(round3(0.0625), 0.062);
        assert_eq!(round3(0.4), 0.4);
        assert_eq!(round3(1.0 / 3.0), 0.333);
    }
}
