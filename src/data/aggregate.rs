use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::Record;
use super::order::{reorder_by_age, syndrome_rank, SYNDROME_ORDER};

// ---------------------------------------------------------------------------
// Time series: group by (date, syndrome)
// ---------------------------------------------------------------------------

/// Which numeric columns a time-series aggregation sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumns {
    /// `relative_cases` only.
    Cases,
    /// `relative_cases` plus both prediction-interval bounds.
    CasesWithBounds,
}

/// One aggregated time-series point.
///
/// The bounds are `None` when they were not requested, or when any
/// contributing record lacked them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    pub syndrome: String,
    pub relative_cases: f64,
    pub expected_lowerbound: Option<f64>,
    pub expected_upperbound: Option<f64>,
}

/// Running sum where one missing contribution makes the total missing.
#[derive(Debug, Clone, Copy)]
struct MissingPropagatingSum(Option<f64>);

impl MissingPropagatingSum {
    fn new() -> Self {
        MissingPropagatingSum(Some(0.0))
    }

    fn add(&mut self, value: Option<f64>) {
        self.0 = match (self.0, value) {
            (Some(acc), Some(v)) => Some(acc + v),
            _ => None,
        };
    }
}

#[derive(Debug)]
struct TimeSeriesAcc {
    cases: f64,
    lower: MissingPropagatingSum,
    upper: MissingPropagatingSum,
}

/// Sum the requested columns per (date, syndrome).
///
/// One row per distinct key, ordered by date then syndrome, so every
/// syndrome's points come out in ascending date order.
pub fn aggregate_by_date_syndrome<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    columns: ValueColumns,
) -> Vec<TimeSeriesRow> {
    let mut groups: BTreeMap<(NaiveDate, &'a str), TimeSeriesAcc> = BTreeMap::new();

    for rec in records {
        let acc = groups
            .entry((rec.date, rec.syndrome.as_str()))
            .or_insert_with(|| TimeSeriesAcc {
                cases: 0.0,
                lower: MissingPropagatingSum::new(),
                upper: MissingPropagatingSum::new(),
            });
        acc.cases += rec.relative_cases;
        acc.lower.add(rec.expected_lowerbound);
        acc.upper.add(rec.expected_upperbound);
    }

    groups
        .into_iter()
        .map(|((date, syndrome), acc)| {
            let (lower, upper) = match columns {
                ValueColumns::Cases => (None, None),
                ValueColumns::CasesWithBounds => (acc.lower.0, acc.upper.0),
            };
            TimeSeriesRow {
                date,
                syndrome: syndrome.to_string(),
                relative_cases: acc.cases,
                expected_lowerbound: lower,
                expected_upperbound: upper,
            }
        })
        .collect()
}

/// One syndrome's slice of an aggregated time series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyndromeSeries {
    pub syndrome: String,
    pub rows: Vec<TimeSeriesRow>,
}

/// Split aggregated rows into one series per syndrome, in first-seen order.
/// Row order inside each series is kept, so dates stay ascending.
pub fn split_by_syndrome(rows: &[TimeSeriesRow]) -> Vec<SyndromeSeries> {
    let mut series: Vec<SyndromeSeries> = Vec::new();
    for row in rows {
        match series.iter_mut().find(|s| s.syndrome == row.syndrome) {
            Some(s) => s.rows.push(row.clone()),
            None => series.push(SyndromeSeries {
                syndrome: row.syndrome.clone(),
                rows: vec![row.clone()],
            }),
        }
    }
    series
}

// ---------------------------------------------------------------------------
// Age distribution: group by (age_group, syndrome)
// ---------------------------------------------------------------------------

/// Summed cases for one (age_group, syndrome) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeSyndromeRow {
    pub age_group: String,
    pub syndrome: String,
    pub relative_cases: f64,
}

/// Sum `relative_cases` per (age_group, syndrome), ordered by that key.
pub fn aggregate_by_age_syndrome<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<AgeSyndromeRow> {
    let mut groups: BTreeMap<(&'a str, &'a str), f64> = BTreeMap::new();
    for rec in records {
        *groups
            .entry((rec.age_group.as_str(), rec.syndrome.as_str()))
            .or_insert(0.0) += rec.relative_cases;
    }
    groups
        .into_iter()
        .map(|((age_group, syndrome), relative_cases)| AgeSyndromeRow {
            age_group: age_group.to_string(),
            syndrome: syndrome.to_string(),
            relative_cases,
        })
        .collect()
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeSlice {
    pub age_group: String,
    pub relative_cases: f64,
    /// Fraction of the syndrome's total, `0.0` when the total is zero.
    pub share: f64,
}

/// Age groups of one syndrome in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeDistribution {
    pub syndrome: String,
    pub slices: Vec<AgeSlice>,
}

impl AgeDistribution {
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.relative_cases).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Partition age rows per syndrome and put each partition in canonical age order.
///
/// The severity-ordered syndromes always get a distribution, empty if nothing
/// survived filtering; other syndromes present follow in lexical order. Age
/// groups a syndrome lacks are left out rather than zero-filled.
pub fn age_distributions(rows: &[AgeSyndromeRow]) -> Vec<AgeDistribution> {
    let mut by_syndrome: BTreeMap<&str, Vec<&AgeSyndromeRow>> = SYNDROME_ORDER
        .iter()
        .map(|s| (*s, Vec::new()))
        .collect();
    for row in rows {
        by_syndrome.entry(row.syndrome.as_str()).or_default().push(row);
    }

    let mut partitions: Vec<(&str, Vec<&AgeSyndromeRow>)> = by_syndrome.into_iter().collect();
    partitions.sort_by_key(|(syndrome, _)| syndrome_rank(syndrome).unwrap_or(usize::MAX));

    partitions
        .into_iter()
        .map(|(syndrome, rows)| {
            let ordered = reorder_by_age(rows, |r| r.age_group.as_str());
            let total: f64 = ordered.iter().map(|r| r.relative_cases).sum();
            let slices = ordered
                .into_iter()
                .map(|r| AgeSlice {
                    age_group: r.age_group.clone(),
                    relative_cases: r.relative_cases,
                    share: if total > 0.0 { r.relative_cases / total } else { 0.0 },
                })
                .collect();
            AgeDistribution {
                syndrome: syndrome.to_string(),
                slices,
            }
        })
        .collect()
}
