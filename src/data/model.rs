use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Record – one row of the surveillance extract
// ---------------------------------------------------------------------------

/// A single surveillance row: admissions for one date / syndrome / age group.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    /// Short syndrome code, e.g. `SARI`, `ARI`, `ILI`.
    pub syndrome: String,
    /// Age bucket code, e.g. `0-4`, `80+`, or the all-ages bucket `00+`.
    pub age_group: String,
    /// Average admissions per reporting emergency department.
    pub relative_cases: f64,
    /// Lower bound of the 80% prediction interval, if computed upstream.
    pub expected_lowerbound: Option<f64>,
    /// Upper bound of the 80% prediction interval, if computed upstream.
    pub expected_upperbound: Option<f64>,
}

// ---------------------------------------------------------------------------
// SurveillanceDataset – the complete loaded extract
// ---------------------------------------------------------------------------

/// The full parsed dataset with the distinct category values it contains.
///
/// Never mutated after construction; filtering and aggregation always build
/// new sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveillanceDataset {
    /// All rows in file order.
    pub records: Vec<Record>,
    /// Distinct syndromes in first-seen order.
    pub syndromes: Vec<String>,
    /// Distinct age groups in first-seen order.
    pub age_groups: Vec<String>,
}

impl SurveillanceDataset {
    /// Collect the distinct category values from the loaded rows.
    pub fn from_records(records: Vec<Record>) -> Self {
        let syndromes = distinct(records.iter().map(|r| r.syndrome.as_str()));
        let age_groups = distinct(records.iter().map(|r| r.age_group.as_str()));
        SurveillanceDataset {
            records,
            syndromes,
            age_groups,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date in the extract.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Distinct values in first-seen order.
pub fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// FilterSelection – the user's current choice of categories
// ---------------------------------------------------------------------------

/// Syndrome and age-group selections. An empty set means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub syndromes: BTreeSet<String>,
    pub age_groups: BTreeSet<String>,
}

impl FilterSelection {
    #[cfg(test)]
    pub fn new<S, A>(syndromes: S, age_groups: A) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        FilterSelection {
            syndromes: syndromes.into_iter().map(Into::into).collect(),
            age_groups: age_groups.into_iter().map(Into::into).collect(),
        }
    }

    /// True when neither category is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.syndromes.is_empty() && self.age_groups.is_empty()
    }
}
