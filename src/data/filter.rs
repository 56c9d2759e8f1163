use std::collections::BTreeSet;

use super::model::{distinct, FilterSelection, Record, SurveillanceDataset};
use super::order::sort_age_labels;

// ---------------------------------------------------------------------------
// Filter predicate: syndrome AND age group
// ---------------------------------------------------------------------------

/// Whether a record passes the selection.
///
/// Each category is checked on its own: an empty set for a category means no
/// constraint on it, a non-empty set requires membership. Both checks must
/// pass, so the two filters combine with AND and their order is irrelevant.
/// Values outside the known sets simply never match.
pub fn matches(record: &Record, selection: &FilterSelection) -> bool {
    passes(&selection.syndromes, &record.syndrome)
        && passes(&selection.age_groups, &record.age_group)
}

fn passes(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Return the records that pass the selection, preserving dataset order.
///
/// With nothing selected this is the whole dataset.
pub fn apply_filters<'a>(
    records: &'a [Record],
    selection: &FilterSelection,
) -> Vec<&'a Record> {
    if selection.is_unconstrained() {
        return records.iter().collect();
    }
    records.iter().filter(|rec| matches(rec, selection)).collect()
}

// ---------------------------------------------------------------------------
// Widget options
// ---------------------------------------------------------------------------

/// Age groups offered for selection given the current syndrome choice.
///
/// Only groups occurring under the selected syndromes (or anywhere, when no
/// syndrome is selected), in canonical order.
pub fn age_group_options(
    dataset: &SurveillanceDataset,
    syndromes: &BTreeSet<String>,
) -> Vec<String> {
    let mut options = distinct(
        dataset
            .records
            .iter()
            .filter(|rec| passes(syndromes, &rec.syndrome))
            .map(|rec| rec.age_group.as_str()),
    );
    sort_age_labels(&mut options);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn sample() -> SurveillanceDataset {
        SurveillanceDataset::from_records(vec![
            record("2023-01-01", "SARI", "0-4", 1.0),
            record("2023-01-01", "ARI", "0-4", 2.0),
            record("2023-01-01", "ILI", "80+", 3.0),
            record("2023-01-02", "SARI", "80+", 4.0),
            record("2023-01-02", "ARI", "00+", 5.0),
            record("2023-01-02", "ILI", "0-4", 6.0),
        ])
    }

    fn cases(rows: &[&Record]) -> Vec<f64> {
        rows.iter().map(|r| r.relative_cases).collect()
    }

    #[test]
    fn empty_selection_is_identity() {
        let ds = sample();
        let out = apply_filters(&ds.records, &FilterSelection::default());
        assert_eq!(out.len(), ds.len());
        assert!(out.iter().zip(&ds.records).all(|(a, b)| *a == b));
    }

    #[test]
    fn syndrome_only_selection() {
        let ds = sample();
        let sel = FilterSelection::new(["SARI"], Vec::<String>::new());
        assert_eq!(cases(&apply_filters(&ds.records, &sel)), vec![1.0, 4.0]);
    }

    #[test]
    fn age_group_only_selection() {
        let ds = sample();
        let sel = FilterSelection::new(Vec::<String>::new(), ["0-4"]);
        assert_eq!(cases(&apply_filters(&ds.records, &sel)), vec![1.0, 2.0, 6.0]);
    }

    #[test]
    fn both_selections_combine_with_and() {
        let ds = sample();
        let sel = FilterSelection::new(["SARI", "ILI"], ["80+"]);
        let out = apply_filters(&ds.records, &sel);
        assert_eq!(cases(&out), vec![3.0, 4.0]);
        assert!(out
            .iter()
            .all(|r| sel.syndromes.contains(&r.syndrome) && sel.age_groups.contains(&r.age_group)));

        let expected = ds
            .records
            .iter()
            .filter(|r| sel.syndromes.contains(&r.syndrome) && sel.age_groups.contains(&r.age_group))
            .count();
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn filtering_is_commutative_and_idempotent() {
        let ds = sample();
        let both = FilterSelection::new(["ARI", "SARI"], ["0-4", "00+"]);
        let syndromes_only = FilterSelection::new(["ARI", "SARI"], Vec::<String>::new());
        let ages_only = FilterSelection::new(Vec::<String>::new(), ["0-4", "00+"]);

        let combined = cases(&apply_filters(&ds.records, &both));

        let first: Vec<Record> = apply_filters(&ds.records, &syndromes_only)
            .into_iter()
            .cloned()
            .collect();
        let syndrome_then_age = cases(&apply_filters(&first, &ages_only));

        let first: Vec<Record> = apply_filters(&ds.records, &ages_only)
            .into_iter()
            .cloned()
            .collect();
        let age_then_syndrome = cases(&apply_filters(&first, &syndromes_only));

        assert_eq!(combined, syndrome_then_age);
        assert_eq!(combined, age_then_syndrome);

        let once: Vec<Record> = apply_filters(&ds.records, &both).into_iter().cloned().collect();
        let twice = apply_filters(&once, &both);
        assert_eq!(cases(&twice), combined);
    }

    #[test]
    fn unknown_values_match_nothing() {
        let ds = sample();
        let sel = FilterSelection::new(["COVID"], Vec::<String>::new());
        assert!(apply_filters(&ds.records, &sel).is_empty());
    }

    #[test]
    fn output_keeps_dataset_order() {
        let ds = sample();
        let sel = FilterSelection::new(["ARI"], Vec::<String>::new());
        let out = apply_filters(&ds.records, &sel);
        assert!(std::ptr::eq(out[0], &ds.records[1]));
        assert!(std::ptr::eq(out[1], &ds.records[4]));
    }

    #[test]
    fn age_options_follow_syndrome_choice() {
        let ds = sample();
        assert_eq!(
            age_group_options(&ds, &BTreeSet::new()),
            vec!["0-4", "80+", "00+"]
        );
        let ari: BTreeSet<String> = ["ARI".to_string()].into_iter().collect();
        assert_eq!(age_group_options(&ds, &ari), vec!["0-4", "00+"]);
    }
}
