use super::aggregate::{
    age_distributions, aggregate_by_age_syndrome, aggregate_by_date_syndrome, AgeDistribution,
    TimeSeriesRow, ValueColumns,
};
use super::filter::apply_filters;
use super::model::{FilterSelection, SurveillanceDataset};

/// Everything the charts need for one filter selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardTables {
    /// Number of records that passed the filters.
    pub filtered_rows: usize,
    /// Summed cases per (date, syndrome).
    pub time_series: Vec<TimeSeriesRow>,
    /// Summed cases and prediction bounds per (date, syndrome).
    pub time_series_with_bounds: Vec<TimeSeriesRow>,
    /// Per-syndrome age distributions in canonical age order.
    pub age_distribution: Vec<AgeDistribution>,
}

/// Filter the dataset and build all chart tables.
///
/// Pure function of its inputs: the same dataset and selection always yield
/// the same tables.
pub fn run(dataset: &SurveillanceDataset, selection: &FilterSelection) -> DashboardTables {
    let filtered = apply_filters(&dataset.records, selection);
    log::debug!(
        "pipeline: {} of {} rows pass {:?}",
        filtered.len(),
        dataset.len(),
        selection
    );

    let time_series = aggregate_by_date_syndrome(filtered.iter().copied(), ValueColumns::Cases);
    let time_series_with_bounds =
        aggregate_by_date_syndrome(filtered.iter().copied(), ValueColumns::CasesWithBounds);
    let age_rows = aggregate_by_age_syndrome(filtered.iter().copied());

    DashboardTables {
        filtered_rows: filtered.len(),
        time_series,
        time_series_with_bounds,
        age_distribution: age_distributions(&age_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{bounded, record};
    use chrono::NaiveDate;

    #[test]
    fn syndrome_selection_scenario() {
        let ds = SurveillanceDataset::from_records(vec![
            record("2023-01-01", "SARI", "0-4", 1.0),
            record("2023-01-01", "ARI", "0-4", 2.0),
        ]);
        let sel = FilterSelection::new(["SARI"], Vec::<String>::new());
        let tables = run(&ds, &sel);
        assert_eq!(tables.filtered_rows, 1);
        assert_eq!(tables.time_series.len(), 1);
        let row = &tables.time_series[0];
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(row.syndrome, "SARI");
        assert_eq!(row.relative_cases, 1.0);
    }

    #[test]
    fn rerun_is_deterministic() {
        let ds = SurveillanceDataset::from_records(vec![
            bounded("2023-01-02", "ILI", "60-79", 1.0, Some(0.2), None),
            bounded("2023-01-01", "SARI", "00+", 2.0, Some(1.0), Some(3.0)),
            bounded("2023-01-01", "SARI", "0-4", 0.5, Some(0.1), Some(0.9)),
            bounded("2023-01-01", "ARI", "80+", 4.0, None, None),
        ]);
        let sel = FilterSelection::new(["SARI", "ILI"], ["00+", "60-79", "0-4"]);
        let first = run(&ds, &sel);
        let second = run(&ds, &sel);
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn nothing_matching_yields_empty_tables() {
        let ds = SurveillanceDataset::from_records(vec![record("2023-01-01", "SARI", "0-4", 1.0)]);
        let sel = FilterSelection::new(["ILI"], ["80+"]);
        let tables = run(&ds, &sel);
        assert_eq!(tables.filtered_rows, 0);
        assert!(tables.time_series.is_empty());
        assert!(tables.time_series_with_bounds.is_empty());
        assert!(tables.age_distribution.iter().all(|d| d.is_empty()));
    }

    #[test]
    fn age_filter_excluding_canonical_groups_does_not_fail() {
        let ds = SurveillanceDataset::from_records(vec![
            record("2023-01-01", "SARI", "0-4", 1.0),
            record("2023-01-01", "SARI", "80+", 2.0),
            record("2023-01-01", "SARI", "00+", 3.0),
        ]);
        let sel = FilterSelection::new(Vec::<String>::new(), ["80+"]);
        let tables = run(&ds, &sel);
        let sari = &tables.age_distribution[0];
        assert_eq!(sari.slices.len(), 1);
        assert_eq!(sari.slices[0].age_group, "80+");
        assert_eq!(sari.slices[0].share, 1.0);
    }
}
