use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter::age_group_options;
use crate::data::model::{FilterSelection, SurveillanceDataset};
use crate::data::pipeline::{self, DashboardTables};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The selection lives here and only here; every change re-runs the whole
/// pipeline against the shared, read-only dataset.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<SurveillanceDataset>>,

    /// Current syndrome / age-group selection.
    pub selection: FilterSelection,

    /// Age groups offered for the current syndrome selection.
    pub age_group_options: Vec<String>,

    /// Chart tables for the current selection.
    pub tables: DashboardTables,

    /// Line colours per syndrome.
    pub syndrome_colors: ColorMap,

    /// Slice colours per age group.
    pub age_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: FilterSelection::default(),
            age_group_options: Vec::new(),
            tables: DashboardTables::default(),
            syndrome_colors: ColorMap::for_syndromes(&[]),
            age_colors: ColorMap::for_age_groups(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and reset the selection.
    pub fn set_dataset(&mut self, dataset: SurveillanceDataset) {
        if dataset.is_empty() {
            log::warn!("Loaded dataset has no rows");
        }
        self.syndrome_colors = ColorMap::for_syndromes(&dataset.syndromes);
        self.dataset = Some(Arc::new(dataset));
        self.selection = FilterSelection::default();
        self.status_message = None;
        self.refresh();
    }

    /// Recompute widget options and chart tables from scratch.
    pub fn refresh(&mut self) {
        let Some(ds) = &self.dataset else {
            self.age_group_options.clear();
            self.tables = DashboardTables::default();
            return;
        };
        self.age_group_options = age_group_options(ds, &self.selection.syndromes);
        let offered = &self.age_group_options;
        self.selection.age_groups.retain(|g| offered.contains(g));
        self.tables = pipeline::run(ds, &self.selection);
    }

    /// Toggle one syndrome in the selection.
    pub fn toggle_syndrome(&mut self, syndrome: &str) {
        if !self.selection.syndromes.remove(syndrome) {
            self.selection.syndromes.insert(syndrome.to_string());
        }
        self.refresh();
    }

    /// Toggle one age group in the selection.
    pub fn toggle_age_group(&mut self, age_group: &str) {
        if !self.selection.age_groups.remove(age_group) {
            self.selection.age_groups.insert(age_group.to_string());
        }
        self.refresh();
    }

    /// Drop every selection, showing all data again.
    pub fn clear_filters(&mut self) {
        self.selection = FilterSelection::default();
        self.refresh();
    }
}
