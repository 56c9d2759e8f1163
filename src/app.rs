use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot};

const INTRODUCTION: &str = "\
The data from emergency department documentation is routinely gathered as part of the \
AKTIN emergency admission register. The data include information on the presenting ED, \
age groups, reason for admission classified according to the Canadian Emergency \
Department Information System - Presenting Complaint List (CEDIS-PCL3.0), \
diagnoses coded according to the International Classification of Diseases (ICD-10), \
and information on inpatient admission following the ED visit.";

const BAND_INTRODUCTION: &str = "\
For better understanding and identification of disease peaks over time, the expected value of \
admissions and an associated 80% prediction interval are calculated and can be visualized below.";

const GLOSSARY: &str = "ARI: Acute Respiratory Illness   \
SARI: Severe Acute Respiratory Infection   ILI: Influenza-Like Illness";

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a surveillance extract to begin  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Emergency Admission Surveillance Data");
            ui.label(INTRODUCTION);
            ui.add_space(8.0);

            plot::time_series_chart(ui, state);
            ui.label(RichText::new(GLOSSARY).small());
            ui.add_space(12.0);

            ui.label(BAND_INTRODUCTION);
            plot::prediction_band_chart(ui, state);
            ui.label(RichText::new(GLOSSARY).small());
            ui.add_space(12.0);

            plot::age_pies(ui, state);
            plot::age_tables(ui, state);
        });
}
