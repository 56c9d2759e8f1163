use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter:");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let syndromes = dataset.syndromes.clone();
    let age_groups = state.age_group_options.clone();

    let mut toggled_syndrome: Option<String> = None;
    let mut toggled_age_group: Option<String> = None;
    let mut clear = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let header = format!(
                "Syndrome  ({}/{})",
                state.selection.syndromes.len(),
                syndromes.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("syndrome_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for syndrome in &syndromes {
                        let mut checked = state.selection.syndromes.contains(syndrome);
                        let text = RichText::new(syndrome)
                            .color(state.syndrome_colors.color_for(syndrome));
                        if ui.checkbox(&mut checked, text).changed() {
                            toggled_syndrome = Some(syndrome.clone());
                        }
                    }
                });

            let header = format!(
                "Age Group  ({}/{})",
                state.selection.age_groups.len(),
                age_groups.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("age_group_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for age_group in &age_groups {
                        let mut checked = state.selection.age_groups.contains(age_group);
                        if ui.checkbox(&mut checked, age_group.as_str()).changed() {
                            toggled_age_group = Some(age_group.clone());
                        }
                    }
                });

            ui.separator();
            ui.label(RichText::new("Nothing ticked means no constraint.").weak());
            if ui.button("Clear filters").clicked() {
                clear = true;
            }
        });

    // Apply after drawing: each change is one full pipeline re-run.
    if let Some(s) = toggled_syndrome {
        state.toggle_syndrome(&s);
    }
    if let Some(g) = toggled_age_group {
        state.toggle_age_group(&g);
    }
    if clear {
        state.clear_filters();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let span = ds
                .date_range()
                .map(|(from, to)| format!(", {from} to {to}"))
                .unwrap_or_default();
            ui.label(format!(
                "{} rows loaded, {} selected{span}",
                ds.len(),
                state.tables.filtered_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open surveillance data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
