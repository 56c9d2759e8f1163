use std::f64::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoints, Polygon};

use crate::color::ColorMap;
use crate::data::aggregate::{split_by_syndrome, AgeDistribution, TimeSeriesRow};
use crate::state::AppState;

const Y_AXIS_LABEL: &str = "Average number of admissions per emergency department";
const CHART_HEIGHT: f32 = 380.0;
const PIE_SIZE: f32 = 260.0;
/// Largest angle drawn as one polygon; egui only fills convex shapes.
const MAX_WEDGE: f64 = FRAC_PI_2;

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn date_plot(id: &str) -> Plot<'_> {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label(Y_AXIS_LABEL)
        .x_axis_formatter(|mark, _range| {
            x_to_date(mark.value)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|name, value| {
            let date = x_to_date(value.x)
                .map(|d| d.to_string())
                .unwrap_or_default();
            if name.is_empty() {
                format!("{date}\n{:.2}", value.y)
            } else {
                format!("{name}\n{date}\n{:.2}", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
}

fn case_points(rows: &[TimeSeriesRow]) -> PlotPoints<'_> {
    rows.iter()
        .map(|r| [date_to_x(r.date), r.relative_cases])
        .collect()
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// One line per syndrome: summed admissions over time.
pub fn time_series_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Emergency Admissions for Respiratory Diseases");
    let series = split_by_syndrome(&state.tables.time_series);
    date_plot("time_series").show(ui, |plot_ui| {
        for s in &series {
            plot_ui.line(
                Line::new(case_points(&s.rows))
                    .name(&s.syndrome)
                    .color(state.syndrome_colors.color_for(&s.syndrome))
                    .width(1.5),
            );
        }
    });
}

/// Admission lines with the 80% prediction interval shaded behind them.
pub fn prediction_band_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Emergency Admissions for Respiratory Diseases with Expected Values");
    let series = split_by_syndrome(&state.tables.time_series_with_bounds);
    date_plot("prediction_band").show(ui, |plot_ui| {
        for s in &series {
            let color = state.syndrome_colors.color_for(&s.syndrome);
            for quad in band_quads(&s.rows) {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(quad))
                        .fill_color(color.gamma_multiply(0.3))
                        .stroke(Stroke::NONE),
                );
            }
            plot_ui.line(
                Line::new(case_points(&s.rows))
                    .name(&s.syndrome)
                    .color(state.syndrome_colors.color_for(&s.syndrome))
                    .width(1.5),
            );
        }
    });
}

/// Split the band into one quad per pair of neighbouring days.
/// Days without both bounds leave a gap.
fn band_quads(rows: &[TimeSeriesRow]) -> Vec<Vec<[f64; 2]>> {
    rows.windows(2)
        .filter_map(|w| {
            let (a, b) = (&w[0], &w[1]);
            let (al, au) = (a.expected_lowerbound?, a.expected_upperbound?);
            let (bl, bu) = (b.expected_lowerbound?, b.expected_upperbound?);
            let (xa, xb) = (date_to_x(a.date), date_to_x(b.date));
            Some(vec![[xa, al], [xb, bl], [xb, bu], [xa, au]])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Age distribution pies
// ---------------------------------------------------------------------------

/// One pie per syndrome, side by side.
pub fn age_pies(ui: &mut Ui, state: &AppState) {
    ui.strong("Syndrome Types sorted from most to least severe by age");
    let dists = &state.tables.age_distribution;
    if dists.is_empty() {
        return;
    }
    ui.columns(dists.len(), |cols| {
        for (col, dist) in cols.iter_mut().zip(dists) {
            col.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(&dist.syndrome).strong());
                age_pie(ui, dist, &state.age_colors);
            });
        }
    });
}

fn age_pie(ui: &mut Ui, dist: &AgeDistribution, colors: &ColorMap) {
    if dist.is_empty() || dist.total() <= 0.0 {
        ui.label(RichText::new("No data for the current filter").weak());
        return;
    }

    Plot::new(format!("pie_{}", dist.syndrome))
        .legend(Legend::default())
        .height(PIE_SIZE)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show(ui, |plot_ui| {
            // Start at 12 o'clock and run counter-clockwise.
            let mut start = FRAC_PI_2;
            for slice in &dist.slices {
                let sweep = slice.share * TAU;
                let name = format!("{}  {:.1}%", slice.age_group, slice.share * 100.0);
                let fill = colors.color_for(&slice.age_group);
                for wedge in wedge_polygons(start, sweep) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(wedge))
                            .name(&name)
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                }
                start += sweep;
            }
        });
}

/// Unit-circle wedge from `start` spanning `sweep` radians, cut into convex pieces.
fn wedge_polygons(start: f64, sweep: f64) -> Vec<Vec<[f64; 2]>> {
    if sweep <= 0.0 {
        return Vec::new();
    }
    let pieces = (sweep / MAX_WEDGE).ceil() as usize;
    let piece = sweep / pieces as f64;
    (0..pieces)
        .map(|p| {
            let from = start + piece * p as f64;
            let steps = 16;
            std::iter::once([0.0, 0.0])
                .chain((0..=steps).map(|i| {
                    let angle = from + piece * i as f64 / steps as f64;
                    [angle.cos(), angle.sin()]
                }))
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tabular view of the pies
// ---------------------------------------------------------------------------

/// Per-syndrome age table with summed cases and shares.
pub fn age_tables(ui: &mut Ui, state: &AppState) {
    egui::CollapsingHeader::new("Age distribution table")
        .id_salt("age_tables")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for dist in &state.tables.age_distribution {
                ui.label(RichText::new(&dist.syndrome).strong());
                ui.push_id(&dist.syndrome, |ui: &mut Ui| {
                    TableBuilder::new(ui)
                        .striped(true)
                        .column(Column::auto().at_least(80.0))
                        .column(Column::auto().at_least(120.0))
                        .column(Column::remainder())
                        .header(20.0, |mut header| {
                            header.col(|ui| {
                                ui.strong("Age group");
                            });
                            header.col(|ui| {
                                ui.strong("Relative cases");
                            });
                            header.col(|ui| {
                                ui.strong("Share");
                            });
                        })
                        .body(|mut body| {
                            for slice in &dist.slices {
                                body.row(18.0, |mut row| {
                                    row.col(|ui| {
                                        ui.label(&slice.age_group);
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("{:.2}", slice.relative_cases));
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("{:.1}%", slice.share * 100.0));
                                    });
                                });
                            }
                        });
                });
                ui.add_space(6.0);
            }
        });
}
