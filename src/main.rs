mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "surveillance-dashboard")]
#[command(about = "Emergency admission surveillance dashboard", long_about = None)]
struct Cli {
    /// Surveillance extract (.csv, .json or .parquet) to open on startup
    #[arg(long, env = "SURVEILLANCE_DATA")]
    data: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut state = AppState::default();
    if let Some(path) = &cli.data {
        let dataset = data::loader::load_file(path).context("startup dataset failed to load")?;
        state.set_dataset(dataset);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Emergency Admission Surveillance",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
