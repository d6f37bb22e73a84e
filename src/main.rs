mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::CellDatabaseApp;
use clap::Parser;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::parse();
    let state = match config.store() {
        Some(store) => {
            log::info!("Reading table '{}' from {}", config.table, store.describe());
            AppState::with_store(store, config.table.clone())
        }
        None => AppState::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cell Database",
        options,
        Box::new(|_cc| Ok(Box::new(CellDatabaseApp::new(state)))),
    )
}
