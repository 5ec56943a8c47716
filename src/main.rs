//! Interactive Sales Tracker Dashboard
//!
//! Loads the sales tracker sheet, filters it by AC and date range, and shows
//! the rows, per-AC totals and a performance chart.

mod charts;
mod config;
mod data;
mod export;
mod gui;
mod pipeline;
mod stats;

use config::{DashboardConfig, CONFIG_FILE_NAME};
use eframe::egui;
use gui::DashboardApp;
use std::path::Path;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE_NAME));
    let title = config.window_title.clone();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
}
