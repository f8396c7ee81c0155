mod app;
mod chart;
mod color;
mod config;
mod dashboard;
mod data;
mod state;
mod ui;

use app::DatasetExplorerApp;
use config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dataset Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(DatasetExplorerApp::new(config)))),
    )
}
