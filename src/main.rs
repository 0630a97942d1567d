mod app;
mod chart;
mod config;
mod error;
mod loader;
mod logging;
mod model;
mod stats;
mod ui;
mod validate;

use config::{AppConfig, CONFIG_PATH};
use eframe::egui;
use std::path::Path;
use ui::PriceApp;

fn main() -> eframe::Result<()> {
    logging::init_logging();

    let config = AppConfig::load_or_default(Path::new(CONFIG_PATH));
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Price History",
        options,
        Box::new(|cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(PriceApp::new(config)))
        }),
    )
}
