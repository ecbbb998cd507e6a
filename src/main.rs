use std::sync::Arc;

use eframe::egui;
use inpaint_studio::{Config, GeminiGateway, StudioApp};
use log::info;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let config = Config::load().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    info!("Run with config: {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(config.viewport),
        ..Default::default()
    };

    eframe::run_native(
        "Inpaint Studio",
        options,
        Box::new(move |_cc| {
            let gateway = Arc::new(GeminiGateway::from_env(&config));
            Ok(Box::new(StudioApp::new(gateway)))
        }),
    )
}
