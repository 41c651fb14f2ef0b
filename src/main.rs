use std::sync::Arc;

use crop_annotator::app::AnnotatorApp;
use crop_annotator::backend::HttpBackend;
use crop_annotator::config::{BackendConfig, EditorOptions};
use crop_annotator::worker::BackendWorker;
use eframe::egui;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match BackendConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: crop-annotator [backend-url]");
            std::process::exit(1);
        }
    };
    log::info!("Using backend at {}", config.base_url);

    let worker = match BackendWorker::spawn(Arc::new(HttpBackend::new(config.clone()))) {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("Failed to start backend request thread: {}", e);
            std::process::exit(1);
        }
    };

    let title = format!("Image Annotator - {}", config.base_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(AnnotatorApp::new(
                config,
                worker,
                EditorOptions::default(),
            )))
        }),
    )
    .expect("Failed to run eframe");
}
