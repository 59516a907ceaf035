use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn};

mod app;
mod config;
mod core;
mod database;
mod logging;
mod models;
mod state;
mod ui;

use app::DatasetSyncApp;
use config::{ConfigStore, DEFAULT_CONFIG_PATH};
use database::MockDatabase;

const WINDOW_WIDTH: f32 = 1200.0;
const WINDOW_HEIGHT: f32 = 800.0;
const COVER_FILE: &str = "cover.jpg";

fn main() -> Result<(), eframe::Error> {
    logging::setup_logging();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    info!("Loading configuration from {:?}", config_path);

    let store = match ConfigStore::load(&config_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot start without configuration: {}", e);
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Dataset-Sync")
                .set_description(format!("Failed to load configuration:\n{}", e))
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
            std::process::exit(1);
        }
    };

    let (title, save_dir) = store.read(|c| {
        if !c.app.has_identity() {
            warn!("app.name or app.version missing, using built-in identity");
        }
        (c.app.window_title(), PathBuf::from(&c.dataset.save_dir))
    });
    // Shared placeholder cover for the generated datasets
    let provider = MockDatabase::new().with_cover(save_dir.join(COVER_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_title(&title),
        ..Default::default()
    };

    info!("Launching application window");
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            egui_extras::install_image_loaders(&cc.egui_ctx);

            Ok(Box::new(DatasetSyncApp::new(store, &provider)))
        }),
    )
}
