use crate::app::DatasetSyncApp;
use crate::state::Page;
use eframe::egui;
use egui_phosphor::regular as Icon;

/// Render the left navigation panel
pub fn render_sidebar(app: &mut DatasetSyncApp, ctx: &egui::Context) {
    egui::SidePanel::left("navigation")
        .resizable(false)
        .exact_width(150.0)
        .show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading(format!("{} Dataset-Sync", Icon::IMAGES));
            ui.add_space(20.0);

            nav_button(ui, app, Page::Datasets, format!("{} Datasets", Icon::DATABASE));
            nav_button(ui, app, Page::Upload, format!("{} Upload", Icon::UPLOAD_SIMPLE));

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.add_space(10.0);
                let theme_label = if app.dark_mode {
                    format!("{} Light mode", Icon::SUN)
                } else {
                    format!("{} Dark mode", Icon::MOON)
                };
                if ui.button(theme_label).clicked() {
                    app.dark_mode = !app.dark_mode;
                }
                nav_button(ui, app, Page::Settings, format!("{} Settings", Icon::GEAR));
            });
        });
}

fn nav_button(ui: &mut egui::Ui, app: &mut DatasetSyncApp, page: Page, label: String) {
    if ui.selectable_label(app.page == page, label).clicked() {
        app.page = page;
    }
}
