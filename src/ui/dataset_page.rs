use crate::app::DatasetSyncApp;
use crate::core::catalog::SortKey;
use crate::models::{DatasetRecord, SyncStatus};
use eframe::egui;
use egui_phosphor::regular as Icon;

const CARD_WIDTH: f32 = 220.0;
const COVER_HEIGHT: f32 = 160.0;

/// Render the datasets page: toolbar plus a grid of dataset cards
pub fn render_dataset_page(app: &mut DatasetSyncApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("dataset_toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui
                .button(format!("{} New Dataset", Icon::PLUS))
                .clicked()
            {
                app.datasets.show_create_dialog = true;
                app.datasets.create_error = None;
            }

            ui.add_space(20.0);

            if ui
                .button(format!("{} Search", Icon::MAGNIFYING_GLASS))
                .clicked()
            {
                app.datasets.show_search = !app.datasets.show_search;
                if !app.datasets.show_search {
                    // Hiding the box clears the search
                    app.datasets.search_input.clear();
                    app.search_datasets("");
                }
            }

            if app.datasets.show_search {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut app.datasets.search_input)
                        .hint_text("Search datasets...")
                        .desired_width(240.0),
                );
                if response.changed() {
                    let keyword = app.datasets.search_input.clone();
                    app.search_datasets(&keyword);
                }
            }

            ui.add_space(20.0);

            let selected = app
                .catalog
                .sort_key()
                .map(|k| k.label())
                .unwrap_or("Sort");
            egui::ComboBox::from_id_salt("dataset_sort")
                .selected_text(format!("{} {}", Icon::SORT_ASCENDING, selected))
                .show_ui(ui, |ui| {
                    for key in SortKey::ALL {
                        if ui
                            .selectable_label(app.catalog.sort_key() == Some(key), key.label())
                            .clicked()
                        {
                            app.catalog.sort_by(key);
                        }
                    }
                });

            ui.label(format!(
                "{} of {} datasets",
                app.catalog.visible_count(),
                app.catalog.all().len()
            ));
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if app.catalog.visible_count() == 0 {
            ui.centered_and_justified(|ui| {
                ui.heading(format!("{} No matching dataset", Icon::MAGNIFYING_GLASS));
            });
            return;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for dataset in app.catalog.visible() {
                        render_card(ui, dataset);
                    }
                });
            });
    });
}

fn render_card(ui: &mut egui::Ui, dataset: &DatasetRecord) {
    egui::Frame::group(ui.style())
        .rounding(6.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                let cover_size = egui::vec2(CARD_WIDTH, COVER_HEIGHT);
                if dataset.cover.is_file() {
                    ui.add(
                        egui::Image::new(format!("file://{}", dataset.cover.display()))
                            .fit_to_exact_size(cover_size)
                            .maintain_aspect_ratio(true),
                    );
                } else {
                    ui.allocate_ui(cover_size, |ui| {
                        ui.centered_and_justified(|ui| {
                            ui.label(egui::RichText::new(Icon::IMAGE).size(48.0).weak());
                        });
                    });
                }

                ui.vertical_centered(|ui| {
                    ui.strong(&dataset.name);
                });
                ui.label(format!("Images: {}", dataset.image_count));
                ui.label(format!(
                    "Last updated: {}",
                    dataset.updated_at.format("%Y-%m-%d")
                ));
                let status_color = match dataset.status {
                    SyncStatus::Synced => egui::Color32::from_rgb(0, 128, 0),
                    SyncStatus::Pending => egui::Color32::from_rgb(255, 150, 0),
                };
                ui.colored_label(status_color, format!("Status: {}", dataset.status.label()));
            });
        });
}

/// Render the "new dataset" dialog
pub fn render_create_dataset_dialog(app: &mut DatasetSyncApp, ctx: &egui::Context) {
    if !app.datasets.show_create_dialog {
        return;
    }

    let mut submit = false;
    let mut cancel = false;
    egui::Window::new(format!("{} New Dataset", Icon::PLUS))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Name");
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.datasets.new_dataset_name)
                    .hint_text("Name of the new dataset")
                    .desired_width(300.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            if let Some(error) = &app.datasets.create_error {
                ui.colored_label(egui::Color32::from_rgb(220, 50, 50), error);
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("✓ Add").clicked() {
                    submit = true;
                }
                if ui.button("✗ Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    // Handle actions outside of the borrow
    if submit {
        app.create_dataset();
    }
    if cancel {
        app.datasets.show_create_dialog = false;
        app.datasets.new_dataset_name.clear();
        app.datasets.create_error = None;
    }
}
