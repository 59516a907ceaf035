use crate::app::DatasetSyncApp;
use crate::models::UploadStatus;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_phosphor::regular as Icon;
use std::path::PathBuf;

const DROP_ZONE_HEIGHT: f32 = 180.0;
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff"];

/// Render the upload page: drop zone, running job and upload history
pub fn render_upload_page(app: &mut DatasetSyncApp, ctx: &egui::Context) {
    // Files dropped anywhere on the window while this page is open
    let dropped: Vec<PathBuf> = ctx.input(|i| {
        i.raw
            .dropped_files
            .iter()
            .filter_map(|f| f.path.clone())
            .collect()
    });
    let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
    if !dropped.is_empty() {
        app.upload.highlight();
        app.start_upload(dropped);
    }

    egui::TopBottomPanel::top("upload_top")
        .resizable(false)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Upload into:");
                let selected = app
                    .upload
                    .target_dataset
                    .clone()
                    .unwrap_or_else(|| "Choose dataset".to_string());
                egui::ComboBox::from_id_salt("upload_target")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for dataset in app.catalog.all() {
                            let is_selected =
                                app.upload.target_dataset.as_deref() == Some(dataset.name.as_str());
                            if ui.selectable_label(is_selected, &dataset.name).clicked() {
                                app.upload.target_dataset = Some(dataset.name.clone());
                            }
                        }
                    });

                let (auto_rename, key) =
                    app.store.read(|c| (c.dataset.auto_rename, c.dataset.auto_rename_key.clone()));
                if auto_rename {
                    ui.label(
                        egui::RichText::new(format!("Auto rename on (key \"{}\")", key)).weak(),
                    );
                }
            });
            ui.add_space(8.0);

            render_drop_zone(app, ui, hovering);
            ui.add_space(8.0);

            render_active_upload(app, ui);
        });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading(format!("{} Upload history", Icon::CLOCK));
        ui.add_space(6.0);
        render_history(app, ui);
    });
}

fn render_drop_zone(app: &mut DatasetSyncApp, ui: &mut egui::Ui, hovering: bool) {
    let fill = if hovering || app.upload.is_highlighted() {
        egui::Color32::from_rgb(220, 220, 250)
    } else {
        ui.visuals().faint_bg_color
    };

    egui::Frame::none()
        .fill(fill)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(150, 150, 150)))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_min_height(DROP_ZONE_HEIGHT);
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                ui.label(egui::RichText::new(Icon::CLOUD_ARROW_UP).size(40.0));
                ui.label("Drop images here");
                ui.label(egui::RichText::new("or").weak());
                if ui
                    .add_enabled(
                        !app.upload.is_uploading(),
                        egui::Button::new(format!("{} Choose files", Icon::FOLDER_OPEN)),
                    )
                    .clicked()
                {
                    if let Some(files) = rfd::FileDialog::new()
                        .add_filter("Images", &IMAGE_EXTENSIONS)
                        .pick_files()
                    {
                        app.start_upload(files);
                    }
                }
            });
        });
}

fn render_active_upload(app: &mut DatasetSyncApp, ui: &mut egui::Ui) {
    let mut cancel = false;
    if let Some(active) = &app.upload.active {
        ui.horizontal(|ui| {
            let done = active.progress.iter().filter(|p| **p >= 1.0).count();
            ui.add(
                egui::ProgressBar::new(active.overall_progress())
                    .desired_width(300.0)
                    .text(format!("{} / {} files", done, active.names.len())),
            );
            if let Some(current) = active.names.get(done) {
                ui.label(format!("Uploading {}", current));
            }
            if ui.button("✗ Cancel").clicked() {
                cancel = true;
            }
        });
        ui.add_space(8.0);
    }

    // Handle actions outside of the borrow
    if cancel {
        app.cancel_upload();
    }
}

fn render_history(app: &DatasetSyncApp, ui: &mut egui::Ui) {
    let history = &app.upload.history;
    let row_height = 22.0;

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::remainder().at_least(160.0).clip(true))
        .column(Column::auto().at_least(70.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(140.0))
        .header(row_height, |mut header| {
            for title in [
                "Dataset", "Image", "Path", "Size", "Progress", "Status", "Uploaded",
            ] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(row_height, history.len(), |mut row| {
                let record = &history[row.index()];
                let color = status_color(record.status);
                row.col(|ui| {
                    ui.label(&record.dataset_name);
                });
                row.col(|ui| {
                    ui.label(&record.image_name);
                });
                row.col(|ui| {
                    ui.label(record.image_path.display().to_string());
                });
                row.col(|ui| {
                    ui.label(record.size_label());
                });
                row.col(|ui| {
                    ui.add(
                        egui::ProgressBar::new(record.status.progress())
                            .desired_width(100.0)
                            .fill(color),
                    );
                });
                row.col(|ui| {
                    ui.colored_label(color, record.status.label());
                });
                row.col(|ui| {
                    ui.label(record.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string());
                });
            });
        });
}

fn status_color(status: UploadStatus) -> egui::Color32 {
    match status {
        UploadStatus::Succeeded => egui::Color32::from_rgb(0, 128, 0),
        UploadStatus::Failed => egui::Color32::from_rgb(220, 0, 0),
        UploadStatus::InProgress => egui::Color32::from_rgb(0, 122, 255),
    }
}
