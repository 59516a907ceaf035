use crate::app::DatasetSyncApp;
use crate::config::{AppSection, Section};
use crate::core::upload::DEFAULT_RENAME_KEY;
use eframe::egui;
use egui_phosphor::regular as Icon;

/// Render the settings page
pub fn render_settings_page(app: &mut DatasetSyncApp, ctx: &egui::Context) {
    let config = app.store.snapshot();
    let degraded = app.store.is_degraded();

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(format!("{} Settings", Icon::GEAR));
                if app.settings.pending > 0 {
                    ui.spinner();
                    ui.label(egui::RichText::new("Saving...").weak());
                }
            });
            ui.label(
                egui::RichText::new(format!("File: {}", app.store.path().display()))
                    .small()
                    .weak(),
            );
            ui.add_space(10.0);

            if degraded {
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(255, 235, 200))
                    .rounding(4.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.colored_label(
                            egui::Color32::from_rgb(160, 80, 0),
                            format!(
                                "{} The settings file could not be read. Showing the last valid values.",
                                Icon::WARNING
                            ),
                        );
                    });
                ui.add_space(10.0);
            }

            ui.group(|ui| {
                ui.strong("Dataset");
                ui.add_space(6.0);

                let mut auto_rename = config.dataset.auto_rename;
                if ui
                    .checkbox(&mut auto_rename, "Rename images on upload")
                    .changed()
                {
                    app.persist_setting("Auto rename", Section::Dataset, "auto_rename", auto_rename);
                }

                ui.horizontal(|ui| {
                    ui.label("Rename key:");
                    let response = ui.add_enabled(
                        config.dataset.auto_rename,
                        egui::TextEdit::singleline(&mut app.settings.rename_key_input)
                            .hint_text(DEFAULT_RENAME_KEY)
                            .desired_width(160.0),
                    );
                    let unchanged =
                        app.settings.rename_key_input.trim() == config.dataset.auto_rename_key;
                    let submitted =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let apply = ui.add_enabled(
                        config.dataset.auto_rename && !unchanged,
                        egui::Button::new("✓ Apply"),
                    );
                    if (apply.clicked() || submitted) && !unchanged {
                        let key = app.settings.rename_key_input.trim().to_string();
                        app.persist_setting("Rename key", Section::Dataset, "auto_rename_key", key);
                    }
                });

                ui.add_space(6.0);
                egui::Grid::new("dataset_dirs")
                    .num_columns(3)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        directory_row(app, ui, "Save directory", "save_dir", &config.dataset.save_dir);
                        directory_row(app, ui, "Cache directory", "tmp_dir", &config.dataset.tmp_dir);
                    });
            });

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.strong("Application");
                ui.add_space(6.0);
                egui::Grid::new("app_identity")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        info_row(ui, "Name", or_fallback(&config.app.name, AppSection::FALLBACK_NAME));
                        info_row(
                            ui,
                            "Version",
                            or_fallback(&config.app.version, AppSection::FALLBACK_VERSION),
                        );
                        info_row(ui, "Description", &config.app.description);
                        info_row(ui, "Author", &config.app.author);
                        info_row(ui, "Startup", &config.app.startup);
                    });
            });

            if let Some(mysql) = &config.mysql {
                ui.add_space(10.0);
                ui.group(|ui| {
                    ui.strong(format!("{} Database", Icon::DATABASE));
                    ui.add_space(6.0);
                    egui::Grid::new("mysql_info")
                        .num_columns(2)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            info_row(ui, "Host", &format!("{}:{}", mysql.host, mysql.port));
                            info_row(ui, "User", &mysql.user);
                            info_row(ui, "Password", &"•".repeat(mysql.password.chars().count()));
                            info_row(ui, "Database", &mysql.dbname);
                            info_row(
                                ui,
                                "Connections",
                                &format!("{} open / {} idle", mysql.max_open_conns, mysql.max_idle_conns),
                            );
                        });
                });
            }
        });
    });
}

fn directory_row(
    app: &mut DatasetSyncApp,
    ui: &mut egui::Ui,
    label: &str,
    key: &'static str,
    current: &str,
) {
    ui.label(format!("{}:", label));
    if current.is_empty() {
        ui.label(egui::RichText::new("Not set").weak().italics());
    } else {
        ui.monospace(current);
    }
    if ui.button(format!("{} Change", Icon::FOLDER_OPEN)).clicked() {
        app.change_directory(label, key);
    }
    ui.end_row();
}

fn info_row(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.label(egui::RichText::new(label).weak());
    ui.label(value);
    ui.end_row();
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
