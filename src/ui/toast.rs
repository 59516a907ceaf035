use crate::app::DatasetSyncApp;
use crate::state::ToastLevel;
use eframe::egui;
use egui_phosphor::regular as Icon;

/// Render queued notifications stacked in the top-right corner
pub fn render_toasts(app: &DatasetSyncApp, ctx: &egui::Context) {
    if app.toasts.is_empty() {
        return;
    }

    let screen = ctx.screen_rect();
    egui::Area::new(egui::Id::new("toasts"))
        .order(egui::Order::Foreground)
        .fixed_pos(egui::pos2(screen.right() - 340.0, screen.top() + 20.0))
        .show(ctx, |ui| {
            ui.set_width(320.0);
            for toast in app.toasts.iter() {
                let (icon, accent) = match toast.level {
                    ToastLevel::Info => (Icon::CHECK_CIRCLE, egui::Color32::from_rgb(70, 130, 220)),
                    ToastLevel::Warning => (Icon::WARNING, egui::Color32::from_rgb(255, 150, 0)),
                    ToastLevel::Error => (Icon::X_CIRCLE, egui::Color32::from_rgb(220, 50, 50)),
                };

                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(45, 45, 48))
                    .stroke(egui::Stroke::new(1.0, accent))
                    .rounding(6.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_width(296.0);
                        ui.horizontal_wrapped(|ui| {
                            ui.label(egui::RichText::new(icon).size(18.0).color(accent));
                            ui.label(
                                egui::RichText::new(&toast.message).color(egui::Color32::WHITE),
                            );
                        });
                    });
                ui.add_space(6.0);
            }
        });
}
