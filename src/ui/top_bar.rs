//! Top bar UI: app title, status, and service health.

use super::colors;
use crate::state::{AppState, ServiceHealth};
use eframe::egui::{self, Color32, RichText};
use egui_phosphor::regular;

pub fn render_top_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new(format!("{} Environmental Monitoring", regular::GLOBE_HEMISPHERE_EAST))
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button(regular::HOUSE)
                        .on_hover_text("Reset to the default view")
                        .clicked()
                    {
                        state.reset_view();
                    }
                    if ui
                        .small_button(regular::ARROWS_CLOCKWISE)
                        .on_hover_text("Check analysis service")
                        .clicked()
                    {
                        state.health_check_requested = true;
                    }
                    render_health(ui, &state.health);
                });
            });
        });
}

fn render_health(ui: &mut egui::Ui, health: &ServiceHealth) {
    let (text, color, hover) = match health {
        ServiceHealth::Unknown => ("Service: unknown".to_string(), colors::ui::LABEL, None),
        ServiceHealth::Checking => ("Service: checking...".to_string(), colors::ui::VALUE, None),
        ServiceHealth::Online(report) if !report.is_ok() => (
            format!("Service: {}", report.status),
            colors::ui::WARNING,
            Some(format!("Earth Engine: {}", report.gee_status)),
        ),
        ServiceHealth::Online(report) if report.satellite_ready() => (
            "Service: online".to_string(),
            colors::ui::SUCCESS,
            Some(format!("Earth Engine: {}\n{}", report.gee_status, report.timestamp)),
        ),
        ServiceHealth::Online(report) => (
            "Service: online, satellite data unavailable".to_string(),
            colors::ui::WARNING,
            Some(format!("Earth Engine: {}", report.gee_status)),
        ),
        ServiceHealth::Offline(reason) => (
            "Service: offline".to_string(),
            colors::ui::ERROR,
            Some(reason.clone()),
        ),
    };

    let response = ui.label(RichText::new(text).size(12.0).color(color));
    if let Some(hover) = hover {
        response.on_hover_text(hover);
    }
}
