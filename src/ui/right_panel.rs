//! Right panel UI: analysis runs, results, and base map.

use super::colors;
use crate::analysis::{AnalysisKind, AnalysisStatus};
use crate::map::BaseStyle;
use crate::state::AppState;
use eframe::egui::{self, Color32, RichText, ScrollArea};

pub fn render_right_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::SidePanel::right("right_panel")
        .resizable(true)
        .default_width(260.0)
        .min_width(200.0)
        .max_width(380.0)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Analysis");
                ui.separator();

                render_target_section(ui, state);
                ui.add_space(5.0);

                for kind in AnalysisKind::ALL {
                    render_kind_section(ui, state, kind);
                }
                ui.add_space(5.0);

                render_base_map_section(ui, state);
            });
        });
}

fn render_target_section(ui: &mut egui::Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Area & Dates").strong())
        .default_open(true)
        .show(ui, |ui| {
            match state.areas.selected_area() {
                Some(area) => ui.label(
                    RichText::new(format!("{} ({})", area.name, area.kind.label()))
                        .color(colors::ui::ACTIVE),
                ),
                None => ui.label(
                    RichText::new("Select an area on the map or in the list")
                        .small()
                        .color(colors::ui::LABEL),
                ),
            };

            egui::Grid::new("date_range_grid")
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label("Start");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.date_range.start_input)
                            .desired_width(100.0)
                            .font(egui::FontId::monospace(12.0)),
                    );
                    ui.end_row();

                    ui.label("End");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.date_range.end_input)
                            .desired_width(100.0)
                            .font(egui::FontId::monospace(12.0)),
                    );
                    ui.end_row();
                });

            if let Err(message) = state.date_range.parse() {
                ui.label(RichText::new(message).small().color(colors::ui::ERROR));
            }
        });
}

fn status_color(status: AnalysisStatus) -> Color32 {
    match status {
        AnalysisStatus::Idle => colors::ui::LABEL,
        AnalysisStatus::Running => colors::ui::ACTIVE,
        AnalysisStatus::Succeeded => colors::ui::SUCCESS,
        AnalysisStatus::Failed => colors::ui::ERROR,
    }
}

fn render_kind_section(ui: &mut egui::Ui, state: &mut AppState, kind: AnalysisKind) {
    let status = state.analysis.status(kind);
    let header = RichText::new(format!("{} {}", kind.icon(), kind.label())).strong();

    egui::CollapsingHeader::new(header)
        .id_salt(kind.slug())
        .default_open(kind == AnalysisKind::Flood)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let can_run = state.areas.selected_area().is_some();
                if ui
                    .add_enabled(can_run, egui::Button::new("Run"))
                    .on_disabled_hover_text("Select an area first")
                    .clicked()
                {
                    state.run_analysis(kind);
                }

                if status == AnalysisStatus::Running {
                    ui.spinner();
                }
                ui.label(RichText::new(status.label()).small().color(status_color(status)));
            });

            if let Some(error) = &state.analysis.state(kind).last_error {
                ui.label(
                    RichText::new(error.to_string())
                        .small()
                        .color(colors::ui::ERROR),
                );
            }

            let Some(result) = state.analysis.result(kind).cloned() else {
                return;
            };

            ui.horizontal(|ui| {
                let mut visible = state.analysis_layers.is_visible(kind);
                let has_features = result.feature_count() > 0;
                if ui
                    .add_enabled(has_features, egui::Checkbox::new(&mut visible, "Show on map"))
                    .changed()
                {
                    state.toggle_analysis(kind);
                }
                if ui.small_button("Clear").clicked() {
                    state.clear_analysis(kind);
                }
            });

            egui::Grid::new(format!("{}_result_grid", kind.slug()))
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label(RichText::new("Method").small().color(colors::ui::LABEL));
                    ui.label(
                        RichText::new(kind.detection_method())
                            .small()
                            .color(colors::ui::VALUE),
                    );
                    ui.end_row();
                    for (label, value) in result.summary() {
                        ui.label(RichText::new(label).small().color(colors::ui::LABEL));
                        ui.label(RichText::new(value).small().color(colors::ui::VALUE));
                        ui.end_row();
                    }
                });
        });
}

fn render_base_map_section(ui: &mut egui::Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Base Map").strong())
        .default_open(false)
        .show(ui, |ui| {
            let current = state.config.base_style;
            let mut chosen = current;
            egui::ComboBox::from_id_salt("base_style_selector")
                .selected_text(current.label())
                .width(150.0)
                .show_ui(ui, |ui| {
                    for style in BaseStyle::all() {
                        ui.selectable_value(&mut chosen, *style, style.label())
                            .on_hover_text(style.description());
                    }
                });
            if chosen != current {
                state.set_base_style(chosen.key());
            }
        });
}
