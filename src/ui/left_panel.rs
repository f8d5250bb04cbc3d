//! Left panel UI: area list, layer toggles, area details and barangay reports.

use super::colors;
use crate::areas::{Area, AreaKind};
use crate::reports::{CitizenReport, ReportStatus};
use crate::state::AppState;
use eframe::egui::{self, RichText, ScrollArea};

pub fn render_left_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(250.0)
        .min_width(200.0)
        .max_width(400.0)
        .show(ctx, |ui| {
            ui.heading("Areas");
            ui.separator();

            render_layer_toggles(ui, state);
            ui.add_space(5.0);

            if state.areas.show_area_details() {
                render_area_details(ui, state);
                ui.add_space(5.0);
            }

            if state.report_markers.show_report_details() {
                render_barangay_reports(ui, state);
                ui.add_space(5.0);
            }

            render_area_list(ui, state);
        });
}

fn render_layer_toggles(ui: &mut egui::Ui, state: &mut AppState) {
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= ui
            .checkbox(&mut state.layer_state.municipalities, "Municipalities")
            .changed();
        changed |= ui
            .checkbox(&mut state.layer_state.barangays, "Barangays")
            .changed();
    });
    let mut reports_changed = false;
    ui.horizontal(|ui| {
        ui.checkbox(&mut state.layer_state.labels, "Labels");
        reports_changed = ui
            .checkbox(&mut state.layer_state.reports, "Citizen reports")
            .changed();
    });

    if changed {
        state.sync_area_layers();
    }
    if reports_changed {
        state.sync_report_markers();
    }
}

fn render_area_details(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(area) = state.areas.selected_area().cloned() else {
        return;
    };

    let mut close = false;
    let mut reset = false;
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&area.name).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                close = ui.small_button(egui_phosphor::regular::X).clicked();
            });
        });
        detail_row(ui, "Type", area.kind.label());
        if let Some(parent) = &area.parent_municipality {
            detail_row(ui, "Municipality", parent);
        }
        if let Ok(bounds) = area.bounds() {
            detail_row(
                ui,
                "Extent",
                &format!(
                    "{:.3}..{:.3} E, {:.3}..{:.3} N",
                    bounds.min().x,
                    bounds.max().x,
                    bounds.min().y,
                    bounds.max().y
                ),
            );
        }
        if area.kind == AreaKind::Municipality {
            let count = state.registry.barangays_of(&area.name).len();
            detail_row(ui, "Barangays", &count.to_string());
        } else {
            let count = state.reports.count_by_barangay(&area.id);
            detail_row(ui, "Reports", &count.to_string());
        }
        if let Some(map) = state.map.as_ref() {
            let selection = state.areas.selection_state(map);
            if selection.is_locked && selection.selected_area_id.as_deref() == Some(area.id.as_str()) {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("Zooming to area").small().color(colors::ui::LABEL));
                });
            }
        }
        reset = ui.button("Reset view").clicked();
    });

    if close {
        state.close_area_details();
    }
    if reset {
        state.reset_view();
    }
}

fn render_barangay_reports(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(barangay_id) = state.report_markers.selected_barangay().map(str::to_string) else {
        return;
    };
    let reports: Vec<CitizenReport> = state
        .reports
        .by_barangay(&barangay_id)
        .into_iter()
        .cloned()
        .collect();
    let selected = state.report_markers.selected_report().map(str::to_string);
    let mut clicked = None;

    ui.group(|ui| {
        ui.label(RichText::new("Citizen reports").strong());
        ui.horizontal(|ui| {
            for status in ReportStatus::ALL {
                let count = state.reports.count_by_status(&barangay_id, status);
                ui.label(
                    RichText::new(format!("{} {}", status.label(), count))
                        .small()
                        .color(status.color()),
                );
            }
        });

        if reports.is_empty() {
            ui.label(
                RichText::new("No reports for this barangay")
                    .small()
                    .color(colors::ui::LABEL),
            );
            return;
        }

        for report in &reports {
            let is_selected = selected.as_deref() == Some(report.id.as_str());
            let text = RichText::new(format!("{} {}", report.status.icon(), report.title))
                .color(report.status.color());
            if ui.selectable_label(is_selected, text).clicked() {
                clicked = Some(report.id.clone());
            }
        }

        let focused = reports
            .iter()
            .find(|r| selected.as_deref() == Some(r.id.as_str()));
        if let Some(report) = focused {
            ui.separator();
            render_report_details(ui, report);
        }
    });

    if let Some(id) = clicked {
        state.fly_to_report(&id);
    }
}

fn render_report_details(ui: &mut egui::Ui, report: &CitizenReport) {
    ui.label(RichText::new(&report.title).strong());
    detail_row(ui, "Status", report.status.label());
    detail_row(ui, "Category", &report.category);
    if let Some(address) = &report.location.address {
        detail_row(ui, "Address", address);
    }
    if let Some(reporter) = &report.reporter_name {
        detail_row(ui, "Reported by", reporter);
    }
    detail_row(
        ui,
        "Submitted",
        &report.created_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    if report.updated_at != report.created_at {
        detail_row(
            ui,
            "Updated",
            &report.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        );
    }
    if !report.description.is_empty() {
        ui.label(RichText::new(&report.description).small());
    }
}

fn detail_row(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).small().color(colors::ui::LABEL));
        ui.label(RichText::new(value).small().color(colors::ui::VALUE));
    });
}

fn render_area_list(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(egui_phosphor::regular::MAGNIFYING_GLASS);
        ui.add(egui::TextEdit::singleline(&mut state.area_filter).hint_text("Filter areas"));
    });

    let selected = state.areas.selected_id().map(str::to_string);
    let matches: Vec<Area> = state
        .registry
        .search(&state.area_filter)
        .into_iter()
        .cloned()
        .collect();
    let mut clicked = None;

    ScrollArea::vertical().show(ui, |ui| {
        for kind in [AreaKind::Municipality, AreaKind::Barangay] {
            egui::CollapsingHeader::new(RichText::new(kind.label()).strong())
                .id_salt(kind.label())
                .default_open(true)
                .show(ui, |ui| {
                    for area in matches.iter().filter(|a| a.kind == kind) {
                        let is_selected = selected.as_deref() == Some(area.id.as_str());
                        let text = if is_selected {
                            RichText::new(&area.name).color(colors::ui::ACTIVE)
                        } else {
                            RichText::new(&area.name)
                        };
                        if ui.selectable_label(is_selected, text).clicked() {
                            clicked = Some(area.id.clone());
                        }
                    }
                });
        }
    });

    if let Some(id) = clicked {
        state.select_area(&id);
    }
}
