#![warn(clippy::all)]

//! Environmental Monitoring Workbench - a map dashboard for satellite
//! change detection over administrative areas.
//!
//! Areas are selected on the map or from a list; flood, forest, built-up,
//! water, dumpsite, logging and fire analyses run against a remote service
//! and come back as map overlays.

mod analysis;
mod areas;
mod config;
mod geo;
mod map;
mod reports;
mod state;
mod ui;

use analysis::{Endpoint, ServiceChannel};
use config::DashboardConfig;
use eframe::egui;
use state::{AppState, ServiceHealth};
use std::time::Duration;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Environmental Monitoring Workbench",
        native_options,
        Box::new(|cc| Ok(Box::new(EnvMonitorApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to mount the app in");
            return;
        };

        let canvas = match document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        {
            Some(canvas) => canvas,
            None => {
                log::error!("app_canvas is missing or not a canvas element");
                return;
            }
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(EnvMonitorApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct EnvMonitorApp {
    /// Application state containing all sub-states
    state: AppState,

    /// Channel for analysis and health requests
    service: ServiceChannel,
}

impl EnvMonitorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let config = DashboardConfig::load();
        Self {
            state: AppState::new(config),
            service: ServiceChannel::new(),
        }
    }

    fn endpoint(&self, timeout_secs: u64) -> Endpoint {
        Endpoint {
            base_url: self.state.config.api_base_url.clone(),
            timeout_secs,
        }
    }

    /// Hands queued requests to the transport.
    fn flush_requests(&mut self, ctx: &egui::Context) {
        if self.state.health_check_requested {
            self.state.health_check_requested = false;
            self.state.health = ServiceHealth::Checking;
            let endpoint = self.endpoint(self.state.config.health_timeout_secs);
            self.service.check_health(ctx.clone(), endpoint);
        }

        for pending in std::mem::take(&mut self.state.outbox) {
            let endpoint = self.endpoint(self.state.config.request_timeout_secs);
            self.service.analyze(ctx.clone(), endpoint, pending);
        }
    }
}

impl eframe::App for EnvMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Some(event) = self.service.try_recv() {
            self.state.apply_service_event(event);
        }

        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        if let Some(map) = self.state.map.as_mut() {
            if let Some(id) = map.advance(Duration::from_secs_f32(dt)) {
                log::debug!("Camera transition {:?} finished", id);
            }
            if map.camera().active().is_some() {
                ctx.request_repaint();
            }
        }

        ui::render_top_bar(ctx, &mut self.state);
        ui::render_left_panel(ctx, &mut self.state);
        ui::render_right_panel(ctx, &mut self.state);
        ui::render_canvas(ctx, &mut self.state);

        self.flush_requests(ctx);

        if self.state.analysis.any_running() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
