//! UI modules for the monitoring dashboard.
//!
//! The UI is split into distinct panels:
//! - Top bar: Title, status, and service health
//! - Left panel: Area list, area layer toggles, and area details
//! - Central canvas: The map
//! - Right panel: Analysis runs, results, and base map

mod canvas;
mod colors;
mod left_panel;
mod right_panel;
mod top_bar;

pub use canvas::render_canvas;
pub use left_panel::render_left_panel;
pub use right_panel::render_right_panel;
pub use top_bar::render_top_bar;
