//! Citizen reports shown as map markers and listed per barangay.

mod markers;
mod registry;

pub use markers::{ReportManager, MARKER_SIZE};
pub use registry::{CitizenReport, ReportRegistry, ReportStatus};
