use crate::map::MapError;
use chrono::NaiveDate;
use thiserror::Error;

/// Error code the service sends when the satellite provider is not available.
pub const SATELLITE_UNAVAILABLE_CODE: &str = "SATELLITE_UNAVAILABLE";

/// Failures of an analysis run, from precondition checks to transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Map not initialized")]
    MapNotInitialized,

    #[error("Area '{0}' has no boundary geometry")]
    MissingGeometry(String),

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Analysis failed (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Cannot connect to the analysis server at {url}. Please ensure the backend server is running.")]
    ServiceUnreachable { url: String, reason: String },

    #[error("Satellite data service is not available: {0}")]
    SatelliteUnavailable(String),

    #[error("Analysis timed out after {0} s")]
    Timeout(u64),

    #[error("Unexpected response from the analysis server: {0}")]
    Decode(String),

    /// Any other transport failure, with the client's own message.
    #[error("{0}")]
    Transport(String),

    #[error("Analysis request ended without a response")]
    Aborted,

    #[error(transparent)]
    Map(#[from] MapError),
}
