//! Satellite change-detection analyses.
//!
//! Seven kinds share one request/response shape with a kind-specific data
//! field. The client owns per-kind status and results, the layer manager
//! owns the overlays, and the transport performs the HTTP calls.

mod client;
mod error;
mod kind;
mod layers;
mod result;
mod transport;

pub use client::{
    AnalysisClient, AnalysisCompletion, AnalysisRequest, AnalysisStatus, CompletionOutcome,
    PendingAnalysis,
};
pub use error::AnalysisError;
pub use kind::AnalysisKind;
pub use layers::AnalysisLayerManager;
pub use transport::{Endpoint, HealthReport, ServiceChannel, ServiceEvent};

#[cfg(test)]
pub use transport::interpret_response;
