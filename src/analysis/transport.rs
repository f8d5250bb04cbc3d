//! HTTP transport for the analysis service.
//!
//! Requests are async but egui's update() is synchronous. Work runs on a
//! worker thread (native) or a local future (wasm) and reports back through
//! a channel that the frame loop drains.

use super::client::{AnalysisCompletion, PendingAnalysis};
use super::error::{AnalysisError, SATELLITE_UNAVAILABLE_CODE};
use super::kind::AnalysisKind;
use super::result::AnalysisResult;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use web_time::Instant;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub gee_status: String,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Whether the satellite provider is authenticated on the server.
    pub fn satellite_ready(&self) -> bool {
        self.gee_status == "Authenticated"
    }
}

/// Messages delivered to the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    Analysis(AnalysisCompletion),
    Health(Result<HealthReport, AnalysisError>),
}

/// Where and how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Turns a status code and body into a result for `kind`.
pub fn interpret_response(
    kind: AnalysisKind,
    status: u16,
    body: &str,
) -> Result<AnalysisResult, AnalysisError> {
    if (200..300).contains(&status) {
        let result = AnalysisResult::parse(kind, body)?;
        if !result.success() {
            return Err(AnalysisError::Server {
                status,
                message: "service reported an unsuccessful analysis".to_string(),
            });
        }
        return Ok(result);
    }

    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (message, code) = match parsed {
        Some(ErrorBody { error, code }) => (error, code),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| format!("HTTP {}", status));

    if code.as_deref() == Some(SATELLITE_UNAVAILABLE_CODE) || message.contains("Earth Engine") {
        return Err(AnalysisError::SatelliteUnavailable(message));
    }
    Err(AnalysisError::Server { status, message })
}

/// Decodes a health body.
pub fn interpret_health(status: u16, body: &str) -> Result<HealthReport, AnalysisError> {
    if !(200..300).contains(&status) {
        return Err(AnalysisError::Server {
            status,
            message: "health check failed".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| AnalysisError::Decode(e.to_string()))
}

/// Sends exactly one completion for a request, `Aborted` if the worker never reports.
struct CompletionGuard {
    sender: Sender<ServiceEvent>,
    ctx: egui::Context,
    kind: AnalysisKind,
    token: u64,
    started: Instant,
    sent: bool,
}

impl CompletionGuard {
    fn finish(mut self, outcome: Result<AnalysisResult, AnalysisError>) {
        self.sent = true;
        let elapsed = self.started.elapsed().as_secs_f64();
        match &outcome {
            Ok(result) => log::info!(
                "{} analysis returned {} features in {:.1}s",
                self.kind,
                result.feature_count(),
                elapsed
            ),
            Err(e) => log::warn!("{} analysis failed after {:.1}s: {}", self.kind, elapsed, e),
        }
        self.send(outcome);
    }

    fn send(&self, outcome: Result<AnalysisResult, AnalysisError>) {
        let _ = self.sender.send(ServiceEvent::Analysis(AnalysisCompletion {
            kind: self.kind,
            token: self.token,
            outcome,
        }));
        self.ctx.request_repaint();
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.sent {
            log::warn!("{} request dropped without a response", self.kind);
            self.send(Err(AnalysisError::Aborted));
        }
    }
}

/// Channel bridging background requests with the UI thread.
pub struct ServiceChannel {
    sender: Sender<ServiceEvent>,
    receiver: Receiver<ServiceEvent>,
}

impl Default for ServiceChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceChannel {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// POSTs a pending analysis in the background.
    pub fn analyze(&self, ctx: egui::Context, endpoint: Endpoint, pending: PendingAnalysis) {
        let guard = CompletionGuard {
            sender: self.sender.clone(),
            ctx,
            kind: pending.kind,
            token: pending.token,
            started: Instant::now(),
            sent: false,
        };
        let url = endpoint.url(&pending.endpoint);
        log::info!("Sending {} request to {}", pending.kind, url);

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            let outcome = native::post_analysis(&endpoint, &url, pending.kind, &pending.body);
            guard.finish(outcome);
        });

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = web::post_analysis(&endpoint, &url, pending.kind, &pending.body).await;
            guard.finish(outcome);
        });
    }

    /// Queries `/health` in the background.
    pub fn check_health(&self, ctx: egui::Context, endpoint: Endpoint) {
        let sender = self.sender.clone();
        let url = endpoint.url("/health");

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            let report = native::get_health(&endpoint, &url);
            let _ = sender.send(ServiceEvent::Health(report));
            ctx.request_repaint();
        });

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let report = web::get_health(&endpoint, &url).await;
            let _ = sender.send(ServiceEvent::Health(report));
            ctx.request_repaint();
        });
    }

    /// Non-blocking check for a finished request.
    pub fn try_recv(&self) -> Option<ServiceEvent> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::time::Duration;

    fn client(timeout_secs: u64) -> Result<reqwest::blocking::Client, reqwest::Error> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
    }

    fn map_error(endpoint: &Endpoint, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(endpoint.timeout_secs)
        } else if e.is_connect() {
            AnalysisError::ServiceUnreachable {
                url: endpoint.base_url.clone(),
                reason: e.to_string(),
            }
        } else if e.is_decode() {
            AnalysisError::Decode(e.to_string())
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }

    pub(super) fn post_analysis(
        endpoint: &Endpoint,
        url: &str,
        kind: AnalysisKind,
        body: &serde_json::Value,
    ) -> Result<AnalysisResult, AnalysisError> {
        let response = client(endpoint.timeout_secs)
            .and_then(|c| c.post(url).json(body).send())
            .map_err(|e| map_error(endpoint, e))?;
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| map_error(endpoint, e))?;
        interpret_response(kind, status, &text)
    }

    pub(super) fn get_health(endpoint: &Endpoint, url: &str) -> Result<HealthReport, AnalysisError> {
        let response = client(endpoint.timeout_secs)
            .and_then(|c| c.get(url).send())
            .map_err(|e| map_error(endpoint, e))?;
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| map_error(endpoint, e))?;
        interpret_health(status, &text)
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use futures_util::future::{select, Either};
    use std::future::Future;

    /// Resolves after `secs` seconds using the browser timer.
    async fn sleep(secs: u64) {
        let millis = (secs.saturating_mul(1000)).min(i32::MAX as u64) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    async fn with_timeout<T>(
        endpoint: &Endpoint,
        request: impl Future<Output = Result<T, AnalysisError>>,
    ) -> Result<T, AnalysisError> {
        let request = Box::pin(request);
        let timer = Box::pin(sleep(endpoint.timeout_secs));
        match select(request, timer).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(_) => Err(AnalysisError::Timeout(endpoint.timeout_secs)),
        }
    }

    /// Fetch reports refused connections and CORS rejections alike as a
    /// failed request; builder errors (bad URLs) keep their own message.
    fn map_error(endpoint: &Endpoint, e: reqwest::Error) -> AnalysisError {
        if e.is_decode() {
            AnalysisError::Decode(e.to_string())
        } else if e.is_request() && !e.is_builder() {
            AnalysisError::ServiceUnreachable {
                url: endpoint.base_url.clone(),
                reason: e.to_string(),
            }
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }

    pub(super) async fn post_analysis(
        endpoint: &Endpoint,
        url: &str,
        kind: AnalysisKind,
        body: &serde_json::Value,
    ) -> Result<AnalysisResult, AnalysisError> {
        with_timeout(endpoint, async {
            let response = reqwest::Client::new()
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| map_error(endpoint, e))?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| map_error(endpoint, e))?;
            interpret_response(kind, status, &text)
        })
        .await
    }

    pub(super) async fn get_health(
        endpoint: &Endpoint,
        url: &str,
    ) -> Result<HealthReport, AnalysisError> {
        with_timeout(endpoint, async {
            let response = reqwest::Client::new()
                .get(url)
                .send()
                .await
                .map_err(|e| map_error(endpoint, e))?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| map_error(endpoint, e))?;
            interpret_health(status, &text)
        })
        .await
    }
}
