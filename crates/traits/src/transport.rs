//! ReportTransport trait for abstracting the reporting REST backend.
//!
//! The trait mirrors the backend surface the viewer consumes: render and
//! export job submission/polling, the TOC stream, parameter fetch and
//! validation, and raw resource retrieval through the resource handler.

use folio_types::{ExportRequest, ParameterState, RenderRequest, ReportId, RequestId, TocNode};
use std::fmt::Debug;
use thiserror::Error;

/// Error type for backend interactions.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The backend answered with a non-2xx status. `message` carries the
    /// human-readable text extracted from the error envelope's `error`
    /// field, or the status line when the body had none.
    #[error("Backend error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

impl TransportError {
    /// The message shown to the user when this error surfaces as a terminal
    /// session state.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Http { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A backend reply to a job submission or poll, before interpretation.
///
/// The declared content type decides the meaning of the body: a JSON
/// payload is a "still running" job handle, anything else is the final
/// result (markup text for renders, a resource URL for exports).
#[derive(Debug, Clone, PartialEq)]
pub struct RawJobResponse {
    pub content_type: String,
    pub body: String,
}

impl RawJobResponse {
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// A final HTML payload.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new("text/html; charset=utf-8", body)
    }

    /// A final plain-text payload (export jobs answer with the resource URL).
    pub fn text(body: impl Into<String>) -> Self {
        Self::new("text/plain", body)
    }

    /// A "still running" JSON envelope carrying the request id to re-poll.
    pub fn pending(request_id: impl AsRef<str>) -> Self {
        Self::new(
            "application/json",
            format!(r#"{{"requestId":"{}"}}"#, request_id.as_ref()),
        )
    }

    /// True when the declared content type is a JSON envelope.
    pub fn is_json(&self) -> bool {
        self.content_type.contains("application/json")
    }
}

/// A transport to the reporting backend.
///
/// Implementations are plain request/response: no state is retained between
/// calls, and the poll loop is driven entirely by the caller threading the
/// request id.
///
/// # Implementations
///
/// - `HttpReportTransport` (in `folio-transport-http`): blocking HTTP
///   against the backend's REST API and resource handler.
/// - [`crate::ScriptedTransport`]: queued canned responses for tests.
pub trait ReportTransport: Send + Sync + Debug {
    /// Submit a render job for a report.
    fn submit_render_job(
        &self,
        report_id: &ReportId,
        request: &RenderRequest,
    ) -> Result<RawJobResponse, TransportError>;

    /// Poll an in-flight render job. Issued with no body.
    fn poll_render_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError>;

    /// Submit an export job for a report/document.
    fn submit_export_job(
        &self,
        report_id: &ReportId,
        request: &ExportRequest,
    ) -> Result<RawJobResponse, TransportError>;

    /// Poll an in-flight export job. Issued with no body.
    fn poll_export_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError>;

    /// Fetch and decode the table-of-contents stream. `url` is the raw
    /// `tocUrl` from the rendered document; relative references resolve
    /// against the resource handler.
    fn fetch_toc(&self, url: &str) -> Result<TocNode, TransportError>;

    /// Fetch the current parameter state of a report.
    fn fetch_parameters(&self, report_id: &ReportId)
        -> Result<Vec<ParameterState>, TransportError>;

    /// Validate candidate parameter values. Same result shape as
    /// [`ReportTransport::fetch_parameters`].
    fn validate_parameters(
        &self,
        report_id: &ReportId,
        parameters: &[ParameterState],
    ) -> Result<Vec<ParameterState>, TransportError>;

    /// Fetch a resource (such as an exported document) as text. Relative
    /// references resolve against the resource handler.
    fn fetch_resource(&self, url: &str) -> Result<String, TransportError>;

    /// Returns a human-readable name for this transport (for logging).
    fn name(&self) -> &'static str;
}
