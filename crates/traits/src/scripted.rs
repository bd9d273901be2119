//! In-memory scripted transport for tests.
//!
//! Responses are queued per endpoint ahead of time; each call consumes the
//! next queued entry. The render and export queues are shared between the
//! submit and poll calls, so a whole job chain is scripted as one ordered
//! sequence (submit response first, poll responses after).

use crate::transport::{RawJobResponse, ReportTransport, TransportError};
use folio_types::{ExportRequest, ParameterState, RenderRequest, ReportId, RequestId, TocNode};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

type ResponseQueue = VecDeque<Result<RawJobResponse, TransportError>>;

/// A scripted transport with canned responses.
///
/// Every call is recorded; tests assert on [`ScriptedTransport::calls`] to
/// verify ordering and endpoints.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    render: RwLock<ResponseQueue>,
    export: RwLock<ResponseQueue>,
    toc: RwLock<VecDeque<Result<TocNode, TransportError>>>,
    fetch_params: RwLock<VecDeque<Result<Vec<ParameterState>, TransportError>>>,
    validate_params: RwLock<VecDeque<Result<Vec<ParameterState>, TransportError>>>,
    resources: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response of the render chain (submit first, then polls).
    pub fn script_render(&self, response: Result<RawJobResponse, TransportError>) {
        if let Ok(mut queue) = self.render.write() {
            queue.push_back(response);
        }
    }

    /// Queue the next response of the export chain (submit first, then polls).
    pub fn script_export(&self, response: Result<RawJobResponse, TransportError>) {
        if let Ok(mut queue) = self.export.write() {
            queue.push_back(response);
        }
    }

    pub fn script_toc(&self, response: Result<TocNode, TransportError>) {
        if let Ok(mut queue) = self.toc.write() {
            queue.push_back(response);
        }
    }

    pub fn script_parameters(&self, response: Result<Vec<ParameterState>, TransportError>) {
        if let Ok(mut queue) = self.fetch_params.write() {
            queue.push_back(response);
        }
    }

    pub fn script_validation(&self, response: Result<Vec<ParameterState>, TransportError>) {
        if let Ok(mut queue) = self.validate_params.write() {
            queue.push_back(response);
        }
    }

    /// Register a resource body served by [`ReportTransport::fetch_resource`].
    pub fn add_resource(&self, url: impl Into<String>, body: impl Into<String>) {
        if let Ok(mut resources) = self.resources.write() {
            resources.insert(url.into(), body.into());
        }
    }

    /// Endpoints invoked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(call);
        }
    }

    fn next<T: Clone>(
        queue: &RwLock<VecDeque<Result<T, TransportError>>>,
        endpoint: &str,
    ) -> Result<T, TransportError> {
        let mut queue = queue
            .write()
            .map_err(|_| TransportError::Network("scripted queue lock poisoned".to_string()))?;
        queue.pop_front().unwrap_or_else(|| {
            Err(TransportError::Network(format!(
                "no scripted response left for {endpoint}"
            )))
        })
    }
}

impl ReportTransport for ScriptedTransport {
    fn submit_render_job(
        &self,
        report_id: &ReportId,
        _request: &RenderRequest,
    ) -> Result<RawJobResponse, TransportError> {
        self.record(format!("POST reports/{report_id}/renderingRequests"));
        Self::next(&self.render, "renderingRequests")
    }

    fn poll_render_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError> {
        self.record(format!("GET reports/renderingRequests/{request_id}"));
        Self::next(&self.render, "renderingRequests")
    }

    fn submit_export_job(
        &self,
        report_id: &ReportId,
        _request: &ExportRequest,
    ) -> Result<RawJobResponse, TransportError> {
        self.record(format!("POST reports/{report_id}/exportRequests"));
        Self::next(&self.export, "exportRequests")
    }

    fn poll_export_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError> {
        self.record(format!("GET reports/exportRequests/{request_id}"));
        Self::next(&self.export, "exportRequests")
    }

    fn fetch_toc(&self, url: &str) -> Result<TocNode, TransportError> {
        self.record(format!("GET toc {url}"));
        Self::next(&self.toc, "toc")
    }

    fn fetch_parameters(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<ParameterState>, TransportError> {
        self.record(format!("GET reports/{report_id}/parameters"));
        Self::next(&self.fetch_params, "parameters")
    }

    fn validate_parameters(
        &self,
        report_id: &ReportId,
        _parameters: &[ParameterState],
    ) -> Result<Vec<ParameterState>, TransportError> {
        self.record(format!("POST reports/{report_id}/parameters/validateValues"));
        Self::next(&self.validate_params, "validateValues")
    }

    fn fetch_resource(&self, url: &str) -> Result<String, TransportError> {
        self.record(format!("GET resource {url}"));
        let resources = self
            .resources
            .read()
            .map_err(|_| TransportError::Network("scripted resource lock poisoned".to_string()))?;
        resources
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Network(format!("no scripted resource for {url}")))
    }

    fn name(&self) -> &'static str {
        "ScriptedTransport"
    }
}
