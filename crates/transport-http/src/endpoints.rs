//! Backend endpoint layout and route formation.

use folio_markup::resolve_resource_url;
use folio_types::{ReportId, RequestId};

/// The two base URLs of a reporting backend: the REST API root and the
/// temporary-resource handler that serves rendered assets and exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rest: String,
    pub resource_handler: String,
}

impl Endpoints {
    pub fn new(rest: impl Into<String>, resource_handler: impl Into<String>) -> Self {
        Self {
            rest: rest.into(),
            resource_handler: resource_handler.into(),
        }
    }

    /// Endpoints under the backend's conventional layout on one host.
    pub fn from_host(host: &str, port: u16) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            rest: format!("{host}:{port}/api"),
            resource_handler: format!("{host}:{port}/TemporaryResource.axd"),
        }
    }

    pub fn render_submit(&self, report_id: &ReportId) -> String {
        format!("{}/reports/{report_id}/renderingRequests", self.rest)
    }

    pub fn render_poll(&self, request_id: &RequestId) -> String {
        format!("{}/reports/renderingRequests/{request_id}", self.rest)
    }

    pub fn export_submit(&self, report_id: &ReportId) -> String {
        format!("{}/reports/{report_id}/exportRequests", self.rest)
    }

    pub fn export_poll(&self, request_id: &RequestId) -> String {
        format!("{}/reports/exportRequests/{request_id}", self.rest)
    }

    pub fn parameters(&self, report_id: &ReportId) -> String {
        format!("{}/reports/{report_id}/parameters", self.rest)
    }

    pub fn validate_values(&self, report_id: &ReportId) -> String {
        format!("{}/reports/{report_id}/parameters/validateValues", self.rest)
    }

    /// Resolves a resource reference against the resource handler.
    /// Absolute URLs pass through unchanged.
    pub fn resource(&self, url: &str) -> String {
        resolve_resource_url(&self.resource_handler, url)
    }
}
