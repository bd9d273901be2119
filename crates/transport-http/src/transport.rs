//! The blocking HTTP transport.

use crate::endpoints::Endpoints;
use folio_traits::{RawJobResponse, ReportTransport, TransportError};
use folio_types::{ExportRequest, ParameterState, RenderRequest, ReportId, RequestId, TocNode};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// `ReportTransport` over blocking HTTP.
#[derive(Debug)]
pub struct HttpReportTransport {
    client: Client,
    endpoints: Endpoints,
}

impl HttpReportTransport {
    pub fn new(endpoints: Endpoints) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn get_raw(&self, url: &str) -> Result<RawJobResponse, TransportError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Self::into_raw(response)
    }

    fn post_raw(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<RawJobResponse, TransportError> {
        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(body)?)
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Self::into_raw(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let raw = self.get_raw(url)?;
        Ok(serde_json::from_str(&raw.body)?)
    }

    fn into_raw(response: Response) -> Result<RawJobResponse, TransportError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(Self::error_from(status, &body));
        }
        Ok(RawJobResponse::new(content_type, body))
    }

    /// Failed requests carry a JSON envelope with an `error` field; fall
    /// back to the status line when the body has none.
    fn error_from(status: reqwest::StatusCode, body: &str) -> TransportError {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        TransportError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl ReportTransport for HttpReportTransport {
    fn submit_render_job(
        &self,
        report_id: &ReportId,
        request: &RenderRequest,
    ) -> Result<RawJobResponse, TransportError> {
        self.post_raw(&self.endpoints.render_submit(report_id), request)
    }

    fn poll_render_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError> {
        self.get_raw(&self.endpoints.render_poll(request_id))
    }

    fn submit_export_job(
        &self,
        report_id: &ReportId,
        request: &ExportRequest,
    ) -> Result<RawJobResponse, TransportError> {
        self.post_raw(&self.endpoints.export_submit(report_id), request)
    }

    fn poll_export_job(&self, request_id: &RequestId) -> Result<RawJobResponse, TransportError> {
        self.get_raw(&self.endpoints.export_poll(request_id))
    }

    fn fetch_toc(&self, url: &str) -> Result<TocNode, TransportError> {
        self.get_json(&self.endpoints.resource(url))
    }

    fn fetch_parameters(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<ParameterState>, TransportError> {
        self.get_json(&self.endpoints.parameters(report_id))
    }

    fn validate_parameters(
        &self,
        report_id: &ReportId,
        parameters: &[ParameterState],
    ) -> Result<Vec<ParameterState>, TransportError> {
        let raw = self.post_raw(&self.endpoints.validate_values(report_id), &parameters)?;
        Ok(serde_json::from_str(&raw.body)?)
    }

    fn fetch_resource(&self, url: &str) -> Result<String, TransportError> {
        Ok(self.get_raw(&self.endpoints.resource(url))?.body)
    }

    fn name(&self) -> &'static str {
        "HttpReportTransport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_is_extracted() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let err = HttpReportTransport::error_from(status, r#"{"error":"Report not found"}"#);
        match err {
            TransportError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Report not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_falls_back_to_status_line() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        let err = HttpReportTransport::error_from(status, "<html>oops</html>");
        match err {
            TransportError::Http { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
