//! Fluent construction of viewer sessions.

use crate::controller::{SessionError, ViewerSession};
use folio_poll::RetryPolicy;
use folio_traits::ReportTransport;
use std::sync::Arc;

/// Builder for a [`ViewerSession`].
///
/// A transport and an asset base are required; everything else has
/// sensible defaults.
#[derive(Default)]
pub struct ViewerSessionBuilder {
    transport: Option<Arc<dyn ReportTransport>>,
    asset_base: Option<String>,
    retry_policy: RetryPolicy,
    document_name: Option<String>,
    report_type: Option<String>,
}

impl ViewerSessionBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            asset_base: None,
            retry_policy: RetryPolicy::default(),
            document_name: None,
            report_type: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn ReportTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// The resource-handler endpoint relative asset and export URLs resolve
    /// against.
    pub fn with_asset_base(mut self, asset_base: impl Into<String>) -> Self {
        self.asset_base = Some(asset_base.into());
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Display name and backend report type sent with drill-down exports.
    pub fn with_document_info(
        mut self,
        document_name: impl Into<String>,
        report_type: impl Into<String>,
    ) -> Self {
        self.document_name = Some(document_name.into());
        self.report_type = Some(report_type.into());
        self
    }

    pub fn build(self) -> Result<ViewerSession, SessionError> {
        let transport = self
            .transport
            .ok_or_else(|| SessionError::Config("a transport is required".to_string()))?;
        let asset_base = self
            .asset_base
            .ok_or_else(|| SessionError::Config("an asset base URL is required".to_string()))?;
        Ok(ViewerSession::new(transport, asset_base)
            .with_policy(self.retry_policy)
            .with_document_info(self.document_name, self.report_type))
    }
}
