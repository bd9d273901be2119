pub mod fixtures;

use folio::{ReportTransport, RetryPolicy, ScriptedTransport, ViewerSession, ViewerSessionBuilder};
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Resource-handler base used by every fixture.
pub const ASSET_BASE: &str = "http://host/TemporaryResource.axd";

/// A viewer session wired to a scripted transport, with no poll delays.
pub fn scripted_session(
    transport: &Arc<ScriptedTransport>,
) -> Result<ViewerSession, Box<dyn std::error::Error>> {
    let session = ViewerSessionBuilder::new()
        .with_transport(Arc::clone(transport) as Arc<dyn ReportTransport>)
        .with_asset_base(ASSET_BASE)
        .with_retry_policy(RetryPolicy::immediate(8))
        .with_document_info("Sales Overview", "Report")
        .build()?;
    Ok(session)
}
