//! # folio
//!
//! Report viewer core library.
//!
//! Folio turns a reporting backend's raw rendered output into a paginated,
//! searchable, navigable document and drives the backend's asynchronous
//! render and export jobs:
//! - **types**: identifiers, document model, parameters, export table
//! - **traits**: the `ReportTransport` backend abstraction
//! - **markup**: pagination and asset-URL rewriting of rendered HTML
//! - **search**: full-text search with match annotation
//! - **drill**: drillthrough link parsing
//! - **poll**: bounded polling of render/export jobs
//! - **session**: the viewer session controller tying it all together
//!
//! The core is transport-agnostic: everything is driven through the
//! `ReportTransport` trait. The `http` feature (on by default) provides a
//! blocking HTTP implementation against the backend's REST API.

pub use folio_drill as drill;
pub use folio_markup as markup;
pub use folio_poll as poll;
pub use folio_search as search;
pub use folio_session as session;
pub use folio_traits as traits;
pub use folio_types as types;

#[cfg(feature = "http")]
pub use folio_transport_http as transport_http;

// Re-export commonly used types
pub use folio_session::{
    ExportAction, ExportIntent, ExportOutcome, SessionError, SessionPhase, ViewerSession,
    ViewerSessionBuilder, ViewerState,
};

pub use folio_poll::{JobPoller, PollError, RetryPolicy};
pub use folio_search::{SearchOptions, SearchOutcome};
pub use folio_traits::{RawJobResponse, ReportTransport, ScriptedTransport, TransportError};
pub use folio_types::{
    DocumentId, ExportFormat, ParameterState, ParameterStateKind, RenderedDocument, ReportId,
    RequestId, SearchMatch, TocNode, ToggleHistory,
};

#[cfg(feature = "http")]
pub use folio_transport_http::{Endpoints, HttpReportTransport};
