//! # folio-types
//!
//! Shared data model for the report viewer core:
//! - **ids**: newtype wrappers for report, document and job-request identifiers
//! - **document**: rendered documents, table-of-contents trees, search matches
//! - **export**: the export-format table and render/export request bodies
//! - **params**: report parameter state as returned by the backend
//! - **toggle**: the drill-down toggle history set
//!
//! This crate carries no behavior beyond the data model itself; every type
//! that crosses the REST boundary serializes in the backend's camelCase JSON.

pub mod document;
pub mod export;
pub mod ids;
pub mod params;
pub mod toggle;

pub use document::{RenderedDocument, SearchMatch, TocNode};
pub use export::{
    ExportFormat, ExportRequest, ExtensionSettings, RenderMode, RenderRequest, RenderTarget,
};
pub use ids::{DocumentId, ReportId, RequestId};
pub use params::{has_invalid_parameters, has_visible_parameters, ParameterState, ParameterStateKind};
pub use toggle::ToggleHistory;
