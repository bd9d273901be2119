//! # folio-transport-http
//!
//! Blocking HTTP implementation of `ReportTransport` against the reporting
//! backend's REST API and resource handler. Blocking on purpose: the
//! session controller is synchronous and one viewer drives at most one
//! request at a time, so an async runtime would buy nothing.

pub mod endpoints;
pub mod transport;

pub use endpoints::Endpoints;
pub use transport::HttpReportTransport;
