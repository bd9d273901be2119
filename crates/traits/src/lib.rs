//! # folio-traits
//!
//! Platform abstraction for the report viewer core.
//!
//! The viewer never talks to the network itself; everything it needs from
//! the reporting backend goes through the [`ReportTransport`] trait. The
//! HTTP implementation lives in `folio-transport-http`; tests drive the
//! core with the in-memory [`ScriptedTransport`].

pub mod scripted;
pub mod transport;

pub use scripted::ScriptedTransport;
pub use transport::{RawJobResponse, ReportTransport, TransportError};
