//! # folio-session
//!
//! The viewer session controller. One [`ViewerSession`] owns the complete
//! state of a report being viewed and drives every operation against the
//! backend: assembling a report (parameters, render, TOC), drill-down group
//! toggling, drillthrough navigation, full-text search, paging and export.
//!
//! Transport failures never poison the session: they are recorded as a
//! terminal error state with a user-facing message, and the next operation
//! starts clean. Long-running operations are guarded by a generation
//! counter so that a session reset in mid-flight discards the stale result
//! instead of committing it.

pub mod builder;
pub mod controller;
pub mod state;

pub use builder::ViewerSessionBuilder;
pub use controller::{SessionError, ViewerSession};
pub use state::{ExportAction, ExportIntent, ExportOutcome, SessionPhase, ViewerState};
