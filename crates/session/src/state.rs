//! Observable session state.

use folio_types::{
    ExportFormat, ParameterState, RenderedDocument, ReportId, SearchMatch, TocNode, ToggleHistory,
};

/// What the session is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    ValidatingParameters,
    /// The parameters panel is up and the session waits for new values.
    AwaitingUserInput,
    Rendering,
    Exporting,
}

/// What the host should do with a finished export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    /// Offer the resource as a download.
    SaveAs,
    /// Open the resource and start printing it.
    Print,
}

/// A finished export, surfaced for the host to act on.
///
/// The session never opens windows or talks to printers itself; it only
/// records where the exported resource lives and what was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Absolute URL of the exported resource.
    pub url: String,
    pub action: ExportAction,
}

/// An export requested together with a report open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportIntent {
    pub format: ExportFormat,
    pub action: ExportAction,
}

impl ExportIntent {
    pub fn save_as(format: ExportFormat) -> Self {
        Self {
            format,
            action: ExportAction::SaveAs,
        }
    }

    pub fn print(format: ExportFormat) -> Self {
        Self {
            format,
            action: ExportAction::Print,
        }
    }
}

/// The full observable state of a viewer session.
///
/// `parent_id` tracks where a drillthrough came from: navigating to a new
/// report records the report left behind, navigating back to the recorded
/// parent clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub report_id: Option<ReportId>,
    pub parent_id: Option<ReportId>,
    pub document: Option<RenderedDocument>,
    pub toc: TocNode,
    pub parameters: Vec<ParameterState>,
    pub show_parameters_panel: bool,
    /// 1-indexed currently visible page.
    pub current_page: usize,
    pub matches: Vec<SearchMatch>,
    /// Index into `matches` of the highlighted match.
    pub current_match: Option<usize>,
    pub toggle_history: ToggleHistory,
    pub export_outcome: Option<ExportOutcome>,
    pub phase: SessionPhase,
    pub has_error: bool,
    pub error_message: Option<String>,
    /// Display name sent with drill-down exports.
    pub document_name: Option<String>,
    /// Backend report type sent with drill-down exports.
    pub report_type: Option<String>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            report_id: None,
            parent_id: None,
            document: None,
            toc: TocNode::root(),
            parameters: Vec::new(),
            show_parameters_panel: false,
            current_page: 1,
            matches: Vec::new(),
            current_match: None,
            toggle_history: ToggleHistory::new(),
            export_outcome: None,
            phase: SessionPhase::Idle,
            has_error: false,
            error_message: None,
            document_name: None,
            report_type: None,
        }
    }
}

impl ViewerState {
    /// The page count of the current document, zero when none is loaded.
    pub fn page_count(&self) -> usize {
        self.document.as_ref().map(|d| d.page_count).unwrap_or(0)
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }
}
