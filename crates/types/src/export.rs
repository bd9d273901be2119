//! Export-format table and the render/export job request bodies.
//!
//! The backend accepts one request shape for both job kinds; what varies is
//! the extension name and which extension settings are present. The
//! enumerated table below replaces the original portal's ad-hoc per-menu
//! settings objects.

use crate::ids::DocumentId;
use crate::params::ParameterState;
use crate::toggle::ToggleHistory;
use serde::{Deserialize, Serialize};

/// Supported export extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Word,
    Image,
    Html,
    Excel,
}

impl ExportFormat {
    /// The backend's `extensionName` value for this format.
    pub fn extension_name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Word => "Word",
            ExportFormat::Image => "Image",
            ExportFormat::Html => "Html",
            ExportFormat::Excel => "Excel",
        }
    }

    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Pdf,
        ExportFormat::Word,
        ExportFormat::Image,
        ExportFormat::Html,
        ExportFormat::Excel,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    Paginated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderTarget {
    Screen,
}

/// Extension settings attached to a render or export submission.
///
/// Absent fields are omitted from the JSON body, matching the backend's
/// expectation that each job kind only receives the settings it understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_as_dialog: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_on_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_page_margins: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_export_support: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<RenderTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toc_stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
}

impl ExtensionSettings {
    /// Settings for the on-screen paginated HTML render.
    pub fn screen_render() -> Self {
        Self {
            include_page_margins: Some(false),
            need_export_support: Some(true),
            render_mode: Some(RenderMode::Paginated),
            target: Some(RenderTarget::Screen),
            toc_stream: Some(true),
            ..Default::default()
        }
    }

    /// Settings for a save-as export of the current document.
    pub fn save_as() -> Self {
        Self {
            save_as_dialog: Some(true),
            ..Default::default()
        }
    }

    /// Settings for a print export of the current document.
    pub fn print() -> Self {
        Self {
            print_on_open: Some(true),
            ..Default::default()
        }
    }

    /// Settings for the drill-down re-render export.
    pub fn drilldown() -> Self {
        Self {
            include_page_margins: Some(true),
            need_export_support: Some(true),
            render_mode: Some(RenderMode::Paginated),
            toc_stream: Some(true),
            ..Default::default()
        }
    }
}

/// Body of a render-job submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub extension_name: String,
    pub extension_settings: ExtensionSettings,
    pub report_parameters: Vec<ParameterState>,
}

impl RenderRequest {
    /// The standard paginated-HTML screen render.
    pub fn screen(report_parameters: Vec<ParameterState>) -> Self {
        Self {
            extension_name: ExportFormat::Html.extension_name().to_string(),
            extension_settings: ExtensionSettings::screen_render(),
            report_parameters,
        }
    }
}

/// Body of an export-job submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    pub extension_name: String,
    pub extension_settings: ExtensionSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle_history: Option<ToggleHistory>,
}

impl ExportRequest {
    pub fn new(
        format: ExportFormat,
        document_id: Option<DocumentId>,
        extension_settings: ExtensionSettings,
    ) -> Self {
        Self {
            document_id,
            extension_name: format.extension_name().to_string(),
            extension_settings,
            name: None,
            report_type: None,
            toggle_history: None,
        }
    }

    /// The drill-down fast-path export: re-renders an already-resolved
    /// document as HTML with the given toggle history applied.
    pub fn drilldown(
        document_id: DocumentId,
        name: Option<String>,
        report_type: Option<String>,
        toggle_history: ToggleHistory,
    ) -> Self {
        Self {
            document_id: Some(document_id),
            extension_name: ExportFormat::Html.extension_name().to_string(),
            extension_settings: ExtensionSettings::drilldown(),
            name,
            report_type,
            toggle_history: Some(toggle_history),
        }
    }
}
