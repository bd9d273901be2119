//! The session controller.

use crate::state::{ExportAction, ExportIntent, ExportOutcome, SessionPhase, ViewerState};
use folio_drill::{parse_drillthrough_link, DrillValues};
use folio_markup::{build_document, resolve_resource_url, set_active_page, MarkupError};
use folio_poll::{JobPoller, PollError, RetryPolicy};
use folio_search::{SearchError, SearchOptions};
use folio_traits::{ReportTransport, TransportError};
use folio_types::{
    has_invalid_parameters, ExportRequest, ExtensionSettings, ParameterState, RenderRequest,
    ReportId, TocNode, ToggleHistory,
};
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("No report is open")]
    NoReport,

    #[error("No document has been rendered")]
    NoDocument,

    #[error("Drillthrough link has no target report: {0}")]
    Drillthrough(String),

    #[error("No search match at index {0}")]
    NoSuchMatch(usize),

    #[error("Session is misconfigured: {0}")]
    Config(String),
}

impl SessionError {
    /// The message recorded in the session's error state.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Transport(err) => err.user_message(),
            SessionError::Poll(PollError::Transport(err)) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// A viewer session for one report at a time.
///
/// All operations are synchronous; the generation counter exists so that a
/// [`ViewerSession::reset`] issued while an operation is in flight (from a
/// callback, or between poll attempts on another thread of control) keeps
/// the stale result from being committed over the fresh state.
#[derive(Debug)]
pub struct ViewerSession {
    transport: Arc<dyn ReportTransport>,
    policy: RetryPolicy,
    asset_base: String,
    state: ViewerState,
    generation: u64,
}

impl ViewerSession {
    pub fn new(transport: Arc<dyn ReportTransport>, asset_base: impl Into<String>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            asset_base: asset_base.into(),
            state: ViewerState::default(),
            generation: 0,
        }
    }

    pub(crate) fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn with_document_info(
        mut self,
        document_name: Option<String>,
        report_type: Option<String>,
    ) -> Self {
        self.state.document_name = document_name;
        self.state.report_type = report_type;
        self
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    /// Drops all viewer state and invalidates any in-flight operation.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = ViewerState {
            document_name: self.state.document_name.clone(),
            report_type: self.state.report_type.clone(),
            ..ViewerState::default()
        };
    }

    /// Opens a report: parameters are fetched, and the report is rendered
    /// when they are all valid. Invalid parameters bring up the parameters
    /// panel instead.
    pub fn open_report(&mut self, report_id: ReportId) -> Result<(), SessionError> {
        self.guarded(move |s, generation| s.assemble(generation, report_id, None, None))
    }

    /// Opens a report and, once rendered, exports it in one chain.
    pub fn open_report_for_export(
        &mut self,
        report_id: ReportId,
        intent: ExportIntent,
    ) -> Result<(), SessionError> {
        self.guarded(move |s, generation| s.assemble(generation, report_id, None, Some(intent)))
    }

    /// Re-assembles the open report with user-supplied parameter values.
    /// The values are validated by the backend first; the panel stays up if
    /// any come back invalid.
    pub fn submit_parameters(
        &mut self,
        parameters: Vec<ParameterState>,
    ) -> Result<(), SessionError> {
        let report_id = self.state.report_id.clone().ok_or(SessionError::NoReport)?;
        self.guarded(move |s, generation| s.assemble(generation, report_id, Some(parameters), None))
    }

    /// Follows a drillthrough hyperlink from the rendered page: the target
    /// report is opened with the link's parameter values.
    pub fn follow_drillthrough(&mut self, href: &str) -> Result<(), SessionError> {
        let request = parse_drillthrough_link(href);
        let Some(report_name) = request.report_name else {
            return Err(SessionError::Drillthrough(href.to_string()));
        };
        let parameters: Vec<ParameterState> = request
            .params
            .into_iter()
            .map(|param| {
                let values = match param.values {
                    DrillValues::Single(value) => vec![value],
                    DrillValues::Multi(values) => values,
                };
                ParameterState::valid(param.name, values)
            })
            .collect();
        info!("drillthrough to {report_name}");
        self.guarded(move |s, generation| {
            s.assemble(generation, ReportId::new(report_name), Some(parameters), None)
        })
    }

    /// Exports the current document.
    pub fn export_document(&mut self, intent: ExportIntent) -> Result<(), SessionError> {
        let report_id = self.state.report_id.clone().ok_or(SessionError::NoReport)?;
        self.guarded(move |s, _generation| {
            s.run_export_chain(&report_id, intent)?;
            s.state.phase = SessionPhase::Idle;
            Ok(())
        })
    }

    /// Toggles a drill-down group open or closed and re-renders the
    /// document with the accumulated toggle history applied.
    pub fn drilldown_group(&mut self, toggle_element_id: &str) -> Result<(), SessionError> {
        let report_id = self.state.report_id.clone().ok_or(SessionError::NoReport)?;
        let document_id = self
            .state
            .document
            .as_ref()
            .and_then(|d| d.document_id.clone())
            .ok_or(SessionError::NoDocument)?;
        let toggle_element_id = toggle_element_id.to_string();

        self.guarded(move |s, generation| {
            s.state.toggle_history.flip(&toggle_element_id);
            s.state.phase = SessionPhase::Rendering;

            let request = ExportRequest::drilldown(
                document_id,
                s.state.document_name.clone(),
                s.state.report_type.clone(),
                s.state.toggle_history.clone(),
            );
            let transport = Arc::clone(&s.transport);
            let poller = JobPoller::new(transport.as_ref(), s.policy.clone());
            let resource_url = poller.run_export(&report_id, &request)?;
            let raw = transport.fetch_resource(resource_url.trim())?;

            if s.commit_render(generation, &report_id, &raw, true)? {
                s.state.phase = SessionPhase::Idle;
            }
            Ok(())
        })
    }

    /// Runs a full-text search over the current document. Matches are
    /// recorded in the state and the view jumps to the first one.
    pub fn search(&mut self, options: &SearchOptions) -> Result<usize, SessionError> {
        let document = self.state.document.as_mut().ok_or(SessionError::NoDocument)?;
        let outcome = folio_search::search(&document.markup, options)?;
        document.markup = outcome.markup;
        self.state.matches = outcome.matches;
        self.state.current_match = None;
        if !self.state.matches.is_empty() {
            self.jump_to_match(0)?;
        }
        Ok(self.state.matches.len())
    }

    /// Jumps to a search match by its index in the match list.
    pub fn jump_to_match(&mut self, match_index: usize) -> Result<(), SessionError> {
        let (page, idx) = self
            .state
            .matches
            .get(match_index)
            .map(|m| (m.page, m.idx))
            .ok_or(SessionError::NoSuchMatch(match_index))?;
        let document = self.state.document.as_mut().ok_or(SessionError::NoDocument)?;
        document.markup = set_active_page(&document.markup, page, Some(idx))?;
        self.state.current_page = page;
        self.state.current_match = Some(match_index);
        Ok(())
    }

    /// Jumps to the next match, wrapping around.
    pub fn next_match(&mut self) -> Result<(), SessionError> {
        let count = self.state.matches.len();
        if count == 0 {
            return Err(SessionError::NoSuchMatch(0));
        }
        let next = self.state.current_match.map(|at| (at + 1) % count).unwrap_or(0);
        self.jump_to_match(next)
    }

    /// Jumps to the previous match, wrapping around.
    pub fn previous_match(&mut self) -> Result<(), SessionError> {
        let count = self.state.matches.len();
        if count == 0 {
            return Err(SessionError::NoSuchMatch(0));
        }
        let previous = self
            .state
            .current_match
            .map(|at| (at + count - 1) % count)
            .unwrap_or(count - 1);
        self.jump_to_match(previous)
    }

    /// Shows the given 1-indexed page, clamping out-of-range values. Any
    /// search highlight marker is cleared.
    pub fn set_page_number(&mut self, page_number: usize) -> Result<(), SessionError> {
        let document = self.state.document.as_mut().ok_or(SessionError::NoDocument)?;
        let page = page_number.clamp(1, document.page_count);
        document.markup = set_active_page(&document.markup, page, None)?;
        self.state.current_page = page;
        self.state.current_match = None;
        Ok(())
    }

    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Wraps an operation: clears the previous terminal state up front and
    /// records any failure as the session's error state.
    fn guarded(
        &mut self,
        op: impl FnOnce(&mut Self, u64) -> Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        let generation = self.begin();
        self.state.has_error = false;
        self.state.error_message = None;
        self.state.export_outcome = None;
        match op(self, generation) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// A failed operation tears the viewer state down to its terminal
    /// error form; only the session's configured document info survives.
    fn fail(&mut self, err: &SessionError) {
        self.state = ViewerState {
            has_error: true,
            error_message: Some(err.user_message()),
            document_name: self.state.document_name.clone(),
            report_type: self.state.report_type.clone(),
            ..ViewerState::default()
        };
    }

    fn assemble(
        &mut self,
        generation: u64,
        report_id: ReportId,
        provided: Option<Vec<ParameterState>>,
        intent: Option<ExportIntent>,
    ) -> Result<(), SessionError> {
        self.state.phase = SessionPhase::ValidatingParameters;
        let transport = Arc::clone(&self.transport);
        let parameters = match provided {
            Some(values) => transport.validate_parameters(&report_id, &values)?,
            None => transport.fetch_parameters(&report_id)?,
        };

        if has_invalid_parameters(&parameters) {
            debug!("report {report_id} has invalid parameters, awaiting input");
            self.state.report_id = Some(report_id);
            self.state.parameters = parameters;
            self.state.show_parameters_panel = true;
            self.state.phase = SessionPhase::AwaitingUserInput;
            return Ok(());
        }

        self.state.phase = SessionPhase::Rendering;
        let poller = JobPoller::new(transport.as_ref(), self.policy.clone());
        let raw = poller.run_render(&report_id, &RenderRequest::screen(parameters.clone()))?;
        if !self.commit_render(generation, &report_id, &raw, false)? {
            return Ok(());
        }
        self.state.parameters = parameters;

        match intent {
            Some(intent) => self.run_export_chain(&report_id, intent)?,
            None => self.load_toc()?,
        }
        self.state.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Commits a finished render, unless the session moved on while the job
    /// was running. Returns whether the commit happened.
    ///
    /// Committing resets the viewer to a fresh document view. The parent
    /// report is tracked across drillthrough navigation: rendering the
    /// recorded parent clears the link, rendering a new report records the
    /// one left behind, and re-rendering the open report changes nothing.
    /// The toggle history only survives drill-down commits; markup that
    /// carries no document-id metadata inherits the previous id.
    fn commit_render(
        &mut self,
        generation: u64,
        report_id: &ReportId,
        raw_markup: &str,
        keep_toggle_history: bool,
    ) -> Result<bool, SessionError> {
        if generation != self.generation {
            debug!("discarding stale render for {report_id}");
            return Ok(false);
        }

        let mut document = build_document(raw_markup, &self.asset_base)?;
        if document.document_id.is_none() {
            document.document_id = self
                .state
                .document
                .as_ref()
                .and_then(|d| d.document_id.clone());
        }
        let same_report = self.state.report_id.as_ref() == Some(report_id);
        let parent_id = if self.state.parent_id.as_ref() == Some(report_id) {
            None
        } else if same_report {
            self.state.parent_id.clone()
        } else {
            self.state.report_id.clone()
        };
        let toggle_history = if keep_toggle_history {
            std::mem::take(&mut self.state.toggle_history)
        } else {
            ToggleHistory::new()
        };

        info!(
            "document ready for {report_id}: {} page(s)",
            document.page_count
        );
        self.state = ViewerState {
            report_id: Some(report_id.clone()),
            parent_id,
            document: Some(document),
            toc: TocNode::root(),
            current_page: 1,
            toggle_history,
            phase: self.state.phase,
            document_name: self.state.document_name.clone(),
            report_type: self.state.report_type.clone(),
            ..ViewerState::default()
        };
        Ok(true)
    }

    fn load_toc(&mut self) -> Result<(), SessionError> {
        let Some(url) = self
            .state
            .document
            .as_ref()
            .and_then(|d| d.toc_url.clone())
        else {
            return Ok(());
        };
        self.state.toc = self.transport.fetch_toc(&url)?;
        Ok(())
    }

    fn run_export_chain(
        &mut self,
        report_id: &ReportId,
        intent: ExportIntent,
    ) -> Result<(), SessionError> {
        self.state.phase = SessionPhase::Exporting;
        let settings = match intent.action {
            ExportAction::SaveAs => ExtensionSettings::save_as(),
            ExportAction::Print => ExtensionSettings::print(),
        };
        let document_id = self
            .state
            .document
            .as_ref()
            .and_then(|d| d.document_id.clone());
        let request = ExportRequest::new(intent.format, document_id, settings);

        let transport = Arc::clone(&self.transport);
        let poller = JobPoller::new(transport.as_ref(), self.policy.clone());
        let resource_url = poller.run_export(report_id, &request)?;
        let url = resolve_resource_url(&self.asset_base, resource_url.trim());
        info!("export ready at {url}");
        self.state.export_outcome = Some(ExportOutcome {
            url,
            action: intent.action,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_traits::{RawJobResponse, ScriptedTransport};
    use folio_types::{ExportFormat, ParameterStateKind};

    fn report_html() -> String {
        concat!(
            r#"<html><head>"#,
            r#"<meta name="tocUrl" content="toc/1"/>"#,
            r#"<meta name="DocumentId" content="doc-1"/>"#,
            r#"</head><body>"#,
            r#"<div class="page"><p>alpha cat</p></div>"#,
            r#"<div class="page"><p>beta cat</p></div>"#,
            r#"</body></html>"#,
        )
        .to_string()
    }

    fn session_with(transport: Arc<ScriptedTransport>) -> ViewerSession {
        ViewerSession::new(transport, "http://host/Resource.axd")
            .with_policy(RetryPolicy::immediate(5))
    }

    fn open_rendered_report(transport: &Arc<ScriptedTransport>) -> ViewerSession {
        transport.script_parameters(Ok(vec![ParameterState::valid("Region", vec!["West".into()])]));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_toc(Ok(TocNode::root()));
        let mut session = session_with(Arc::clone(transport));
        session.open_report(ReportId::new("sales")).unwrap();
        session
    }

    #[test]
    fn test_open_report_renders_and_loads_toc() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_parameters(Ok(vec![ParameterState::valid("Region", vec!["West".into()])]));
        transport.script_render(Ok(RawJobResponse::pending("7")));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_toc(Ok(TocNode {
            name: "$root".into(),
            page: None,
            kids: vec![TocNode {
                name: "Summary".into(),
                page: Some(1),
                kids: vec![],
            }],
        }));

        let mut session = session_with(Arc::clone(&transport));
        session.open_report(ReportId::new("sales")).unwrap();

        let state = session.state();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.report_id, Some(ReportId::new("sales")));
        assert_eq!(state.page_count(), 2);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.toc.kids.len(), 1);
        assert!(!state.has_error);
        assert_eq!(
            transport.calls(),
            vec![
                "GET reports/sales/parameters".to_string(),
                "POST reports/sales/renderingRequests".to_string(),
                "GET reports/renderingRequests/7".to_string(),
                "GET toc toc/1".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_parameters_bring_up_the_panel() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_parameters(Ok(vec![ParameterState {
            name: "Year".into(),
            state: ParameterStateKind::MissingValidValue,
            ..Default::default()
        }]));

        let mut session = session_with(Arc::clone(&transport));
        session.open_report(ReportId::new("sales")).unwrap();

        let state = session.state();
        assert!(state.show_parameters_panel);
        assert_eq!(state.phase, SessionPhase::AwaitingUserInput);
        assert!(state.document.is_none());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_submitted_parameters_are_validated_then_rendered() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_parameters(Ok(vec![ParameterState {
            name: "Year".into(),
            state: ParameterStateKind::MissingValidValue,
            ..Default::default()
        }]));
        let mut session = session_with(Arc::clone(&transport));
        session.open_report(ReportId::new("sales")).unwrap();

        transport.script_validation(Ok(vec![ParameterState::valid("Year", vec!["2020".into()])]));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_toc(Ok(TocNode::root()));
        session
            .submit_parameters(vec![ParameterState::valid("Year", vec!["2020".into()])])
            .unwrap();

        let state = session.state();
        assert!(!state.show_parameters_panel);
        assert!(state.has_document());
        assert!(transport
            .calls()
            .contains(&"POST reports/sales/parameters/validateValues".to_string()));
    }

    #[test]
    fn test_backend_failure_becomes_error_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_parameters(Err(TransportError::Http {
            status: 500,
            message: "Report not found".to_string(),
        }));

        let mut session = session_with(Arc::clone(&transport));
        let result = session.open_report(ReportId::new("missing"));

        assert!(result.is_err());
        let state = session.state();
        assert!(state.has_error);
        assert_eq!(state.error_message.as_deref(), Some("Report not found"));
        assert_eq!(state.phase, SessionPhase::Idle);
    }

    #[test]
    fn test_open_for_export_surfaces_an_outcome_instead_of_toc() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_parameters(Ok(vec![]));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_export(Ok(RawJobResponse::text("exports/sales.pdf")));

        let mut session = session_with(Arc::clone(&transport));
        session
            .open_report_for_export(ReportId::new("sales"), ExportIntent::save_as(ExportFormat::Pdf))
            .unwrap();

        let state = session.state();
        let outcome = state.export_outcome.as_ref().unwrap();
        assert_eq!(outcome.url, "http://host/Resource.axd/exports/sales.pdf");
        assert_eq!(outcome.action, ExportAction::SaveAs);
        // The TOC is never fetched on the export chain.
        assert_eq!(state.toc, TocNode::root());
        assert!(!transport.calls().iter().any(|c| c.starts_with("GET toc")));
    }

    #[test]
    fn test_drilldown_flips_history_and_rerenders() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = open_rendered_report(&transport);

        transport.script_export(Ok(RawJobResponse::text("exports/doc-1.html")));
        transport.add_resource("exports/doc-1.html", report_html());
        session.drilldown_group("g5").unwrap();

        let state = session.state();
        assert!(state.toggle_history.contains("g5"));
        assert!(state.has_document());
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(transport
            .calls()
            .contains(&"GET resource exports/doc-1.html".to_string()));

        // Flipping the same group again removes it from the history.
        transport.script_export(Ok(RawJobResponse::text("exports/doc-1.html")));
        session.drilldown_group("g5").unwrap();
        assert!(!session.state().toggle_history.contains("g5"));
    }

    #[test]
    fn test_drillthrough_records_parent_report() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = open_rendered_report(&transport);

        transport.script_validation(Ok(vec![ParameterState::valid("Region", vec!["West".into()])]));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_toc(Ok(TocNode::root()));
        session
            .follow_drillthrough("report.aspx?ReportId=detail&Parameters=Region%3DWest")
            .unwrap();

        let state = session.state();
        assert_eq!(state.report_id, Some(ReportId::new("detail")));
        assert_eq!(state.parent_id, Some(ReportId::new("sales")));

        // Navigating back to the parent clears the link.
        transport.script_parameters(Ok(vec![]));
        transport.script_render(Ok(RawJobResponse::html(report_html())));
        transport.script_toc(Ok(TocNode::root()));
        session.open_report(ReportId::new("sales")).unwrap();
        assert_eq!(session.state().parent_id, None);
    }

    #[test]
    fn test_drillthrough_without_target_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = session_with(transport);
        let result = session.follow_drillthrough("report.aspx?Parameters=a%3Db");
        assert!(matches!(result, Err(SessionError::Drillthrough(_))));
    }

    #[test]
    fn test_search_jumps_to_first_match() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = open_rendered_report(&transport);
        session.set_page_number(2).unwrap();

        let count = session.search(&SearchOptions::text("alpha")).unwrap();
        assert_eq!(count, 1);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.state().current_match, Some(0));
        let markup = &session.state().document.as_ref().unwrap().markup;
        assert!(markup.contains("data-match-element"));
    }

    #[test]
    fn test_match_navigation_wraps() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = open_rendered_report(&transport);

        session.search(&SearchOptions::text("cat")).unwrap();
        assert_eq!(session.state().current_match, Some(0));
        session.next_match().unwrap();
        assert_eq!(session.state().current_match, Some(1));
        assert_eq!(session.current_page(), 2);
        session.next_match().unwrap();
        assert_eq!(session.state().current_match, Some(0));
        session.previous_match().unwrap();
        assert_eq!(session.state().current_match, Some(1));
    }

    #[test]
    fn test_page_number_is_clamped() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = open_rendered_report(&transport);

        session.set_page_number(99).unwrap();
        assert_eq!(session.current_page(), 2);
        session.set_page_number(0).unwrap();
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_stale_render_is_discarded_after_reset() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = session_with(transport);

        let generation = session.begin();
        session.reset();
        let committed = session
            .commit_render(generation, &ReportId::new("sales"), &report_html(), false)
            .unwrap();
        assert!(!committed);
        assert!(session.state().document.is_none());
    }

    #[test]
    fn test_operations_without_a_document_are_errors() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut session = session_with(transport);

        assert!(matches!(
            session.search(&SearchOptions::text("x")),
            Err(SessionError::NoDocument)
        ));
        assert!(matches!(
            session.set_page_number(1),
            Err(SessionError::NoDocument)
        ));
        assert!(matches!(
            session.export_document(ExportIntent::print(ExportFormat::Pdf)),
            Err(SessionError::NoReport)
        ));
    }
}
