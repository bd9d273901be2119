//! # folio-search
//!
//! Full-text search over a rendered document's page content.
//!
//! The query text is treated as a literal substring, never as a regex; the
//! compiled pattern is matched against the text of every text-bearing
//! element's *last child node*, page by page in document order. A trailing
//! text node counts with just its own text, while a trailing child element
//! counts with its whole subtree text. Elements whose match text lives in
//! an earlier child never match on behalf of content nested inside them.
//!
//! Matched elements are tagged with their ordinal in a `data-match-id`
//! attribute so the page renderer can scroll a chosen match into view.
//! Because the annotation rewrites start tags that have already been
//! scanned by the time a match is decided, the search runs in two passes:
//! one to collect matches, one to annotate.

use folio_markup::attrs::{
    collect_attributes, is_page_element, rebuild_start, remove_attr, set_attr,
};
use folio_markup::transform::MATCH_ID_ATTR;
use folio_types::SearchMatch;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Elements considered text-bearing for search purposes.
const TEXT_ELEMENTS: [&[u8]; 6] = [b"div", b"p", b"a", b"td", b"li", b"span"];

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Could not compile search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Markup is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Options for one search invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub text: String,
    pub match_case: bool,
    pub whole_phrase: bool,
}

impl SearchOptions {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Result of a search: the matches in discovery order, plus the document
/// markup re-annotated with match tags.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub matches: Vec<SearchMatch>,
    pub markup: String,
}

/// Compiles the query into a regex.
///
/// All regex metacharacters in the text are escaped, so the query matches
/// literally. `whole_phrase` adds word boundaries on both ends. The
/// pattern is always multiline and is case-insensitive unless `match_case`
/// is set.
pub fn build_query_pattern(options: &SearchOptions) -> Result<Regex, SearchError> {
    let mut pattern = regex::escape(&options.text);
    if options.whole_phrase {
        pattern = format!(r"\b{pattern}\b");
    }
    Ok(RegexBuilder::new(&pattern)
        .multi_line(true)
        .case_insensitive(!options.match_case)
        .build()?)
}

/// Searches the document and annotates matched elements.
///
/// Empty query text (after trimming) yields no matches and leaves the
/// markup untouched; callers gate search submission on non-empty input.
pub fn search(markup: &str, options: &SearchOptions) -> Result<SearchOutcome, SearchError> {
    if options.text.trim().is_empty() {
        return Ok(SearchOutcome {
            matches: Vec::new(),
            markup: markup.to_string(),
        });
    }

    let pattern = build_query_pattern(options)?;
    let matches = collect_matches(markup, &pattern)?;
    let annotated = annotate_matches(markup, &matches)?;
    debug!("search for {:?}: {} match(es)", options.text, matches.len());

    Ok(SearchOutcome {
        matches,
        markup: annotated,
    })
}

/// One open element on the scan stack.
struct OpenElement {
    /// Ordinal within the page, when this is a text-bearing element inside
    /// a page.
    tracked: Option<(usize, usize)>,
    /// Text of this element's last child node, once one has been seen.
    last_child_text: Option<String>,
    /// Concatenated text of the whole subtree.
    content: String,
}

impl OpenElement {
    fn new(tracked: Option<(usize, usize)>) -> Self {
        Self {
            tracked,
            last_child_text: None,
            content: String::new(),
        }
    }
}

fn is_text_element(e: &BytesStart) -> bool {
    let name = e.name();
    TEXT_ELEMENTS
        .iter()
        .any(|tag| name.as_ref().eq_ignore_ascii_case(tag))
}

/// Pass 1: walk the document recording which (page, element ordinal) pairs
/// match the pattern. An element's match text is only known once it closes,
/// so the result is sorted back into document order afterwards.
fn collect_matches(markup: &str, pattern: &Regex) -> Result<Vec<SearchMatch>, SearchError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut current_page: Option<usize> = None;
    let mut page_count: usize = 0;
    let mut element_counter: usize = 0;
    let mut page_stack_base: usize = 0;
    let mut matches: Vec<SearchMatch> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let attrs = collect_attributes(&e);
                if is_page_element(&e, &attrs) && current_page.is_none() {
                    current_page = Some(page_count);
                    page_count += 1;
                    element_counter = 0;
                    page_stack_base = stack.len();
                    stack.push(OpenElement::new(None));
                } else {
                    let tracked = current_page.filter(|_| is_text_element(&e)).map(|page| {
                        let idx = element_counter;
                        element_counter += 1;
                        (page, idx)
                    });
                    stack.push(OpenElement::new(tracked));
                }
            }
            Event::Empty(e) => {
                // A childless element consumes an ordinal but has no text,
                // and it becomes its parent's last child node.
                if current_page.is_some() && is_text_element(&e) {
                    element_counter += 1;
                }
                if let Some(parent) = stack.last_mut() {
                    parent.last_child_text = Some(String::new());
                }
            }
            Event::Text(e) => {
                let text = e
                    .xml_content()
                    .map_err(|err| SearchError::Xml(quick_xml::Error::from(err)))?;
                for open in stack.iter_mut() {
                    open.content.push_str(&text);
                }
                if let Some(open) = stack.last_mut() {
                    open.last_child_text = Some(text.into_owned());
                }
            }
            Event::End(_) => {
                if let Some(open) = stack.pop() {
                    if let (Some((page, idx)), Some(text)) = (open.tracked, &open.last_child_text) {
                        if pattern.is_match(text) {
                            matches.push(SearchMatch {
                                idx,
                                page: page + 1,
                                text: text.clone(),
                            });
                        }
                    }
                    // The closed element is now its parent's last child; its
                    // subtree text carries over as the parent's match text.
                    if let Some(parent) = stack.last_mut() {
                        parent.last_child_text = Some(open.content);
                    }
                    if current_page.is_some() && stack.len() == page_stack_base {
                        current_page = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    matches.sort_by_key(|m| (m.page, m.idx));
    Ok(matches)
}

/// Pass 2: rewrite the markup, clearing stale match tags and writing the
/// fresh ones. Element ordinals are assigned exactly as in pass 1.
fn annotate_matches(markup: &str, matches: &[SearchMatch]) -> Result<String, SearchError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;
    let mut writer = Writer::new(Vec::new());

    let mut depth: usize = 0;
    let mut page_depth: Option<usize> = None;
    let mut current_page: usize = 0;
    let mut page_count: usize = 0;
    let mut element_counter: usize = 0;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let rewritten = annotate_tag(
                    &e,
                    &mut page_depth,
                    depth,
                    &mut current_page,
                    &mut page_count,
                    &mut element_counter,
                    matches,
                );
                depth += 1;
                match rewritten {
                    Some(tag) => writer.write_event(Event::Start(tag))?,
                    None => writer.write_event(Event::Start(e))?,
                }
            }
            Event::Empty(e) => {
                let rewritten = annotate_empty_tag(page_depth.is_some(), &e, &mut element_counter);
                match rewritten {
                    Some(tag) => writer.write_event(Event::Empty(tag))?,
                    None => writer.write_event(Event::Empty(e))?,
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if page_depth == Some(depth) {
                    page_depth = None;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

#[allow(clippy::too_many_arguments)]
fn annotate_tag(
    e: &BytesStart,
    page_depth: &mut Option<usize>,
    depth: usize,
    current_page: &mut usize,
    page_count: &mut usize,
    element_counter: &mut usize,
    matches: &[SearchMatch],
) -> Option<BytesStart<'static>> {
    let mut attrs = collect_attributes(e);

    if is_page_element(e, &attrs) && page_depth.is_none() {
        *page_depth = Some(depth);
        *current_page = *page_count;
        *page_count += 1;
        *element_counter = 0;
        return None;
    }

    if page_depth.is_none() || !is_text_element(e) {
        return None;
    }

    let idx = *element_counter;
    *element_counter += 1;

    let matched = matches
        .iter()
        .any(|m| m.page == *current_page + 1 && m.idx == idx);
    let mut changed = remove_attr(&mut attrs, MATCH_ID_ATTR);
    if matched {
        set_attr(&mut attrs, MATCH_ID_ATTR, idx.to_string());
        changed = true;
    }

    changed.then(|| rebuild_start(e, &attrs))
}

fn annotate_empty_tag(
    in_page: bool,
    e: &BytesStart,
    element_counter: &mut usize,
) -> Option<BytesStart<'static>> {
    if !in_page || !is_text_element(e) {
        return None;
    }
    *element_counter += 1;
    // An empty element has no direct text; it can only lose a stale tag.
    let mut attrs = collect_attributes(e);
    remove_attr(&mut attrs, MATCH_ID_ATTR).then(|| rebuild_start(e, &attrs))
}
