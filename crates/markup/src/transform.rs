//! Streaming rewrite of rendered report markup.

use crate::attrs::{
    collect_attributes, get_attr, is_page_element, rebuild_start, remove_attr, set_attr,
};
use crate::error::MarkupError;
use crate::uri::{is_absolute_uri, is_base64_uri};
use folio_types::{DocumentId, RenderedDocument};
use log::debug;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};

/// Attribute carrying a search-match ordinal, written by the search
/// indexer and consumed by [`set_active_page`].
pub const MATCH_ID_ATTR: &str = "data-match-id";
/// Marker attribute for the element the UI should scroll into view.
pub const MATCH_ELEMENT_ATTR: &str = "data-match-element";

/// Frame styling applied to every page container.
const PAGE_FRAME_BORDER: &str = "solid 50px white";

static BACKGROUND_IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)background-image\s*:\s*url\(([^)]*)\)")
        .expect("background-image pattern is valid")
});

fn lenient_reader(raw: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(raw);
    // Report output is near-XHTML; tolerate mismatched end tags instead of
    // failing the whole document.
    reader.config_mut().check_end_names = false;
    reader
}

/// Parses raw rendered HTML into a displayable, paginated, asset-correct
/// document.
///
/// Page containers get stable `page_N` ids and only the first page is left
/// visible. Relative image sources and CSS `background-image` URLs are
/// prefixed with `asset_base` unless they are base64 data URIs, already
/// absolute, or already prefixed; running the output through the rewrite a
/// second time changes nothing.
pub fn build_document(raw_html: &str, asset_base: &str) -> Result<RenderedDocument, MarkupError> {
    let mut reader = lenient_reader(raw_html);
    let mut writer = Writer::new(Vec::new());

    let mut depth: usize = 0;
    let mut page_depth: Option<usize> = None;
    let mut style_depth: Option<usize> = None;
    let mut page_count: usize = 0;
    let mut toc_url: Option<String> = None;
    let mut document_id: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let direct_page_child = page_depth.is_some_and(|pd| depth == pd + 1);
                let opened_pages = page_count;
                let rewritten = rewrite_open_tag(
                    &e,
                    asset_base,
                    direct_page_child,
                    &mut page_count,
                    &mut toc_url,
                    &mut document_id,
                );
                if page_count > opened_pages && page_depth.is_none() {
                    page_depth = Some(depth);
                }
                if e.name().as_ref().eq_ignore_ascii_case(b"style") && style_depth.is_none() {
                    style_depth = Some(depth);
                }
                depth += 1;
                match rewritten {
                    Some(tag) => writer.write_event(Event::Start(tag))?,
                    None => writer.write_event(Event::Start(e))?,
                }
            }
            Event::Empty(e) => {
                let direct_page_child = page_depth.is_some_and(|pd| depth == pd + 1);
                let rewritten = rewrite_open_tag(
                    &e,
                    asset_base,
                    direct_page_child,
                    &mut page_count,
                    &mut toc_url,
                    &mut document_id,
                );
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
                if style_depth == Some(depth) {
                    style_depth = None;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Text(e) if style_depth.is_some() => {
                let css = e
                    .xml_content()
                    .map_err(|err| MarkupError::Text(err.to_string()))?;
                let rewritten = rewrite_css_urls(&css, asset_base);
                if rewritten == css {
                    writer.write_event(Event::Text(e))?;
                } else {
                    writer.write_event(Event::Text(BytesText::new(&rewritten)))?;
                }
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    debug!(
        "built document: {} page(s), toc={}, id={}",
        page_count,
        toc_url.is_some(),
        document_id.is_some()
    );

    Ok(RenderedDocument {
        markup: String::from_utf8(writer.into_inner())?,
        // A document with no detected page containers displays as one page.
        page_count: page_count.max(1),
        toc_url,
        document_id: document_id.map(DocumentId::new),
    })
}

fn rewrite_open_tag(
    e: &BytesStart,
    asset_base: &str,
    direct_page_child: bool,
    page_count: &mut usize,
    toc_url: &mut Option<String>,
    document_id: &mut Option<String>,
) -> Option<BytesStart<'static>> {
    let mut attrs = collect_attributes(e);
    let mut changed = false;
    let name = e.name();
    let name = name.as_ref();

    if is_page_element(e, &attrs) {
        let index = *page_count;
        *page_count += 1;
        set_attr(&mut attrs, "id", format!("page_{index}"));
        let mut style = get_attr(&attrs, "style").unwrap_or_default().to_string();
        style = set_style_property(&style, "display", if index == 0 { "block" } else { "none" });
        style = set_style_property(&style, "border", PAGE_FRAME_BORDER);
        style = set_style_property(&style, "box-sizing", "content-box");
        set_attr(&mut attrs, "style", style);
        changed = true;
    } else if direct_page_child {
        // The backend positions page children absolutely against the full
        // render; pin them back into the flow.
        let mut style = get_attr(&attrs, "style").unwrap_or_default().to_string();
        style = set_style_property(&style, "position", "relative");
        style = remove_style_property(&style, "top");
        set_attr(&mut attrs, "style", style);
        changed = true;
    }

    if name.eq_ignore_ascii_case(b"img") {
        if let Some(src) = get_attr(&attrs, "src") {
            if needs_asset_prefix(src, asset_base) {
                let src = format!("{}/{}", asset_base.trim_end_matches('/'), src);
                set_attr(&mut attrs, "src", src);
                changed = true;
            }
        }
    }

    if name.eq_ignore_ascii_case(b"meta") {
        match get_attr(&attrs, "name") {
            Some("tocUrl") if toc_url.is_none() => {
                *toc_url = get_attr(&attrs, "content").map(str::to_string);
            }
            Some("DocumentId") if document_id.is_none() => {
                *document_id = get_attr(&attrs, "content").map(str::to_string);
            }
            _ => {}
        }
    }

    changed.then(|| rebuild_start(e, &attrs))
}

fn needs_asset_prefix(src: &str, asset_base: &str) -> bool {
    !is_base64_uri(src) && !is_absolute_uri(src) && !src.starts_with(asset_base)
}

/// Rewrites `background-image: url(...)` declarations, prefixing relative
/// URLs with the asset base. Already-absolute or already-prefixed URLs are
/// left as-is.
fn rewrite_css_urls(css: &str, asset_base: &str) -> String {
    BACKGROUND_IMAGE_URL
        .replace_all(css, |caps: &Captures| {
            let url = &caps[1];
            // Entity-encoded ampersands hide the query string from the
            // absolute-URI test.
            let plain = url.replace("&amp;", "&");
            if is_absolute_uri(plain.trim()) || url.starts_with(asset_base) {
                format!("background-image:url({url})")
            } else {
                // Joined verbatim, without the '/' the img rewrite inserts;
                // style-block urls carry their own separator when they need
                // one.
                format!("background-image:url({asset_base}{url})")
            }
        })
        .into_owned()
}

/// Toggles exactly one page visible.
///
/// `page_number` is 1-indexed; out-of-range values are the caller's error
/// and simply leave every page hidden. When `highlight` is given, the
/// element tagged with that match ordinal on the target page is marked for
/// scroll-into-view, and any previous marker is cleared. A highlight id
/// that does not exist on the target page is a silent no-op: the match may
/// belong to a different page than the one requested.
pub fn set_active_page(
    markup: &str,
    page_number: usize,
    highlight: Option<usize>,
) -> Result<String, MarkupError> {
    let mut reader = lenient_reader(markup);
    let mut writer = Writer::new(Vec::new());

    let mut depth: usize = 0;
    let mut page_index: usize = 0;
    let mut target_depth: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let in_target = target_depth.is_some();
                let (rewritten, is_target_page) =
                    activate_tag(&e, &mut page_index, page_number, highlight, in_target);
                if is_target_page && target_depth.is_none() {
                    target_depth = Some(depth);
                }
                depth += 1;
                match rewritten {
                    Some(tag) => writer.write_event(Event::Start(tag))?,
                    None => writer.write_event(Event::Start(e))?,
                }
            }
            Event::Empty(e) => {
                let in_target = target_depth.is_some();
                let (rewritten, _) =
                    activate_tag(&e, &mut page_index, page_number, highlight, in_target);
                match rewritten {
                    Some(tag) => writer.write_event(Event::Empty(tag))?,
                    None => writer.write_event(Event::Empty(e))?,
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if target_depth == Some(depth) {
                    target_depth = None;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn activate_tag(
    e: &BytesStart,
    page_index: &mut usize,
    page_number: usize,
    highlight: Option<usize>,
    in_target_page: bool,
) -> (Option<BytesStart<'static>>, bool) {
    let mut attrs = collect_attributes(e);
    let mut changed = false;
    let mut is_target_page = false;

    if is_page_element(e, &attrs) {
        let index = *page_index;
        *page_index += 1;
        is_target_page = index + 1 == page_number;
        let mut style = get_attr(&attrs, "style").unwrap_or_default().to_string();
        style = set_style_property(&style, "display", if is_target_page { "block" } else { "none" });
        set_attr(&mut attrs, "style", style);
        changed = true;
    }

    let is_highlight = in_target_page
        && highlight.is_some()
        && get_attr(&attrs, MATCH_ID_ATTR).and_then(|id| id.parse::<usize>().ok()) == highlight;
    let has_marker = get_attr(&attrs, MATCH_ELEMENT_ATTR).is_some();

    if is_highlight && !has_marker {
        set_attr(&mut attrs, MATCH_ELEMENT_ATTR, "");
        changed = true;
    } else if !is_highlight && has_marker {
        remove_attr(&mut attrs, MATCH_ELEMENT_ATTR);
        changed = true;
    }

    (changed.then(|| rebuild_start(e, &attrs)), is_target_page)
}

/// Counts the document's page units. Markup with no detected page
/// containers reports a single page.
pub fn extract_page_count(markup: &str) -> Result<usize, MarkupError> {
    let mut reader = lenient_reader(markup);
    let mut count = 0;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if is_page_element(&e, &collect_attributes(&e)) {
                    count += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(count.max(1))
}

/// Reads the `tocUrl` metadata tag; `None` if absent.
pub fn extract_toc_url(markup: &str) -> Result<Option<String>, MarkupError> {
    extract_meta(markup, "tocUrl")
}

/// Reads the `DocumentId` metadata tag; `None` if absent.
pub fn extract_document_id(markup: &str) -> Result<Option<DocumentId>, MarkupError> {
    Ok(extract_meta(markup, "DocumentId")?.map(DocumentId::new))
}

fn extract_meta(markup: &str, meta_name: &str) -> Result<Option<String>, MarkupError> {
    let mut reader = lenient_reader(markup);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref().eq_ignore_ascii_case(b"meta") {
                    let attrs = collect_attributes(&e);
                    if get_attr(&attrs, "name") == Some(meta_name) {
                        return Ok(get_attr(&attrs, "content").map(str::to_string));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(None)
}

// --- Inline style helpers ---

fn style_entries(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                return None;
            }
            let (key, value) = declaration.split_once(':')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn render_style(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn set_style_property(style: &str, key: &str, value: &str) -> String {
    let mut entries = style_entries(style);
    match entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
        Some(entry) => entry.1 = value.to_string(),
        None => entries.push((key.to_string(), value.to_string())),
    }
    render_style(&entries)
}

fn remove_style_property(style: &str, key: &str) -> String {
    let mut entries = style_entries(style);
    entries.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    render_style(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET_BASE: &str = "http://host/Resource.axd";

    fn three_pages() -> String {
        r#"<html><head><meta name="tocUrl" content="toc/42"/><meta name="DocumentId" content="doc-42"/></head><body><div class="page"><p style="position:absolute;top:10px">one</p></div><div class="page"><p>two</p></div><div class="page"><p>three</p></div></body></html>"#
            .to_string()
    }

    fn visible_pages(markup: &str) -> Vec<usize> {
        let mut reader = Reader::from_str(markup);
        let mut visible = Vec::new();
        let mut index = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    let attrs = collect_attributes(&e);
                    if is_page_element(&e, &attrs) {
                        let style = get_attr(&attrs, "style").unwrap_or_default();
                        if style.contains("display:block") {
                            visible.push(index + 1);
                        }
                        index += 1;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        visible
    }

    #[test]
    fn test_build_partitions_pages_and_shows_first() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        assert_eq!(doc.page_count, 3);
        assert_eq!(visible_pages(&doc.markup), vec![1]);
        assert!(doc.markup.contains(r#"id="page_0""#));
        assert!(doc.markup.contains(r#"id="page_2""#));
    }

    #[test]
    fn test_build_extracts_metadata() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        assert_eq!(doc.toc_url.as_deref(), Some("toc/42"));
        assert_eq!(doc.document_id.as_ref().map(|id| id.as_str()), Some("doc-42"));
    }

    #[test]
    fn test_build_without_pages_reports_single_page() {
        let doc = build_document("<html><body><p>plain</p></body></html>", ASSET_BASE).unwrap();
        assert_eq!(doc.page_count, 1);
    }

    #[test]
    fn test_direct_page_children_are_repositioned() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        assert!(doc.markup.contains("position:relative"));
        assert!(!doc.markup.contains("top:10px"));
    }

    #[test]
    fn test_image_rewrite_skips_absolute_and_base64() {
        let raw = r#"<div class="page"><img src="images/chart.png"/><img src="http://cdn/logo.png"/><img src="data:image/png;base64,AAAA"/></div>"#;
        let doc = build_document(raw, ASSET_BASE).unwrap();
        assert!(doc.markup.contains(r#"src="http://host/Resource.axd/images/chart.png""#));
        assert!(doc.markup.contains(r#"src="http://cdn/logo.png""#));
        assert!(doc.markup.contains(r#"src="data:image/png;base64,AAAA""#));
    }

    #[test]
    fn test_image_rewrite_is_idempotent() {
        let raw = r#"<div class="page"><img src="images/chart.png"/></div>"#;
        let once = build_document(raw, ASSET_BASE).unwrap();
        let twice = build_document(&once.markup, ASSET_BASE).unwrap();
        assert_eq!(once.markup, twice.markup);
    }

    #[test]
    fn test_css_background_rewrite() {
        let raw = r#"<html><head><style>.a { background-image: url(img/bg.png) } .b { background-image: url(http://cdn/bg.png) }</style></head><body/></html>"#;
        let doc = build_document(raw, ASSET_BASE).unwrap();
        assert!(doc
            .markup
            .contains("background-image:url(http://host/Resource.axdimg/bg.png)"));
        assert!(doc.markup.contains("background-image:url(http://cdn/bg.png)"));
    }

    #[test]
    fn test_set_active_page_shows_exactly_one() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        let markup = set_active_page(&doc.markup, 2, None).unwrap();
        assert_eq!(visible_pages(&markup), vec![2]);
    }

    #[test]
    fn test_set_active_page_is_idempotent() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        let once = set_active_page(&doc.markup, 3, None).unwrap();
        let twice = set_active_page(&once, 3, None).unwrap();
        assert_eq!(once, twice);
        assert_eq!(visible_pages(&twice), vec![3]);
    }

    #[test]
    fn test_set_active_page_marks_highlight_and_clears_previous() {
        let raw = r#"<div class="page"><p data-match-id="0">hit one</p></div><div class="page"><p data-match-id="1">hit two</p></div>"#;
        let first = set_active_page(raw, 1, Some(0)).unwrap();
        assert!(first.contains(r#"data-match-id="0" data-match-element="""#));

        let second = set_active_page(&first, 2, Some(1)).unwrap();
        assert_eq!(second.matches(MATCH_ELEMENT_ATTR).count(), 1);
        assert!(second.contains(r#"data-match-id="1" data-match-element="""#));
    }

    #[test]
    fn test_set_active_page_missing_highlight_is_noop() {
        let doc = build_document(&three_pages(), ASSET_BASE).unwrap();
        let markup = set_active_page(&doc.markup, 1, Some(99)).unwrap();
        assert!(!markup.contains(MATCH_ELEMENT_ATTR));
        assert_eq!(visible_pages(&markup), vec![1]);
    }

    #[test]
    fn test_extract_page_count_defaults_to_one() {
        assert_eq!(extract_page_count("<div>no pages</div>").unwrap(), 1);
        assert_eq!(extract_page_count(&three_pages()).unwrap(), 3);
    }

    #[test]
    fn test_extract_metadata_absent_is_none() {
        assert_eq!(extract_toc_url("<html/>").unwrap(), None);
        assert_eq!(extract_document_id("<html/>").unwrap(), None);
    }
}
