//! Markup fixtures shaped like the backend's rendered report output.

/// Wraps page bodies in the backend's document envelope, with TOC and
/// document-id metadata in the head.
pub fn report_markup(document_id: &str, toc_url: &str, pages: &[&str]) -> String {
    let mut html = String::from("<html><head>");
    html.push_str(&format!(r#"<meta name="tocUrl" content="{toc_url}"/>"#));
    html.push_str(&format!(r#"<meta name="DocumentId" content="{document_id}"/>"#));
    html.push_str("</head><body>");
    for page in pages {
        html.push_str(&format!(r#"<div class="page">{page}</div>"#));
    }
    html.push_str("</body></html>");
    html
}

/// A plain three-page sales report.
pub fn sales_report() -> String {
    report_markup(
        "doc-1",
        "toc/1",
        &[
            "<p>Sales summary for the Western region</p>",
            "<p>Detail rows</p><span>Total units: 120</span>",
            "<p>Appendix</p>",
        ],
    )
}

/// The backend's TOC payload for [`sales_report`].
pub fn sales_toc_json() -> &'static str {
    r#"{
        "name": "$root",
        "kids": [
            { "name": "Summary", "page": 1 },
            { "name": "Detail", "page": 2, "kids": [ { "name": "Totals", "page": 2 } ] },
            { "name": "Appendix", "page": 3 }
        ]
    }"#
}
