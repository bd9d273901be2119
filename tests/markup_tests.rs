mod common;

use common::fixtures::{report_markup, sales_report};
use common::{TestResult, ASSET_BASE};
use folio::markup::{build_document, set_active_page};

#[test]
fn test_build_document_from_backend_output() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let document = build_document(&sales_report(), ASSET_BASE)?;
    assert_eq!(document.page_count, 3);
    assert_eq!(document.toc_url.as_deref(), Some("toc/1"));
    assert_eq!(
        document.document_id.as_ref().map(|id| id.as_str()),
        Some("doc-1")
    );

    // Stable page ids, first page visible, the rest hidden.
    assert!(document.markup.contains(r#"id="page_0""#));
    assert!(document.markup.contains(r#"id="page_2""#));
    assert_eq!(document.markup.matches("display:block").count(), 1);
    assert_eq!(document.markup.matches("display:none").count(), 2);
    Ok(())
}

#[test]
fn test_relative_assets_resolve_against_the_resource_handler() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let markup = report_markup(
        "doc-1",
        "toc/1",
        &[concat!(
            r#"<img src="images/chart.png"/>"#,
            r#"<img src="data:image/png;base64,iVBORw0KGgo="/>"#,
            r#"<img src="http://other/logo.png"/>"#,
        )],
    );
    let document = build_document(&markup, ASSET_BASE)?;

    assert!(document
        .markup
        .contains(r#"src="http://host/TemporaryResource.axd/images/chart.png""#));
    assert!(document.markup.contains(r#"src="data:image/png;base64,iVBORw0KGgo=""#));
    assert!(document.markup.contains(r#"src="http://other/logo.png""#));
    Ok(())
}

#[test]
fn test_rewrite_is_idempotent() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let first = build_document(&sales_report(), ASSET_BASE)?;
    let second = build_document(&first.markup, ASSET_BASE)?;
    assert_eq!(first.markup, second.markup);
    assert_eq!(first.page_count, second.page_count);
    Ok(())
}

#[test]
fn test_page_switching_keeps_one_page_visible() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let document = build_document(&sales_report(), ASSET_BASE)?;
    let markup = set_active_page(&document.markup, 2, None)?;
    assert_eq!(markup.matches("display:block").count(), 1);
    assert_eq!(markup.matches("display:none").count(), 2);

    let back = set_active_page(&markup, 1, None)?;
    assert_eq!(back.matches("display:block").count(), 1);
    Ok(())
}

#[test]
fn test_markup_without_pages_is_one_page() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let document = build_document("<html><body><p>flat output</p></body></html>", ASSET_BASE)?;
    assert_eq!(document.page_count, 1);
    assert!(document.toc_url.is_none());
    Ok(())
}
