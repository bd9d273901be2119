//! Rendered document model: paginated markup, TOC trees and search matches.

use crate::ids::DocumentId;
use serde::{Deserialize, Serialize};

/// Name of the sentinel root node of a TOC tree.
pub const TOC_ROOT_NAME: &str = "$root";

/// A rendered report document, ready for client-side display.
///
/// The markup is the backend's HTML fragment after the viewer rewrite:
/// page containers carry stable `page_N` ids, exactly one page is visible,
/// and relative asset URLs are resolved against the resource handler.
/// Page numbers are 0-indexed in the markup ids and 1-indexed everywhere
/// in the public API.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Rewritten display markup.
    pub markup: String,
    /// Number of page units; a document with no detected page containers
    /// is treated as a single page.
    pub page_count: usize,
    /// Reference to the separate table-of-contents resource, if the render
    /// produced one.
    pub toc_url: Option<String>,
    /// Stable identifier of the rendered artifact.
    pub document_id: Option<DocumentId>,
}

/// One entry in the table-of-contents tree.
///
/// Interior and leaf nodes reference a 1-indexed page; the root node is the
/// `$root` sentinel and references nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocNode {
    pub name: String,
    pub page: Option<u32>,
    pub kids: Vec<TocNode>,
}

impl TocNode {
    /// The empty sentinel tree used before a TOC has been fetched.
    pub fn root() -> Self {
        Self {
            name: TOC_ROOT_NAME.to_string(),
            page: None,
            kids: Vec::new(),
        }
    }
}

impl Default for TocNode {
    fn default() -> Self {
        Self::root()
    }
}

/// A single full-text search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Ordinal of the matched element within its page, as tagged on the
    /// element's `data-match-id` attribute.
    pub idx: usize,
    /// 1-indexed page number the match was found on.
    pub page: usize,
    /// The matched text excerpt.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_root_sentinel() {
        let root = TocNode::root();
        assert_eq!(root.name, "$root");
        assert!(root.page.is_none());
        assert!(root.kids.is_empty());
    }

    #[test]
    fn test_toc_deserializes_backend_shape() {
        let json = r#"{
            "name": "$root",
            "kids": [
                { "name": "Summary", "page": 1 },
                { "name": "Detail", "page": 2, "kids": [ { "name": "West", "page": 3 } ] }
            ]
        }"#;
        let toc: TocNode = serde_json::from_str(json).unwrap();
        assert_eq!(toc.kids.len(), 2);
        assert_eq!(toc.kids[0].page, Some(1));
        assert_eq!(toc.kids[1].kids[0].name, "West");
    }
}
