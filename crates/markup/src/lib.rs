//! # folio-markup
//!
//! Normalizes raw rendered-report HTML into a paginated, asset-resolved
//! document ready for client-side display:
//! - partitions the markup into page units (`div` containers with the
//!   `page` class) and keeps exactly one page visible at a time
//! - rewrites relative image and CSS `background-image` URLs against the
//!   resource-handler endpoint, idempotently
//! - extracts the document metadata the viewer needs (page count, TOC url,
//!   document id)
//!
//! The transformer is a streaming rewrite over `quick-xml` events; the
//! reader runs leniently so near-XHTML report output degrades instead of
//! failing outright.

pub mod attrs;
pub mod error;
pub mod transform;
pub mod uri;

pub use error::MarkupError;
pub use transform::{
    build_document, extract_document_id, extract_page_count, extract_toc_url, set_active_page,
};
pub use uri::{is_absolute_uri, is_base64_uri, resolve_resource_url};
