//! URI classification and resolution helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static ABSOLUTE_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("absolute URI pattern is valid"));

static BASE64_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^data:\w+/\w+;base64,").expect("base64 URI pattern is valid"));

/// True when the reference is an absolute `http`/`https` URI.
pub fn is_absolute_uri(uri: &str) -> bool {
    ABSOLUTE_URI.is_match(uri)
}

/// True when the reference is an inline base64 data URI.
pub fn is_base64_uri(uri: &str) -> bool {
    BASE64_URI.is_match(uri)
}

/// Resolves a resource reference: absolute URIs pass through, everything
/// else is served by the resource-handler endpoint.
pub fn resolve_resource_url(resource_handler: &str, url: &str) -> String {
    if is_absolute_uri(url) {
        url.to_string()
    } else {
        format!("{}/{}", resource_handler.trim_end_matches('/'), url)
    }
}
