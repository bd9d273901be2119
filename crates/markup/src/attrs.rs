//! Owned-attribute helpers for rewriting start tags.
//!
//! quick-xml events borrow from the input, so tags that need modified
//! attributes are rebuilt from an owned copy. Keys are matched
//! case-insensitively (HTML attribute semantics); attribute values that
//! fail to unescape are dropped rather than failing the whole pass.
//!
//! Shared with `folio-search`, which annotates the same markup.

use quick_xml::events::BytesStart;

pub type OwnedAttributes = Vec<(String, String)>;

/// Collects an element's attributes as owned, unescaped key/value pairs.
pub fn collect_attributes(e: &BytesStart) -> OwnedAttributes {
    e.attributes()
        .flatten()
        .filter_map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

pub fn get_attr<'a>(attrs: &'a OwnedAttributes, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub fn set_attr(attrs: &mut OwnedAttributes, name: &str, value: impl Into<String>) {
    let value = value.into();
    match attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value,
        None => attrs.push((name.to_string(), value)),
    }
}

pub fn remove_attr(attrs: &mut OwnedAttributes, name: &str) -> bool {
    let before = attrs.len();
    attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    attrs.len() != before
}

/// True when the `class` attribute contains the given class token.
pub fn has_class(attrs: &OwnedAttributes, class: &str) -> bool {
    get_attr(attrs, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|token| token == class))
        .unwrap_or(false)
}

/// Rebuilds a start tag with the given attribute set, preserving the
/// original tag name.
pub fn rebuild_start(e: &BytesStart, attrs: &OwnedAttributes) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for (key, value) in attrs {
        out.push_attribute((key.as_str(), value.as_str()));
    }
    out
}

/// True when the element is a page container (`div` with the `page` class).
pub fn is_page_element(e: &BytesStart, attrs: &OwnedAttributes) -> bool {
    e.name().as_ref().eq_ignore_ascii_case(b"div") && has_class(attrs, "page")
}
