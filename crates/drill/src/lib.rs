//! # folio-drill
//!
//! Parsing of drillthrough hyperlinks embedded in rendered report pages.
//!
//! A drillthrough link looks like a relative page URL with a query string:
//!
//! ```text
//! report.aspx?ReportId=Sales&Parameters=Region%3DWest%26Year%3D2020
//! ```
//!
//! Only the `ReportId` and `Parameters` query keys are meaningful. The
//! `Parameters` value is itself a percent-encoded list of
//! semicolon-separated `name=value` clauses, where a value may carry
//! several comma-separated entries and literal delimiters are
//! backslash-escaped.
//!
//! Parsing is infallible: clauses that cannot be understood are skipped,
//! and a link with no recognizable parts yields an empty request. Bad
//! links come from report authors, not from callers, so there is nothing
//! useful to surface as an error.

use percent_encoding::percent_decode_str;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A parsed drillthrough target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillRequest {
    /// Name of the report the link points at.
    pub report_name: Option<String>,
    /// Parameter values to run the target report with.
    pub params: Vec<DrillParameter>,
}

/// One parameter carried by a drillthrough link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillParameter {
    pub name: String,
    pub values: DrillValues,
}

/// A parameter's value set.
///
/// Single and multi values serialize differently: a single value is a bare
/// string array, while a multi value wraps each entry in an object and
/// adds a `multivalue` marker. The rendering backend distinguishes the two
/// shapes, so the asymmetry is preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillValues {
    Single(String),
    Multi(Vec<String>),
}

impl Serialize for DrillParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.values {
            DrillValues::Single(value) => {
                let mut s = serializer.serialize_struct("DrillParameter", 2)?;
                s.serialize_field("name", &self.name)?;
                s.serialize_field("values", std::slice::from_ref(value))?;
                s.end()
            }
            DrillValues::Multi(values) => {
                #[derive(serde::Serialize)]
                struct Entry<'a> {
                    value: &'a str,
                }
                let entries: Vec<Entry> = values.iter().map(|v| Entry { value: v }).collect();
                let mut s = serializer.serialize_struct("DrillParameter", 3)?;
                s.serialize_field("name", &self.name)?;
                s.serialize_field("values", &entries)?;
                s.serialize_field("multivalue", &true)?;
                s.end()
            }
        }
    }
}

/// Splits on a single-character delimiter, honoring backslash escapes.
///
/// The backslash is consumed and the following character taken literally,
/// whatever it is.
pub fn split_escaped(s: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delimiter {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    parts
}

/// Parses a drillthrough hyperlink into a request.
pub fn parse_drillthrough_link(href: &str) -> DrillRequest {
    let mut request = DrillRequest::default();
    let Some((_, query)) = href.split_once('?') else {
        return request;
    };

    for clause in query.split('&') {
        let Some((key, raw_value)) = clause.split_once('=') else {
            continue;
        };
        let value = percent_decode_str(raw_value).decode_utf8_lossy();
        match key {
            "ReportId" => request.report_name = Some(value.into_owned()),
            "Parameters" => request.params = parse_parameters(&value),
            _ => {}
        }
    }

    request
}

fn parse_parameters(encoded: &str) -> Vec<DrillParameter> {
    split_escaped(encoded, ';')
        .iter()
        .filter_map(|clause| {
            // Only the first value segment counts; anything after a second
            // unescaped '=' is dropped.
            let mut key_value = split_escaped(clause, '=').into_iter();
            let name = key_value.next().filter(|key| !key.is_empty())?;
            let value = key_value.next()?;
            let mut values = split_escaped(&value, ',');
            let values = if values.len() > 1 {
                DrillValues::Multi(values)
            } else {
                DrillValues::Single(values.remove(0))
            };
            Some(DrillParameter { name, values })
        })
        .collect()
}
