//! Error types for markup transformation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed text content: {0}")]
    Text(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Markup is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
