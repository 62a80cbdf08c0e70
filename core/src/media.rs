//! Media formats and the header pairs derived from them.
//!
//! # Design
//! Callers name media formats by their MIME string, the same value that
//! ends up on the wire. Only `application/json` is supported; any other
//! value is a caller mistake and is rejected with
//! `DispatchError::UnsupportedMediaFormat` before a request is opened.

use std::fmt;
use std::str::FromStr;

use crate::error::DispatchError;

/// MIME string for JSON bodies.
pub const JSON: &str = "application/json";

/// Body encodings the dispatcher knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaFormat {
    #[default]
    Json,
}

impl MediaFormat {
    /// Resolve a MIME string to a supported format.
    pub fn parse(media: &str) -> Result<Self, DispatchError> {
        match media {
            JSON => Ok(MediaFormat::Json),
            other => Err(DispatchError::UnsupportedMediaFormat(other.to_string())),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Json => JSON,
        }
    }
}

impl FromStr for MediaFormat {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaFormat::parse(s)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Build the `Accept` header for `media`.
pub fn accept_header(media: &str) -> Result<Header, DispatchError> {
    let format = MediaFormat::parse(media)?;
    Ok(Header::new("Accept", format.as_str()))
}

/// Build the `Content-Type` header for `media`.
pub fn content_type_header(media: &str) -> Result<Header, DispatchError> {
    let format = MediaFormat::parse(media)?;
    Ok(Header::new("Content-Type", format.as_str()))
}
