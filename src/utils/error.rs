//! Error types for document retrieval and parsing
//!
//! Retrieval and parse failures are kept apart so callers can tell a
//! missing document from a malformed one.

use thiserror::Error;

use crate::graph::RdfFormat;

/// Errors that can occur while retrieving a document
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status code
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    /// Request timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Local file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Content decoding error
    #[error("Decoding error for {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Http { .. } => true,
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Errors that can occur while parsing a fetched document
#[derive(Error, Debug)]
pub enum ParseError {
    /// Document is not valid in the expected RDF serialization
    #[error("Failed to parse {url} as {format}: {message}")]
    Syntax {
        format: RdfFormat,
        url: String,
        message: String,
    },

    /// Document is not valid JSON
    #[error("Invalid JSON in {url}: {message}")]
    Json { url: String, message: String },

    /// The document location could not be turned into a base IRI
    #[error("Invalid base IRI: {0}")]
    InvalidBase(String),
}

/// Errors raised while loading a document into a graph
#[derive(Error, Debug)]
pub enum LoadError {
    /// Retrieval failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LoadError {
    /// Whether this is a retrieval failure rather than a malformed document
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
