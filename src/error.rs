//! Crate-wide error type
//!
//! Retrieval, parsing, ontology resolution and mapping serialization each
//! keep their own error type. [`Error`] wraps them at the public API
//! boundary and [`MapperErrorTrait::category`] classifies a failure without
//! matching every variant:
//!
//! ```rust,ignore
//! match err.category() {
//!     ErrorCategory::Network => eprintln!("could not retrieve document: {err}"),
//!     ErrorCategory::Parsing => eprintln!("document is malformed: {err}"),
//!     _ => eprintln!("{err}"),
//! }
//! ```

use thiserror::Error;

pub use crate::ontology::error::OntologyError;
pub use crate::utils::error::{FetchError, LoadError, ParseError};

/// Shared classification of the crate's error types
pub trait MapperErrorTrait: std::error::Error {
    /// Whether a later attempt may succeed
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

/// Broad failure kind reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Document retrieval errors (HTTP status, timeout, unreadable file)
    Network,
    /// Malformed RDF or JSON
    Parsing,
    /// Configuration and validation errors
    Config,
    /// Mapping document assembly and serialization errors
    Mapping,
}

impl ErrorCategory {
    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "retrieval error",
            Self::Parsing => "parse error",
            Self::Config => "configuration error",
            Self::Mapping => "mapping error",
        }
    }
}

impl MapperErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        FetchError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl MapperErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl MapperErrorTrait for OntologyError {
    fn is_recoverable(&self) -> bool {
        OntologyError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            OntologyError::ResolutionFailed { source, .. } => match source {
                LoadError::Fetch(_) => ErrorCategory::Network,
                LoadError::Parse(_) => ErrorCategory::Parsing,
            },
            OntologyError::InvalidClassIri { .. }
            | OntologyError::DuplicatePrefix { .. }
            | OntologyError::InvalidRegistryEntry { .. } => ErrorCategory::Config,
        }
    }
}

/// Error returned by [`crate::mapping::Mapper`] operations
#[derive(Error, Debug)]
pub enum Error {
    /// Document could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Ontology registry and resolution errors
    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Mapping document (de)serialization
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid request or settings
    #[error("Config error: {0}")]
    Config(String),
}

impl MapperErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(_) => false,
            Self::Ontology(e) => e.is_recoverable(),
            Self::Json(_) | Self::Yaml(_) | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Parse(_) => ErrorCategory::Parsing,
            Self::Ontology(e) => MapperErrorTrait::category(e),
            Self::Json(_) | Self::Yaml(_) => ErrorCategory::Mapping,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status of a failed retrieval, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch(e) => e.status(),
            Self::Ontology(OntologyError::ResolutionFailed {
                source: LoadError::Fetch(e),
                ..
            }) => e.status(),
            _ => None,
        }
    }
}

// Loading failures keep their retrieval/parse distinction
impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Fetch(e) => Self::Fetch(e),
            LoadError::Parse(e) => Self::Parse(e),
        }
    }
}

/// Result alias for [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RdfFormat;

    fn status_error(status: u16) -> FetchError {
        FetchError::Status {
            url: "https://example.org/method.ttl".to_string(),
            status,
        }
    }

    fn syntax_error() -> ParseError {
        ParseError::Syntax {
            format: RdfFormat::Turtle,
            url: "https://example.org/method.ttl".to_string(),
            message: "unexpected token".to_string(),
        }
    }

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(status_error(404));
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let parse_err = Error::Parse(syntax_error());
        assert_eq!(parse_err.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_is_recoverable() {
        let fetch_err = Error::Fetch(FetchError::Timeout {
            url: "https://example.org".to_string(),
        });
        assert!(fetch_err.is_recoverable());

        assert!(!Error::Fetch(status_error(404)).is_recoverable());
        assert!(!Error::Parse(syntax_error()).is_recoverable());
    }

    #[test]
    fn test_load_error_keeps_distinction() {
        let unified: Error = LoadError::Fetch(status_error(403)).into();
        assert!(matches!(unified, Error::Fetch(_)));
        assert_eq!(unified.status(), Some(403));

        let unified: Error = LoadError::Parse(syntax_error()).into();
        assert!(matches!(unified, Error::Parse(_)));
        assert_eq!(unified.status(), None);
    }

    #[test]
    fn test_resolution_failure_category() {
        let err: Error = OntologyError::resolution_failed(
            "http://purl.obolibrary.org/obo/BFO_0000008",
            "http://purl.obolibrary.org/obo/bfo.owl",
            LoadError::Parse(syntax_error()),
        )
        .into();
        assert_eq!(err.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("predicate must be an absolute IRI");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
        assert_eq!(err.category().label(), "configuration error");
    }
}
