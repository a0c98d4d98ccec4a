//! Custom error types for ontology operations
//!
//! Registry construction, subclass resolution and class filter validation
//! each have their own variants so that callers can tell a missing
//! ontology document apart from a bad class IRI.

use std::fmt;

use crate::utils::error::LoadError;

/// Result type alias for ontology operations
pub type OntologyResult<T> = Result<T, OntologyError>;

/// Custom error type for ontology operations
#[derive(Debug)]
pub enum OntologyError {
    // =========================================================================
    // Resolution Errors
    // =========================================================================
    /// The ontology document defining a class could not be loaded
    ResolutionFailed {
        class_iri: String,
        source_url: String,
        source: LoadError,
    },

    /// A class filter entry is not an absolute IRI
    InvalidClassIri { value: String },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    /// Two registry entries share a prefix
    DuplicatePrefix { prefix: String },

    /// A registry entry has an unusable namespace or source
    InvalidRegistryEntry { prefix: String, reason: String },
}

impl fmt::Display for OntologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Resolution
            OntologyError::ResolutionFailed {
                class_iri,
                source_url,
                source,
            } => {
                write!(
                    f,
                    "Failed to load ontology {source_url} defining '{class_iri}': {source}"
                )
            }
            OntologyError::InvalidClassIri { value } => {
                write!(f, "Class filter is not an absolute IRI: '{value}'")
            }

            // Registry
            OntologyError::DuplicatePrefix { prefix } => {
                write!(f, "Duplicate ontology prefix in registry: '{prefix}'")
            }
            OntologyError::InvalidRegistryEntry { prefix, reason } => {
                write!(f, "Invalid registry entry '{prefix}': {reason}")
            }
        }
    }
}

impl std::error::Error for OntologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OntologyError::ResolutionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Helper constructors
// ============================================================================

impl OntologyError {
    /// Resolution error for a class whose ontology failed to load
    pub fn resolution_failed(
        class_iri: impl Into<String>,
        source_url: impl Into<String>,
        source: LoadError,
    ) -> Self {
        OntologyError::ResolutionFailed {
            class_iri: class_iri.into(),
            source_url: source_url.into(),
            source,
        }
    }

    pub fn invalid_class_iri(value: impl Into<String>) -> Self {
        OntologyError::InvalidClassIri {
            value: value.into(),
        }
    }

    /// Whether loading the ontology again could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            OntologyError::ResolutionFailed {
                source: LoadError::Fetch(e),
                ..
            } => e.is_recoverable(),
            _ => false,
        }
    }

    /// Whether the underlying failure was a retrieval (not a parse) error
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            OntologyError::ResolutionFailed { source, .. } if source.is_retrieval()
        )
    }
}
