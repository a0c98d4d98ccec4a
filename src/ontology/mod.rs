//! Ontology catalog and class hierarchy resolution
//!
//! Class filters name abstract classes such as
//! `cco:InformationContentEntity`, while documents type their individuals with
//! concrete subclasses. This module finds the ontology that defines a class
//! and widens the filter to the class's subclass closure.
//!
//! # Submodules
//!
//! - [`registry`] - Prefix -> namespace/source catalog, built once per process
//! - [`resolver`] - `rdfs:subClassOf*` closure over a fetched ontology
//! - [`error`] - Custom error types for ontology operations
//!
//! # Quick Start
//!
//! ```ignore
//! use maptomethod::ontology::{OntologyRegistry, SubclassResolver};
//!
//! let resolver = SubclassResolver::new(loader, OntologyRegistry::shared());
//! let classes = resolver
//!     .resolve_subclasses("http://purl.obolibrary.org/obo/BFO_0000008", None)
//!     .await?;
//! ```

pub mod error;
pub mod registry;
pub mod resolver;

pub use error::{OntologyError, OntologyResult};
pub use registry::{ontology_key, OntologyEntry, OntologyRegistry};
pub use resolver::{subclass_closure, ClassMatch, SubclassResolver};
