//! maptomethod - Map semantic data documents onto method graphs
//!
//! Resolves the entities of a data document (e.g. CSVW metadata in JSON-LD)
//! and of a template/method graph, and generates YARRRML mapping rules that
//! link the two once a user has paired them up.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`fetch`] - Document retrieval over HTTP(S) and from local files
//! - [`graph`] - RDF parsing into an in-memory statement store
//! - [`ontology`] - Ontology registry and subclass closure resolution
//! - [`entities`] - Type-driven entity extraction and base namespace detection
//! - [`mapping`] - JSONPath iterator discovery and mapping synthesis
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use maptomethod::config::Config;
//! use maptomethod::mapping::{CachedEntities, Mapper, MappingPair, MappingRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mapper = Mapper::new(Config::from_env()?)?;
//!     let request = MappingRequest {
//!         data_url: "https://example.org/example-metadata.json".to_string(),
//!         template_url: "https://example.org/method.ttl".to_string(),
//!         pairs: vec![MappingPair::new("SpecimenName", "SpecimenID")],
//!         ..Default::default()
//!     };
//!     let output = mapper.map(&request, CachedEntities::default(), None).await?;
//!     println!("{}", output.to_yaml()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod mapping;
pub mod ontology;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::entities::{EntityMap, EntityQueryEngine, EntityRecord, QueryResult};
    pub use crate::error::{Error, ErrorCategory, MapperErrorTrait, Result};
    pub use crate::fetch::{HttpTransport, Transport};
    pub use crate::graph::{GraphLoader, RdfFormat, RdfGraph};
    pub use crate::mapping::{
        CachedEntities, Mapper, MappingDocument, MappingOutput, MappingPair, MappingRequest,
    };
    pub use crate::ontology::{ClassMatch, OntologyRegistry, SubclassResolver};
}

// Direct re-exports for convenience
pub use mapping::{Mapper, MappingDocument};
