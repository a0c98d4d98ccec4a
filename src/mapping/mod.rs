//! Mapping generation between a data document and a template graph
//!
//! [`Mapper`] drives the whole workflow: query the data document for
//! subjects, query the template graph for objects, then synthesize a
//! YARRRML document from the pairs a user picked.
//!
//! # Submodules
//!
//! - [`iterator`] - JSONPath iterator discovery in raw JSON
//! - [`document`] - Serializable mapping document
//! - [`synthesizer`] - Pair validation and rule assembly

pub mod document;
pub mod iterator;
pub mod synthesizer;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::entities::{detect_base_namespace, EntityQueryEngine, QueryResult};
use crate::error::{Error, Result};
use crate::fetch::{HttpTransport, Transport};
use crate::graph::GraphLoader;
use crate::ontology::{ClassMatch, OntologyRegistry, SubclassResolver};
use crate::utils::{is_absolute_iri, mapping_filename};

pub use document::{Condition, MappingDocument, MappingRule, Source};
pub use iterator::{discover_iterator, IteratorDiscovery, SourceIterator, FALLBACK_ITERATOR};
pub use synthesizer::{
    MappingPair, MappingSynthesizer, SkipReason, SkippedPair, Synthesis, SynthesisRequest,
};

/// What to map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    /// Data document (e.g. CSVW JSON-LD metadata)
    pub data_url: String,

    /// Template graph the data is linked to
    pub template_url: String,

    /// Pairs in output order
    pub pairs: Vec<MappingPair>,

    /// Overrides the configured predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// Overrides the configured rowwise flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_template_rowwise: Option<bool>,
}

/// Previously computed query results to reuse instead of querying again
#[derive(Debug, Clone, Default)]
pub struct CachedEntities {
    /// Data subjects with the data document's base namespace
    pub data: Option<QueryResult>,

    /// Base namespace of the template graph
    pub template_namespace: Option<String>,
}

/// A generated mapping ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOutput {
    /// File name derived from the data URL
    pub filename: String,

    pub document: MappingDocument,

    /// Pairs that produced no rule
    pub skipped: Vec<SkippedPair>,
}

impl MappingOutput {
    /// YAML text of the document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(self.document.to_yaml()?)
    }

    /// JSON text of the document
    pub fn to_json(&self) -> Result<String> {
        Ok(self.document.to_json()?)
    }
}

/// Entity resolution and mapping generation with configured defaults
#[derive(Clone)]
pub struct Mapper {
    config: Config,
    engine: EntityQueryEngine,
    synthesizer: MappingSynthesizer,
}

impl Mapper {
    /// Create a mapper that fetches over HTTP(S) and from local files
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::with_config(&config.fetch)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a mapper on top of a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self::with_registry(config, transport, OntologyRegistry::shared())
    }

    /// Create a mapper with a custom transport and ontology registry
    pub fn with_registry(
        config: Config,
        transport: Arc<dyn Transport>,
        registry: Arc<OntologyRegistry>,
    ) -> Self {
        let loader = GraphLoader::new(transport.clone());
        let resolver = SubclassResolver::new(loader.clone(), registry);
        let engine = EntityQueryEngine::new(loader, resolver);
        let synthesizer = MappingSynthesizer::new(IteratorDiscovery::new(transport));

        Self {
            config,
            engine,
            synthesizer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &EntityQueryEngine {
        &self.engine
    }

    /// Data subjects using the configured classes and match mode
    pub async fn subjects(&self, data_url: &str, authorization: Option<&str>) -> Result<QueryResult> {
        let mapping = &self.config.mapping;
        self.engine
            .query_entities(
                data_url,
                &mapping.data_subject_classes,
                mapping.data_match(),
                authorization,
            )
            .await
    }

    /// Template objects using the configured classes and match mode
    pub async fn objects(
        &self,
        template_url: &str,
        authorization: Option<&str>,
    ) -> Result<QueryResult> {
        let mapping = &self.config.mapping;
        self.engine
            .query_entities(
                template_url,
                &mapping.template_object_classes,
                mapping.template_match(),
                authorization,
            )
            .await
    }

    /// Entities of explicit classes
    pub async fn query(
        &self,
        url: &str,
        classes: &[String],
        mode: ClassMatch,
        authorization: Option<&str>,
    ) -> Result<QueryResult> {
        self.engine
            .query_entities(url, classes, mode, authorization)
            .await
    }

    /// Every distinct `rdf:type` in a document
    pub async fn types(&self, url: &str, authorization: Option<&str>) -> Result<Vec<String>> {
        self.engine.get_all_types(url, authorization).await
    }

    /// Subclass closure of one class
    pub async fn resolve(&self, class_iri: &str, authorization: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .engine
            .resolver()
            .resolve_subclasses(class_iri, authorization)
            .await?)
    }

    /// Generate the mapping document for `request`
    ///
    /// Cached data entities replace the data query; a cached template
    /// namespace avoids loading the template graph.
    ///
    /// # Errors
    ///
    /// A predicate override that is not an absolute IRI is a configuration
    /// error and fails before anything is fetched.
    pub async fn map(
        &self,
        request: &MappingRequest,
        cached: CachedEntities,
        authorization: Option<&str>,
    ) -> Result<MappingOutput> {
        if let Some(predicate) = request.predicate.as_deref() {
            if !is_absolute_iri(predicate) {
                return Err(Error::config(format!(
                    "predicate must be an absolute IRI, got '{predicate}'"
                )));
            }
        }

        let data = match cached.data {
            Some(data) => {
                tracing::debug!(entities = data.len(), "Using cached data entities");
                data
            }
            None => self.subjects(&request.data_url, authorization).await?,
        };

        let template_namespace = match cached.template_namespace {
            Some(ns) => ns,
            None => {
                let graph = self
                    .engine
                    .loader()
                    .load(&request.template_url, authorization)
                    .await?;
                detect_base_namespace(&graph)
            }
        };

        let mapping = &self.config.mapping;
        let synthesis_request = SynthesisRequest {
            data_url: &request.data_url,
            use_template_rowwise: request
                .use_template_rowwise
                .unwrap_or(mapping.use_template_rowwise),
            data_namespace: &data.base_namespace,
            template_namespace: &template_namespace,
            pairs: &request.pairs,
            subject_entities: &data.entities,
            predicate: request.predicate.as_deref().unwrap_or(&mapping.predicate),
            base: &mapping.base,
        };

        let synthesis = self
            .synthesizer
            .synthesize(&synthesis_request, authorization)
            .await?;

        Ok(MappingOutput {
            filename: mapping_filename(&request.data_url),
            document: synthesis.document,
            skipped: synthesis.skipped,
        })
    }
}
