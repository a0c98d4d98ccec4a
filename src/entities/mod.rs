//! Type-driven entity extraction
//!
//! Finds every individual whose `rdf:type` is in a class filter, attaches a
//! display label and reduces its IRI to a short id. The engine holds no state
//! between calls; a previously returned [`EntityMap`] can stand in for a
//! fresh query anywhere one is accepted.
//!
//! # Submodules
//!
//! - [`record`] - Entity records and query results

pub mod record;

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::graph::{GraphLoader, RdfGraph};
use crate::graph::namespaces::BASE_PREFIX;
use crate::ontology::{ClassMatch, OntologyError, SubclassResolver};
use crate::utils::is_absolute_iri;

pub use record::{
    EntityMap, EntityRecord, QueryResult, ShortIdCollision, CSVW_NAME, CSVW_TITLE,
    LABEL_PREDICATES, RDFS_LABEL,
};

/// Queries documents for individuals of given classes
#[derive(Clone)]
pub struct EntityQueryEngine {
    loader: GraphLoader,
    resolver: SubclassResolver,
}

impl EntityQueryEngine {
    /// Create an engine
    pub fn new(loader: GraphLoader, resolver: SubclassResolver) -> Self {
        Self { loader, resolver }
    }

    /// The loader used for documents
    pub fn loader(&self) -> &GraphLoader {
        &self.loader
    }

    /// The resolver used for subclass expansion
    pub fn resolver(&self) -> &SubclassResolver {
        &self.resolver
    }

    /// Extract entities of `classes` from the document at `url`
    ///
    /// With [`ClassMatch::Subclasses`] each filter is widened to its subclass
    /// closure before matching; [`ClassMatch::Exact`] uses the filters as
    /// given.
    ///
    /// # Errors
    ///
    /// Fails on a class filter that is not an absolute IRI, on ontology
    /// resolution failures and when the document cannot be fetched or
    /// parsed. A malformed document is never reported as an empty result.
    pub async fn query_entities(
        &self,
        url: &str,
        classes: &[String],
        mode: ClassMatch,
        authorization: Option<&str>,
    ) -> Result<QueryResult> {
        let filters = validate_filters(classes)?;
        let expanded = self.resolver.expand(&filters, mode, authorization).await?;
        let graph = self.loader.load(url, authorization).await?;

        let result = extract_entities(&graph, &expanded);

        tracing::info!(
            url = %url,
            mode = ?mode,
            filters = filters.len(),
            classes = expanded.len(),
            entities = result.len(),
            collisions = result.collisions.len(),
            base = %result.base_namespace,
            "Queried entities"
        );

        Ok(result)
    }

    /// Every distinct `rdf:type` object in the document at `url`, sorted
    pub async fn get_all_types(&self, url: &str, authorization: Option<&str>) -> Result<Vec<String>> {
        let graph = self.loader.load(url, authorization).await?;
        let types: Vec<String> = graph.types().into_iter().collect();

        tracing::debug!(url = %url, types = types.len(), "Listed document types");

        Ok(types)
    }
}

fn validate_filters(classes: &[String]) -> Result<Vec<String>> {
    let mut filters = Vec::with_capacity(classes.len());

    for class in classes {
        let class = class.trim();
        if class.is_empty() {
            continue;
        }
        if !is_absolute_iri(class) {
            return Err(OntologyError::invalid_class_iri(class).into());
        }
        filters.push(class.to_string());
    }

    Ok(filters)
}

/// Extract entities typed with any of `classes` from a parsed graph
///
/// A subject typed with several matching classes records the one listed
/// first. Subjects are visited in IRI order; when two IRIs share a short id
/// the first keeps the key and the other is reported as a collision.
pub fn extract_entities(graph: &RdfGraph, classes: &[String]) -> QueryResult {
    let mut rank: HashMap<&str, usize> = HashMap::new();
    for (idx, class) in classes.iter().enumerate() {
        rank.entry(class.as_str()).or_insert(idx);
    }

    let mut matched: BTreeMap<&str, (usize, &str)> = BTreeMap::new();
    for (subject, class) in graph.typed_subjects() {
        let Some(&r) = rank.get(class) else {
            continue;
        };
        matched
            .entry(subject)
            .and_modify(|best| {
                if r < best.0 {
                    *best = (r, class);
                }
            })
            .or_insert((r, class));
    }

    let label_predicates: Vec<&str> = LABEL_PREDICATES.iter().map(|(p, _)| *p).collect();
    let labels = graph.literal_index(&label_predicates);

    let mut entities = EntityMap::new();
    let mut collisions = Vec::new();

    for (subject, (_, class)) in matched {
        let mut record = EntityRecord::new(subject).with_type(class);
        if let Some((property, text)) = label_of(&labels, subject) {
            record = record.with_label(property, text);
        }

        if let Some(existing) = entities.get(&record.short_id) {
            tracing::warn!(
                short_id = %record.short_id,
                kept = %existing.uri,
                dropped = %record.uri,
                "Short id collision"
            );
            collisions.push(ShortIdCollision {
                short_id: record.short_id.clone(),
                kept: existing.uri.clone(),
                dropped: record.uri,
            });
            continue;
        }

        entities.insert(record.short_id.clone(), record);
    }

    QueryResult {
        entities,
        base_namespace: detect_base_namespace(graph),
        collisions,
    }
}

/// First label found among the label predicates, with its stripped name
fn label_of<'a>(
    labels: &HashMap<(&'a str, &'a str), &'a str>,
    subject: &'a str,
) -> Option<(&'static str, &'a str)> {
    LABEL_PREDICATES.iter().find_map(|(predicate, name)| {
        labels
            .get(&(subject, *predicate))
            .map(|text| (*name, *text))
    })
}

/// Namespace bound to the `base` prefix, else the document URL plus `/`
pub fn detect_base_namespace(graph: &RdfGraph) -> String {
    match graph.namespaces().get(BASE_PREFIX) {
        Some(iri) => iri.clone(),
        None => format!("{}/", graph.location()),
    }
}
