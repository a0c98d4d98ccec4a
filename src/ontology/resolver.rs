//! Subclass closure resolution
//!
//! Widens a class filter to the class itself plus every class reachable
//! through `rdfs:subClassOf` in the ontology that defines it.

use futures::future::try_join_all;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::error::{OntologyError, OntologyResult};
use super::registry::OntologyRegistry;
use crate::graph::GraphLoader;

/// How a class filter matches `rdf:type` values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassMatch {
    /// Only the listed classes
    #[default]
    Exact,
    /// The listed classes and all their subclasses
    Subclasses,
}

impl ClassMatch {
    /// Mode for a boolean "expand subclasses" toggle
    pub fn from_expand(expand: bool) -> Self {
        if expand {
            Self::Subclasses
        } else {
            Self::Exact
        }
    }
}

/// Resolves classes to their reflexive-transitive subclass closure
#[derive(Clone)]
pub struct SubclassResolver {
    loader: GraphLoader,
    registry: Arc<OntologyRegistry>,
}

impl SubclassResolver {
    /// Create a resolver using the given loader and registry
    pub fn new(loader: GraphLoader, registry: Arc<OntologyRegistry>) -> Self {
        Self { loader, registry }
    }

    /// The registry used to locate ontology documents
    pub fn registry(&self) -> &OntologyRegistry {
        &self.registry
    }

    /// Resolve `class_iri` and all of its subclasses
    ///
    /// The class comes first, followed by its descendants in breadth-first
    /// order. A class whose ontology is not registered resolves to itself
    /// alone; an empty input resolves to nothing without any fetch.
    ///
    /// # Errors
    ///
    /// Returns `OntologyError::ResolutionFailed` when the ontology document
    /// cannot be fetched or parsed.
    pub async fn resolve_subclasses(
        &self,
        class_iri: &str,
        authorization: Option<&str>,
    ) -> OntologyResult<Vec<String>> {
        let class_iri = class_iri.trim();
        if class_iri.is_empty() {
            return Ok(Vec::new());
        }

        let Some(entry) = self.registry.lookup(class_iri) else {
            tracing::debug!(class = %class_iri, "No registered ontology, using exact class");
            return Ok(vec![class_iri.to_string()]);
        };

        let ontology = self
            .loader
            .load(&entry.src, authorization)
            .await
            .map_err(|e| OntologyError::resolution_failed(class_iri, &entry.src, e))?;

        let classes = subclass_closure(ontology.subclass_edges(), class_iri);

        tracing::debug!(
            class = %class_iri,
            ontology = %entry.src,
            classes = classes.len(),
            "Resolved subclass closure"
        );

        Ok(classes)
    }

    /// Expand a class filter list according to `mode`
    ///
    /// Filters resolve concurrently; the result keeps filter order and
    /// drops repeats.
    pub async fn expand(
        &self,
        classes: &[String],
        mode: ClassMatch,
        authorization: Option<&str>,
    ) -> OntologyResult<Vec<String>> {
        let resolved: Vec<Vec<String>> = match mode {
            ClassMatch::Exact => classes
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(|c| vec![c.to_string()])
                .collect(),
            ClassMatch::Subclasses => {
                try_join_all(
                    classes
                        .iter()
                        .map(|class| self.resolve_subclasses(class, authorization)),
                )
                .await?
            }
        };

        let expanded: IndexSet<String> = resolved.into_iter().flatten().collect();
        Ok(expanded.into_iter().collect())
    }
}

/// Reflexive-transitive closure of `root` over `(child, parent)` edges
///
/// Breadth-first from `root`; every class is visited once, so cycles in a
/// malformed ontology terminate.
pub fn subclass_closure<'a>(
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    root: &str,
) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for (child, parent) in edges {
        children.entry(parent).or_default().push(child);
    }

    let mut visited: IndexSet<String> = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(root.to_string());
    queue.push_back(root.to_string());

    while let Some(class) = queue.pop_front() {
        if let Some(direct) = children.get(class.as_str()) {
            for child in direct {
                if visited.insert(child.to_string()) {
                    queue.push_back(child.to_string());
                }
            }
        }
    }

    visited.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchedDocument, Transport};
    use crate::ontology::registry::OntologyEntry;
    use crate::utils::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const ONTOLOGY: &str = r#"@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://e.org/onto/> .
ex:A rdfs:subClassOf ex:B .
ex:B rdfs:subClassOf ex:C .
ex:D rdfs:subClassOf ex:B .
ex:X rdfs:subClassOf ex:Y .
"#;

    struct StaticTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn fetch_with_accept(
            &self,
            url: &Url,
            _authorization: Option<&str>,
            _accept: &str,
        ) -> Result<FetchedDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedDocument {
                url: url.clone(),
                content_type: None,
                body: ONTOLOGY.to_string(),
            })
        }
    }

    fn resolver() -> (SubclassResolver, Arc<StaticTransport>) {
        let transport = Arc::new(StaticTransport {
            calls: AtomicUsize::new(0),
        });
        let registry = OntologyRegistry::with_entries(vec![OntologyEntry::new(
            "ex",
            "http://e.org/onto/",
            "http://e.org/onto.ttl",
        )])
        .unwrap();
        let loader = GraphLoader::new(transport.clone());
        (SubclassResolver::new(loader, Arc::new(registry)), transport)
    }

    #[test]
    fn test_closure_is_reflexive_and_transitive() {
        let edges = vec![("A", "B"), ("B", "C"), ("D", "B")];
        let closure = subclass_closure(edges, "C");
        assert_eq!(closure[0], "C");
        assert_eq!(closure.len(), 4);
        for class in ["A", "B", "D"] {
            assert!(closure.contains(&class.to_string()));
        }
    }

    #[test]
    fn test_closure_survives_cycles() {
        let edges = vec![("A", "B"), ("B", "A"), ("A", "A")];
        let closure = subclass_closure(edges, "A");
        assert_eq!(closure, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_closure_of_leaf() {
        let closure = subclass_closure(Vec::<(&str, &str)>::new(), "Leaf");
        assert_eq!(closure, vec!["Leaf".to_string()]);
    }

    #[test]
    fn test_resolve_registered_class() {
        let (resolver, transport) = resolver();
        let classes =
            tokio_test::block_on(resolver.resolve_subclasses("http://e.org/onto/C", None)).unwrap();

        assert_eq!(classes[0], "http://e.org/onto/C");
        for class in ["A", "B", "D"] {
            assert!(classes.contains(&format!("http://e.org/onto/{class}")));
        }
        assert!(!classes.contains(&"http://e.org/onto/X".to_string()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_unregistered_class_is_exact() {
        let (resolver, transport) = resolver();
        let classes =
            tokio_test::block_on(resolver.resolve_subclasses("http://other.org/Leaf", None))
                .unwrap();
        assert_eq!(classes, vec!["http://other.org/Leaf".to_string()]);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_resolve_empty_makes_no_call() {
        let (resolver, transport) = resolver();
        let classes = tokio_test::block_on(resolver.resolve_subclasses("", None)).unwrap();
        assert!(classes.is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_expand_modes() {
        let (resolver, _) = resolver();
        let filters = vec![
            "http://e.org/onto/B".to_string(),
            "http://other.org/Leaf".to_string(),
            "http://e.org/onto/A".to_string(),
        ];

        let exact = tokio_test::block_on(resolver.expand(&filters, ClassMatch::Exact, None)).unwrap();
        assert_eq!(exact, filters);

        let expanded =
            tokio_test::block_on(resolver.expand(&filters, ClassMatch::Subclasses, None)).unwrap();
        assert_eq!(expanded[0], "http://e.org/onto/B");
        assert!(expanded.contains(&"http://other.org/Leaf".to_string()));
        // A appears once even though both B's closure and the A filter yield it
        assert_eq!(
            expanded
                .iter()
                .filter(|c| c.as_str() == "http://e.org/onto/A")
                .count(),
            1
        );
    }
}
