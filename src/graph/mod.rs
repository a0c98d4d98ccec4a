//! RDF document loading into an in-memory statement store
//!
//! The loader fetches a document through a [`Transport`], picks its
//! serialization, parses it with sophia and keeps the resulting statements
//! together with the document's namespace bindings.
//!
//! # Submodules
//!
//! - [`format`] - Serialization detection and location normalization
//! - [`namespaces`] - Prefix declarations of the source document
//! - [`jsonld`] - Remote `@context` inlining before JSON-LD parsing

pub mod format;
pub mod jsonld;
pub mod namespaces;

use sophia::api::parser::{QuadParser, TripleParser};
use sophia::api::quad::Quad;
use sophia::api::source::{QuadSource, TripleSource};
use sophia::api::term::{Term, TermKind};
use sophia::api::triple::Triple;
use sophia::iri::Iri;
use sophia::jsonld::loader::NoLoader;
use sophia::jsonld::{JsonLdOptions, JsonLdParser};
use sophia::turtle::parser::{nt::NTriplesParser, turtle::TurtleParser};
use sophia::xml::parser::RdfXmlParser;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use url::Url;

use crate::fetch::{FetchedDocument, Transport};
use crate::utils::error::{LoadError, ParseError};

pub use format::{guess_format, normalize_location, RdfFormat};
pub use namespaces::Namespaces;

/// `rdf:type`
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// `rdfs:subClassOf`
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

/// A node in subject or object position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Node {
    /// IRI value, if this node is an IRI
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Lexical form, if this node is a literal
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    fn from_term<T: Term>(term: T) -> Option<Self> {
        match term.kind() {
            TermKind::Iri => term.iri().map(|iri| Self::Iri(iri.as_str().to_string())),
            TermKind::BlankNode => term
                .bnode_id()
                .map(|id| Self::Blank(id.as_str().to_string())),
            TermKind::Literal => term.lexical_form().map(|lex| Self::Literal(lex.to_string())),
            _ => None,
        }
    }
}

/// One parsed triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

impl Statement {
    /// Create a statement from its parts
    pub fn new(subject: Node, predicate: impl Into<String>, object: Node) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Parsed document: its statements and declared namespaces
#[derive(Debug, Clone)]
pub struct RdfGraph {
    location: Url,
    format: RdfFormat,
    statements: Vec<Statement>,
    namespaces: Namespaces,
}

impl RdfGraph {
    /// Assemble a graph from already parsed parts
    pub fn from_parts(
        location: Url,
        format: RdfFormat,
        statements: Vec<Statement>,
        namespaces: Namespaces,
    ) -> Self {
        Self {
            location,
            format,
            statements,
            namespaces,
        }
    }

    /// Parse `text` in `format`, resolving relative IRIs against `location`
    ///
    /// Namespace bindings are read from the text as-is; JSON-LD documents
    /// with remote contexts should go through [`GraphLoader`] instead.
    pub fn parse(text: &str, format: RdfFormat, location: &Url) -> Result<Self, ParseError> {
        let statements = parse_statements(text, format, location)?;
        let namespaces = namespaces::extract_namespaces(format, text);

        Ok(Self::from_parts(location.clone(), format, statements, namespaces))
    }

    /// Location the graph was loaded from
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Serialization the graph was parsed from
    pub fn format(&self) -> RdfFormat {
        self.format
    }

    /// Prefix bindings declared by the document
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// All statements
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of distinct statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the graph holds no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// `(subject, class)` for every `rdf:type` statement between IRIs
    pub fn typed_subjects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statements
            .iter()
            .filter(|st| st.predicate == RDF_TYPE)
            .filter_map(|st| Some((st.subject.as_iri()?, st.object.as_iri()?)))
    }

    /// Every distinct class used as an `rdf:type` object, sorted
    pub fn types(&self) -> BTreeSet<String> {
        self.statements
            .iter()
            .filter(|st| st.predicate == RDF_TYPE)
            .filter_map(|st| st.object.as_iri())
            .map(str::to_string)
            .collect()
    }

    /// First literal of every `(subject, predicate)` pair among `predicates`
    ///
    /// Built in one pass; "first" is document order.
    pub fn literal_index<'a>(
        &'a self,
        predicates: &[&str],
    ) -> HashMap<(&'a str, &'a str), &'a str> {
        let mut index = HashMap::new();
        for st in &self.statements {
            if !predicates.contains(&st.predicate.as_str()) {
                continue;
            }
            let (Some(subject), Some(text)) = (st.subject.as_iri(), st.object.as_literal()) else {
                continue;
            };
            index.entry((subject, st.predicate.as_str())).or_insert(text);
        }
        index
    }

    /// `(child, parent)` for every `rdfs:subClassOf` statement between IRIs
    pub fn subclass_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statements
            .iter()
            .filter(|st| st.predicate == RDFS_SUBCLASS_OF)
            .filter_map(|st| Some((st.subject.as_iri()?, st.object.as_iri()?)))
    }
}

/// Collects parsed terms, dropping duplicates and unsupported terms
#[derive(Default)]
struct StatementCollector {
    seen: HashSet<Statement>,
    statements: Vec<Statement>,
}

impl StatementCollector {
    fn push<S: Term, P: Term, O: Term>(&mut self, s: S, p: P, o: O) {
        let predicate = match p.iri() {
            Some(iri) => iri.as_str().to_string(),
            None => return,
        };
        let (Some(subject), Some(object)) = (Node::from_term(s), Node::from_term(o)) else {
            return;
        };

        let statement = Statement::new(subject, predicate, object);
        if self.seen.insert(statement.clone()) {
            self.statements.push(statement);
        }
    }
}

fn parse_statements(
    text: &str,
    format: RdfFormat,
    location: &Url,
) -> Result<Vec<Statement>, ParseError> {
    let syntax_error = |message: String| ParseError::Syntax {
        format,
        url: location.to_string(),
        message,
    };
    let mut collector = StatementCollector::default();

    match format {
        RdfFormat::Turtle => {
            let base = Iri::new(location.to_string())
                .map_err(|e| ParseError::InvalidBase(e.to_string()))?;
            TurtleParser { base: Some(base) }
                .parse_str(text)
                .for_each_triple(|t| collector.push(t.s(), t.p(), t.o()))
                .map_err(|e| syntax_error(e.to_string()))?;
        }
        RdfFormat::NTriples => {
            NTriplesParser {}
                .parse_str(text)
                .for_each_triple(|t| collector.push(t.s(), t.p(), t.o()))
                .map_err(|e| syntax_error(e.to_string()))?;
        }
        RdfFormat::RdfXml => {
            let base = Iri::new(location.to_string())
                .map_err(|e| ParseError::InvalidBase(e.to_string()))?;
            RdfXmlParser { base: Some(base) }
                .parse_str(text)
                .for_each_triple(|t| collector.push(t.s(), t.p(), t.o()))
                .map_err(|e| syntax_error(e.to_string()))?;
        }
        RdfFormat::JsonLd => {
            let base = Iri::new(Arc::<str>::from(location.as_str()))
                .map_err(|e| ParseError::InvalidBase(e.to_string()))?;
            JsonLdParser::new_with_options(
                JsonLdOptions::new()
                    .with_default_document_loader::<NoLoader>()
                    .with_base(base),
            )
                .parse_str(text)
                .for_each_quad(|q| collector.push(q.s(), q.p(), q.o()))
                .map_err(|e| syntax_error(e.to_string()))?;
        }
    }

    Ok(collector.statements)
}

/// Fetches and parses RDF documents
#[derive(Clone)]
pub struct GraphLoader {
    transport: Arc<dyn Transport>,
}

impl GraphLoader {
    /// Create a loader on top of a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The transport used for retrieval
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch `location` and parse it, guessing the serialization
    ///
    /// Local paths are normalized to absolute `file://` URLs first.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Fetch`] when retrieval fails (non-2xx status,
    /// unreadable file) and [`LoadError::Parse`] for malformed documents.
    pub async fn load(
        &self,
        location: &str,
        authorization: Option<&str>,
    ) -> Result<RdfGraph, LoadError> {
        let url = normalize_location(location)?;
        let document = self.transport.fetch(&url, authorization).await?;
        let format = guess_format(&url, document.content_type.as_deref());

        self.parse_document(url, document, format).await
    }

    /// Fetch `location` and parse it in an explicit serialization
    pub async fn load_as(
        &self,
        location: &str,
        format: RdfFormat,
        authorization: Option<&str>,
    ) -> Result<RdfGraph, LoadError> {
        let url = normalize_location(location)?;
        let document = self.transport.fetch(&url, authorization).await?;

        self.parse_document(url, document, format).await
    }

    async fn parse_document(
        &self,
        url: Url,
        document: FetchedDocument,
        format: RdfFormat,
    ) -> Result<RdfGraph, LoadError> {
        let (text, namespaces) = if format.is_json() {
            let mut doc: serde_json::Value =
                serde_json::from_str(&document.body).map_err(|e| ParseError::Json {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            jsonld::inline_remote_contexts(&mut doc, &url, self.transport.as_ref()).await?;
            let namespaces = namespaces::json_ld_prefixes(&doc);
            (doc.to_string(), namespaces)
        } else {
            let namespaces = namespaces::extract_namespaces(format, &document.body);
            (document.body, namespaces)
        };

        let location = url.clone();
        let statements =
            tokio::task::spawn_blocking(move || parse_statements(&text, format, &location))
                .await
                .map_err(|e| ParseError::Syntax {
                    format,
                    url: url.to_string(),
                    message: format!("parser task failed: {e}"),
                })??;

        tracing::debug!(
            url = %url,
            format = %format,
            statements = statements.len(),
            prefixes = namespaces.len(),
            "Parsed RDF document"
        );

        Ok(RdfGraph::from_parts(url, format, statements, namespaces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Url {
        Url::parse("https://example.org/method.ttl").unwrap()
    }

    const METHOD_TTL: &str = r#"@prefix base: <https://example.org/method/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix cco: <http://www.ontologyrepository.com/CommonCoreOntologies/> .

<https://example.org/method/SpecimenName> a cco:DesignativeName ;
    rdfs:label "Specimen name"@en .
<https://example.org/method/Width> a cco:InformationContentEntity .
"#;

    #[test]
    fn test_parse_turtle() {
        let graph = RdfGraph::parse(METHOD_TTL, RdfFormat::Turtle, &location()).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(
            graph.namespaces().get("base").unwrap(),
            "https://example.org/method/"
        );

        let typed: Vec<_> = graph.typed_subjects().collect();
        assert!(typed.contains(&(
            "https://example.org/method/Width",
            "http://www.ontologyrepository.com/CommonCoreOntologies/InformationContentEntity"
        )));

        let label = "http://www.w3.org/2000/01/rdf-schema#label";
        let index = graph.literal_index(&[label]);
        assert_eq!(
            index.get(&("https://example.org/method/SpecimenName", label)),
            Some(&"Specimen name")
        );
        assert!(index.keys().all(|(_, predicate)| *predicate == label));
    }

    #[test]
    fn test_relative_iris_resolve_against_location() {
        let ttl = "<Thing> a <Class> .";
        let graph = RdfGraph::parse(ttl, RdfFormat::Turtle, &location()).unwrap();
        let typed: Vec<_> = graph.typed_subjects().collect();
        assert_eq!(
            typed,
            vec![("https://example.org/Thing", "https://example.org/Class")]
        );
    }

    #[test]
    fn test_parse_rdf_xml() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:owl="http://www.w3.org/2002/07/owl#">
  <owl:Class rdf:about="http://example.org/onto/A">
    <rdfs:subClassOf rdf:resource="http://example.org/onto/B"/>
  </owl:Class>
</rdf:RDF>"#;
        let graph = RdfGraph::parse(xml, RdfFormat::RdfXml, &location()).unwrap();
        let edges: Vec<_> = graph.subclass_edges().collect();
        assert_eq!(
            edges,
            vec![("http://example.org/onto/A", "http://example.org/onto/B")]
        );
        assert!(graph
            .types()
            .contains("http://www.w3.org/2002/07/owl#Class"));
    }

    #[test]
    fn test_parse_ntriples_deduplicates() {
        let nt = "<http://e.org/a> <http://e.org/p> \"x\" .\n<http://e.org/a> <http://e.org/p> \"x\" .\n";
        let graph = RdfGraph::parse(nt, RdfFormat::NTriples, &location()).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_parse_json_ld_inline_context() {
        let doc = r#"{
  "@context": {"rdfs": "http://www.w3.org/2000/01/rdf-schema#", "ex": "http://e.org/"},
  "@id": "ex:col1",
  "@type": "ex:Column",
  "rdfs:label": "Force"
}"#;
        let graph = RdfGraph::parse(doc, RdfFormat::JsonLd, &location()).unwrap();
        let typed: Vec<_> = graph.typed_subjects().collect();
        assert_eq!(typed, vec![("http://e.org/col1", "http://e.org/Column")]);
        assert_eq!(graph.namespaces().get("ex").unwrap(), "http://e.org/");
    }

    #[test]
    fn test_malformed_turtle_is_parse_error() {
        let err = RdfGraph::parse("this is not turtle", RdfFormat::Turtle, &location()).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { format: RdfFormat::Turtle, .. }));
    }
}
