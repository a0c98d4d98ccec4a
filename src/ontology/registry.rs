//! Catalog of known ontologies
//!
//! Maps a prefix to its namespace IRI and to the document that defines the
//! ontology. Built once per process; read-only afterwards.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use super::error::{OntologyError, OntologyResult};
use crate::utils::{is_absolute_iri, short_id};

/// Well-known vocabularies whose namespace IRI also serves the definition
const WELL_KNOWN: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("org", "http://www.w3.org/ns/org#"),
    ("odrl", "http://www.w3.org/ns/odrl/2/"),
    ("prof", "http://www.w3.org/ns/dx/prof/"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("qb", "http://purl.org/linked-data/cube#"),
    ("schema", "https://schema.org/"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("sosa", "http://www.w3.org/ns/sosa/"),
    ("ssn", "http://www.w3.org/ns/ssn/"),
    ("time", "http://www.w3.org/2006/time#"),
    ("vann", "http://purl.org/vocab/vann/"),
    ("void", "http://rdfs.org/ns/void#"),
];

/// Domain ontologies whose definition lives somewhere else than the namespace
const DOMAIN: &[(&str, &str, &str)] = &[
    (
        "bfo",
        "http://purl.obolibrary.org/obo/",
        "http://purl.obolibrary.org/obo/bfo.owl",
    ),
    (
        "iao",
        "http://purl.obolibrary.org/obo/",
        "http://purl.obolibrary.org/obo/iao.owl",
    ),
    (
        "cco",
        "http://www.ontologyrepository.com/CommonCoreOntologies/",
        "https://raw.githubusercontent.com/CommonCoreOntology/CommonCoreOntologies/master/cco-merged/MergedAllCoreOntology-v1.3-2021-03-01.ttl",
    ),
    (
        "iof",
        "https://spec.industrialontologies.org/ontology/core/Core/",
        "https://spec.industrialontologies.org/ontology/core/Core/",
    ),
    ("oa", "http://www.w3.org/ns/oa#", "http://www.w3.org/ns/oa.ttl"),
    (
        "csvw",
        "http://www.w3.org/ns/csvw#",
        "https://www.w3.org/ns/csvw.ttl",
    ),
    (
        "mseo",
        "https://purl.matolab.org/mseo/mid/",
        "https://purl.matolab.org/mseo/mid",
    ),
    ("pmd", "https://w3id.org/pmd/co/", "https://w3id.org/pmd/co/"),
];

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyEntry {
    /// Short prefix, e.g. `bfo`
    pub prefix: String,

    /// Namespace IRI the ontology's classes live under
    pub uri: String,

    /// Document to fetch to learn the ontology's class hierarchy
    pub src: String,
}

impl OntologyEntry {
    /// Create an entry
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
            src: src.into(),
        }
    }
}

/// Prefix -> ontology catalog
#[derive(Debug, Clone, Default)]
pub struct OntologyRegistry {
    entries: IndexMap<String, OntologyEntry>,
}

impl OntologyRegistry {
    /// Registry built from the well-known vocabularies and domain ontologies
    pub fn builtin() -> Self {
        let mut entries = IndexMap::new();

        for (prefix, uri) in WELL_KNOWN {
            entries.insert(prefix.to_string(), OntologyEntry::new(*prefix, *uri, *uri));
        }
        for (prefix, uri, src) in DOMAIN {
            entries.insert(prefix.to_string(), OntologyEntry::new(*prefix, *uri, *src));
        }

        Self { entries }
    }

    /// Process-wide builtin registry, computed on first use
    pub fn shared() -> Arc<Self> {
        static REGISTRY: OnceLock<Arc<OntologyRegistry>> = OnceLock::new();

        REGISTRY.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    /// Registry from explicit entries
    ///
    /// # Errors
    ///
    /// Returns `OntologyError::DuplicatePrefix` when a prefix repeats and
    /// `OntologyError::InvalidRegistryEntry` for non-IRI namespaces.
    pub fn with_entries(entries: impl IntoIterator<Item = OntologyEntry>) -> OntologyResult<Self> {
        let mut map = IndexMap::new();

        for entry in entries {
            if !is_absolute_iri(&entry.uri) {
                return Err(OntologyError::InvalidRegistryEntry {
                    prefix: entry.prefix,
                    reason: format!("namespace '{}' is not an absolute IRI", entry.uri),
                });
            }
            if map.contains_key(&entry.prefix) {
                return Err(OntologyError::DuplicatePrefix {
                    prefix: entry.prefix,
                });
            }
            map.insert(entry.prefix.clone(), entry);
        }

        Ok(Self { entries: map })
    }

    /// Entry by prefix
    pub fn get(&self, prefix: &str) -> Option<&OntologyEntry> {
        self.entries.get(prefix)
    }

    /// All entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &OntologyEntry> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the ontology that defines `class_iri`
    ///
    /// OBO-style identifiers (`BFO_0000008`) are tried by their id prefix
    /// first. Otherwise the entry with the longest namespace that prefixes
    /// the class IRI wins, skipping namespaces registered by more than one
    /// entry: those only resolve by id prefix.
    pub fn lookup(&self, class_iri: &str) -> Option<&OntologyEntry> {
        if let Some(entry) = ontology_key(class_iri)
            .and_then(|key| self.entries.get(&key))
            .filter(|entry| class_iri.starts_with(&entry.uri))
        {
            return Some(entry);
        }

        self.entries
            .values()
            .filter(|entry| !entry.uri.is_empty() && class_iri.starts_with(&entry.uri))
            .filter(|entry| self.entries.values().filter(|e| e.uri == entry.uri).count() == 1)
            .max_by_key(|entry| entry.uri.len())
    }
}

/// Lower-cased id prefix of an OBO-style class IRI tail, e.g. `bfo`
pub fn ontology_key(class_iri: &str) -> Option<String> {
    static OBO_ID_RE: OnceLock<Regex> = OnceLock::new();

    let re = OBO_ID_RE
        .get_or_init(|| Regex::new(r"^([A-Za-z]+)_\d+$").expect("Invalid regex pattern"));

    let tail = short_id(class_iri);
    re.captures(&tail).map(|caps| caps[1].to_ascii_lowercase())
}
