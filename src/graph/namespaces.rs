//! Namespace bindings declared by a document
//!
//! The RDF parsers only yield triples, so prefix declarations are read
//! straight from the source text (Turtle, RDF/XML) or from the JSON-LD
//! context.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::RdfFormat;

/// Prefix bound by JSON-LD `@base` when the document has no `base` prefix
pub const BASE_PREFIX: &str = "base";

/// Ordered prefix -> namespace IRI bindings
pub type Namespaces = IndexMap<String, String>;

/// Extract the namespace bindings of a document in the given format
pub fn extract_namespaces(format: RdfFormat, text: &str) -> Namespaces {
    match format {
        RdfFormat::Turtle => turtle_prefixes(text),
        RdfFormat::RdfXml => xml_prefixes(text),
        RdfFormat::JsonLd => serde_json::from_str::<Value>(text)
            .map(|doc| json_ld_prefixes(&doc))
            .unwrap_or_default(),
        RdfFormat::NTriples => Namespaces::new(),
    }
}

/// `@prefix p: <iri> .` and SPARQL-style `PREFIX p: <iri>`
fn turtle_prefixes(text: &str) -> Namespaces {
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();

    let re = PREFIX_RE.get_or_init(|| {
        Regex::new(r"(?mi)^\s*@?prefix\s+([A-Za-z][\w.\-]*)?:\s*<([^>]*)>")
            .expect("Invalid regex pattern")
    });

    re.captures_iter(text)
        .map(|caps| {
            let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (prefix.to_string(), caps[2].to_string())
        })
        .collect()
}

/// `xmlns:p="iri"` attributes anywhere in the document
fn xml_prefixes(text: &str) -> Namespaces {
    static XMLNS_RE: OnceLock<Regex> = OnceLock::new();

    let re = XMLNS_RE.get_or_init(|| {
        Regex::new(r#"xmlns(?::([A-Za-z_][\w.\-]*))?\s*=\s*["']([^"']*)["']"#)
            .expect("Invalid regex pattern")
    });

    let mut namespaces = Namespaces::new();
    for caps in re.captures_iter(text) {
        let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        namespaces
            .entry(prefix.to_string())
            .or_insert_with(|| caps[2].to_string());
    }
    namespaces
}

/// Term definitions of the (inlined) `@context` whose value is a namespace IRI
pub fn json_ld_prefixes(doc: &Value) -> Namespaces {
    let mut namespaces = Namespaces::new();
    let mut base = None;

    let contexts: Vec<&Value> = match doc {
        Value::Object(map) => map.get("@context").into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(|i| i.get("@context")).collect(),
        _ => Vec::new(),
    };

    for context in contexts {
        collect_context(context, &mut namespaces, &mut base);
    }

    if let Some(base) = base {
        namespaces.entry(BASE_PREFIX.to_string()).or_insert(base);
    }

    namespaces
}

fn collect_context(context: &Value, namespaces: &mut Namespaces, base: &mut Option<String>) {
    match context {
        Value::Array(items) => {
            for item in items {
                collect_context(item, namespaces, base);
            }
        }
        Value::Object(map) => {
            for (term, definition) in map {
                if term == "@base" {
                    if let Some(iri) = definition.as_str() {
                        *base = Some(iri.to_string());
                    }
                    continue;
                }
                if term.starts_with('@') {
                    continue;
                }
                let iri = match definition {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(def) => def.get("@id").and_then(Value::as_str),
                    _ => None,
                };
                if let Some(iri) = iri.filter(|iri| is_namespace_iri(iri)) {
                    namespaces.insert(term.clone(), iri.to_string());
                }
            }
        }
        _ => {}
    }
}

fn is_namespace_iri(iri: &str) -> bool {
    iri.contains(':') && (iri.ends_with('/') || iri.ends_with('#'))
}
