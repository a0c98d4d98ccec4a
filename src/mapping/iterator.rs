//! JSONPath iterator discovery
//!
//! A mapping source tells the execution engine which array of the raw JSON
//! document to iterate. Documents differ in shape (a flat `notes` array, a
//! `tables[*].tableSchema.columns` nesting, ...), so the array is searched
//! for rather than assumed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use crate::fetch::{Transport, ACCEPT_JSON_LD};
use crate::graph::normalize_location;
use crate::utils::error::FetchError;

/// Iterator matching every array element anywhere in the document
pub const FALLBACK_ITERATOR: &str = "$..[*]";

/// Where a field's values live in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIterator {
    /// JSONPath expression selecting the objects that carry the field
    pub iterator: String,

    /// Name to register the source under
    pub source_name: String,
}

impl SourceIterator {
    /// Catch-all iterator for `field`
    pub fn fallback(field: &str) -> Self {
        Self {
            iterator: FALLBACK_ITERATOR.to_string(),
            source_name: format!("{}_all", field.to_ascii_lowercase()),
        }
    }

    /// Whether this is the catch-all iterator
    pub fn is_fallback(&self) -> bool {
        self.iterator == FALLBACK_ITERATOR
    }
}

/// Fetches source documents and searches them for field arrays
#[derive(Clone)]
pub struct IteratorDiscovery {
    transport: Arc<dyn Transport>,
}

impl IteratorDiscovery {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Find the iterator for `field` in the JSON document at `doc_url`
    ///
    /// A document that is not JSON, or that has no array of objects carrying
    /// the field, yields the catch-all iterator.
    ///
    /// # Errors
    ///
    /// Only retrieval failures are reported.
    pub async fn find_iterator(
        &self,
        doc_url: &str,
        field: &str,
        authorization: Option<&str>,
    ) -> Result<SourceIterator, FetchError> {
        let mut found = self
            .find_iterators(doc_url, &[field.to_string()], authorization)
            .await?;
        Ok(found.pop().unwrap_or_else(|| SourceIterator::fallback(field)))
    }

    /// Find iterators for several fields with a single fetch
    ///
    /// Results are in the order of `fields`.
    pub async fn find_iterators(
        &self,
        doc_url: &str,
        fields: &[String],
        authorization: Option<&str>,
    ) -> Result<Vec<SourceIterator>, FetchError> {
        let url = normalize_location(doc_url)?;
        let document = self
            .transport
            .fetch_with_accept(&url, authorization, ACCEPT_JSON_LD)
            .await?;

        let json = match serde_json::from_str::<Value>(&document.body) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Source is not JSON, using catch-all iterators");
                None
            }
        };

        Ok(fields
            .iter()
            .map(|field| match &json {
                Some(json) => discover_iterator(json, field),
                None => SourceIterator::fallback(field),
            })
            .collect())
    }
}

/// Search `doc` depth-first for the first array whose first element is an
/// object with `field`
///
/// Keys are visited in document order. An array's elements are searched
/// after the array itself was checked, so an outer match wins over a nested
/// one.
pub fn discover_iterator(doc: &Value, field: &str) -> SourceIterator {
    match find_array(doc, field, "$") {
        Some((iterator, key)) => {
            tracing::debug!(field = %field, iterator = %iterator, "Discovered iterator");
            SourceIterator {
                iterator,
                source_name: source_name(&key),
            }
        }
        None => {
            tracing::debug!(field = %field, "No array carries field, using catch-all iterator");
            SourceIterator::fallback(field)
        }
    }
}

fn find_array(node: &Value, field: &str, path: &str) -> Option<(String, String)> {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let child = format!("{path}{}", path_segment(key));
                match value {
                    Value::Array(items) if !items.is_empty() => {
                        let iterator = format!("{child}[*]");
                        let carries_field = items[0]
                            .as_object()
                            .is_some_and(|first| first.contains_key(field));
                        if carries_field {
                            return Some((iterator, key.clone()));
                        }
                        for item in items {
                            if let Some(found) = find_array(item, field, &iterator) {
                                return Some(found);
                            }
                        }
                    }
                    Value::Object(_) => {
                        if let Some(found) = find_array(value, field, &child) {
                            return Some(found);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        Value::Array(items) => {
            let iterator = format!("{path}[*]");
            items
                .iter()
                .find_map(|item| find_array(item, field, &iterator))
        }
        _ => None,
    }
}

/// `.key` for plain identifiers, `['key']` otherwise
fn path_segment(key: &str) -> String {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();

    let re = IDENT_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex pattern"));

    if re.is_match(key) {
        format!(".{key}")
    } else {
        format!("['{}']", key.replace('\'', "\\'"))
    }
}

/// Source name for the array found under `key`
pub fn source_name(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    if lower.contains("note") || lower.contains("annotation") {
        String::from("annotations")
    } else if lower.contains("column") {
        String::from("columns")
    } else if lower.contains("table") {
        String::from("tables")
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_table_columns() {
        let doc = json!({
            "tables": [{"tableSchema": {"columns": [{"name": "X", "titles": "Speed"}]}}]
        });
        let found = discover_iterator(&doc, "titles");
        assert_eq!(found.iterator, "$.tables[*].tableSchema.columns[*]");
        assert_eq!(found.source_name, "columns");
        assert!(!found.is_fallback());
    }

    #[test]
    fn test_flat_notes() {
        let doc = json!({
            "@context": "http://www.w3.org/ns/csvw",
            "notes": [{"@id": "n1", "label": "Specimen"}],
            "tableSchema": {"columns": [{"titles": "Force"}]}
        });
        let found = discover_iterator(&doc, "label");
        assert_eq!(found.iterator, "$.notes[*]");
        assert_eq!(found.source_name, "annotations");

        let found = discover_iterator(&doc, "titles");
        assert_eq!(found.iterator, "$.tableSchema.columns[*]");
    }

    #[test]
    fn test_first_match_in_document_order() {
        let doc = json!({
            "rows": [{"label": "a"}],
            "notes": [{"label": "b"}]
        });
        let found = discover_iterator(&doc, "label");
        assert_eq!(found.iterator, "$.rows[*]");
        assert_eq!(found.source_name, "rows");
    }

    #[test]
    fn test_non_identifier_keys_are_bracketed() {
        let doc = json!({"@graph": [{"label": "x"}]});
        let found = discover_iterator(&doc, "label");
        assert_eq!(found.iterator, "$['@graph'][*]");
        assert_eq!(found.source_name, "@graph");
    }

    #[test]
    fn test_fallback_when_field_missing() {
        let doc = json!({"notes": [{"label": "x"}], "empty": []});
        let found = discover_iterator(&doc, "titles");
        assert_eq!(found.iterator, FALLBACK_ITERATOR);
        assert_eq!(found.source_name, "titles_all");
        assert!(found.is_fallback());
    }

    #[test]
    fn test_only_first_element_is_checked() {
        let doc = json!({"items": [{"other": 1}, {"label": "x"}]});
        assert!(discover_iterator(&doc, "label").is_fallback());
    }

    #[test]
    fn test_source_name_rules() {
        assert_eq!(source_name("Notes"), "annotations");
        assert_eq!(source_name("myAnnotations"), "annotations");
        assert_eq!(source_name("columns"), "columns");
        assert_eq!(source_name("tables"), "tables");
        assert_eq!(source_name("Rows"), "rows");
    }
}
