//! YARRRML mapping document model
//!
//! Every map keeps insertion order so that regenerated documents diff
//! cleanly under version control.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reference formulation of every generated source
pub const JSONPATH: &str = "jsonpath";

/// Condition function comparing two strings
pub const EQUAL_FUNCTION: &str = "equal";

/// Subject template of every generated rule
pub const SUBJECT_TEMPLATE: &str = "$(@id)";

/// A complete mapping document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Prefix -> namespace bindings
    pub prefixes: IndexMap<String, String>,

    /// Namespace of generated rule identifiers
    pub base: String,

    /// `"true"` or `"false"`, consumed by the execution engine
    pub use_template_rowwise: String,

    /// Named JSONPath sources
    pub sources: IndexMap<String, Source>,

    /// Template entity id -> rule
    pub mappings: IndexMap<String, MappingRule>,
}

/// A JSONPath source over the data document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub access: String,

    #[serde(rename = "referenceFormulation")]
    pub reference_formulation: String,

    pub iterator: String,
}

impl Source {
    /// JSONPath source over `access`
    pub fn jsonpath(access: impl Into<String>, iterator: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            reference_formulation: JSONPATH.to_string(),
            iterator: iterator.into(),
        }
    }
}

/// Rule linking matching data rows to one template entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub sources: Vec<String>,

    /// Subject template
    pub s: String,

    pub condition: Condition,

    /// Predicate-object pairs
    pub po: Vec<(String, String)>,
}

/// Function call guarding a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub function: String,

    /// `(name, value)` arguments
    pub parameters: Vec<(String, String)>,
}

impl Condition {
    /// `equal(str1 = $(reference), str2 = literal)`
    pub fn equal(reference: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            function: EQUAL_FUNCTION.to_string(),
            parameters: vec![
                (String::from("str1"), reference.into()),
                (String::from("str2"), literal.into()),
            ],
        }
    }
}

impl MappingDocument {
    /// Empty document with the given prefixes and base
    pub fn new(prefixes: IndexMap<String, String>, base: impl Into<String>, rowwise: bool) -> Self {
        Self {
            prefixes,
            base: base.into(),
            use_template_rowwise: rowwise.to_string(),
            sources: IndexMap::new(),
            mappings: IndexMap::new(),
        }
    }

    /// Whether the execution engine should duplicate the template per row
    pub fn rowwise(&self) -> bool {
        self.use_template_rowwise.eq_ignore_ascii_case("true")
    }

    /// YAML text, keys in insertion order
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Pretty-printed JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a document from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> MappingDocument {
        let mut prefixes = IndexMap::new();
        prefixes.insert("template".to_string(), "https://example.org/method/".to_string());
        prefixes.insert("data".to_string(), "https://example.org/data/".to_string());

        let mut doc = MappingDocument::new(prefixes, "http://purl.matolab.org/mseo/mappings/", false);
        doc.sources.insert(
            "columns".to_string(),
            Source::jsonpath("https://example.org/data.json", "$.tableSchema.columns[*]"),
        );
        doc.mappings.insert(
            "Width".to_string(),
            MappingRule {
                sources: vec!["columns".to_string()],
                s: SUBJECT_TEMPLATE.to_string(),
                condition: Condition::equal("$(titles)", "Breite (µm)\nzweite Zeile"),
                po: vec![(
                    "http://purl.obolibrary.org/obo/RO_0010002".to_string(),
                    "template:Width~iri".to_string(),
                )],
            },
        );
        doc
    }

    #[test]
    fn test_yaml_key_order() {
        let yaml = document().to_yaml().unwrap();
        let positions: Vec<usize> = ["prefixes:", "base:", "use_template_rowwise:", "sources:", "mappings:"]
            .iter()
            .map(|key| yaml.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(yaml.contains("referenceFormulation: jsonpath"));
    }

    #[test]
    fn test_yaml_keeps_unicode_unescaped() {
        let yaml = document().to_yaml().unwrap();
        assert!(yaml.contains("µm"));
        assert!(!yaml.contains("\\u"));
    }

    #[test]
    fn test_rowwise_flag_is_string() {
        let doc = document();
        assert_eq!(doc.use_template_rowwise, "false");
        assert!(!doc.rowwise());

        let back = MappingDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
        assert_eq!(back.use_template_rowwise, "false");
    }

    #[test]
    fn test_json_rendering() {
        let json: serde_json::Value = serde_json::from_str(&document().to_json().unwrap()).unwrap();
        assert_eq!(json["mappings"]["Width"]["condition"]["function"], "equal");
        assert_eq!(json["mappings"]["Width"]["po"][0][1], "template:Width~iri");
    }
}
