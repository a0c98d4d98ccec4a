//! Entity record types returned by the query engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `rdfs:label`
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// `csvw:title`
pub const CSVW_TITLE: &str = "http://www.w3.org/ns/csvw#title";

/// `csvw:name`
pub const CSVW_NAME: &str = "http://www.w3.org/ns/csvw#name";

/// Label predicates in priority order, with the name recorded for each
pub const LABEL_PREDICATES: &[(&str, &str)] = &[
    (RDFS_LABEL, "label"),
    (CSVW_TITLE, "title"),
    (CSVW_NAME, "name"),
];

/// One matched individual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Full subject IRI
    pub uri: String,

    /// Final path or fragment segment of `uri`
    pub short_id: String,

    /// Stripped name of the predicate that supplied `label_text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_property: Option<String>,

    /// Display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,

    /// Class that matched the filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<String>,
}

impl EntityRecord {
    /// Create a record without label or type information
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let short_id = crate::utils::short_id(&uri);
        Self {
            uri,
            short_id,
            label_property: None,
            label_text: None,
            rdf_type: None,
        }
    }

    /// Set the label property and text
    pub fn with_label(mut self, property: impl Into<String>, text: impl Into<String>) -> Self {
        self.label_property = Some(property.into());
        self.label_text = Some(text.into());
        self
    }

    /// Set the matched class
    pub fn with_type(mut self, rdf_type: impl Into<String>) -> Self {
        self.rdf_type = Some(rdf_type.into());
        self
    }
}

/// Entities keyed by short id
pub type EntityMap = BTreeMap<String, EntityRecord>;

/// Two subject IRIs that reduce to the same short id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIdCollision {
    pub short_id: String,

    /// IRI whose record was kept
    pub kept: String,

    /// IRI that was not added to the result
    pub dropped: String,
}

/// Outcome of an entity query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub entities: EntityMap,

    /// Namespace the document's identifiers live under
    pub base_namespace: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<ShortIdCollision>,
}

impl QueryResult {
    /// Number of entities found
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether any short ids collided
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}
