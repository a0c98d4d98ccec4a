//! Mapping document synthesis
//!
//! Turns a list of (template id, data id) pairs into a mapping document:
//! one source per label field, one equality-guarded rule per valid pair.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::document::{Condition, MappingDocument, MappingRule, Source, SUBJECT_TEMPLATE};
use super::iterator::{IteratorDiscovery, SourceIterator};
use crate::entities::EntityMap;
use crate::utils::error::FetchError;

/// Namespaces bound in every generated document after `template` and `data`
const FIXED_PREFIXES: &[(&str, &str)] = &[
    ("bfo", "http://purl.obolibrary.org/obo/"),
    ("csvw", "http://www.w3.org/ns/csvw#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
];

/// Link data entity `data_id` to template entity `template_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingPair {
    pub template_id: String,
    pub data_id: String,
}

impl MappingPair {
    pub fn new(template_id: impl Into<String>, data_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            data_id: data_id.into(),
        }
    }
}

impl FromStr for MappingPair {
    type Err = String;

    /// Parse `TEMPLATE_ID=DATA_ID`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((template, data)) if !template.trim().is_empty() && !data.trim().is_empty() => {
                Ok(Self::new(template.trim(), data.trim()))
            }
            _ => Err(format!("expected TEMPLATE_ID=DATA_ID, got '{s}'")),
        }
    }
}

impl fmt::Display for MappingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.template_id, self.data_id)
    }
}

/// Why a pair produced no rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The data id is not in the supplied entity dictionary
    UnknownDataEntity,
    /// The data entity has no label to compare against
    MissingLabel,
    /// An earlier pair already mapped this template id
    DuplicateTemplate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownDataEntity => "unknown data entity",
            Self::MissingLabel => "data entity has no label",
            Self::DuplicateTemplate => "template entity already mapped",
        };
        f.write_str(text)
    }
}

/// A pair left out of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub pair: MappingPair,
    pub reason: SkipReason,
}

/// Inputs of one synthesis
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    /// Data document the sources read from
    pub data_url: &'a str,

    pub use_template_rowwise: bool,

    /// Namespace bound to `data`
    pub data_namespace: &'a str,

    /// Namespace bound to `template`
    pub template_namespace: &'a str,

    /// Pairs in output order
    pub pairs: &'a [MappingPair],

    /// Data entities the pairs' data ids refer to
    pub subject_entities: &'a EntityMap,

    /// Predicate of each rule's predicate-object pair
    pub predicate: &'a str,

    /// `base` of the document
    pub base: &'a str,
}

/// A synthesized document with the pairs it left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub document: MappingDocument,
    pub skipped: Vec<SkippedPair>,
}

/// Builds mapping documents
#[derive(Clone)]
pub struct MappingSynthesizer {
    discovery: IteratorDiscovery,
}

impl MappingSynthesizer {
    pub fn new(discovery: IteratorDiscovery) -> Self {
        Self { discovery }
    }

    /// Build the mapping document for `request`
    ///
    /// Pairs with an unknown or unlabeled data entity, or a template id that
    /// was already mapped, are skipped and reported; they never fail the
    /// synthesis. Each distinct label field is looked up in the data
    /// document once.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the data document cannot be retrieved.
    pub async fn synthesize(
        &self,
        request: &SynthesisRequest<'_>,
        authorization: Option<&str>,
    ) -> Result<Synthesis, FetchError> {
        let plan = plan_rules(request);

        let fields: Vec<String> = plan.fields.iter().cloned().collect();
        let iterators = if fields.is_empty() {
            Vec::new()
        } else {
            self.discovery
                .find_iterators(request.data_url, &fields, authorization)
                .await?
        };

        let synthesis = assemble(request, plan, &fields, iterators);

        tracing::info!(
            data = %request.data_url,
            rules = synthesis.document.mappings.len(),
            sources = synthesis.document.sources.len(),
            skipped = synthesis.skipped.len(),
            "Synthesized mapping document"
        );

        Ok(synthesis)
    }
}

/// Valid pairs resolved to (template id, field, label text)
struct RulePlan {
    rules: Vec<(String, String, String)>,
    fields: IndexSet<String>,
    skipped: Vec<SkippedPair>,
}

fn plan_rules(request: &SynthesisRequest<'_>) -> RulePlan {
    let mut rules = Vec::new();
    let mut fields = IndexSet::new();
    let mut skipped = Vec::new();
    let mut mapped: IndexSet<&str> = IndexSet::new();

    let mut skip = |pair: &MappingPair, reason: SkipReason| {
        tracing::debug!(
            template = %pair.template_id,
            data = %pair.data_id,
            reason = %reason,
            "Skipping mapping pair"
        );
        skipped.push(SkippedPair {
            pair: pair.clone(),
            reason,
        });
    };

    for pair in request.pairs {
        let Some(entity) = request.subject_entities.get(&pair.data_id) else {
            skip(pair, SkipReason::UnknownDataEntity);
            continue;
        };
        let (Some(property), Some(text)) = (&entity.label_property, &entity.label_text) else {
            skip(pair, SkipReason::MissingLabel);
            continue;
        };
        if !mapped.insert(pair.template_id.as_str()) {
            skip(pair, SkipReason::DuplicateTemplate);
            continue;
        }

        let field = lookup_field(property);
        fields.insert(field.clone());
        rules.push((pair.template_id.clone(), field, text.clone()));
    }

    RulePlan {
        rules,
        fields,
        skipped,
    }
}

fn assemble(
    request: &SynthesisRequest<'_>,
    plan: RulePlan,
    fields: &[String],
    iterators: Vec<SourceIterator>,
) -> Synthesis {
    let mut document = MappingDocument::new(
        document_prefixes(request.template_namespace, request.data_namespace),
        request.base,
        request.use_template_rowwise,
    );

    let mut source_of: IndexMap<&str, String> = IndexMap::new();
    for (field, found) in fields.iter().zip(iterators) {
        let name = free_source_name(&document.sources, &found, field);
        document
            .sources
            .entry(name.clone())
            .or_insert_with(|| Source::jsonpath(request.data_url, found.iterator));
        source_of.insert(field.as_str(), name);
    }

    for (template_id, field, text) in plan.rules {
        let Some(source) = source_of.get(field.as_str()) else {
            continue;
        };
        let rule = MappingRule {
            sources: vec![source.clone()],
            s: SUBJECT_TEMPLATE.to_string(),
            condition: Condition::equal(format!("$({field})"), text),
            po: vec![(
                request.predicate.to_string(),
                format!("template:{template_id}~iri"),
            )],
        };
        document.mappings.insert(template_id, rule);
    }

    Synthesis {
        document,
        skipped: plan.skipped,
    }
}

/// Source name for `found` that is unused or already bound to its iterator
///
/// A clash becomes `{name}_{field}`, then `{name}_{field}_2`, `{name}_{field}_3`
/// until a name fits.
fn free_source_name(
    sources: &IndexMap<String, Source>,
    found: &SourceIterator,
    field: &str,
) -> String {
    let fits = |name: &str| {
        sources
            .get(name)
            .map_or(true, |existing| existing.iterator == found.iterator)
    };

    if fits(&found.source_name) {
        return found.source_name.clone();
    }

    let renamed = format!("{}_{}", found.source_name, field.to_ascii_lowercase());
    let mut candidate = renamed.clone();
    let mut n = 2usize;
    while !fits(&candidate) {
        candidate = format!("{renamed}_{n}");
        n += 1;
    }
    candidate
}

/// JSON key holding the values of a label property
///
/// CSVW metadata spells `csvw:title` as `titles`.
pub fn lookup_field(label_property: &str) -> String {
    match label_property {
        "title" => String::from("titles"),
        other => other.to_string(),
    }
}

/// `template`, `data`, then the fixed vocabulary prefixes
pub fn document_prefixes(template_namespace: &str, data_namespace: &str) -> IndexMap<String, String> {
    let mut prefixes = IndexMap::new();
    prefixes.insert(String::from("template"), template_namespace.to_string());
    prefixes.insert(String::from("data"), data_namespace.to_string());
    for (prefix, iri) in FIXED_PREFIXES {
        prefixes
            .entry(prefix.to_string())
            .or_insert_with(|| iri.to_string());
    }
    prefixes
}
