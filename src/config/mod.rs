//! Configuration management for maptomethod
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::ontology::ClassMatch;
use crate::utils::is_absolute_iri;

/// `oa:Annotation`
pub const OA_ANNOTATION: &str = "http://www.w3.org/ns/oa#Annotation";

/// `csvw:Column`
pub const CSVW_COLUMN: &str = "http://www.w3.org/ns/csvw#Column";

/// `cco:InformationContentEntity`
pub const CCO_INFORMATION_CONTENT_ENTITY: &str =
    "http://www.ontologyrepository.com/CommonCoreOntologies/InformationContentEntity";

/// `bfo:BFO_0000008` (temporal region)
pub const BFO_TEMPORAL_REGION: &str = "http://purl.obolibrary.org/obo/BFO_0000008";

/// `obo:RO_0010002` (is carrier of)
pub const DEFAULT_PREDICATE: &str = "http://purl.obolibrary.org/obo/RO_0010002";

/// Namespace generated rule identifiers live under
pub const DEFAULT_MAPPING_BASE: &str = "http://purl.matolab.org/mseo/mappings/";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document retrieval configuration
    pub fetch: FetchConfig,

    /// Entity query and mapping defaults
    pub mapping: MappingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Accept self-signed or otherwise invalid TLS certificates
    pub accept_invalid_certs: bool,
}

/// Class filters, predicate and flags used when none are given per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Classes of the data document's subjects
    pub data_subject_classes: Vec<String>,

    /// Classes of the template document's objects
    pub template_object_classes: Vec<String>,

    /// Widen the data filter to subclasses
    pub expand_data_subclasses: bool,

    /// Widen the template filter to subclasses
    pub expand_template_subclasses: bool,

    /// Predicate linking data rows to template entities
    pub predicate: String,

    /// `base` of generated mapping documents
    pub base: String,

    /// Ask the execution engine to duplicate the template per data row
    pub use_template_rowwise: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, text)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let request_timeout_secs = std::env::var("MAPTOMETHOD_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.fetch.request_timeout_secs);

        let user_agent =
            std::env::var("MAPTOMETHOD_USER_AGENT").unwrap_or(defaults.fetch.user_agent);

        let accept_invalid_certs = env_flag("MAPTOMETHOD_ACCEPT_INVALID_CERTS")
            .unwrap_or(defaults.fetch.accept_invalid_certs);

        let data_subject_classes = env_list("MAPTOMETHOD_DATA_CLASSES")
            .unwrap_or(defaults.mapping.data_subject_classes);

        let template_object_classes = env_list("MAPTOMETHOD_TEMPLATE_CLASSES")
            .unwrap_or(defaults.mapping.template_object_classes);

        let expand_data_subclasses = env_flag("MAPTOMETHOD_EXPAND_DATA_SUBCLASSES")
            .unwrap_or(defaults.mapping.expand_data_subclasses);

        let expand_template_subclasses = env_flag("MAPTOMETHOD_EXPAND_TEMPLATE_SUBCLASSES")
            .unwrap_or(defaults.mapping.expand_template_subclasses);

        let predicate =
            std::env::var("MAPTOMETHOD_PREDICATE").unwrap_or(defaults.mapping.predicate);

        let base = std::env::var("MAPTOMETHOD_MAPPING_BASE").unwrap_or(defaults.mapping.base);

        let use_template_rowwise = env_flag("MAPTOMETHOD_USE_TEMPLATE_ROWWISE")
            .unwrap_or(defaults.mapping.use_template_rowwise);

        let log_level =
            std::env::var("MAPTOMETHOD_LOG_LEVEL").unwrap_or(defaults.logging.level);

        let log_format =
            std::env::var("MAPTOMETHOD_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            fetch: FetchConfig {
                request_timeout_secs,
                user_agent,
                accept_invalid_certs,
            },
            mapping: MappingConfig {
                data_subject_classes,
                template_object_classes,
                expand_data_subclasses,
                expand_template_subclasses,
                predicate,
                base,
                use_template_rowwise,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.fetch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if !is_absolute_iri(&self.mapping.predicate) {
            anyhow::bail!(
                "predicate must be an absolute IRI, got '{}'",
                self.mapping.predicate
            );
        }

        if !is_absolute_iri(&self.mapping.base) {
            anyhow::bail!("base must be an absolute IRI, got '{}'", self.mapping.base);
        }

        for class in self
            .mapping
            .data_subject_classes
            .iter()
            .chain(&self.mapping.template_object_classes)
        {
            if !is_absolute_iri(class) {
                anyhow::bail!("class filter must be an absolute IRI, got '{class}'");
            }
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }
}

impl FetchConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl MappingConfig {
    /// Match mode for data subject queries
    pub fn data_match(&self) -> ClassMatch {
        ClassMatch::from_expand(self.expand_data_subclasses)
    }

    /// Match mode for template object queries
    pub fn template_match(&self) -> ClassMatch {
        ClassMatch::from_expand(self.expand_template_subclasses)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: format!("maptomethod/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: true,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            data_subject_classes: default_data_classes(),
            template_object_classes: default_template_classes(),
            expand_data_subclasses: false,
            expand_template_subclasses: true,
            predicate: String::from(DEFAULT_PREDICATE),
            base: String::from(DEFAULT_MAPPING_BASE),
            use_template_rowwise: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Default data subject classes, built fresh on every call
pub fn default_data_classes() -> Vec<String> {
    vec![String::from(OA_ANNOTATION), String::from(CSVW_COLUMN)]
}

/// Default template object classes, built fresh on every call
pub fn default_template_classes() -> Vec<String> {
    vec![
        String::from(CCO_INFORMATION_CONTENT_ENTITY),
        String::from(BFO_TEMPORAL_REGION),
    ]
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let value = std::env::var(name).ok()?;
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
