pub mod map;
pub mod query;

use clap::ValueEnum;
use maptomethod::ontology::ClassMatch;

// Re-export command functions for convenience
pub use map::{map, MapParams};
pub use query::{objects, registry, resolve, subjects, types, QueryParams};

/// `--match` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    /// Only the listed classes
    Exact,
    /// The listed classes and their subclasses
    Subclasses,
}

impl From<MatchMode> for ClassMatch {
    fn from(mode: MatchMode) -> Self {
        match mode {
            MatchMode::Exact => ClassMatch::Exact,
            MatchMode::Subclasses => ClassMatch::Subclasses,
        }
    }
}

/// Rendering of a generated mapping document
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}
