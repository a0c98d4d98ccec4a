//! Common utilities and helper functions
//!
//! IRI and filename helpers shared by the query engine and the synthesizer.

pub mod error;

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Suffix appended by CSV-to-CSVW tooling to metadata documents
const METADATA_SUFFIX: &str = "-metadata";

/// Strip an IRI down to its final path or fragment segment
///
/// `http://example.org/data#Column1` and `http://example.org/data/Column1`
/// both yield `Column1`. Trailing separators are ignored.
pub fn short_id(iri: &str) -> String {
    let trimmed = iri.trim_end_matches(['/', '#']);
    trimmed
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// Last path segment of a URL with any query string or fragment removed
pub fn url_basename(location: &str) -> String {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location
            .split(['?', '#'])
            .next()
            .unwrap_or(location)
            .to_string(),
    };

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Derive the mapping filename for a data document
///
/// `.../example-metadata.json` becomes `example-map.yaml`. Without the
/// metadata suffix the extension is dropped and a trailing generated token
/// (`-3f9a2c1b`) is removed.
pub fn mapping_filename(data_url: &str) -> String {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

    let base = url_basename(data_url);

    let stem = if let Some(idx) = base.find(METADATA_SUFFIX) {
        base[..idx].to_string()
    } else {
        let stem = match base.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => base.as_str(),
        };
        let re = TOKEN_RE
            .get_or_init(|| Regex::new(r"-[0-9a-fA-F]{6,}$").expect("Invalid regex pattern"));
        re.replace(stem, "").to_string()
    };

    let stem = if stem.is_empty() { "mapping" } else { stem.as_str() };
    format!("{stem}-map.yaml")
}

/// Whether a string looks like an absolute IRI with a scheme
pub fn is_absolute_iri(value: &str) -> bool {
    static SCHEME_RE: OnceLock<Regex> = OnceLock::new();

    let re = SCHEME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("Invalid regex pattern"));
    re.is_match(value)
}
