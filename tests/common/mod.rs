//! Common test utilities

use std::path::PathBuf;
use std::sync::Arc;

use maptomethod::config::Config;
use maptomethod::fetch::HttpTransport;
use maptomethod::mapping::Mapper;
use maptomethod::ontology::{OntologyEntry, OntologyRegistry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a file under `tests/fixtures`
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("missing fixture {name}: {e}"))
}

/// Serve every fixture under `/<name>` with a matching content type
#[allow(dead_code)]
pub async fn mount_fixtures(server: &MockServer) {
    for (name, content_type) in [
        ("example-metadata.json", "application/json"),
        ("method.ttl", "text/turtle"),
        ("cco.ttl", "text/turtle"),
        ("bfo.owl", "application/rdf+xml"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_raw(fixture(name), content_type))
            .mount(server)
            .await;
    }
}

/// Registry pointing CCO and BFO at the mock server
#[allow(dead_code)]
pub fn test_registry(server: &MockServer) -> Arc<OntologyRegistry> {
    let registry = OntologyRegistry::with_entries(vec![
        OntologyEntry::new(
            "cco",
            "http://www.ontologyrepository.com/CommonCoreOntologies/",
            format!("{}/cco.ttl", server.uri()),
        ),
        OntologyEntry::new(
            "bfo",
            "http://purl.obolibrary.org/obo/",
            format!("{}/bfo.owl", server.uri()),
        ),
    ])
    .expect("valid test registry");
    Arc::new(registry)
}

/// Mapper with default configuration backed by the mock server
#[allow(dead_code)]
pub fn test_mapper(server: &MockServer) -> Mapper {
    test_mapper_with(server, Config::default())
}

/// Mapper with the given configuration backed by the mock server
#[allow(dead_code)]
pub fn test_mapper_with(server: &MockServer, config: Config) -> Mapper {
    let transport = HttpTransport::with_config(&config.fetch).expect("http client");
    Mapper::with_registry(config, Arc::new(transport), test_registry(server))
}
