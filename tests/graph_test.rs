//! Integration tests for GraphLoader
//!
//! Format detection, JSON-LD context inlining and the retrieval/parse error
//! split, exercised over a mock server and local files.

mod common;

use std::sync::Arc;

use common::{fixture, fixture_path, mount_fixtures};
use maptomethod::fetch::HttpTransport;
use maptomethod::graph::{GraphLoader, RdfFormat};
use maptomethod::utils::error::LoadError;
use serde_json::json;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn loader() -> GraphLoader {
    GraphLoader::new(Arc::new(HttpTransport::new().unwrap()))
}

#[tokio::test]
async fn test_load_turtle_by_extension() {
    let server = MockServer::start().await;
    mount_fixtures(&server).await;

    let graph = loader()
        .load(&format!("{}/method.ttl", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(graph.format(), RdfFormat::Turtle);
    assert_eq!(
        graph.namespaces().get("base").map(String::as_str),
        Some("https://example.org/method/")
    );
    assert!(graph
        .types()
        .contains("http://purl.obolibrary.org/obo/BFO_0000038"));
}

#[tokio::test]
async fn test_load_rdf_xml_ontology() {
    let server = MockServer::start().await;
    mount_fixtures(&server).await;

    let graph = loader()
        .load(&format!("{}/bfo.owl", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(graph.format(), RdfFormat::RdfXml);
    assert_eq!(graph.subclass_edges().count(), 2);
}

#[tokio::test]
async fn test_api_download_path_is_json_ld() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/files/7/download/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(fixture("example-metadata.json"), "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let graph = loader()
        .load(&format!("{}/api/files/7/download/upload", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(graph.format(), RdfFormat::JsonLd);
    assert!(graph.types().contains("http://www.w3.org/ns/csvw#Column"));
    assert_eq!(
        graph.namespaces().get("base").map(String::as_str),
        Some("https://example.org/data/")
    );
}

#[tokio::test]
async fn test_remote_context_is_inlined() {
    let server = MockServer::start().await;

    let context = json!({
        "@context": {
            "csvw": "http://www.w3.org/ns/csvw#",
            "titles": "csvw:title",
            "Column": "csvw:Column"
        }
    });
    Mock::given(method("GET"))
        .and(path("/contexts/csvw.jsonld"))
        .respond_with(ResponseTemplate::new(200).set_body_json(context))
        .expect(1)
        .mount(&server)
        .await;

    let document = json!({
        "@context": [format!("{}/contexts/csvw.jsonld", server.uri()), {"@base": "https://example.org/data/"}],
        "@id": "col1",
        "@type": "Column",
        "titles": "Kraft"
    });
    Mock::given(method("GET"))
        .and(path("/data.jsonld"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(&server)
        .await;

    let graph = loader()
        .load(&format!("{}/data.jsonld", server.uri()), None)
        .await
        .unwrap();

    let typed: Vec<_> = graph.typed_subjects().collect();
    assert_eq!(
        typed,
        vec![("https://example.org/data/col1", "http://www.w3.org/ns/csvw#Column")]
    );
    assert_eq!(
        graph.namespaces().get("csvw").map(String::as_str),
        Some("http://www.w3.org/ns/csvw#")
    );
}

#[tokio::test]
async fn test_remote_context_is_negotiated_as_json_ld() {
    let server = MockServer::start().await;

    // The namespace document answers Turtle unless JSON-LD is asked for first
    Mock::given(method("GET"))
        .and(path("/ns/csvw"))
        .and(header_regex("accept", r"^application/ld\+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@context": {
                "csvw": "http://www.w3.org/ns/csvw#",
                "titles": "csvw:title",
                "Column": "csvw:Column"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ns/csvw"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "@prefix csvw: <http://www.w3.org/ns/csvw#> .\ncsvw:Column a <http://www.w3.org/2000/01/rdf-schema#Class> .\n",
            "text/turtle",
        ))
        .expect(0)
        .mount(&server)
        .await;

    let document = json!({
        "@context": [format!("{}/ns/csvw", server.uri()), {"@base": "https://example.org/data/"}],
        "@id": "col1",
        "@type": "Column",
        "titles": "Kraft"
    });
    Mock::given(method("GET"))
        .and(path("/files/example-metadata.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(&server)
        .await;

    let graph = loader()
        .load(&format!("{}/files/example-metadata.json", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(graph.format(), RdfFormat::JsonLd);
    assert!(graph.types().contains("http://www.w3.org/ns/csvw#Column"));
}

#[tokio::test]
async fn test_status_error_is_retrieval() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.ttl"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let err = loader()
        .load(&format!("{}/gone.ttl", server.uri()), None)
        .await
        .unwrap_err();

    assert!(err.is_retrieval());
    match err {
        LoadError::Fetch(fetch) => assert_eq!(fetch.status(), Some(410)),
        other => panic!("expected retrieval error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_document_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.ttl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("@prefix ex <oops"))
        .mount(&server)
        .await;

    let err = loader()
        .load(&format!("{}/broken.ttl", server.uri()), None)
        .await
        .unwrap_err();

    assert!(!err.is_retrieval());
    assert!(matches!(err, LoadError::Parse(_)));
    assert!(err.to_string().contains("broken.ttl"));
}

#[tokio::test]
async fn test_load_local_path() {
    let location = fixture_path("method.ttl");
    let graph = loader()
        .load(location.to_str().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(graph.location().scheme(), "file");
    assert_eq!(graph.typed_subjects().count(), 5);
}

#[tokio::test]
async fn test_load_as_overrides_guess() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("graph.data");
    std::fs::write(
        &file,
        "<http://e.org/a> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://e.org/B> .\n",
    )
    .unwrap();

    let graph = loader()
        .load_as(file.to_str().unwrap(), RdfFormat::NTriples, None)
        .await
        .unwrap();

    assert_eq!(graph.format(), RdfFormat::NTriples);
    assert_eq!(graph.len(), 1);
}
