//! Document retrieval over HTTP(S) and from the local filesystem
//!
//! This module provides the transport used by the graph loader and the
//! iterator discovery:
//! - `http(s)://` retrieval with an optional `Authorization` header
//! - `file://` retrieval for local documents
//! - UTF-8 decoding (BOM-aware) of the response body
//!
//! RDF documents are requested with [`ACCEPT_RDF`]. JSON-LD contexts are
//! requested with [`ACCEPT_JSON_LD`], since hosts such as the CSVW namespace
//! negotiate Turtle for a Turtle-first header.
//!
//! Every fetch is a single attempt. Non-success responses surface as
//! [`FetchError::Status`] with the URL and status code attached.

use async_trait::async_trait;
use encoding_rs::UTF_8;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use url::Url;

use crate::config::FetchConfig;
use crate::utils::error::FetchError;

/// Accept header for RDF documents, Turtle first
pub const ACCEPT_RDF: &str = "text/turtle, application/rdf+xml;q=0.9, application/ld+json;q=0.9, application/json;q=0.8, */*;q=0.5";

/// Accept header for JSON-LD contexts and JSON data documents
pub const ACCEPT_JSON_LD: &str = "application/ld+json, application/json;q=0.9, */*;q=0.1";

/// A retrieved and decoded document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final location of the document
    pub url: Url,

    /// `Content-Type` reported by the server, if any
    pub content_type: Option<String>,

    /// Decoded body
    pub body: String,
}

/// Source of raw documents
///
/// The graph loader and iterator discovery only ever talk to this trait, so
/// tests and embedding applications can substitute their own retrieval.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a document, forwarding `authorization` when supplied
    async fn fetch(
        &self,
        url: &Url,
        authorization: Option<&str>,
    ) -> Result<FetchedDocument, FetchError> {
        self.fetch_with_accept(url, authorization, ACCEPT_RDF).await
    }

    /// Fetch a document, asking for the media types in `accept`
    async fn fetch_with_accept(
        &self,
        url: &Url,
        authorization: Option<&str>,
        accept: &str,
    ) -> Result<FetchedDocument, FetchError>;
}

/// Default transport backed by reqwest and tokio's filesystem API
pub struct HttpTransport {
    /// HTTP client with configured timeout and compression
    client: Client,
}

impl HttpTransport {
    /// Create a transport with default settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(&FetchConfig::default())
    }

    /// Create a transport from fetch configuration
    ///
    /// Certificate validation follows `accept_invalid_certs`, which defaults
    /// to accepting self-signed and misconfigured ontology hosts.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Http {
                url: String::from("<client>"),
                source: e,
            })?;

        Ok(Self { client })
    }

    async fn fetch_http(
        &self,
        url: &Url,
        authorization: Option<&str>,
        accept: &str,
    ) -> Result<FetchedDocument, FetchError> {
        let headers = build_headers(authorization, accept)?;

        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http {
                        url: url.to_string(),
                        source: e,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let body = decode_utf8(&bytes).map_err(|reason| FetchError::Decode {
            url: url.to_string(),
            reason,
        })?;

        tracing::debug!(url = %final_url, bytes = bytes.len(), "Fetched remote document");

        Ok(FetchedDocument {
            url: final_url,
            content_type,
            body,
        })
    }

    async fn fetch_file(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| FetchError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let body = decode_utf8(&bytes).map_err(|reason| FetchError::Decode {
            url: url.to_string(),
            reason,
        })?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read local document");

        Ok(FetchedDocument {
            url: url.clone(),
            content_type: None,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_with_accept(
        &self,
        url: &Url,
        authorization: Option<&str>,
        accept: &str,
    ) -> Result<FetchedDocument, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url, authorization, accept).await,
            "file" => self.fetch_file(url).await,
            other => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{other}' in {url}"
            ))),
        }
    }
}

/// Build request headers, attaching `Authorization` when supplied
///
/// A bare token is sent as `Bearer <token>`; a value that already carries a
/// scheme (`Bearer ...`, `Basic ...`) is forwarded verbatim.
pub fn build_headers(authorization: Option<&str>, accept: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let accept = HeaderValue::from_str(accept)
        .map_err(|_| FetchError::InvalidUrl(format!("invalid accept header '{accept}'")))?;
    headers.insert(ACCEPT, accept);

    if let Some(auth) = authorization.map(str::trim).filter(|a| !a.is_empty()) {
        let value = if auth.contains(char::is_whitespace) {
            auth.to_string()
        } else {
            format!("Bearer {auth}")
        };
        let mut header = HeaderValue::from_str(&value)
            .map_err(|_| FetchError::InvalidUrl(String::from("invalid authorization header")))?;
        header.set_sensitive(true);
        headers.insert(AUTHORIZATION, header);
    }

    Ok(headers)
}

/// Decode bytes as UTF-8, stripping a byte order mark
pub fn decode_utf8(bytes: &[u8]) -> Result<String, String> {
    let (cow, had_errors) = UTF_8.decode_with_bom_removal(bytes);

    if had_errors {
        return Err(String::from("UTF-8 decoding errors"));
    }

    Ok(cow.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = "Zugfestigkeit µm ✓";
        assert_eq!(decode_utf8(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"{\"a\":1}");
        assert_eq!(decode_utf8(&bytes).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_utf8(&[0xff, 0xfe, 0x00, 0xc3]).is_err());
    }

    #[test]
    fn test_bearer_header() {
        let headers = build_headers(Some("abc123"), ACCEPT_RDF).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");

        let headers = build_headers(Some("Basic dXNlcjpwdw=="), ACCEPT_RDF).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic dXNlcjpwdw==");

        let headers = build_headers(None, ACCEPT_RDF).unwrap();
        assert!(!headers.contains_key(AUTHORIZATION));
        assert!(headers.contains_key(ACCEPT));
    }

    #[test]
    fn test_accept_header() {
        let headers = build_headers(None, ACCEPT_JSON_LD).unwrap();
        let accept = headers.get(ACCEPT).unwrap().to_str().unwrap();
        assert!(accept.starts_with("application/ld+json"));

        assert!(build_headers(None, "text/turtle\n").is_err());
    }

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }
}
