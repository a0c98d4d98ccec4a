//! Remote `@context` inlining for JSON-LD documents
//!
//! The JSON-LD parser runs without a document loader, so context IRIs are
//! resolved here through the regular transport before parsing.

use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use crate::fetch::{Transport, ACCEPT_JSON_LD};
use crate::utils::error::{LoadError, ParseError};

/// Nested remote contexts followed before giving up
const MAX_CONTEXT_DEPTH: usize = 8;

/// Replace every remote context reference in `doc` with the fetched context
///
/// Handles a string context, a context array mixing strings and objects, and
/// top-level arrays of node objects. Contexts are requested as JSON-LD and
/// fetched without the caller's authorization.
pub async fn inline_remote_contexts(
    doc: &mut Value,
    document_url: &Url,
    transport: &dyn Transport,
) -> Result<(), LoadError> {
    let mut fetched = HashMap::new();

    match doc {
        Value::Object(map) => {
            if let Some(context) = map.get_mut("@context") {
                inline_context(context, document_url, transport, &mut fetched, 0).await?;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Some(context) = item.get_mut("@context") {
                    inline_context(context, document_url, transport, &mut fetched, 0).await?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn inline_context<'a>(
    context: &'a mut Value,
    base: &'a Url,
    transport: &'a dyn Transport,
    fetched: &'a mut HashMap<Url, Value>,
    depth: usize,
) -> futures::future::BoxFuture<'a, Result<(), LoadError>> {
    Box::pin(async move {
        match context {
            Value::String(reference) => {
                let resolved = fetch_context(reference, base, transport, fetched, depth).await?;
                *context = resolved;
            }
            Value::Array(items) => {
                let mut flattened = Vec::with_capacity(items.len());
                for item in items.iter_mut() {
                    if let Value::String(reference) = item {
                        match fetch_context(reference, base, transport, fetched, depth).await? {
                            Value::Array(inner) => flattened.extend(inner),
                            other => flattened.push(other),
                        }
                    } else {
                        flattened.push(item.take());
                    }
                }
                *items = flattened;
            }
            _ => {}
        }
        Ok(())
    })
}

async fn fetch_context(
    reference: &str,
    base: &Url,
    transport: &dyn Transport,
    fetched: &mut HashMap<Url, Value>,
    depth: usize,
) -> Result<Value, LoadError> {
    let url = base
        .join(reference)
        .map_err(|e| ParseError::InvalidBase(format!("{reference}: {e}")))?;

    if let Some(cached) = fetched.get(&url) {
        return Ok(cached.clone());
    }

    if depth >= MAX_CONTEXT_DEPTH {
        return Err(ParseError::Json {
            url: url.to_string(),
            message: String::from("remote context nesting too deep"),
        }
        .into());
    }

    tracing::debug!(context = %url, "Fetching remote JSON-LD context");
    let document = transport
        .fetch_with_accept(&url, None, ACCEPT_JSON_LD)
        .await?;

    let parsed: Value = serde_json::from_str(&document.body).map_err(|e| ParseError::Json {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let mut context = match parsed {
        Value::Object(mut map) => map.remove("@context").unwrap_or(Value::Object(map)),
        other => other,
    };

    inline_context(&mut context, &document.url, transport, fetched, depth + 1).await?;
    fetched.insert(url, context.clone());

    Ok(context)
}
