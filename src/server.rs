//! The relay backend.
//!
//! `POST /api/chat` forwards a message list to a [`Generator`] and answers with the
//! extracted reply text.  `/api/ping` and `/api/debug` report static status, and
//! everything else falls through to the static frontend directory.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::extract::{extract_text, matching_path};
use crate::generation::Generator;
use crate::observability::{RELAY_ERRORS, RELAY_REJECTED, RELAY_REQUESTS};
use crate::types::{ChatMessage, ChatReply, Content, ErrorReply};

/// Shared state of the relay handlers.
pub struct RelayState {
    generator: Arc<dyn Generator>,
    has_api_key: bool,
}

impl RelayState {
    /// Create relay state around a generator.
    ///
    /// `has_api_key` is only reported by `/api/debug`.
    pub fn new(generator: Arc<dyn Generator>, has_api_key: bool) -> SharedState {
        Arc::new(Self {
            generator,
            has_api_key,
        })
    }
}

pub type SharedState = Arc<RelayState>;

/// Router with the API endpoints only.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(chat).fallback(|| async { method_not_allowed("POST") }),
        )
        .route(
            "/api/ping",
            get(ping).fallback(|| async { method_not_allowed("GET") }),
        )
        .route("/api/debug", any(debug_info))
        .with_state(state)
}

/// Full application: API endpoints, the static frontend, and permissive CORS.
pub fn build_app(state: SharedState, public_dir: &Path) -> Router {
    build_router(state)
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
}

/// Validate a chat body and return its messages.
///
/// `messages` must be an array whose elements carry string `role` and `content`.
pub fn messages_from_body(body: &Value) -> Result<Vec<ChatMessage>> {
    let Some(messages) = body.get("messages").and_then(Value::as_array) else {
        return Err(Error::validation(
            "messages must be an array",
            Some("messages".to_string()),
        ));
    };
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            serde_json::from_value::<ChatMessage>(message.clone()).map_err(|e| {
                Error::validation(
                    format!("messages[{index}] must have string role and content: {e}"),
                    Some(format!("messages[{index}]")),
                )
            })
        })
        .collect()
}

/// Forward a chat body to `generator` and extract the reply text.
pub async fn relay(generator: &dyn Generator, body: &Value) -> Result<String> {
    let messages = messages_from_body(body)?;
    let contents: Vec<Content> = messages.iter().map(Content::from).collect();
    debug!(messages = contents.len(), "forwarding chat to generator");
    let reply = generator.generate(contents).await?;
    match matching_path(&reply) {
        Some(path) => debug!(?path, "extracted reply text"),
        None => warn!("no extraction path matched; returning serialized reply"),
    }
    Ok(extract_text(&reply))
}

fn parse_body(body: &[u8]) -> serde_json::Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Object(Map::new()))
    } else {
        serde_json::from_slice(body)
    }
}

async fn chat(State(state): State<SharedState>, body: Bytes) -> Response {
    RELAY_REQUESTS.click();
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(err) => {
            RELAY_REJECTED.click();
            debug!(error = %err, "rejecting unparseable chat body");
            return error_reply(StatusCode::BAD_REQUEST, "invalid JSON body");
        }
    };
    match relay(state.generator.as_ref(), &body).await {
        Ok(result) => Json(ChatReply { result }).into_response(),
        Err(err) => {
            RELAY_ERRORS.click();
            error!(error = %err, "chat relay failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, err.message())
        }
    }
}

async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "now": now_rfc3339() }))
}

async fn debug_info(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    let mut rendered = Map::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        rendered.insert(name.as_str().to_string(), Value::String(values.join(", ")));
    }
    Json(json!({
        "ok": true,
        "now": now_rfc3339(),
        "method": method.as_str(),
        "url": uri.to_string(),
        "headers": rendered,
        "hasGeminiKey": state.has_api_key,
    }))
}

fn method_not_allowed(allow: &'static str) -> Response {
    let mut response = error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    response
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorReply::new(message))).into_response()
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_must_be_array() {
        for body in [
            json!({}),
            json!({"messages": "not-a-list"}),
            json!({"messages": {"role": "user"}}),
            Value::Null,
        ] {
            let err = messages_from_body(&body).unwrap_err();
            assert_eq!(err.message(), "messages must be an array");
        }
    }

    #[test]
    fn elements_need_role_and_content() {
        let body = json!({"messages": [{"role": "user", "content": "ok"}, {"role": "user"}]});
        let err = messages_from_body(&body).unwrap_err();
        assert!(err.is_validation());
        assert!(err.message().starts_with("messages[1]"), "{}", err.message());
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(parse_body(b"").unwrap(), json!({}));
        assert_eq!(parse_body(b" \n").unwrap(), json!({}));
        assert!(parse_body(b"{not json").is_err());
    }

    #[test]
    fn now_is_rfc3339() {
        let now = now_rfc3339();
        assert!(OffsetDateTime::parse(&now, &Rfc3339).is_ok(), "{now}");
    }
}
