use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use chatrelay::{Content, Error, Generator, RelayState, Result, build_app, build_router};

/// Answers every call with a fixed reply (or error) and records what it was asked.
struct FakeGenerator {
    reply: std::result::Result<Value, String>,
    seen: Mutex<Vec<Vec<Content>>>,
}

impl FakeGenerator {
    fn replying(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, contents: Vec<Content>) -> Result<Value> {
        self.seen.lock().unwrap().push(contents);
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(Error::api(503, None, message.clone())),
        }
    }
}

fn gemini_reply(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
}

fn chat_request(method: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_returns_extracted_text() {
    let generator = FakeGenerator::replying(gemini_reply("Hi there"));
    let app = build_router(RelayState::new(generator.clone(), true));

    let body = json!({"messages": [{"role": "user", "content": "Hello"}]}).to_string();
    let response = app.oneshot(chat_request("POST", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"result": "Hi there"}));

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        serde_json::to_value(&seen[0]).unwrap(),
        json!([{"role": "user", "parts": [{"text": "Hello"}]}])
    );
}

#[tokio::test]
async fn chat_forwards_whole_history() {
    let generator = FakeGenerator::replying(gemini_reply("third"));
    let app = build_router(RelayState::new(generator.clone(), true));

    let body = json!({"messages": [
        {"role": "user", "content": "one"},
        {"role": "model", "content": "two"},
        {"role": "user", "content": "three"}
    ]})
    .to_string();
    let response = app.oneshot(chat_request("POST", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(generator.seen.lock().unwrap()[0].len(), 3);
}

#[tokio::test]
async fn unknown_reply_shape_is_dumped() {
    let reply = json!({"unexpected": {"shape": true}});
    let app = build_router(RelayState::new(FakeGenerator::replying(reply.clone()), true));

    let body = json!({"messages": []}).to_string();
    let response = app.oneshot(chat_request("POST", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = json_body(response).await["result"].as_str().unwrap().to_string();
    assert_eq!(serde_json::from_str::<Value>(&result).unwrap(), reply);
}

#[tokio::test]
async fn messages_must_be_an_array() {
    let generator = FakeGenerator::replying(gemini_reply("unused"));
    let app = build_router(RelayState::new(generator.clone(), true));

    let body = json!({"messages": "not-a-list"}).to_string();
    let response = app.oneshot(chat_request("POST", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "messages must be an array"})
    );
    assert!(generator.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_body_has_no_messages() {
    let app = build_router(RelayState::new(FakeGenerator::replying(json!({})), true));
    let response = app.oneshot(chat_request("POST", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "messages must be an array"})
    );
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let app = build_router(RelayState::new(FakeGenerator::replying(json!({})), true));
    let response = app.oneshot(chat_request("POST", "{nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "invalid JSON body"}));
}

#[tokio::test]
async fn generation_failure_is_server_error() {
    let app = build_router(RelayState::new(FakeGenerator::failing("model overloaded"), true));
    let body = json!({"messages": [{"role": "user", "content": "Hello"}]}).to_string();
    let response = app.oneshot(chat_request("POST", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({"error": "model overloaded"}));
}

#[tokio::test]
async fn chat_rejects_other_methods() {
    for method in ["GET", "PUT", "DELETE"] {
        let app = build_router(RelayState::new(FakeGenerator::replying(json!({})), true));
        let response = app.oneshot(chat_request(method, "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(
            json_body(response).await,
            json!({"error": "Method Not Allowed"})
        );
    }
}

#[tokio::test]
async fn ping_reports_ok() {
    let app = build_router(RelayState::new(FakeGenerator::replying(json!({})), false));
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], json!(true));
    assert!(body["now"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");
}

#[tokio::test]
async fn debug_echoes_request() {
    let app = build_router(RelayState::new(FakeGenerator::replying(json!({})), false));
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/debug?probe=1")
                .header("x-probe", "yes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["method"], json!("PUT"));
    assert_eq!(body["url"], json!("/api/debug?probe=1"));
    assert_eq!(body["headers"]["x-probe"], json!("yes"));
    assert_eq!(body["hasGeminiKey"], json!(false));
}

#[tokio::test]
async fn app_serves_static_files_with_cors() {
    let dir = std::env::temp_dir().join(format!("chatrelay-public-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>chat</h1>").unwrap();

    let app = build_app(
        RelayState::new(FakeGenerator::replying(json!({})), true),
        &dir,
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .header(header::ORIGIN, "http://elsewhere.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>chat</h1>");

    let _ = std::fs::remove_dir_all(&dir);
}
