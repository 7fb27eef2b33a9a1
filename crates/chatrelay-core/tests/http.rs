mod support;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chatrelay_core::{Core, REQUEST_ID_HEADER};

use support::{
    Behaviour, DEEPSEEK, GEMINI, OPENAI, ScriptedClient, config_patch, dispatcher, gemini_text,
    upstream_error,
};

fn router(client: &Arc<ScriptedClient>) -> Router {
    Core::new(Arc::new(dispatcher(config_patch(), client))).router()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn chat_paths_answer_with_reply() {
    for path in ["/chat", "/api/chat", "/.netlify/functions/chat"] {
        let client = ScriptedClient::new();
        client.on(GEMINI, gemini_text("Hello there."));
        let (status, headers, body) = send(
            router(&client),
            post(path, json!({ "messages": [{ "role": "user", "content": "Hello" }] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "path {path}");
        assert_eq!(body, json!({ "reply": "Hello there." }));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.contains_key(REQUEST_ID_HEADER));
    }
}

#[tokio::test]
async fn reply_is_rewritten_before_it_leaves() {
    let client = ScriptedClient::new();
    client.on(GEMINI, gemini_text("I am a large language model, trained by Google."));
    let (status, _, body) = send(
        router(&client),
        post("/api/chat", json!({ "prompt": "Say hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["reply"],
        "I am a large language model, trained by calmash1."
    );
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let client = ScriptedClient::new();
    let (status, _, body) = send(router(&client), post("/chat", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing or invalid chatHistory" }));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn total_failure_hides_upstream_details() {
    let client = ScriptedClient::new();
    client.on(GEMINI, upstream_error(500, "secret upstream detail"));
    client.on(DEEPSEEK, upstream_error(401, "bad key"));
    client.on(OPENAI, Behaviour::Respond(503, String::new()));
    let (status, _, body) = send(
        router(&client),
        post("/chat", json!({ "messages": [{ "role": "user", "content": "Hello" }] })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "AI backend failed." }));
}

#[tokio::test]
async fn preflight_gets_cors_headers_and_no_body() {
    let client = ScriptedClient::new();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/generate-chat-response")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(router(&client), req).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

#[tokio::test]
async fn get_is_not_allowed() {
    let client = ScriptedClient::new();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/chat")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(router(&client), req).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed. Please use POST." }));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let client = ScriptedClient::new();
    let (status, _, body) = send(router(&client), post("/nope", json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn generate_path_uses_success_envelope() {
    let client = ScriptedClient::new();
    client.on(GEMINI, gemini_text("Sure thing."));
    let (status, _, body) = send(
        router(&client),
        post(
            "/generate-chat-response",
            json!({ "chatHistory": [{ "role": "user", "parts": [{ "text": "Help me" }] }] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "text": "Sure thing." }));
}

#[tokio::test]
async fn chat_name_request_returns_chat_name() {
    let client = ScriptedClient::new();
    client.on(GEMINI, gemini_text("'Help Request'"));
    let (status, _, body) = send(
        router(&client),
        post(
            "/.netlify/functions/generate-chat-response",
            json!({
                "chatHistory": [
                    { "role": "user", "parts": [{ "text": "Help me" }] },
                    { "role": "model", "parts": [{ "text": "With what?" }] }
                ],
                "requestType": "generateChatName"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "chatName": "Help Request" }));
}

#[tokio::test]
async fn generate_errors_carry_success_false() {
    let client = ScriptedClient::new();
    let (status, _, body) = send(
        router(&client),
        post("/api/generate-chat-response", json!({ "chatHistory": "oops" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn each_request_gets_its_own_id() {
    let client = ScriptedClient::new();
    client.on(GEMINI, gemini_text("ok"));
    let app = router(&client);
    let body = json!({ "prompt": "Hello" });

    let (_, first, _) = send(app.clone(), post("/chat", body.clone())).await;
    let (_, second, _) = send(app, post("/chat", body)).await;

    assert_ne!(first[REQUEST_ID_HEADER], second[REQUEST_ID_HEADER]);
}

#[tokio::test]
async fn creator_question_is_answered_without_upstream_calls() {
    let client = ScriptedClient::new();
    client.on(GEMINI, gemini_text("Google made me."));
    let (status, _, body) = send(
        router(&client),
        post(
            "/chat",
            json!({ "messages": [{ "role": "user", "content": "Who made you?" }] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "reply": "I'm created by calmash1 also known as Grady Hanson." })
    );
    assert!(client.calls().is_empty());
}
