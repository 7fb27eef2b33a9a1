use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use chatrelay_protocol::chat::{ErrorBody, ReplyBody, SuccessBody};

use crate::classify::{ChatCall, RequestType, classify_body, ensure_method};
use crate::core::CoreState;
use crate::error::ProxyError;

pub const REQUEST_ID_HEADER: &str = "x-chatrelay-request-id";

#[derive(Debug, Clone)]
pub struct RequestTraceId(pub String);

/// Response envelope spoken by a route family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{ "reply" }` / `{ "error" }`
    Reply,
    /// `{ "success", "text" | "chatName" }` / `{ "success": false, "error" }`
    Success,
}

impl Envelope {
    fn as_str(&self) -> &'static str {
        match self {
            Envelope::Reply => "reply",
            Envelope::Success => "success",
        }
    }
}

pub async fn chat_handler(
    State(state): State<Arc<CoreState>>,
    Extension(RequestTraceId(trace_id)): Extension<RequestTraceId>,
    method: Method,
    body: Bytes,
) -> Response {
    handle(&state, &trace_id, method, body, Envelope::Reply).await
}

pub async fn generate_handler(
    State(state): State<Arc<CoreState>>,
    Extension(RequestTraceId(trace_id)): Extension<RequestTraceId>,
    method: Method,
    body: Bytes,
) -> Response {
    handle(&state, &trace_id, method, body, Envelope::Success).await
}

pub async fn not_found_handler() -> Response {
    error_response(ProxyError::not_found("Not Found"), Envelope::Reply)
}

async fn handle(
    state: &CoreState,
    trace_id: &str,
    method: Method,
    body: Bytes,
    envelope: Envelope,
) -> Response {
    let started_at = Instant::now();
    let call = match ensure_method(&method, Method::POST).and_then(|()| classify_body(&body)) {
        Ok(call) => call,
        Err(err) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                envelope = envelope.as_str(),
                method = %method,
                status = err.status.as_u16(),
                error = %err.message,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
            );
            return error_response(err, envelope);
        }
    };

    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        envelope = envelope.as_str(),
        turns = call.turns.len(),
        request_type = ?call.request_type,
    );

    let ChatCall {
        turns,
        request_type,
    } = call;
    let result = match request_type {
        RequestType::Reply => state.dispatcher.reply(&turns, trace_id).await,
        RequestType::ChatName => state.dispatcher.title(&turns, trace_id).await,
    };

    match result {
        Ok(reply) => {
            info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                envelope = envelope.as_str(),
                status = StatusCode::OK.as_u16(),
                source = %reply.source.label(),
                attempts = reply.attempts.len(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
            );
            match (envelope, request_type) {
                (Envelope::Reply, _) => Json(ReplyBody { reply: reply.text }).into_response(),
                (Envelope::Success, RequestType::Reply) => {
                    Json(SuccessBody::text(reply.text)).into_response()
                }
                (Envelope::Success, RequestType::ChatName) => {
                    Json(SuccessBody::chat_name(reply.text)).into_response()
                }
            }
        }
        Err(err) => {
            let err = ProxyError::from(err);
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                envelope = envelope.as_str(),
                status = err.status.as_u16(),
                error = %err.message,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
            );
            error_response(err, envelope)
        }
    }
}

fn error_response(err: ProxyError, envelope: Envelope) -> Response {
    let body = ErrorBody {
        success: match envelope {
            Envelope::Reply => None,
            Envelope::Success => Some(false),
        },
        error: err.message,
    };
    (err.status, Json(body)).into_response()
}

/// Assigns the trace id, answers CORS preflight and stamps CORS and
/// request-id headers on every response.
pub async fn downstream_layer(mut req: Request<Body>, next: Next) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let mut resp = if req.method() == Method::OPTIONS {
        let mut resp = Response::new(Body::empty());
        *resp.status_mut() = StatusCode::NO_CONTENT;
        resp
    } else {
        req.extensions_mut()
            .insert(RequestTraceId(trace_id.clone()));
        next.run(req).await
    };

    apply_cors(resp.headers_mut());
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
