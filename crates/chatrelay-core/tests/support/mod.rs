#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::{Value, json};

use chatrelay_common::{GlobalConfig, GlobalConfigPatch, ProviderSettingsPatch};
use chatrelay_core::{Dispatcher, UpstreamClient, build_dispatcher};
use chatrelay_provider_core::{
    UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse, UpstreamTransportErrorKind,
};

/// What the scripted upstream does for a matching URL.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Respond(u16, String),
    Fail(UpstreamTransportErrorKind),
    /// Never answers within any test timeout.
    Hang,
}

/// Upstream stand-in keyed by URL prefix. Records every request it sees.
#[derive(Default)]
pub struct ScriptedClient {
    routes: Mutex<Vec<(String, Behaviour)>>,
    calls: Mutex<Vec<UpstreamHttpRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, url_prefix: &str, behaviour: Behaviour) {
        self.routes
            .lock()
            .unwrap()
            .push((url_prefix.to_string(), behaviour));
    }

    pub fn calls(&self) -> Vec<UpstreamHttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|req| req.url).collect()
    }

    fn behaviour_for(&self, url: &str) -> Option<Behaviour> {
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, behaviour)| behaviour.clone())
    }
}

impl UpstreamClient for ScriptedClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            let behaviour = self.behaviour_for(&req.url);
            let url = req.url.clone();
            self.calls.lock().unwrap().push(req);
            match behaviour {
                Some(Behaviour::Respond(status, body)) => Ok(UpstreamHttpResponse {
                    status,
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    body: Bytes::from(body),
                }),
                Some(Behaviour::Fail(kind)) => Err(UpstreamFailure::Transport {
                    kind,
                    message: format!("scripted failure for {url}"),
                }),
                Some(Behaviour::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(UpstreamFailure::Transport {
                        kind: UpstreamTransportErrorKind::Other,
                        message: "hang ended".to_string(),
                    })
                }
                None => Err(UpstreamFailure::Transport {
                    kind: UpstreamTransportErrorKind::Connect,
                    message: format!("no route for {url}"),
                }),
            }
        })
    }
}

pub const GEMINI: &str = "http://gemini.test";
pub const DEEPSEEK: &str = "http://deepseek.test";
pub const OPENAI: &str = "http://openai.test";

pub fn gemini_text(text: &str) -> Behaviour {
    Behaviour::Respond(
        200,
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string(),
    )
}

pub fn openai_text(text: &str) -> Behaviour {
    Behaviour::Respond(
        200,
        json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
        })
        .to_string(),
    )
}

pub fn upstream_error(status: u16, message: &str) -> Behaviour {
    Behaviour::Respond(
        status,
        json!({ "error": { "message": message } }).to_string(),
    )
}

/// Gemini, DeepSeek and OpenAI in that order, all keyed, pointed at the
/// scripted hosts.
pub fn config_patch() -> GlobalConfigPatch {
    let mut patch = GlobalConfigPatch::default();
    for (name, base_url) in [("gemini", GEMINI), ("deepseek", DEEPSEEK), ("openai", OPENAI)] {
        patch.providers.insert(
            name.to_string(),
            ProviderSettingsPatch {
                api_key: Some(format!("{name}-key")),
                base_url: Some(base_url.to_string()),
                timeout_ms: Some(2_000),
                ..Default::default()
            },
        );
    }
    patch
}

pub fn global_config(patch: GlobalConfigPatch) -> GlobalConfig {
    patch.into_config().unwrap()
}

pub fn dispatcher(patch: GlobalConfigPatch, client: &Arc<ScriptedClient>) -> Dispatcher {
    build_dispatcher(&global_config(patch), client.clone()).unwrap()
}

pub fn request_json(req: &UpstreamHttpRequest) -> Value {
    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap()
}
