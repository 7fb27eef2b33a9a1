use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::any;

use crate::dispatch::Dispatcher;
use crate::handler::{chat_handler, downstream_layer, generate_handler, not_found_handler};

/// Paths answering with `{ "reply" }`.
pub const CHAT_PATHS: [&str; 3] = ["/chat", "/api/chat", "/.netlify/functions/chat"];

/// Paths answering with `{ "success", "text" | "chatName" }`.
pub const GENERATE_PATHS: [&str; 3] = [
    "/generate-chat-response",
    "/api/generate-chat-response",
    "/.netlify/functions/generate-chat-response",
];

pub struct CoreState {
    pub dispatcher: Arc<Dispatcher>,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: Arc::new(CoreState { dispatcher }),
        }
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for path in CHAT_PATHS {
            router = router.route(path, any(chat_handler));
        }
        for path in GENERATE_PATHS {
            router = router.route(path, any(generate_handler));
        }
        router
            .fallback(not_found_handler)
            .layer(middleware::from_fn(downstream_layer))
            .with_state(self.state.clone())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
