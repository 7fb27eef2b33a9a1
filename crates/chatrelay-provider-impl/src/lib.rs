//! Built-in upstream providers.
//!
//! This crate does not perform network IO. It builds `UpstreamHttpRequest`
//! values for the dispatcher to send and decodes what comes back.

mod auth_extractor;
mod providers;
mod registry;

pub use providers::{
    DeepSeekProvider, GeminiProvider, OpenAIProvider, default_base_url, default_model,
};
pub use registry::register_builtin_providers;
