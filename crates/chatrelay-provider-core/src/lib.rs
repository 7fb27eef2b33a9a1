//! Provider abstractions for chatrelay.
//!
//! Nothing here performs network IO. Providers turn a `ChatPrompt` into an
//! `UpstreamHttpRequest` and decode the raw `UpstreamHttpResponse`; the
//! dispatch layer owns the client and the timeouts.

pub mod config;
pub mod errors;
pub mod headers;
pub mod provider;
pub mod registry;

pub use config::{ProviderConfig, ProviderKind};
pub use errors::{AttemptError, AttemptResult};
pub use headers::{Headers, header_get, header_set};
pub use provider::{
    ChatPrompt, HttpMethod, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamProvider, UpstreamTransportErrorKind,
};
pub use registry::ProviderRegistry;
