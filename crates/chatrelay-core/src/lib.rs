pub mod bootstrap;
pub mod classify;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod upstream_client;

pub use bootstrap::{Bootstrap, CliArgs, bootstrap, bootstrap_from_env, build_dispatcher};
pub use classify::{ChatCall, RequestType, classify_body};
pub use core::{Core, CoreState};
pub use dispatch::{
    AttemptOutcome, AttemptRecord, DispatchError, Dispatcher, ProviderSlot, Reply, ReplySource,
};
pub use error::{BACKEND_FAILED, ProxyError};
pub use handler::{REQUEST_ID_HEADER, RequestTraceId};
pub use upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};
