//! Ordered provider fallback.
//!
//! A request walks the configured slots in priority order. Each provider
//! gets exactly one attempt under its own timeout; the first reply wins and
//! is passed through the rewrite rules. Nothing here is mutated after
//! construction, so one `Dispatcher` serves all requests concurrently.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use chatrelay_protocol::ConversationTurn;
use chatrelay_provider_core::{
    AttemptError, ChatPrompt, ProviderConfig, ProviderRegistry, UpstreamProvider,
};
use chatrelay_transform::title::{clean_title, title_prompt};
use chatrelay_transform::{
    AttributionOverride, BoundedConversation, RuleSet, Sanitizer, WindowError, WindowPolicy,
    latest_user_prompt, window,
};

use crate::upstream_client::UpstreamClient;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid conversation: {0}")]
    Validation(#[from] WindowError),
    #[error("all {} providers failed", .attempts.len())]
    AllProvidersFailed { attempts: Vec<AttemptRecord> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { elapsed_ms: u64 },
    Unconfigured { reason: String },
    Timeout { after_ms: u64 },
    Failed { status: Option<u16>, message: String },
}

impl AttemptOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success { .. } => "success",
            AttemptOutcome::Unconfigured { .. } => "unconfigured",
            AttemptOutcome::Timeout { .. } => "timeout",
            AttemptOutcome::Failed { .. } => "error",
        }
    }
}

impl From<AttemptError> for AttemptOutcome {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Unconfigured { reason, .. } => AttemptOutcome::Unconfigured { reason },
            AttemptError::Timeout { after_ms, .. } => AttemptOutcome::Timeout { after_ms },
            AttemptError::Upstream {
                status, message, ..
            } => AttemptOutcome::Failed { status, message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// Fixed attribution answer; no provider was called.
    Attribution,
    Provider(String),
    /// A provider answered but the fixed attribution answer replaced it.
    SafetyNet(String),
}

impl ReplySource {
    pub fn label(&self) -> &str {
        match self {
            ReplySource::Attribution => "attribution",
            ReplySource::Provider(name) | ReplySource::SafetyNet(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    pub attempts: Vec<AttemptRecord>,
}

enum SlotState {
    Ready(Arc<dyn UpstreamProvider>),
    Unconfigured { reason: String },
}

/// One entry of the fallback chain.
pub struct ProviderSlot {
    config: ProviderConfig,
    state: SlotState,
}

impl ProviderSlot {
    /// Resolves the adapter for `config` and checks its credential once.
    pub fn from_registry(config: ProviderConfig, registry: &ProviderRegistry) -> Self {
        match registry.get(config.kind) {
            Some(provider) => Self::new(config, provider),
            None => Self {
                state: SlotState::Unconfigured {
                    reason: format!("no adapter for kind {}", config.kind),
                },
                config,
            },
        }
    }

    pub fn new(config: ProviderConfig, provider: Arc<dyn UpstreamProvider>) -> Self {
        let state = match provider.validate(&config) {
            Ok(()) => SlotState::Ready(provider),
            Err(err) => SlotState::Unconfigured {
                reason: match err {
                    AttemptError::Unconfigured { reason, .. } => reason,
                    other => other.to_string(),
                },
            },
        };
        Self { config, state }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, SlotState::Ready(_))
    }
}

pub struct Dispatcher {
    slots: Vec<ProviderSlot>,
    client: Arc<dyn UpstreamClient>,
    attribution: AttributionOverride,
    rules: RuleSet,
    window_policy: WindowPolicy,
    sanitizer: Sanitizer,
    system_prompt: Option<String>,
}

impl Dispatcher {
    pub fn new(
        mut slots: Vec<ProviderSlot>,
        client: Arc<dyn UpstreamClient>,
        attribution: AttributionOverride,
        rules: RuleSet,
        window_policy: WindowPolicy,
        sanitizer: Sanitizer,
        system_prompt: Option<String>,
    ) -> Self {
        slots.sort_by_key(|slot| slot.config.priority);
        Self {
            slots,
            client,
            attribution,
            rules,
            window_policy,
            sanitizer,
            system_prompt,
        }
    }

    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    /// Answers the last user turn of `turns`.
    pub async fn reply(
        &self,
        turns: &[ConversationTurn],
        trace_id: &str,
    ) -> Result<Reply, DispatchError> {
        let conversation = window(turns, &self.window_policy, &self.sanitizer)?;

        if let Some(fixed) = self.attribution.check(turns) {
            info!(
                event = "attribution_override",
                trace_id = %trace_id,
            );
            return Ok(Reply {
                text: fixed.to_string(),
                source: ReplySource::Attribution,
                attempts: Vec::new(),
            });
        }

        let prompt = ChatPrompt {
            system_instruction: self.system_prompt.clone(),
            conversation,
            temperature: None,
        };
        let (raw, provider, attempts) = self.run_chain(&prompt, trace_id).await?;
        let text = self.rules.rewrite(&raw);

        if self.attribution.asks_about_origin(latest_user_prompt(turns)) {
            info!(
                event = "attribution_safety_net",
                trace_id = %trace_id,
                provider = %provider,
            );
            return Ok(Reply {
                text: self.attribution.fixed_reply().to_string(),
                source: ReplySource::SafetyNet(provider),
                attempts,
            });
        }

        Ok(Reply {
            text,
            source: ReplySource::Provider(provider),
            attempts,
        })
    }

    /// Short title for the conversation. The full conversation feeds the
    /// title prompt. A creator question still gets the fixed reply.
    pub async fn title(
        &self,
        turns: &[ConversationTurn],
        trace_id: &str,
    ) -> Result<Reply, DispatchError> {
        let kept: Vec<ConversationTurn> = turns
            .iter()
            .filter(|turn| !self.window_policy.is_placeholder(&turn.content))
            .cloned()
            .collect();
        if kept.is_empty() {
            return Err(DispatchError::Validation(WindowError::Empty));
        }
        if let Some(fixed) = self.attribution.check(&kept) {
            info!(
                event = "attribution_override",
                trace_id = %trace_id,
            );
            return Ok(Reply {
                text: fixed.to_string(),
                source: ReplySource::Attribution,
                attempts: Vec::new(),
            });
        }

        let prompt = ChatPrompt::new(BoundedConversation::single(title_prompt(&kept)));
        let (raw, provider, attempts) = self.run_chain(&prompt, trace_id).await?;
        Ok(Reply {
            text: self.rules.rewrite(&clean_title(&raw)),
            source: ReplySource::Provider(provider),
            attempts,
        })
    }

    async fn run_chain(
        &self,
        prompt: &ChatPrompt,
        trace_id: &str,
    ) -> Result<(String, String, Vec<AttemptRecord>), DispatchError> {
        let mut attempts = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let provider = match &slot.state {
                SlotState::Ready(provider) => provider,
                SlotState::Unconfigured { reason } => {
                    info!(
                        event = "provider_skipped",
                        trace_id = %trace_id,
                        provider = %slot.config.name,
                        reason = %reason,
                    );
                    attempts.push(AttemptRecord {
                        provider: slot.config.name.clone(),
                        outcome: AttemptOutcome::Unconfigured {
                            reason: reason.clone(),
                        },
                    });
                    continue;
                }
            };

            info!(
                event = "provider_attempt",
                trace_id = %trace_id,
                provider = %slot.config.name,
                priority = slot.config.priority,
                timeout_ms = slot.config.timeout_ms,
            );
            let started_at = Instant::now();
            match self.attempt(&slot.config, provider.as_ref(), prompt).await {
                Ok(text) => {
                    let elapsed_ms = started_at.elapsed().as_millis() as u64;
                    info!(
                        event = "provider_succeeded",
                        trace_id = %trace_id,
                        provider = %slot.config.name,
                        elapsed_ms,
                    );
                    attempts.push(AttemptRecord {
                        provider: slot.config.name.clone(),
                        outcome: AttemptOutcome::Success { elapsed_ms },
                    });
                    return Ok((text, slot.config.name.clone(), attempts));
                }
                Err(err) => {
                    warn!(
                        event = "provider_failed",
                        trace_id = %trace_id,
                        provider = %slot.config.name,
                        kind = err.kind(),
                        error = %err,
                        elapsed_ms = started_at.elapsed().as_millis() as u64,
                    );
                    attempts.push(AttemptRecord {
                        provider: slot.config.name.clone(),
                        outcome: err.into(),
                    });
                }
            }
        }

        warn!(
            event = "all_providers_failed",
            trace_id = %trace_id,
            attempts = attempts.len(),
        );
        Err(DispatchError::AllProvidersFailed { attempts })
    }

    async fn attempt(
        &self,
        config: &ProviderConfig,
        provider: &dyn UpstreamProvider,
        prompt: &ChatPrompt,
    ) -> Result<String, AttemptError> {
        let req = provider.build_chat(config, prompt).await?;
        let timeout = AttemptError::Timeout {
            provider: config.name.clone(),
            after_ms: config.timeout_ms,
        };
        let response = match tokio::time::timeout(config.timeout(), self.client.send(req)).await {
            Err(_elapsed) => return Err(timeout),
            Ok(Err(failure)) if failure.is_timeout() => return Err(timeout),
            Ok(Err(failure)) => {
                return Err(AttemptError::upstream(
                    &config.name,
                    None,
                    failure.message(),
                ));
            }
            Ok(Ok(response)) => response,
        };
        provider.decode_reply(config, &response)
    }
}
