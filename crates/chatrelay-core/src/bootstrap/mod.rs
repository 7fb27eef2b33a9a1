use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use chatrelay_common::{BrandConfig, BrandPatch, GlobalConfig, GlobalConfigPatch, ProviderSettingsPatch};
use chatrelay_provider_core::{ProviderConfig, ProviderKind, ProviderRegistry};
use chatrelay_provider_impl::{default_model, register_builtin_providers};
use chatrelay_transform::{AttributionOverride, RuleSet, Sanitizer, WindowPolicy};

use crate::dispatch::{Dispatcher, ProviderSlot};
use crate::upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "chatrelay",
    version,
    about = "Chat backend with ordered LLM provider fallback"
)]
pub struct CliArgs {
    /// JSON config file; CLI and ENV values override it.
    #[arg(long, env = "CHATRELAY_CONFIG")]
    pub config: Option<String>,

    /// Bind host.
    #[arg(long, env = "CHATRELAY_HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "CHATRELAY_PROXY")]
    pub proxy: Option<String>,

    /// Prior turns forwarded ahead of the current user turn.
    #[arg(long, env = "CHATRELAY_MAX_HISTORY")]
    pub max_history: Option<String>,

    /// Comma-separated fallback order, e.g. `gemini,deepseek,openai`.
    #[arg(long, env = "CHATRELAY_PROVIDER_ORDER")]
    pub provider_order: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Older name of the Gemini key, used when `GEMINI_API_KEY` is unset.
    #[arg(long, env = "GEMINI_FLASH_API_KEY", hide = true, hide_env_values = true)]
    pub gemini_flash_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    #[arg(long, env = "GEMINI_TIMEOUT_MS")]
    pub gemini_timeout_ms: Option<String>,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,

    #[arg(long, env = "DEEPSEEK_MODEL")]
    pub deepseek_model: Option<String>,

    #[arg(long, env = "DEEPSEEK_BASE_URL")]
    pub deepseek_base_url: Option<String>,

    #[arg(long, env = "DEEPSEEK_TIMEOUT_MS")]
    pub deepseek_timeout_ms: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL")]
    pub openai_model: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    #[arg(long, env = "OPENAI_TIMEOUT_MS")]
    pub openai_timeout_ms: Option<String>,

    /// Brand that replies should credit.
    #[arg(long, env = "CHATRELAY_BRAND_NAME")]
    pub brand_name: Option<String>,

    #[arg(long, env = "CHATRELAY_BRAND_ALIAS")]
    pub brand_alias: Option<String>,

    /// Upstream brand rewritten in replies.
    #[arg(long, env = "CHATRELAY_UPSTREAM_BRAND")]
    pub upstream_brand: Option<String>,

    /// Replaces the brand names in outbound user text.
    #[arg(long, env = "CHATRELAY_SANITIZE_PLACEHOLDER")]
    pub sanitize_placeholder: Option<String>,

    #[arg(long, env = "CHATRELAY_ATTRIBUTION_REPLY")]
    pub attribution_reply: Option<String>,

    #[arg(long, env = "CHATRELAY_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,
}

pub struct Bootstrap {
    pub config: GlobalConfig,
    pub dispatcher: Arc<Dispatcher>,
}

pub fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    let args = CliArgs::parse();
    bootstrap(args)
}

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let config = load_config(args)?;
    let client = WreqUpstreamClient::new(UpstreamClientConfig::from_global(&config))
        .context("build upstream client")?;
    let dispatcher = build_dispatcher(&config, Arc::new(client))?;

    for slot in dispatcher.slots() {
        let provider = slot.config();
        info!(
            provider = %provider.name,
            kind = %provider.kind,
            model = %provider.model.as_deref().unwrap_or(default_model(provider.kind)),
            timeout_ms = provider.timeout_ms,
            priority = provider.priority,
            configured = slot.is_configured(),
            "provider ready"
        );
    }

    Ok(Bootstrap {
        config,
        dispatcher: Arc::new(dispatcher),
    })
}

/// Merges config layers once: CLI > ENV > config file > defaults.
/// clap already applies CLI > ENV precedence for each field.
pub fn load_config(args: CliArgs) -> anyhow::Result<GlobalConfig> {
    let mut merged = match sanitize_optional_env_value(args.config.clone()) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => GlobalConfigPatch::default(),
    };
    merged.overlay(cli_patch(args)?);
    merged.into_config().context("finalize merged global config")
}

fn read_config_file(path: &Path) -> anyhow::Result<GlobalConfigPatch> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

fn cli_patch(args: CliArgs) -> anyhow::Result<GlobalConfigPatch> {
    let mut patch = GlobalConfigPatch {
        host: sanitize_optional_env_value(args.host),
        port: parse_u16_env_value(args.port, "PORT")?,
        proxy: sanitize_optional_env_value(args.proxy),
        max_history: parse_usize_env_value(args.max_history, "CHATRELAY_MAX_HISTORY")?,
        provider_order: sanitize_optional_env_value(args.provider_order).map(|order| {
            order
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        }),
        brand: BrandPatch {
            name: sanitize_optional_env_value(args.brand_name),
            alias: sanitize_optional_env_value(args.brand_alias),
            upstream: sanitize_optional_env_value(args.upstream_brand),
            sanitize_placeholder: sanitize_optional_env_value(args.sanitize_placeholder),
            attribution_reply: sanitize_optional_env_value(args.attribution_reply),
        },
        system_prompt: sanitize_optional_env_value(args.system_prompt),
        ..Default::default()
    };

    let gemini_key = sanitize_optional_env_value(args.gemini_api_key)
        .or_else(|| sanitize_optional_env_value(args.gemini_flash_api_key));
    let providers = [
        (
            "gemini",
            gemini_key,
            args.gemini_model,
            args.gemini_base_url,
            parse_u64_env_value(args.gemini_timeout_ms, "GEMINI_TIMEOUT_MS")?,
        ),
        (
            "deepseek",
            sanitize_optional_env_value(args.deepseek_api_key),
            args.deepseek_model,
            args.deepseek_base_url,
            parse_u64_env_value(args.deepseek_timeout_ms, "DEEPSEEK_TIMEOUT_MS")?,
        ),
        (
            "openai",
            sanitize_optional_env_value(args.openai_api_key),
            args.openai_model,
            args.openai_base_url,
            parse_u64_env_value(args.openai_timeout_ms, "OPENAI_TIMEOUT_MS")?,
        ),
    ];
    for (name, api_key, model, base_url, timeout_ms) in providers {
        let settings = ProviderSettingsPatch {
            api_key,
            model: sanitize_optional_env_value(model),
            base_url: sanitize_optional_env_value(base_url),
            timeout_ms,
        };
        if settings != ProviderSettingsPatch::default() {
            patch.providers.insert(name.to_string(), settings);
        }
    }
    Ok(patch)
}

/// One `ProviderConfig` per configured provider, priority = position.
pub fn provider_configs(global: &GlobalConfig) -> anyhow::Result<Vec<ProviderConfig>> {
    global
        .providers
        .iter()
        .enumerate()
        .map(|(priority, settings)| {
            let kind = ProviderKind::parse(&settings.name)
                .with_context(|| format!("unknown provider in order: {}", settings.name))?;
            Ok(ProviderConfig {
                name: settings.name.clone(),
                kind,
                base_url: settings.base_url.clone(),
                api_key: settings.api_key.clone(),
                model: settings.model.clone(),
                timeout_ms: settings.timeout_ms,
                priority,
            })
        })
        .collect()
}

pub fn build_dispatcher(
    global: &GlobalConfig,
    client: Arc<dyn UpstreamClient>,
) -> anyhow::Result<Dispatcher> {
    let mut registry = ProviderRegistry::new();
    register_builtin_providers(&mut registry);

    let slots = provider_configs(global)?
        .into_iter()
        .map(|config| ProviderSlot::from_registry(config, &registry))
        .collect();
    let rules = RuleSet::brand_rules(&global.brand.upstream, &global.brand.name)
        .context("compile rewrite rules")?;
    let sanitizer = Sanitizer::from_brand(&global.brand).context("compile sanitizer")?;
    let system_prompt = global
        .system_prompt
        .clone()
        .unwrap_or_else(|| default_system_prompt(&global.brand));

    Ok(Dispatcher::new(
        slots,
        client,
        AttributionOverride::from_brand(&global.brand),
        rules,
        WindowPolicy::new(global.max_history),
        sanitizer,
        Some(system_prompt),
    ))
}

pub fn default_system_prompt(brand: &BrandConfig) -> String {
    format!(
        "If the user asks about who created you, who made you, or who built you, you must always answer: \"{}\" For all other topics or questions, answer normally and do not mention your creator.",
        brand.attribution_reply
    )
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // PaaS dashboards sometimes inject unresolved `${VAR}` placeholders.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

fn parse_u16_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u16>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u16>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

fn parse_u64_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u64>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u64>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

fn parse_usize_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<usize>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<usize>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}
