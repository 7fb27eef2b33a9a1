use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_HISTORY: usize = 12;
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_PROVIDER_ORDER: [&str; 3] = ["gemini", "deepseek", "openai"];

/// Alternate provider names and the canonical name they stand for.
const PROVIDER_ALIASES: [(&str, &str); 1] = [("aistudio", "gemini")];

/// Lowercased, trimmed provider name with aliases resolved.
pub fn canonical_provider_name(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    PROVIDER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
    #[error("invalid global config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Branding used by the attribution override and the rewrite rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    /// Custom brand that replies should carry.
    pub name: String,
    /// Human alias of the custom brand.
    pub alias: String,
    /// Upstream provider brand that gets rewritten in replies.
    pub upstream: String,
    /// Name substituted for the custom brand in outbound user text.
    pub sanitize_placeholder: String,
    /// Fixed answer to "who made you" style questions.
    pub attribution_reply: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "calmash1".to_string(),
            alias: "Grady Hanson".to_string(),
            upstream: "Google".to_string(),
            sanitize_placeholder: "Google".to_string(),
            attribution_reply: "I'm created by calmash1 also known as Grady Hanson.".to_string(),
        }
    }
}

/// Per-provider settings as loaded from the environment.
///
/// `model` and `base_url` fall back to provider defaults when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

/// Final, merged global configuration used by the running process.
///
/// Merge order: CLI > ENV > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Optional proxy for upstream egress.
    pub proxy: Option<String>,
    pub max_history: usize,
    /// Providers in fallback order; index is priority.
    pub providers: Vec<ProviderSettings>,
    pub brand: BrandConfig,
    /// System instruction sent ahead of the conversation.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettingsPatch {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl ProviderSettingsPatch {
    pub fn overlay(&mut self, other: ProviderSettingsPatch) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandPatch {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub upstream: Option<String>,
    pub sanitize_placeholder: Option<String>,
    pub attribution_reply: Option<String>,
}

impl BrandPatch {
    pub fn overlay(&mut self, other: BrandPatch) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.alias.is_some() {
            self.alias = other.alias;
        }
        if other.upstream.is_some() {
            self.upstream = other.upstream;
        }
        if other.sanitize_placeholder.is_some() {
            self.sanitize_placeholder = other.sanitize_placeholder;
        }
        if other.attribution_reply.is_some() {
            self.attribution_reply = other.attribution_reply;
        }
    }

    fn into_brand(self) -> Result<BrandConfig, GlobalConfigError> {
        let defaults = BrandConfig::default();
        let brand = BrandConfig {
            name: self.name.unwrap_or(defaults.name),
            alias: self.alias.unwrap_or(defaults.alias),
            upstream: self.upstream.unwrap_or(defaults.upstream),
            sanitize_placeholder: self
                .sanitize_placeholder
                .unwrap_or(defaults.sanitize_placeholder),
            attribution_reply: self.attribution_reply.unwrap_or(defaults.attribution_reply),
        };
        // Blank names would turn the rewrite phrases into bare prefixes.
        for (field, value) in [
            ("brand.name", &brand.name),
            ("brand.upstream", &brand.upstream),
            ("brand.attribution_reply", &brand.attribution_reply),
        ] {
            if value.trim().is_empty() {
                return Err(GlobalConfigError::Invalid {
                    field,
                    reason: "must not be blank".to_string(),
                });
            }
        }
        Ok(brand)
    }
}

/// Optional layer used for merging global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub proxy: Option<String>,
    pub max_history: Option<usize>,
    pub provider_order: Option<Vec<String>>,
    pub providers: BTreeMap<String, ProviderSettingsPatch>,
    pub brand: BrandPatch,
    pub system_prompt: Option<String>,
}

impl GlobalConfigPatch {
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.max_history.is_some() {
            self.max_history = other.max_history;
        }
        if other.provider_order.is_some() {
            self.provider_order = other.provider_order;
        }
        for (name, patch) in other.providers {
            self.providers.entry(name).or_default().overlay(patch);
        }
        self.brand.overlay(other.brand);
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt;
        }
    }

    pub fn into_config(mut self) -> Result<GlobalConfig, GlobalConfigError> {
        let order = self.provider_order.take().unwrap_or_else(|| {
            DEFAULT_PROVIDER_ORDER
                .iter()
                .map(|name| name.to_string())
                .collect()
        });
        if order.is_empty() {
            return Err(GlobalConfigError::MissingField("provider_order"));
        }

        let mut settings: BTreeMap<String, ProviderSettingsPatch> = BTreeMap::new();
        for (name, patch) in std::mem::take(&mut self.providers) {
            settings
                .entry(canonical_provider_name(&name))
                .or_default()
                .overlay(patch);
        }

        let mut providers = Vec::with_capacity(order.len());
        for name in order {
            let name = canonical_provider_name(&name);
            if name.is_empty() {
                continue;
            }
            if providers.iter().any(|p: &ProviderSettings| p.name == name) {
                return Err(GlobalConfigError::Invalid {
                    field: "provider_order",
                    reason: format!("provider {name} listed twice"),
                });
            }
            let patch = settings.remove(&name).unwrap_or_default();
            let timeout_ms = patch.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
            if timeout_ms == 0 {
                return Err(GlobalConfigError::Invalid {
                    field: "timeout_ms",
                    reason: format!("provider {name} timeout must be positive"),
                });
            }
            providers.push(ProviderSettings {
                name,
                api_key: patch.api_key,
                model: patch.model,
                base_url: patch.base_url,
                timeout_ms,
            });
        }
        if providers.is_empty() {
            return Err(GlobalConfigError::MissingField("provider_order"));
        }

        Ok(GlobalConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            proxy: self.proxy,
            max_history: self.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
            providers,
            brand: self.brand.into_brand()?,
            system_prompt: self.system_prompt,
        })
    }
}
