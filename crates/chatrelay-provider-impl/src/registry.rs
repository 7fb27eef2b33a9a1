use std::sync::Arc;

use chatrelay_provider_core::ProviderRegistry;

use crate::providers::{DeepSeekProvider, GeminiProvider, OpenAIProvider};

pub fn register_builtin_providers(registry: &mut ProviderRegistry) {
    registry.register(Arc::new(GeminiProvider::new()));
    registry.register(Arc::new(DeepSeekProvider::new()));
    registry.register(Arc::new(OpenAIProvider::new()));
}
