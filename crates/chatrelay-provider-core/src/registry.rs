use std::collections::HashMap;
use std::sync::Arc;

use crate::{ProviderKind, UpstreamProvider};

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn UpstreamProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn UpstreamProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn UpstreamProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Looks a provider up by its configured name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn UpstreamProvider>> {
        ProviderKind::parse(name).and_then(|kind| self.get(kind))
    }
}
