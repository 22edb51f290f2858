//! Dialect selection
//!
//! Resolution order: explicit override, then the provider's mapped dialect,
//! then the fallback.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::{DialectKind, SharedDialect};
use crate::logging::Logger;
use crate::providers::ProviderKind;

/// Typed mapping from provider family to dialect
pub struct DialectRegistry {
    by_provider: HashMap<ProviderKind, DialectKind>,
    fallback: DialectKind,
    logger: Arc<dyn Logger>,
}

impl DialectRegistry {
    /// Registry with the built-in mapping
    ///
    /// Anthropic-family providers use `anthropic-invoke`, OpenAI-family
    /// providers use `openai-json`, everything else falls back to `xml-tags`.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let mut by_provider = HashMap::new();
        by_provider.insert(ProviderKind::Anthropic, DialectKind::AnthropicInvoke);
        by_provider.insert(ProviderKind::OpenAi, DialectKind::OpenAiJson);
        Self {
            by_provider,
            fallback: DialectKind::XmlTags,
            logger,
        }
    }

    /// Map a provider family to a dialect, replacing any existing mapping
    pub fn with_mapping(mut self, provider: ProviderKind, dialect: DialectKind) -> Self {
        self.by_provider.insert(provider, dialect);
        self
    }

    /// Dialect used for providers without a mapping
    pub fn with_fallback(mut self, dialect: DialectKind) -> Self {
        self.fallback = dialect;
        self
    }

    pub fn fallback(&self) -> DialectKind {
        self.fallback
    }

    /// Which dialect a provider name resolves to
    pub fn kind_for(&self, override_kind: Option<DialectKind>, provider_name: &str) -> DialectKind {
        if let Some(kind) = override_kind {
            return kind;
        }
        self.by_provider
            .get(&ProviderKind::from_name(provider_name))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Construct the dialect for a provider
    pub fn resolve(&self, override_kind: Option<DialectKind>, provider_name: &str) -> SharedDialect {
        let kind = self.kind_for(override_kind, provider_name);
        self.logger.debug(&format!(
            "[DialectRegistry] Provider '{}' uses dialect '{}'{}",
            provider_name,
            kind,
            if override_kind.is_some() { " (override)" } else { "" }
        ));
        kind.create(Arc::clone(&self.logger))
    }
}

impl std::fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("by_provider", &self.by_provider)
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn registry() -> DialectRegistry {
        DialectRegistry::new(Arc::new(NoOpLogger::new()))
    }

    #[test]
    fn test_default_mapping() {
        let registry = registry();
        assert_eq!(registry.resolve(None, "anthropic").name(), "anthropic-invoke");
        assert_eq!(registry.resolve(None, "claude").name(), "anthropic-invoke");
        assert_eq!(registry.resolve(None, "openai").name(), "openai-json");
        assert_eq!(registry.resolve(None, "openrouter").name(), "openai-json");
        assert_eq!(registry.resolve(None, "ollama").name(), "xml-tags");
        assert_eq!(registry.resolve(None, "mock").name(), "xml-tags");
        assert_eq!(registry.resolve(None, "some-local-llm").name(), "xml-tags");
    }

    #[test]
    fn test_override_wins() {
        let registry = registry();
        assert_eq!(
            registry.resolve(Some(DialectKind::XmlTags), "anthropic").name(),
            "xml-tags"
        );
        assert_eq!(
            registry.kind_for(Some(DialectKind::OpenAiJson), "ollama"),
            DialectKind::OpenAiJson
        );
    }

    #[test]
    fn test_custom_mapping_and_fallback() {
        let registry = registry()
            .with_mapping(ProviderKind::Ollama, DialectKind::OpenAiJson)
            .with_fallback(DialectKind::AnthropicInvoke);

        assert_eq!(registry.kind_for(None, "ollama"), DialectKind::OpenAiJson);
        assert_eq!(registry.kind_for(None, "gemini"), DialectKind::AnthropicInvoke);
        assert_eq!(registry.fallback(), DialectKind::AnthropicInvoke);
    }
}
