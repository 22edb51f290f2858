//! Typed provider identity
//!
//! Provider names are free-form strings ("openai", "azure", "claude", ...).
//! Anything that needs to branch on the provider family classifies the name
//! once with [`ProviderKind::from_name`] and matches on the enum.

use std::fmt;

/// Family a provider belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
    Ollama,
    Mock,
    /// Any provider not known to this crate, by lowercased name
    Other(String),
}

impl ProviderKind {
    /// Classify a provider name
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "anthropic" | "claude" | "bedrock-anthropic" => Self::Anthropic,
            "openai" | "azure" | "openrouter" | "groq" | "deepseek" | "xai" | "together"
            | "fireworks" | "mistral" => Self::OpenAi,
            "gemini" | "google" | "vertex" => Self::Gemini,
            "ollama" => Self::Ollama,
            "mock" => Self::Mock,
            _ => Self::Other(lower),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::Mock => write!(f, "mock"),
            ProviderKind::Other(name) => write!(f, "{}", name),
        }
    }
}
