//! Errors raised by wrapped providers
//!
//! The orchestrator never creates these itself; it passes whatever the
//! wrapped provider returned straight through to its caller.

use thiserror::Error;

/// Failure of a `Provider::call`
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// The provider answered, but not with anything usable
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("No API key configured for {provider}")]
    MissingApiKey { provider: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Provider named in the error, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ApiError { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::MissingApiKey { provider } => Some(provider),
            Self::Cancelled | Self::Json(_) | Self::Other(_) => None,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
