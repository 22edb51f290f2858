//! LLM provider abstraction
//!
//! The orchestration core consumes providers; it does not implement one.
//! Concrete providers (OpenAI, Anthropic, Ollama, ...) live with the task
//! runner and implement [`Provider`].
//!
//! The `MockProvider` is kept for testing purposes.

mod error;
mod kind;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use kind::ProviderKind;
pub use mock::{MockConfig, MockMode, MockProvider, MockStep};
pub use traits::{Provider, SharedProvider};
