//! Tool-call dialects
//!
//! Models without a native function-calling API can still use tools if the
//! prompt teaches them a textual convention and their output is parsed back.
//! Each convention is a [`ToolCallDialect`]:
//!
//! - [`XmlTagDialect`] (`xml-tags`): `<tool_call>{json}</tool_call>` blocks,
//!   the fallback for any provider
//! - [`AnthropicDialect`] (`anthropic-invoke`): `<function_calls><invoke>` blocks
//! - [`OpenAiJsonDialect`] (`openai-json`): fenced `{"tool_calls": [...]}` JSON
//!
//! [`DialectRegistry`] picks the dialect for a provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use promptbeat_core::dialects::DialectRegistry;
//!
//! let registry = DialectRegistry::new(logger);
//! let dialect = registry.resolve(None, "claude");
//! assert_eq!(dialect.name(), "anthropic-invoke");
//!
//! let prompt = dialect.create_tool_prompt("List my repos", &tools);
//! let calls = dialect.extract_tool_calls(&model_output);
//! ```

mod anthropic;
mod openai;
mod registry;
mod traits;
mod xml;

pub use anthropic::AnthropicDialect;
pub use openai::OpenAiJsonDialect;
pub use registry::DialectRegistry;
pub use traits::{DialectKind, SharedDialect, ToolCallDialect};
pub use xml::XmlTagDialect;
