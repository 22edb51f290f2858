//! Core types shared by the registry client, the dialects and the orchestrator
//!
//! This module contains all the shared types used across providers.

mod model;
mod response;
mod tool;

pub use model::{ModelPricing, ProviderCapabilities};
pub use response::{LlmResponse, ResponseMetadata, TokenUsage, ToolCallRecord};
pub use tool::{Tool, ToolArguments, ToolCallRequest, ToolExecutionResult};
