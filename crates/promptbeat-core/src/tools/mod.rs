//! Tool management module
//!
//! This module owns the connections to every configured tool server, the
//! merged tool catalog, and safe tool execution.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistryClient                         │
//! │                                             │
//! │  - Connects to all servers concurrently     │
//! │  - Fetches tools via MCP tools/list         │
//! │  - Applies the allow/block policy           │
//! │  - Routes tools/call to the owning server   │
//! │  - Bounds every call with a timeout         │
//! └─────────────────────────────────────────────┘
//!           │
//!           │ MCP over stdio (tools/list, tools/call)
//!           ▼
//! ┌──────────────┐ ┌──────────────┐ ┌──────────┐
//! │ server "fs"  │ │ server "git" │ │   ...    │
//! └──────────────┘ └──────────────┘ └──────────┘
//! ```

mod client;
mod policy;

pub use client::ToolRegistryClient;
pub use policy::ToolPolicy;
