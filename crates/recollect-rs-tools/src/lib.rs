//! Tool interfaces, the per-session tool registry, and the MCP-backed tool source.

pub mod mcp;
pub mod registry;
pub mod source;
pub mod tool;

/// MCP client source and tool wrapper.
pub use mcp::{McpTool, McpToolSource};
/// Immutable tool registry.
pub use registry::ToolRegistry;
/// Tool discovery trait.
pub use source::ToolSource;
/// Tool trait and descriptor.
pub use tool::{Tool, ToolDescriptor};
