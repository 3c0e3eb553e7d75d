//! Error types for memory operations.

use recollect_rs_protocol::ToolError;

/// Errors raised inside memory operations before they are logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// A capture pattern failed to compile.
    #[error("regex error: {0}")]
    Regex(String),
    /// The memory service tool failed.
    #[error("memory tool failed: {0}")]
    Tool(#[from] ToolError),
    /// The memory service did not answer in time.
    #[error("memory call timed out after {0} ms")]
    Timeout(u64),
}
