/// Errors returned by tools and tool sources.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// The service exposing the tool could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Tool call did not finish in time.
    #[error("tool timed out after {0} ms")]
    Timeout(u64),
}
