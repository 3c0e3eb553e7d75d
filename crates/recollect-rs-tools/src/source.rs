//! Discovery of tools exposed by an external service.

use crate::tool::Tool;
use async_trait::async_trait;
use recollect_rs_protocol::ToolError;
use std::sync::Arc;

/// Something that can list the tools a service currently exposes.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Discover the tools currently available.
    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError>;
}
