//! The `Tool` seam between the turn pipeline and the memory service.

use async_trait::async_trait;
use recollect_rs_protocol::ToolError;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// Name, description, and input schema of a discovered tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Remote operation taking a JSON object.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema the arguments object must satisfy.
    fn input_schema(&self) -> Value;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            input_schema: self.input_schema(),
        }
    }
}
