use async_trait::async_trait;
use parking_lot::Mutex;
use recollect_rs_protocol::ToolError;
use recollect_rs_tools::{Tool, ToolSource};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Tool returning a fixed result and recording every argument object.
#[derive(Debug, Clone)]
pub struct StubTool {
    name: String,
    result: Value,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<Value>>>,
}

impl StubTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: json!({}),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "stub"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.calls.lock().push(args);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.result.clone())
    }
}

/// Tool that always fails and counts its calls.
#[derive(Debug, Clone)]
pub struct FailingTool {
    name: String,
    message: String,
    calls: Arc<Mutex<usize>>,
}

impl FailingTool {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        *self.calls.lock() += 1;
        Err(ToolError::ExecutionFailed(self.message.clone()))
    }
}

/// Source handing out a fixed tool list.
#[derive(Debug, Clone, Default)]
pub struct StaticToolSource {
    tools: Vec<Arc<dyn Tool>>,
    discoveries: Arc<Mutex<usize>>,
}

impl StaticToolSource {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools,
            discoveries: Arc::new(Mutex::new(0)),
        }
    }

    pub fn discoveries(&self) -> usize {
        *self.discoveries.lock()
    }
}

#[async_trait]
impl ToolSource for StaticToolSource {
    fn label(&self) -> &str {
        "static"
    }

    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        *self.discoveries.lock() += 1;
        Ok(self.tools.clone())
    }
}

/// Source whose service is never reachable.
#[derive(Debug, Clone, Default)]
pub struct FailingToolSource;

#[async_trait]
impl ToolSource for FailingToolSource {
    fn label(&self) -> &str {
        "unreachable"
    }

    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        Err(ToolError::ConnectionFailed("connection refused".to_string()))
    }
}
