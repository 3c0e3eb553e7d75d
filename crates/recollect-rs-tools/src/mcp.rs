//! MCP client that exposes a memory service's tools through the `Tool` trait.
//!
//! The service is spawned as a child process speaking MCP over stdio. The
//! connection is opened on first discovery and reused by later sessions; if
//! listing tools fails the cached connection is dropped so the next session
//! reconnects.

use crate::source::ToolSource;
use crate::tool::Tool;
use async_trait::async_trait;
use log::{debug, info, warn};
use recollect_rs_config::MemoryConfig;
use recollect_rs_protocol::ToolError;
use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParams;
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Tool source backed by an MCP server launched as a child process.
pub struct McpToolSource {
    label: String,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    connect_timeout: Duration,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl McpToolSource {
    pub fn new(command: impl Into<String>, args: Vec<String>, env: HashMap<String, String>) -> Self {
        let command = command.into();
        Self {
            label: format!("mcp:{command}"),
            command,
            args,
            env,
            connect_timeout: Duration::from_secs(30),
            service: Mutex::new(None),
        }
    }

    /// Build a source from memory settings; `None` when memory is disabled
    /// or no command is configured.
    pub fn from_config(config: &MemoryConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let command = config.command.as_deref()?.trim();
        if command.is_empty() {
            return None;
        }
        Some(
            Self::new(command, config.args.clone(), config.env.clone())
                .with_connect_timeout(Duration::from_millis(config.timeout_ms)),
        )
    }

    /// Bound the time allowed for spawning and the MCP handshake.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn connect(&self) -> Result<RunningService<RoleClient, ()>, ToolError> {
        info!(
            "connecting to memory service (command={}, args={:?})",
            self.command, self.args
        );
        let mut command = Command::new(&self.command);
        command.args(&self.args).envs(&self.env);
        let transport = TokioChildProcess::new(command).map_err(|err| {
            ToolError::ConnectionFailed(format!("failed to spawn {}: {err}", self.command))
        })?;
        let handshake = ().serve(transport);
        match tokio::time::timeout(self.connect_timeout, handshake).await {
            Ok(Ok(service)) => Ok(service),
            Ok(Err(err)) => Err(ToolError::ConnectionFailed(format!(
                "mcp handshake failed: {err}"
            ))),
            Err(_) => Err(ToolError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }
}

impl fmt::Debug for McpToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpToolSource")
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}

#[async_trait]
impl ToolSource for McpToolSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        let mut guard = self.service.lock().await;
        let peer = match guard.as_ref() {
            Some(service) => service.peer().clone(),
            None => {
                let service = self.connect().await?;
                let peer = service.peer().clone();
                *guard = Some(service);
                peer
            }
        };

        let listed = match peer.list_all_tools().await {
            Ok(listed) => listed,
            Err(err) => {
                warn!(
                    "listing memory service tools failed, dropping connection (error={})",
                    err
                );
                *guard = None;
                return Err(ToolError::ConnectionFailed(err.to_string()));
            }
        };

        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(listed.len());
        for tool in listed {
            let descriptor = serde_json::to_value(&tool)
                .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;
            match McpTool::from_descriptor(&descriptor, peer.clone()) {
                Some(tool) => tools.push(Arc::new(tool)),
                None => warn!("skipping malformed tool descriptor (descriptor={})", descriptor),
            }
        }
        debug!("memory service tools discovered (count={})", tools.len());
        Ok(tools)
    }
}

/// One tool exposed by a connected MCP server.
#[derive(Clone)]
pub struct McpTool {
    name: String,
    description: String,
    input_schema: Value,
    peer: Peer<RoleClient>,
}

impl McpTool {
    /// Build from the JSON form of an MCP tool descriptor.
    fn from_descriptor(descriptor: &Value, peer: Peer<RoleClient>) -> Option<Self> {
        let name = descriptor.get("name")?.as_str()?.to_string();
        let description = descriptor
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let input_schema = descriptor
            .get("inputSchema")
            .cloned()
            .unwrap_or_else(|| json!({ "type": "object" }));
        Some(Self {
            name,
            description,
            input_schema,
            peer,
        })
    }
}

impl fmt::Debug for McpTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "McpTool({})", self.name)
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        if !args.is_object() {
            return Err(ToolError::InvalidArguments(format!(
                "{} expects a JSON object",
                self.name
            )));
        }
        let params: CallToolRequestParams =
            serde_json::from_value(json!({ "name": self.name, "arguments": args }))
                .map_err(|err| ToolError::InvalidArguments(err.to_string()))?;
        debug!("calling memory service tool (name={})", self.name);
        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;
        let raw = serde_json::to_value(&result)
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;
        reduce_call_result(&raw)
    }
}

/// Reduce the JSON form of an MCP `CallToolResult` to a plain JSON value.
///
/// Structured content wins when present. Otherwise text parts are joined and
/// parsed as JSON, falling back to a JSON string. Error results become
/// `ToolError::ExecutionFailed` carrying the text.
pub(crate) fn reduce_call_result(raw: &Value) -> Result<Value, ToolError> {
    let text = raw
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if raw.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::ExecutionFailed(text));
    }
    if let Some(structured) = raw.get("structuredContent").filter(|value| !value.is_null()) {
        return Ok(structured.clone());
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
