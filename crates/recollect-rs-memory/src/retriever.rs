//! Lookup of stored facts relevant to an incoming message.

use crate::MemoryError;
use crate::policy::truncate_chars;
use log::{debug, warn};
use recollect_rs_config::{MAX_QUERY_CHARS_LIMIT, MemoryConfig};
use recollect_rs_protocol::MemoryNamespace;
use recollect_rs_tools::ToolRegistry;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Heading placed above retrieved facts.
pub const CONTEXT_LABEL: &str = "Relevant memories about this user:";

/// Text block injected into the prompt; empty means no augmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryContext(String);

impl MemoryContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Searches the memory service through a session's tool registry.
#[derive(Debug, Clone)]
pub struct MemoryRetriever {
    tools: Arc<ToolRegistry>,
    search_tool: String,
    max_query_chars: usize,
    max_nodes: usize,
    timeout: Duration,
}

impl MemoryRetriever {
    pub fn new(tools: Arc<ToolRegistry>, config: &MemoryConfig) -> Self {
        Self {
            tools,
            search_tool: config.search_tool.clone(),
            max_query_chars: config.max_query_chars.clamp(1, MAX_QUERY_CHARS_LIMIT),
            max_nodes: config.max_nodes,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Fetch context for `query`; never fails, degrading to empty context.
    pub async fn search(&self, query: &str, namespace: &MemoryNamespace) -> MemoryContext {
        match self.try_search(query, namespace).await {
            Ok(context) => context,
            Err(err) => {
                warn!(
                    "memory search failed, continuing without context (namespace={}, error={})",
                    namespace, err
                );
                MemoryContext::empty()
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        namespace: &MemoryNamespace,
    ) -> Result<MemoryContext, MemoryError> {
        let Some(tool) = self.tools.get(&self.search_tool) else {
            debug!(
                "no search tool registered, skipping retrieval (tool={})",
                self.search_tool
            );
            return Ok(MemoryContext::empty());
        };
        let args = self.search_arguments(query, namespace);
        let result = tokio::time::timeout(self.timeout, tool.call(args))
            .await
            .map_err(|_| MemoryError::Timeout(self.timeout.as_millis() as u64))??;
        let context = flatten_results(&result);
        debug!(
            "memory search finished (namespace={}, context_chars={})",
            namespace,
            context.as_str().chars().count()
        );
        Ok(context)
    }

    /// Build the search tool arguments, truncating the query.
    pub fn search_arguments(&self, query: &str, namespace: &MemoryNamespace) -> Value {
        json!({
            "query": truncate_chars(query, self.max_query_chars),
            "group_ids": [namespace.as_str()],
            "max_nodes": self.max_nodes,
            "center_node_uuid": Value::Null,
        })
    }
}

/// Reduce a search result to a context block.
///
/// Strings are used verbatim. Node lists (bare or under `nodes`) become one
/// `- <fact>` line per node using `summary`, falling back to `name`.
pub fn flatten_results(result: &Value) -> MemoryContext {
    let nodes = match result {
        Value::String(text) => return MemoryContext::new(text.trim()),
        Value::Array(nodes) => nodes,
        Value::Object(map) => {
            if let Some(error) = map.get("error") {
                warn!("memory service returned an error (error={})", error);
                return MemoryContext::empty();
            }
            match map.get("nodes").and_then(Value::as_array) {
                Some(nodes) => nodes,
                None => return MemoryContext::empty(),
            }
        }
        _ => return MemoryContext::empty(),
    };

    let facts: Vec<String> = nodes.iter().filter_map(node_fact).collect();
    if facts.is_empty() {
        return MemoryContext::empty();
    }
    let mut block = String::from(CONTEXT_LABEL);
    for fact in facts {
        block.push_str("\n- ");
        block.push_str(&fact);
    }
    MemoryContext::new(block)
}

fn node_fact(node: &Value) -> Option<String> {
    if let Some(text) = node.as_str() {
        return non_blank(text);
    }
    ["summary", "name", "fact"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .find_map(non_blank)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
