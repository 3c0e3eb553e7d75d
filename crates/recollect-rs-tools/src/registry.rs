//! Registry of the tools discovered for one chat session.

use crate::source::ToolSource;
use crate::tool::{Tool, ToolDescriptor};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable name-to-tool map, built once per session.
///
/// An empty registry is the degraded state used when the memory service
/// cannot be reached; every memory operation becomes a no-op against it.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from already-constructed tools.
    ///
    /// Later tools with a duplicate name replace earlier ones.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut map = HashMap::new();
        for tool in tools {
            debug!("registering tool (name={})", tool.name());
            map.insert(tool.name().to_string(), tool);
        }
        Self { tools: map }
    }

    /// Discover tools from `source`; failures yield an empty registry.
    pub async fn initialize(source: &dyn ToolSource) -> Self {
        match source.discover().await {
            Ok(tools) => {
                let registry = Self::from_tools(tools);
                info!(
                    "tool registry initialized (source={}, tools={})",
                    source.label(),
                    registry.len()
                );
                registry
            }
            Err(err) => {
                warn!(
                    "tool discovery failed, continuing without tools (source={}, error={})",
                    source.label(),
                    err
                );
                Self::empty()
            }
        }
    }

    /// Fetch a tool by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List registered tool names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors of every tool, sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|tool| tool.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}
