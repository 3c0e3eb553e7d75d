//! Background persistence of user messages as memory episodes.

use crate::{CapturePolicy, MemoryError};
use chrono::Utc;
use log::{debug, info, warn};
use recollect_rs_config::MemoryConfig;
use recollect_rs_protocol::{Episode, MemoryNamespace};
use recollect_rs_tools::{Tool, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Sends episodes to the memory service's add-episode tool.
#[derive(Debug, Clone)]
pub struct MemoryWriter {
    tools: Arc<ToolRegistry>,
    add_tool: String,
    timeout: Duration,
    policy: Arc<CapturePolicy>,
}

impl MemoryWriter {
    pub fn new(tools: Arc<ToolRegistry>, config: &MemoryConfig, policy: Arc<CapturePolicy>) -> Self {
        Self {
            tools,
            add_tool: config.add_tool.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            policy,
        }
    }

    /// Store `user_message` under `namespace` on a detached task.
    ///
    /// Returns `None` when nothing was spawned: no add-episode tool, the
    /// capture policy rejected the message, or no runtime is available.
    /// Errors inside the task are logged and dropped.
    pub fn record(&self, user_message: &str, namespace: &MemoryNamespace) -> Option<JoinHandle<()>> {
        let tool = self.tools.get(&self.add_tool)?;
        let Some(body) = self.policy.apply(user_message) else {
            debug!("episode skipped by capture policy (namespace={})", namespace);
            return None;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime available, episode dropped (namespace={})", namespace);
            return None;
        };
        let episode = Episode::from_user_message(body, namespace.clone(), Utc::now());
        let timeout = self.timeout;
        Some(runtime.spawn(async move {
            let name = episode.name.clone();
            let namespace = episode.namespace.clone();
            match store_episode(tool, episode, timeout).await {
                Ok(()) => info!("episode stored (name={}, namespace={})", name, namespace),
                Err(err) => warn!(
                    "episode write failed (name={}, namespace={}, error={})",
                    name, namespace, err
                ),
            }
        }))
    }
}

async fn store_episode(
    tool: Arc<dyn Tool>,
    episode: Episode,
    timeout: Duration,
) -> Result<(), MemoryError> {
    let args = episode.to_tool_arguments();
    tokio::time::timeout(timeout, tool.call(args))
        .await
        .map_err(|_| MemoryError::Timeout(timeout.as_millis() as u64))??;
    Ok(())
}
