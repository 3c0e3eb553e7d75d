//! In-memory chat sessions and their registry.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use recollect_rs_config::SessionConfig;
use recollect_rs_memory::resolve_namespace;
use recollect_rs_protocol::{AuthenticatedUser, ChatMessage, MemoryNamespace};
use recollect_rs_tools::{ToolRegistry, ToolSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type SessionId = Uuid;

/// State owned by one chat session.
///
/// Identity, namespace and tools are fixed at creation. The transcript holds
/// at most the configured history window.
#[derive(Debug)]
pub struct ChatSession {
    id: SessionId,
    user: Option<AuthenticatedUser>,
    namespace: MemoryNamespace,
    tools: Arc<ToolRegistry>,
    history: RwLock<Vec<ChatMessage>>,
    created_at: DateTime<Utc>,
    last_active: Mutex<Instant>,
}

impl ChatSession {
    pub fn new(user: Option<AuthenticatedUser>, tools: Arc<ToolRegistry>) -> Self {
        let namespace = resolve_namespace(user.as_ref());
        Self {
            id: Uuid::new_v4(),
            user,
            namespace,
            tools,
            history: RwLock::new(Vec::new()),
            created_at: Utc::now(),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn namespace(&self) -> &MemoryNamespace {
        &self.namespace
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Snapshot of the transcript.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.read().clone()
    }

    /// Append a completed exchange, keeping only the newest `keep` messages.
    /// With `keep == 0` nothing is stored.
    pub fn record_turn(&self, user_message: &str, reply: &str, keep: usize) {
        if keep == 0 {
            return;
        }
        let mut history = self.history.write();
        history.push(ChatMessage::user(user_message));
        history.push(ChatMessage::assistant(reply));
        let excess = history.len().saturating_sub(keep);
        history.drain(..excess);
    }

    fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_active.lock().elapsed()
    }
}

/// Retention bounds for open sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    /// `None` keeps idle sessions until capacity evicts them.
    pub idle_timeout: Option<Duration>,
}

impl SessionLimits {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_sessions: config.max_sessions.max(1),
            idle_timeout: (config.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(config.idle_timeout_secs)),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Creates, finds and removes chat sessions.
pub struct SessionManager {
    source: Option<Arc<dyn ToolSource>>,
    limits: SessionLimits,
    sessions: RwLock<HashMap<SessionId, Arc<ChatSession>>>,
}

impl SessionManager {
    /// `source` is consulted once per new session; `None` gives every
    /// session an empty registry.
    pub fn new(source: Option<Arc<dyn ToolSource>>) -> Self {
        Self {
            source,
            limits: SessionLimits::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Start a session for `user`, discovering its tools.
    ///
    /// Idle sessions are dropped first; at capacity the least recently used
    /// session is evicted to make room.
    pub async fn create(&self, user: Option<AuthenticatedUser>) -> Arc<ChatSession> {
        let tools = match &self.source {
            Some(source) => ToolRegistry::initialize(source.as_ref()).await,
            None => ToolRegistry::empty(),
        };
        let session = Arc::new(ChatSession::new(user, Arc::new(tools)));
        info!(
            "created session (session_id={}, namespace={}, tools={})",
            session.id(),
            session.namespace(),
            session.tools().len()
        );
        let mut sessions = self.sessions.write();
        self.evict(&mut sessions);
        sessions.insert(session.id(), Arc::clone(&session));
        session
    }

    /// Look up a session and mark it active.
    pub fn get(&self, id: SessionId) -> Result<Arc<ChatSession>, CoreError> {
        let session = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::UnknownSession(id))?;
        session.touch();
        Ok(session)
    }

    /// Remove a session; returns whether it existed.
    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        debug!("removed session (session_id={}, existed={})", id, removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn evict(&self, sessions: &mut HashMap<SessionId, Arc<ChatSession>>) {
        if let Some(timeout) = self.limits.idle_timeout {
            sessions.retain(|id, session| {
                let keep = session.idle_for() < timeout;
                if !keep {
                    info!("expired idle session (session_id={})", id);
                }
                keep
            });
        }
        while sessions.len() >= self.limits.max_sessions {
            let Some(oldest) = sessions
                .values()
                .max_by_key(|session| session.idle_for())
                .map(|session| session.id())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!(
                "evicted least recently used session (session_id={}, max_sessions={})",
                oldest, self.limits.max_sessions
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionLimits, SessionManager};
    use crate::error::CoreError;
    use pretty_assertions::assert_eq;
    use recollect_rs_protocol::{AuthenticatedUser, ChatMessage};
    use std::time::Duration;

    #[tokio::test]
    async fn sessions_resolve_namespace_once() {
        let manager = SessionManager::new(None);
        let session = manager
            .create(Some(AuthenticatedUser::new("a b!c")))
            .await;
        assert_eq!(session.namespace().as_str(), "user-a-b-c");
        assert!(session.tools().is_empty());

        let fetched = manager.get(session.id()).expect("session");
        assert_eq!(fetched.namespace(), session.namespace());
    }

    #[tokio::test]
    async fn anonymous_sessions_use_anonymous_namespace() {
        let manager = SessionManager::new(None);
        let session = manager.create(None).await;
        assert_eq!(session.namespace().as_str(), "anonymous");
    }

    #[tokio::test]
    async fn remove_forgets_session() {
        let manager = SessionManager::new(None);
        let session = manager.create(None).await;
        assert_eq!(manager.len(), 1);
        assert!(manager.remove(session.id()));
        assert!(!manager.remove(session.id()));
        assert!(matches!(
            manager.get(session.id()),
            Err(CoreError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn record_turn_keeps_newest_messages() {
        let manager = SessionManager::new(None);
        let session = manager.create(None).await;
        session.record_turn("Hi", "Hello", 3);
        session.record_turn("How are you?", "Fine", 3);
        assert_eq!(
            session.history(),
            vec![
                ChatMessage::assistant("Hello"),
                ChatMessage::user("How are you?"),
                ChatMessage::assistant("Fine"),
            ]
        );
    }

    #[tokio::test]
    async fn zero_window_stores_nothing() {
        let manager = SessionManager::new(None);
        let session = manager.create(None).await;
        for _ in 0..100 {
            session.record_turn("ping", "pong", 0);
        }
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let manager = SessionManager::new(None).with_limits(SessionLimits {
            max_sessions: 2,
            idle_timeout: None,
        });
        let first = manager.create(None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = manager.create(None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        manager.get(first.id()).expect("first is still open");

        let third = manager.create(None).await;
        assert_eq!(manager.len(), 2);
        assert!(manager.get(first.id()).is_ok());
        assert!(manager.get(third.id()).is_ok());
        assert!(matches!(
            manager.get(second.id()),
            Err(CoreError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn idle_sessions_expire_on_next_create() {
        let manager = SessionManager::new(None).with_limits(SessionLimits {
            max_sessions: 100,
            idle_timeout: Some(Duration::from_millis(20)),
        });
        let stale = manager.create(None).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let fresh = manager.create(None).await;
        assert_eq!(manager.len(), 1);
        assert!(manager.get(fresh.id()).is_ok());
        assert!(manager.get(stale.id()).is_err());
    }

    #[test]
    fn zero_idle_timeout_disables_expiry() {
        let limits = SessionLimits::from_config(&recollect_rs_config::SessionConfig {
            max_sessions: 0,
            idle_timeout_secs: 0,
        });
        assert_eq!(limits.max_sessions, 1);
        assert_eq!(limits.idle_timeout, None);
    }
}
