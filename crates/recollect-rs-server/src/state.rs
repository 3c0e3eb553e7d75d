//! State shared by the route handlers.

use recollect_rs_core::ChatService;
use std::sync::Arc;
use std::time::Instant;

/// Shared state handed to every route.
pub struct AppState {
    pub service: Arc<ChatService>,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<ChatService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
