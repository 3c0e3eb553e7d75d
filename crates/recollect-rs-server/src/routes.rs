//! HTTP route handlers.

use crate::error::ApiError;
use crate::sse::SseTransport;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use log::{debug, info, warn};
use recollect_rs_core::{CoreError, Credentials};
use recollect_rs_tools::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const EVENT_BUFFER: usize = 64;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub sessions: usize,
    pub auth_enabled: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        sessions: state.service.session_count(),
        auth_enabled: state.service.auth_enabled(),
    })
}

/// Login body; both fields may be omitted when login is disabled.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub namespace: String,
    pub tools: Vec<ToolDescriptor>,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let credentials = match (request.username, request.password) {
        (None, None) => None,
        (username, password) => Some(Credentials::new(
            username.unwrap_or_default(),
            password.unwrap_or_default(),
        )),
    };
    let session = state.service.open_session(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id(),
            namespace: session.namespace().to_string(),
            tools: session.tools().descriptors(),
        }),
    ))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.service.close_session(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::UnknownSession(id).into())
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Run a turn and stream it back as server-sent events.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Response, ApiError> {
    state.service.session(id)?;
    if request.content.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "empty_message",
            "message content must not be empty",
        ));
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let transport = SseTransport::new(tx);
    let service = Arc::clone(&state.service);
    tokio::spawn(async move {
        match service.send_message(id, &request.content, &transport).await {
            Ok(outcome) => {
                if let Some(message) = &outcome.error
                    && transport.send_error(message).await.is_err()
                {
                    debug!("client left before error event (session_id={})", id);
                }
            }
            Err(CoreError::Transport(err)) => {
                info!("client disconnected mid-turn (session_id={}, error={})", id, err);
            }
            Err(err) => {
                warn!("turn failed (session_id={}, error={})", id, err);
                if transport.send_error(&err.to_string()).await.is_err() {
                    debug!("client left before error event (session_id={})", id);
                }
            }
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response())
}
