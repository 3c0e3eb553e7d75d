//! Core chat pipeline for Recollect.
//!
//! This crate owns the model client, prompt assembly, sessions, login, and
//! the turn controller that ties memory retrieval and capture to streamed
//! generation.

pub mod auth;
pub mod error;
pub mod generator;
pub mod llm;
pub mod prompt;
pub mod service;
pub mod session;
pub mod turn;

/// Credential verification.
pub use auth::{CredentialVerifier, StaticCredentials};
/// Error types.
pub use error::{CoreError, ModelError};
/// Streaming generation.
pub use generator::{Generation, ResponseGenerator};
/// Model abstraction and the OpenAI-compatible client.
pub use llm::{ChatModel, DeltaStream, OpenAiChatModel};
/// Prompt assembly.
pub use prompt::augment;
/// Service facade.
pub use service::{ChatService, Credentials};
/// Sessions.
pub use session::{ChatSession, SessionId, SessionLimits, SessionManager};
/// Turn handling.
pub use turn::{TurnController, TurnOutcome};
