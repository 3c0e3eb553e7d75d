//! Error types for the core chat pipeline.

use recollect_rs_protocol::TransportError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the hosted model client.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The HTTP request could not be sent.
    #[error("model request failed: {0}")]
    Request(String),
    /// The API answered with a non-success status.
    #[error("model API error {status}: {body}")]
    Status { status: u16, body: String },
    /// The response stream broke off.
    #[error("model stream failed: {0}")]
    Stream(String),
    /// A chunk could not be decoded.
    #[error("invalid model response: {0}")]
    Decode(String),
    /// The API reported an error inside the stream.
    #[error("model API error: {0}")]
    Api(String),
}

/// Errors returned by the chat service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session id is unknown.
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),
    /// Credentials were missing or rejected.
    #[error("invalid credentials")]
    Unauthorized,
    /// Delivering output to the user failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Settings could not be turned into runtime components.
    #[error("config error: {0}")]
    Config(String),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}
