//! Test helpers shared across Recollect crates.

pub mod llm;
pub mod tools;
pub mod transport;

pub use llm::{FailingModel, StreamingModel};
pub use tools::{FailingTool, FailingToolSource, StaticToolSource, StubTool};
pub use transport::RecordingTransport;
