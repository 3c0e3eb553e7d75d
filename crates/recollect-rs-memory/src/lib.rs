//! Memory plumbing between chat turns and the knowledge-graph memory service:
//! namespace resolution, context retrieval, and episode capture.

pub mod error;
pub mod namespace;
pub mod policy;
pub mod retriever;
pub mod writer;

/// Memory error type.
pub use error::MemoryError;
/// Session identity to namespace mapping.
pub use namespace::resolve_namespace;
/// Episode capture policy.
pub use policy::CapturePolicy;
/// Context retrieval.
pub use retriever::{MemoryContext, MemoryRetriever};
/// Background episode writes.
pub use writer::MemoryWriter;
