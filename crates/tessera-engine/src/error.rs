//! Error types for the service engine.

use tessera_coding::CodingError;
use thiserror::Error;

/// Errors surfaced by [`FragmentService`](crate::FragmentService) operations.
///
/// None of these are fatal to the service: a failed call leaves the registry
/// and every other instance untouched, and nothing is retried internally.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No live instance for the given handle, or no pending encode session.
    #[error("unknown instance handle {0}")]
    UnknownInstance(i64),

    /// Shard counts rejected at instance creation.
    #[error("invalid coder configuration: {0}")]
    InvalidConfig(#[source] CodingError),

    /// Splitting the input buffer failed.
    #[error("split failed: {0}")]
    Split(#[source] CodingError),

    /// Parity generation failed.
    #[error("parity encode failed: {0}")]
    Encode(#[source] CodingError),

    /// Missing shards could not be rebuilt.
    #[error("reconstruction failed: {0}")]
    Reconstruct(#[source] CodingError),

    /// Assembling the output buffer failed.
    #[error("join failed: {0}")]
    Join(#[source] CodingError),

    /// The caller supplied the wrong number of shard buffers.
    #[error("shard list holds {got} entries, instance is configured for {expected}")]
    ShardCount {
        /// Shard count the instance was created with.
        expected: usize,
        /// Entries the caller supplied.
        got: usize,
    },

    /// A caller-supplied buffer does not match the fragment length.
    #[error("buffer {index} is {got} bytes, expected {expected}")]
    BufferSize {
        /// Position of the offending buffer.
        index: usize,
        /// Required length in bytes.
        expected: usize,
        /// Actual length in bytes.
        got: usize,
    },
}
