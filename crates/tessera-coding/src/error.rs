//! Error types for coding operations.

use thiserror::Error;

/// Errors raised while splitting, encoding, reconstructing or joining shards.
#[derive(Debug, Error)]
pub enum CodingError {
    /// Shard counts outside what the coding scheme supports.
    #[error("unsupported shard counts: {data} data, {parity} parity (need data > 0, data + parity <= 256)")]
    InvalidShardCounts {
        /// Requested data shard count.
        data: usize,
        /// Requested parity shard count.
        parity: usize,
    },

    /// The input buffer was empty.
    #[error("cannot split an empty buffer")]
    EmptyInput,

    /// The Reed-Solomon backend returned an error.
    #[error("reed-solomon error: {0}")]
    ReedSolomon(#[from] reed_solomon_erasure::Error),

    /// A data shard required for joining is absent.
    #[error("data shard {0} missing after reconstruction")]
    MissingDataShard(usize),

    /// Join destination does not match the requested size.
    #[error("join size mismatch: destination {dest} bytes, requested {requested}, shards hold {available}")]
    JoinSizeMismatch {
        /// Destination buffer length.
        dest: usize,
        /// Bytes the caller asked to recover.
        requested: usize,
        /// Bytes actually available across the data shards.
        available: usize,
    },
}
