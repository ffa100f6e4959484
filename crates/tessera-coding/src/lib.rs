//! # Tessera Coding
//!
//! Reed-Solomon coder for the Tessera fragment service.
//!
//! This crate provides:
//! - [`Coder`] - splits a buffer into `k` equal-length data shards, derives
//!   `m` parity shards, and reconstructs the original from any `k` survivors
//! - Shard-count validation against the GF(2^8) field limit
//! - Ordered join back into a caller-supplied buffer, truncated to the
//!   original (pre-padding) size
//!
//! The Galois-field matrix arithmetic itself is delegated to
//! `reed-solomon-erasure`; this crate owns the split/join geometry and the
//! zero-parity degenerate case.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod coder;
mod error;

pub use coder::{Coder, ShardSet};
pub use error::CodingError;

/// Maximum total shard count (data + parity) supported by the GF(2^8) field.
pub const MAX_TOTAL_SHARDS: usize = 256;
