//! # Tessera Engine
//!
//! The stateful core of the Tessera fragment service: a registry of live
//! coder instances, each addressed by an opaque integer handle, plus the
//! two-phase encode and single-phase decode pipelines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      FragmentService                            │
//! │   handle ──► Instance { Coder, encode session }                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   encode:  split ──► parity ──► session ──► copy-out            │
//! │   decode:  rebuild missing data shards ──► join ──► dest        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service is synchronous and CPU-bound; all registry operations are
//! safe to call from multiple threads without external locking. Encode is
//! split into two calls because the caller can only allocate its
//! destination buffers once the per-shard length is known.
//!
//! The engine never retains caller memory and never hands out memory the
//! caller must free: phase-two encode and decode only write into buffers
//! the caller supplies.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod service;

pub use error::EngineError;
pub use service::FragmentService;
