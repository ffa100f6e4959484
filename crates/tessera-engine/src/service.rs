//! Instance registry and the encode/decode pipelines.
//!
//! Instances live in a concurrent `DashMap` keyed by an `i64` handle.
//! Handles are allocated by a compare-exchange retry loop on a process-wide
//! counter, so concurrent creators never collide and a handle is never
//! reassigned to a different live instance. Each instance carries its own
//! encode session; operations on different handles never contend.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tessera_coding::{Coder, ShardSet};
use tracing::{debug, info};

use crate::error::EngineError;

/// A live coder instance: immutable coding configuration plus the most
/// recent encode session, if any.
struct Instance {
    coder: Coder,
    session: Mutex<Option<ShardSet>>,
}

/// The fragment service: registry of coder instances and the entry points
/// every boundary call is routed through.
///
/// A `FragmentService` is an ordinary value. The FFI layer pins one for the
/// whole process; tests construct as many independent services as they need.
pub struct FragmentService {
    instances: DashMap<i64, Instance>,
    next_handle: AtomicI64,
}

impl FragmentService {
    /// Create an empty service with no live instances.
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            next_handle: AtomicI64::new(0),
        }
    }

    /// Create a coder instance and return its handle.
    ///
    /// The handle counter only advances once the configuration has been
    /// accepted, so rejected calls never burn a handle.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] if the shard counts are not supported
    /// by the coding scheme.
    pub fn create_instance(
        &self,
        data_shards: usize,
        parity_shards: usize,
    ) -> Result<i64, EngineError> {
        let coder = Coder::new(data_shards, parity_shards).map_err(EngineError::InvalidConfig)?;

        // Grab a token: CAS retry loop, no lock.
        let mut current = self.next_handle.load(Ordering::Relaxed);
        loop {
            match self.next_handle.compare_exchange(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        let handle = current;

        self.instances.insert(
            handle,
            Instance {
                coder,
                session: Mutex::new(None),
            },
        );
        info!(handle, data_shards, parity_shards, "created coder instance");
        Ok(handle)
    }

    /// Destroy an instance, dropping its coder and any pending encode session.
    ///
    /// Destroying an unknown or already-destroyed handle is a no-op.
    pub fn destroy_instance(&self, handle: i64) {
        if self.instances.remove(&handle).is_some() {
            info!(handle, "destroyed coder instance");
        }
    }

    /// Number of live instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Phase one of encode: split `data`, compute parity, and stash the
    /// shard set in the instance's session.
    ///
    /// Returns `(fragment_len, shard_count)` so the caller can allocate
    /// exactly `shard_count` buffers of `fragment_len` bytes for phase two.
    /// Any prior session on the handle is replaced.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownInstance`], [`EngineError::Split`] (empty
    /// input) or [`EngineError::Encode`].
    pub fn encode_compute(&self, handle: i64, data: &[u8]) -> Result<(usize, usize), EngineError> {
        let instance = self
            .instances
            .get(&handle)
            .ok_or(EngineError::UnknownInstance(handle))?;

        let mut shards = instance.coder.split(data).map_err(EngineError::Split)?;
        instance
            .coder
            .encode(&mut shards)
            .map_err(EngineError::Encode)?;

        let fragment_len = shards[0].len();
        let shard_count = shards.len();
        debug!(handle, fragment_len, shard_count, "encoded shard set");

        *lock(&instance.session) = Some(shards);
        Ok((fragment_len, shard_count))
    }

    /// Phase two of encode: copy the session's shards into caller-owned
    /// buffers, in shard order.
    ///
    /// The session is retained afterwards: copy-out may be repeated until
    /// the next [`encode_compute`](Self::encode_compute) or
    /// [`destroy_instance`](Self::destroy_instance) on the handle.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownInstance`] if the handle is dead or phase one
    /// has not run; [`EngineError::ShardCount`] / [`EngineError::BufferSize`]
    /// if the destinations do not match what phase one reported.
    pub fn encode_copy_out(
        &self,
        handle: i64,
        destinations: &mut [&mut [u8]],
    ) -> Result<(), EngineError> {
        let instance = self
            .instances
            .get(&handle)
            .ok_or(EngineError::UnknownInstance(handle))?;

        let session = lock(&instance.session);
        let shards = session
            .as_ref()
            .ok_or(EngineError::UnknownInstance(handle))?;

        if destinations.len() != shards.len() {
            return Err(EngineError::ShardCount {
                expected: shards.len(),
                got: destinations.len(),
            });
        }
        for (index, (dest, shard)) in destinations.iter_mut().zip(shards).enumerate() {
            if dest.len() != shard.len() {
                return Err(EngineError::BufferSize {
                    index,
                    expected: shard.len(),
                    got: dest.len(),
                });
            }
            dest.copy_from_slice(shard);
        }
        debug!(handle, shards = shards.len(), "copied shard set out");
        Ok(())
    }

    /// Decode: rebuild missing data shards and join the original buffer
    /// into `dest`, truncated to `original_size` bytes.
    ///
    /// `shards` must hold one entry per shard, in the order produced at
    /// encode time; `None` marks a missing shard, and every present entry
    /// must be exactly `fragment_len` bytes. Missing shards are rebuilt
    /// unconditionally; corruption detection is the caller's concern.
    ///
    /// On failure the contents of `dest` are unspecified.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownInstance`], [`EngineError::ShardCount`],
    /// [`EngineError::BufferSize`], [`EngineError::Reconstruct`] (more than
    /// `parity_shards` missing, or backend failure) or [`EngineError::Join`]
    /// (`dest` is not `original_size` bytes, or the data shards hold fewer).
    pub fn decode(
        &self,
        handle: i64,
        shards: &[Option<&[u8]>],
        fragment_len: usize,
        original_size: usize,
        dest: &mut [u8],
    ) -> Result<(), EngineError> {
        let instance = self
            .instances
            .get(&handle)
            .ok_or(EngineError::UnknownInstance(handle))?;
        let coder = &instance.coder;

        if shards.len() != coder.total_shards() {
            return Err(EngineError::ShardCount {
                expected: coder.total_shards(),
                got: shards.len(),
            });
        }

        let mut set: Vec<Option<Vec<u8>>> = Vec::with_capacity(shards.len());
        for (index, shard) in shards.iter().enumerate() {
            match shard {
                Some(s) if s.len() != fragment_len => {
                    return Err(EngineError::BufferSize {
                        index,
                        expected: fragment_len,
                        got: s.len(),
                    });
                }
                Some(s) => set.push(Some(s.to_vec())),
                None => set.push(None),
            }
        }

        coder
            .reconstruct_data(&mut set)
            .map_err(EngineError::Reconstruct)?;
        coder.join(dest, &set, original_size).map_err(EngineError::Join)?;
        debug!(handle, original_size, "decoded buffer");
        Ok(())
    }
}

impl Default for FragmentService {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a session mutex, recovering the guard if a panicking thread
/// poisoned it. Session data is a plain buffer cache and stays coherent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
