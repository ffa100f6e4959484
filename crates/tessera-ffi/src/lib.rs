//! # tessera-ffi - C-compatible boundary for the fragment service
//!
//! This crate exposes the Tessera erasure-coding engine over a stable C ABI
//! for native callers (C, C++, Go, anything that can speak `extern "C"`).
//!
//! ## Calling convention
//!
//! Every fallible function returns `0` on success and `-1` on failure
//! ([`TESSERA_OK`] / [`TESSERA_ERR`]); `tessera_instance_create` returns the
//! new handle (>= 0) or `-1`. No structured error detail crosses the
//! boundary - diagnostics are logged process-side via `tracing`.
//!
//! ## Memory ownership
//!
//! The callee never allocates memory the caller must free:
//! - Phase-two encode and decode only write into caller-supplied buffers of
//!   the exact size phase one reported.
//! - Input shards are read-only views for the duration of a single call;
//!   nothing is retained.
//! - A null shard pointer at index `i` means "shard `i` is missing" and is
//!   never dereferenced.
//! - On any `-1` return, output buffers are in an unspecified partial state
//!   and must be discarded.
//!
//! ## Safety
//!
//! Functions taking raw pointers are `unsafe`; callers must pass pointers
//! that are valid for the declared lengths. All raw-pointer handling is
//! confined to this crate - the engine underneath is safe Rust.

#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

use std::os::raw::{c_char, c_int};
use std::slice;
use std::sync::LazyLock;

use tessera_engine::FragmentService;
use tracing::error;

/// Success sentinel.
pub const TESSERA_OK: c_int = 0;
/// Failure sentinel.
pub const TESSERA_ERR: c_int = -1;

/// The process-wide service instance behind every boundary entry point.
static SERVICE: LazyLock<FragmentService> = LazyLock::new(FragmentService::new);

/// Initialize process-side logging.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call multiple times
/// (idempotent). Returns 0.
#[unsafe(no_mangle)]
pub extern "C" fn tessera_init() -> c_int {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    TESSERA_OK
}

/// Library version as a static NUL-terminated string.
///
/// The returned pointer is valid for the lifetime of the process and must
/// NOT be freed.
#[unsafe(no_mangle)]
pub extern "C" fn tessera_version() -> *const c_char {
    const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

/// Create a coder instance for `data_shards` data and `parity_shards`
/// parity shards.
///
/// Returns the instance handle (>= 0), or `-1` if the counts are not
/// supported by the coding scheme (`data_shards < 1`, negative counts, or
/// more than 256 total shards).
#[unsafe(no_mangle)]
pub extern "C" fn tessera_instance_create(data_shards: c_int, parity_shards: c_int) -> i64 {
    let (Ok(data), Ok(parity)) = (
        usize::try_from(data_shards),
        usize::try_from(parity_shards),
    ) else {
        error!(data_shards, parity_shards, "negative shard counts");
        return i64::from(TESSERA_ERR);
    };

    match SERVICE.create_instance(data, parity) {
        Ok(handle) => handle,
        Err(err) => {
            error!(data_shards, parity_shards, %err, "instance create failed");
            i64::from(TESSERA_ERR)
        }
    }
}

/// Destroy an instance, releasing its coder and any pending encode session.
///
/// Idempotent: destroying an unknown or already-destroyed handle is a
/// no-op. Always returns 0.
#[unsafe(no_mangle)]
pub extern "C" fn tessera_instance_destroy(handle: i64) -> c_int {
    SERVICE.destroy_instance(handle);
    TESSERA_OK
}

/// Phase one of encode: split `data` into shards, compute parity, and hold
/// the result for copy-out.
///
/// On success writes the per-shard byte length to `fragment_len_out` and
/// the total shard count to `shard_count_out`; the caller then allocates
/// exactly that many buffers of that size for
/// [`tessera_encode_copy_out`]. Each call replaces the handle's previous
/// pending result.
///
/// Returns `-1` on an unknown handle, empty input, or coder failure.
///
/// # Safety
///
/// - `data` must be valid for reads of `data_len` bytes
/// - `fragment_len_out` and `shard_count_out` must be valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessera_encode_compute(
    handle: i64,
    data: *const u8,
    data_len: usize,
    fragment_len_out: *mut usize,
    shard_count_out: *mut usize,
) -> c_int {
    if data.is_null() || fragment_len_out.is_null() || shard_count_out.is_null() {
        error!(handle, "null pointer passed to encode_compute");
        return TESSERA_ERR;
    }
    let data = unsafe { slice::from_raw_parts(data, data_len) };

    match SERVICE.encode_compute(handle, data) {
        Ok((fragment_len, shard_count)) => {
            unsafe {
                *fragment_len_out = fragment_len;
                *shard_count_out = shard_count;
            }
            TESSERA_OK
        }
        Err(err) => {
            error!(handle, %err, "encode compute failed");
            TESSERA_ERR
        }
    }
}

/// Phase two of encode: copy the pending shards into caller-owned buffers.
///
/// `dests` is an array of `dest_count` pointers, each to a caller-owned
/// buffer of `fragment_len` bytes, filled in shard order (data shards
/// first, then parity). The pending result is retained, so copy-out may be
/// repeated until the next compute or destroy on the handle.
///
/// Returns `-1` if the handle is unknown, phase one has not run, or the
/// buffer geometry does not match what phase one reported.
///
/// # Safety
///
/// - `dests` must be valid for reads of `dest_count` pointers
/// - every pointer in `dests` must be non-null and valid for writes of
///   `fragment_len` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessera_encode_copy_out(
    handle: i64,
    dests: *mut *mut u8,
    dest_count: usize,
    fragment_len: usize,
) -> c_int {
    if dests.is_null() {
        error!(handle, "null destination array passed to encode_copy_out");
        return TESSERA_ERR;
    }
    let pointers = unsafe { slice::from_raw_parts(dests, dest_count) };
    if pointers.iter().any(|p| p.is_null()) {
        error!(handle, "null destination buffer passed to encode_copy_out");
        return TESSERA_ERR;
    }
    let mut buffers: Vec<&mut [u8]> = pointers
        .iter()
        .map(|&p| unsafe { slice::from_raw_parts_mut(p, fragment_len) })
        .collect();

    match SERVICE.encode_copy_out(handle, &mut buffers) {
        Ok(()) => TESSERA_OK,
        Err(err) => {
            error!(handle, %err, "encode copy-out failed");
            TESSERA_ERR
        }
    }
}

/// Decode: rebuild the original buffer from surviving shards.
///
/// `shards` is an array of `shard_count` pointers in encode order; a null
/// entry marks that shard as missing, every non-null entry is read as
/// exactly `fragment_len` bytes. The recovered buffer, truncated to
/// `original_size` bytes (undoing encode-time padding), is written to
/// `dest`, which must be exactly `original_size` bytes (`dest_len` says how
/// long it really is).
///
/// Returns `-1` on an unknown handle, more missing shards than the
/// instance's parity count, inconsistent geometry, or a destination size
/// mismatch. On failure `dest` is left in an unspecified partial state.
///
/// # Safety
///
/// - `shards` must be valid for reads of `shard_count` pointers
/// - every non-null pointer in `shards` must be valid for reads of
///   `fragment_len` bytes
/// - `dest` must be valid for writes of `dest_len` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessera_decode(
    handle: i64,
    shards: *const *const u8,
    shard_count: usize,
    fragment_len: usize,
    original_size: usize,
    dest: *mut u8,
    dest_len: usize,
) -> c_int {
    if shards.is_null() || dest.is_null() {
        error!(handle, "null pointer passed to decode");
        return TESSERA_ERR;
    }
    let pointers = unsafe { slice::from_raw_parts(shards, shard_count) };
    let views: Vec<Option<&[u8]>> = pointers
        .iter()
        .map(|&p| {
            if p.is_null() {
                None
            } else {
                Some(unsafe { slice::from_raw_parts(p, fragment_len) })
            }
        })
        .collect();
    let dest = unsafe { slice::from_raw_parts_mut(dest, dest_len) };

    match SERVICE.decode(handle, &views, fragment_len, original_size, dest) {
        Ok(()) => TESSERA_OK,
        Err(err) => {
            error!(handle, %err, "decode failed");
            TESSERA_ERR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    /// Drive the full FFI encode pipeline, returning the shard buffers.
    fn ffi_encode(handle: i64, data: &[u8]) -> (Vec<Vec<u8>>, usize) {
        let mut fragment_len = 0usize;
        let mut shard_count = 0usize;
        let rc = unsafe {
            tessera_encode_compute(
                handle,
                data.as_ptr(),
                data.len(),
                &mut fragment_len,
                &mut shard_count,
            )
        };
        assert_eq!(rc, TESSERA_OK);

        let mut buffers = vec![vec![0u8; fragment_len]; shard_count];
        let mut pointers: Vec<*mut u8> = buffers.iter_mut().map(|b| b.as_mut_ptr()).collect();
        let rc = unsafe {
            tessera_encode_copy_out(handle, pointers.as_mut_ptr(), pointers.len(), fragment_len)
        };
        assert_eq!(rc, TESSERA_OK);
        (buffers, fragment_len)
    }

    #[test]
    fn test_init_idempotent() {
        assert_eq!(tessera_init(), TESSERA_OK);
        assert_eq!(tessera_init(), TESSERA_OK);
    }

    #[test]
    fn test_version_static() {
        let v1 = tessera_version();
        let v2 = tessera_version();
        assert!(!v1.is_null());
        assert_eq!(v1, v2);
        let version = unsafe { CStr::from_ptr(v1) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_create_destroy() {
        let handle = tessera_instance_create(4, 2);
        assert!(handle >= 0);
        assert_eq!(tessera_instance_destroy(handle), TESSERA_OK);
        // Idempotent.
        assert_eq!(tessera_instance_destroy(handle), TESSERA_OK);
    }

    #[test]
    fn test_create_rejects_bad_counts() {
        assert_eq!(tessera_instance_create(0, 1), -1);
        assert_eq!(tessera_instance_create(-4, 2), -1);
        assert_eq!(tessera_instance_create(4, -2), -1);
        assert_eq!(tessera_instance_create(200, 100), -1);
    }

    #[test]
    fn test_encode_compute_unknown_handle() {
        let data = [0u8; 16];
        let mut fragment_len = 0usize;
        let mut shard_count = 0usize;
        let rc = unsafe {
            tessera_encode_compute(
                i64::MAX,
                data.as_ptr(),
                data.len(),
                &mut fragment_len,
                &mut shard_count,
            )
        };
        assert_eq!(rc, TESSERA_ERR);
    }

    #[test]
    fn test_encode_compute_null_data() {
        let handle = tessera_instance_create(2, 1);
        let mut fragment_len = 0usize;
        let mut shard_count = 0usize;
        let rc = unsafe {
            tessera_encode_compute(handle, ptr::null(), 8, &mut fragment_len, &mut shard_count)
        };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_encode_compute_empty_input() {
        let handle = tessera_instance_create(2, 1);
        let data = [0u8; 1];
        let mut fragment_len = 0usize;
        let mut shard_count = 0usize;
        let rc = unsafe {
            tessera_encode_compute(handle, data.as_ptr(), 0, &mut fragment_len, &mut shard_count)
        };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_copy_out_without_compute() {
        let handle = tessera_instance_create(2, 1);
        let mut buf = [0u8; 8];
        let mut pointers = [buf.as_mut_ptr()];
        let rc = unsafe { tessera_encode_copy_out(handle, pointers.as_mut_ptr(), 1, 8) };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_copy_out_null_array() {
        let handle = tessera_instance_create(2, 1);
        let rc = unsafe { tessera_encode_copy_out(handle, ptr::null_mut(), 3, 8) };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_decode_null_shards() {
        let handle = tessera_instance_create(2, 1);
        let mut out = [0u8; 8];
        let rc = unsafe {
            tessera_decode(handle, ptr::null(), 3, 4, 8, out.as_mut_ptr(), out.len())
        };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_full_round_trip() {
        let handle = tessera_instance_create(4, 2);
        assert!(handle >= 0);
        let data: Vec<u8> = (0u8..=255).cycle().take(1337).collect();
        let (buffers, fragment_len) = ffi_encode(handle, &data);
        assert_eq!(buffers.len(), 6);

        let pointers: Vec<*const u8> = buffers.iter().map(|b| b.as_ptr()).collect();
        let mut out = vec![0u8; data.len()];
        let rc = unsafe {
            tessera_decode(
                handle,
                pointers.as_ptr(),
                pointers.len(),
                fragment_len,
                data.len(),
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(rc, TESSERA_OK);
        assert_eq!(out, data);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_round_trip_with_missing_shards() {
        let handle = tessera_instance_create(4, 2);
        let data = b"ten bytes!".to_vec();
        let (buffers, fragment_len) = ffi_encode(handle, &data);
        // 10 bytes over 4 data shards: ceil -> 3, rounded up to 4.
        assert_eq!(fragment_len, 4);
        assert_eq!(buffers.len(), 6);

        // Mark shards 1 (data) and 4 (parity) missing.
        let pointers: Vec<*const u8> = buffers
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if i == 1 || i == 4 {
                    ptr::null()
                } else {
                    b.as_ptr()
                }
            })
            .collect();
        let mut out = vec![0u8; data.len()];
        let rc = unsafe {
            tessera_decode(
                handle,
                pointers.as_ptr(),
                pointers.len(),
                fragment_len,
                data.len(),
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(rc, TESSERA_OK);
        assert_eq!(out, data);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_decode_over_loss() {
        let handle = tessera_instance_create(4, 2);
        let data = vec![0x77u8; 500];
        let (buffers, fragment_len) = ffi_encode(handle, &data);

        // Three nulls, only two parity shards.
        let pointers: Vec<*const u8> = buffers
            .iter()
            .enumerate()
            .map(|(i, b)| if i < 3 { ptr::null() } else { b.as_ptr() })
            .collect();
        let mut out = vec![0u8; data.len()];
        let rc = unsafe {
            tessera_decode(
                handle,
                pointers.as_ptr(),
                pointers.len(),
                fragment_len,
                data.len(),
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(rc, TESSERA_ERR);
        tessera_instance_destroy(handle);
    }

    #[test]
    fn test_use_after_destroy() {
        let handle = tessera_instance_create(2, 1);
        tessera_instance_destroy(handle);
        let data = [0xAAu8; 32];
        let mut fragment_len = 0usize;
        let mut shard_count = 0usize;
        let rc = unsafe {
            tessera_encode_compute(
                handle,
                data.as_ptr(),
                data.len(),
                &mut fragment_len,
                &mut shard_count,
            )
        };
        assert_eq!(rc, TESSERA_ERR);
    }
}
