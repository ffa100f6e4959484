//! Reed-Solomon coder.
//!
//! Wraps `reed-solomon-erasure` with the shard geometry used across the
//! service: `k` data shards followed by `m` parity shards, all the same
//! length, the last data shard zero-padded.

use reed_solomon_erasure::galois_8::ReedSolomon;
use tracing::debug;

use crate::MAX_TOTAL_SHARDS;
use crate::error::CodingError;

/// An ordered set of equal-length shards: data shards at `0..k`, parity
/// shards at `k..k + m`.
pub type ShardSet = Vec<Vec<u8>>;

/// Reed-Solomon coder for a fixed `(data, parity)` configuration.
///
/// With `parity_shards == 0` the coder degrades to pure split/join: no
/// backend is constructed, encoding is a no-op and reconstruction requires
/// every data shard to be present.
pub struct Coder {
    data_shards: usize,
    parity_shards: usize,
    rs: Option<ReedSolomon>,
}

impl Coder {
    /// Create a coder for `data_shards` data and `parity_shards` parity shards.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::InvalidShardCounts`] unless `data_shards > 0`
    /// and `data_shards + parity_shards <= 256` (the GF(2^8) field limit).
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self, CodingError> {
        if data_shards == 0 || data_shards + parity_shards > MAX_TOTAL_SHARDS {
            return Err(CodingError::InvalidShardCounts {
                data: data_shards,
                parity: parity_shards,
            });
        }

        let rs = if parity_shards == 0 {
            None
        } else {
            Some(ReedSolomon::new(data_shards, parity_shards)?)
        };

        Ok(Self {
            data_shards,
            parity_shards,
            rs,
        })
    }

    /// Number of data shards.
    pub fn data_shards(&self) -> usize {
        self.data_shards
    }

    /// Number of parity shards.
    pub fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    /// Total shard count (data + parity).
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Split `data` into the full shard set.
    ///
    /// The fragment length is `ceil(len / data_shards)` rounded up to an
    /// even byte count. The last data shard is zero-padded; parity shards
    /// are allocated zero-filled and not yet computed. The caller must
    /// remember the original length to undo the padding at join time.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::EmptyInput`] if `data` is empty.
    pub fn split(&self, data: &[u8]) -> Result<ShardSet, CodingError> {
        if data.is_empty() {
            return Err(CodingError::EmptyInput);
        }

        let fragment_len = round_up_even(data.len().div_ceil(self.data_shards));

        let mut shards = Vec::with_capacity(self.total_shards());
        for chunk in data.chunks(fragment_len) {
            let mut shard = Vec::with_capacity(fragment_len);
            shard.extend_from_slice(chunk);
            shard.resize(fragment_len, 0);
            shards.push(shard);
        }
        shards.resize_with(self.total_shards(), || vec![0u8; fragment_len]);

        debug_assert_eq!(shards.len(), self.total_shards());
        debug!(
            data_len = data.len(),
            fragment_len,
            shards = shards.len(),
            "split buffer into shards"
        );
        Ok(shards)
    }

    /// Compute the parity shards in place.
    ///
    /// `shards` must be a full set as produced by [`Coder::split`].
    pub fn encode(&self, shards: &mut ShardSet) -> Result<(), CodingError> {
        match &self.rs {
            Some(rs) => rs.encode(shards).map_err(CodingError::from),
            None => Ok(()),
        }
    }

    /// Check that the parity shards are consistent with the data shards.
    pub fn verify(&self, shards: &ShardSet) -> Result<bool, CodingError> {
        match &self.rs {
            Some(rs) => rs.verify(shards).map_err(CodingError::from),
            None => Ok(true),
        }
    }

    /// Rebuild only the missing data shards.
    ///
    /// Absent entries are `None`; present entries must all share one length.
    /// Missing parity shards are left as `None`.
    pub fn reconstruct_data(&self, shards: &mut [Option<Vec<u8>>]) -> Result<(), CodingError> {
        match &self.rs {
            Some(rs) => rs.reconstruct_data(shards).map_err(CodingError::from),
            None => self.require_all_data(shards),
        }
    }

    /// Rebuild every missing shard, parity included.
    pub fn reconstruct(&self, shards: &mut [Option<Vec<u8>>]) -> Result<(), CodingError> {
        match &self.rs {
            Some(rs) => rs.reconstruct(shards).map_err(CodingError::from),
            None => self.require_all_data(shards),
        }
    }

    /// Join the data shards, in order, into `dest`.
    ///
    /// Writes exactly `size` bytes, truncating the split-time padding.
    ///
    /// # Errors
    ///
    /// [`CodingError::MissingDataShard`] if a data shard is `None`;
    /// [`CodingError::JoinSizeMismatch`] if `dest` is not `size` bytes long
    /// or the data shards hold fewer than `size` bytes.
    pub fn join(
        &self,
        dest: &mut [u8],
        shards: &[Option<Vec<u8>>],
        size: usize,
    ) -> Result<(), CodingError> {
        let fragment_len = shards
            .iter()
            .flatten()
            .map(Vec::len)
            .next()
            .unwrap_or(0);
        let available = fragment_len * self.data_shards;
        if dest.len() != size || available < size {
            return Err(CodingError::JoinSizeMismatch {
                dest: dest.len(),
                requested: size,
                available,
            });
        }

        let mut written = 0;
        for (index, shard) in shards.iter().take(self.data_shards).enumerate() {
            let shard = shard
                .as_ref()
                .ok_or(CodingError::MissingDataShard(index))?;
            if written >= size {
                break;
            }
            let take = shard.len().min(size - written);
            dest[written..written + take].copy_from_slice(&shard[..take]);
            written += take;
        }

        if written != size {
            return Err(CodingError::JoinSizeMismatch {
                dest: dest.len(),
                requested: size,
                available: written,
            });
        }
        Ok(())
    }

    /// Zero-parity path: reconstruction is possible only when nothing is lost.
    fn require_all_data(&self, shards: &[Option<Vec<u8>>]) -> Result<(), CodingError> {
        for (index, shard) in shards.iter().take(self.data_shards).enumerate() {
            if shard.is_none() {
                return Err(CodingError::MissingDataShard(index));
            }
        }
        Ok(())
    }
}

/// Round up to the nearest even number.
fn round_up_even(n: usize) -> usize {
    if n % 2 == 0 { n } else { n + 1 }
}
