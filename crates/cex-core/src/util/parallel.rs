//! Explicit, per-instance parallel dispatch configuration (§4.2/§5, and the
//! "avoid hidden global thread pools" design note in §9). Each `CipherMode`
//! owns one of these rather than reaching for a process-wide pool.

/// SIMD batch width assumed for the inner loop of a worker segment. This
/// crate does not hand-roll SIMD; it is the unit the parallel partitioner
/// aligns segment boundaries to so a future SIMD-batched inner loop (or the
/// `rayon` data-parallel fallback used here) can process whole batches.
pub const SIMD_LANES: usize = 4;

/// Configuration for data-parallel bulk symmetric transforms.
#[derive(Debug, Clone, Copy)]
pub struct ParallelOptions {
    /// Whether the owning mode instance is permitted to fan out across
    /// `max_degree` workers for buffers at least `block_size` bytes.
    pub is_parallel: bool,
    /// Maximum worker count for one `transform` call.
    pub max_degree: usize,
    /// Threshold (bytes) above which a `transform` call is partitioned.
    /// Must be a multiple of `minimum_size`.
    pub block_size: usize,
}

impl ParallelOptions {
    /// `block_size` = `threads * BlockSize * SIMD_LANES`, matching the
    /// `ParallelMinimumSize` formula in §4.2.
    pub fn new(is_parallel: bool, max_degree: usize, cipher_block_size: usize) -> Self {
        let minimum = Self::minimum_size(max_degree, cipher_block_size);
        ParallelOptions { is_parallel, max_degree, block_size: minimum }
    }

    pub fn minimum_size(max_degree: usize, cipher_block_size: usize) -> usize {
        max_degree.max(1) * cipher_block_size * SIMD_LANES
    }

    /// Default policy: parallel enabled, degree from available parallelism,
    /// threshold set to `ParallelMinimumSize` (one L1-sized segment per
    /// worker is a larger, implementation-chosen multiple in production;
    /// the minimum is what correctness depends on).
    pub fn default_for(cipher_block_size: usize) -> Self {
        let degree = available_parallelism();
        Self::new(true, degree, cipher_block_size)
    }

    pub fn sequential(cipher_block_size: usize) -> Self {
        ParallelOptions { is_parallel: false, max_degree: 1, block_size: cipher_block_size }
    }

    /// Whether a buffer of `len` bytes should be partitioned.
    pub fn should_parallelize(&self, len: usize) -> bool {
        self.is_parallel && len >= self.block_size && self.max_degree > 1
    }
}

#[cfg(feature = "parallel")]
fn available_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(not(feature = "parallel"))]
fn available_parallelism() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_size_scales_with_degree_and_block() {
        assert_eq!(ParallelOptions::minimum_size(4, 16), 4 * 16 * SIMD_LANES);
    }

    #[test]
    fn sequential_never_parallelizes() {
        let opts = ParallelOptions::sequential(16);
        assert!(!opts.should_parallelize(1 << 20));
    }
}
