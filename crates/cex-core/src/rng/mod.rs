//! Host entropy (§6.4): the `IRandom` capability every signer and the BCG's
//! optional reseed provider consume. `OsRandom` is the default
//! non-deterministic source; `NistRng` is the deterministic AES-256-CTR DRBG
//! used to reproduce KAT vectors bit-for-bit.

pub mod nist;

pub use nist::NistRng;

use crate::error::{CryptoError, Result};

/// A pluggable entropy source (§6.4). `generate` is a convenience built on
/// `fill` and may block on a hardware RNG the same way `fill` can.
pub trait IRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;

    fn generate(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}

/// The default, non-deterministic `IRandom`, backed by the operating
/// system's CSPRNG via `rand`/`getrandom`.
#[derive(Default)]
pub struct OsRandom;

impl IRandom for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        use rand_core::RngCore;
        rand::rngs::OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::internal("OsRandom::fill", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_random_fills_requested_length() {
        let mut rng = OsRandom;
        let mut buf = [0u8; 32];
        rng.fill(&mut buf).unwrap();
        // Not a statistical test, just confirms the plumbing runs.
        let out = rng.generate(16).unwrap();
        assert_eq!(out.len(), 16);
    }
}
