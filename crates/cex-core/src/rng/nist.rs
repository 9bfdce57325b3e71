//! `NistRng` (§6.4, §7.1): the deterministic AES-256-CTR DRBG NIST KAT
//! harnesses seed test vectors with. Seeded by a fixed 48-byte seed (first
//! 32 bytes the AES-256 key, last 16 the initial counter block), built
//! directly on this crate's own `cipher::rijndael::Rijndael` and
//! `mode::ctr::Ctr` rather than an external RNG crate.

use crate::cipher::rijndael::Rijndael;
use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mode::ctr::{CounterEndian, Ctr};
use crate::mode::{BlockCipherOwnership, CipherMode};

use super::IRandom;

pub struct NistRng {
    ctr: Ctr<'static>,
}

impl NistRng {
    pub fn new(seed: &[u8; 48]) -> Result<Self> {
        let key = SymmetricKey::with_nonce(seed[..32].to_vec(), seed[32..].to_vec());
        let cipher: Box<dyn crate::cipher::BlockCipher + Send + Sync> = Box::new(Rijndael::new());
        let mut ctr = Ctr::new(BlockCipherOwnership::Owned(cipher), CounterEndian::Big);
        ctr.initialize(true, &key)?;
        Ok(NistRng { ctr })
    }
}

impl IRandom for NistRng {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let padded_len = ((buf.len() + BLOCK_SIZE - 1) / BLOCK_SIZE) * BLOCK_SIZE;
        let zeros = vec![0u8; padded_len];
        let mut keystream = vec![0u8; padded_len];
        self.ctr
            .transform(&zeros, &mut keystream)
            .map_err(|_| CryptoError::internal("NistRng::fill", "counter-mode keystream generation failed"))?;
        buf.copy_from_slice(&keystream[..buf.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic_for_a_fixed_seed() {
        let seed = [0x2bu8; 48];
        let mut a = NistRng::new(&seed).unwrap();
        let mut b = NistRng::new(&seed).unwrap();
        assert_eq!(a.generate(100).unwrap(), b.generate(100).unwrap());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = NistRng::new(&[0x00u8; 48]).unwrap();
        let mut b = NistRng::new(&[0x01u8; 48]).unwrap();
        assert_ne!(a.generate(32).unwrap(), b.generate(32).unwrap());
    }
}
