//! The Block-Cipher Counter generator (§4.5): a `Drbg` driven by a keyed
//! `BlockCipher` in CTR mode. When a generation crosses the configured
//! reseed threshold, fresh entropy is pulled from an optional `IRandom`
//! provider and mixed into the running key via HKDF, salted with the
//! counter value at the moment of reseed.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mode::ctr::{CounterEndian, Ctr};
use crate::mode::{BlockCipherOwnership, CipherMode};
use crate::primitives::hkdf::{hkdf_expand_with_salt, HashId};
use crate::rng::IRandom;

/// Default reseed window (§4.5: "default 2^20 bytes").
pub const DEFAULT_RESEED_THRESHOLD: usize = 1 << 20;

/// The `Drbg` capability (§3 Data Model, §9 trait-ification note).
pub trait Drbg {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()>;
    fn generate(&mut self, out: &mut [u8]) -> Result<()>;
    fn is_initialized(&self) -> bool;
}

pub struct Bcg<'a> {
    ctr: Ctr<'a>,
    key: Vec<u8>,
    hash: HashId,
    provider: Option<Box<dyn IRandom + Send>>,
    reseed_threshold: usize,
    bytes_since_reseed: usize,
    initialized: bool,
}

impl<'a> Bcg<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>, provider: Option<Box<dyn IRandom + Send>>) -> Self {
        Bcg {
            ctr: Ctr::new(cipher, CounterEndian::Big),
            key: Vec::new(),
            hash: HashId::Sha256,
            provider,
            reseed_threshold: DEFAULT_RESEED_THRESHOLD,
            bytes_since_reseed: 0,
            initialized: false,
        }
    }

    pub fn with_reseed_threshold(mut self, threshold: usize) -> Self {
        self.reseed_threshold = threshold;
        self
    }

    pub fn with_hash(mut self, hash: HashId) -> Self {
        self.hash = hash;
        self
    }

    fn reseed(&mut self) -> Result<()> {
        let counter_salt = self.ctr.counter_snapshot();
        let provider = self
            .provider
            .as_mut()
            .ok_or_else(|| CryptoError::illegal_operation("Bcg::reseed", "reseed threshold reached but no entropy provider is configured"))?;
        let entropy = provider.generate(self.key.len())?;

        let mut ikm = Vec::with_capacity(self.key.len() + entropy.len());
        ikm.extend_from_slice(&self.key);
        ikm.extend_from_slice(&entropy);

        let mut new_key = vec![0u8; self.key.len()];
        hkdf_expand_with_salt(self.hash, Some(&counter_salt), &ikm, b"cex-rs/bcg/reseed", &mut new_key)?;

        let seeded = SymmetricKey::with_nonce(new_key.clone(), counter_salt.to_vec());
        self.ctr.initialize(true, &seeded)?;
        self.key = new_key;
        self.bytes_since_reseed = 0;
        Ok(())
    }

    fn fill_keystream(&mut self, out: &mut [u8]) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }
        let padded_len = ((out.len() + BLOCK_SIZE - 1) / BLOCK_SIZE) * BLOCK_SIZE;
        let zeros = vec![0u8; padded_len];
        let mut keystream = vec![0u8; padded_len];
        self.ctr.transform(&zeros, &mut keystream)?;
        out.copy_from_slice(&keystream[..out.len()]);
        Ok(())
    }
}

impl<'a> Drbg for Bcg<'a> {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()> {
        let nonce = if key.nonce.is_empty() { vec![0u8; BLOCK_SIZE] } else { key.nonce.clone() };
        let seeded = SymmetricKey::with_nonce(key.key.clone(), nonce);
        self.ctr.initialize(true, &seeded)?;
        self.key = key.key.clone();
        self.bytes_since_reseed = 0;
        self.initialized = true;
        Ok(())
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Bcg::generate"));
        }
        let mut offset = 0;
        while offset < out.len() {
            let remaining_window = self.reseed_threshold.saturating_sub(self.bytes_since_reseed);
            if remaining_window == 0 {
                self.reseed()?;
                continue;
            }
            let chunk_len = remaining_window.min(out.len() - offset);
            self.fill_keystream(&mut out[offset..offset + chunk_len])?;
            self.bytes_since_reseed += chunk_len;
            offset += chunk_len;
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::rijndael::Rijndael;

    #[test]
    fn bcg_aes256_no_reseed_kat() {
        let key_bytes = hex_literal::hex!("0053A6F94C9FF24598EB3E91E4378ADD3083D6297CCF2275C81B6EC11467BA0D");
        let nonce = hex_literal::hex!("00000000000000000000000000000080");
        let mut cipher = Rijndael::new();
        let mut bcg = Bcg::new(BlockCipherOwnership::Borrowed(&mut cipher), None);
        bcg.initialize(&SymmetricKey::with_nonce(key_bytes.to_vec(), nonce.to_vec())).unwrap();
        let mut out = [0u8; 64];
        bcg.generate(&mut out).unwrap();
        let expected = hex_literal::hex!(
            "4F48B3FEC548525A5E64182A29A1D035EE7A491436D49D8639E9B8AE77176CCBAFB3CA08D062D6BD5505851531BBA5DCC2543FE3CCF62B9422E369440D19B6E0"
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn reseeds_after_crossing_threshold() {
        struct FixedEntropy;
        impl IRandom for FixedEntropy {
            fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
                buf.iter_mut().for_each(|b| *b = 0x42);
                Ok(())
            }
        }

        let key = SymmetricKey::with_nonce(vec![0x11u8; 32], vec![0u8; 16]);
        let mut cipher = Rijndael::new();
        let mut bcg = Bcg::new(BlockCipherOwnership::Borrowed(&mut cipher), Some(Box::new(FixedEntropy)))
            .with_reseed_threshold(32);
        bcg.initialize(&key).unwrap();

        let mut out = vec![0u8; 96];
        bcg.generate(&mut out).unwrap();
        assert!(!out.iter().all(|&b| b == 0));
    }

    #[test]
    fn errors_without_a_provider_once_threshold_crossed() {
        let key = SymmetricKey::with_nonce(vec![0x11u8; 32], vec![0u8; 16]);
        let mut cipher = Rijndael::new();
        let mut bcg = Bcg::new(BlockCipherOwnership::Borrowed(&mut cipher), None).with_reseed_threshold(16);
        bcg.initialize(&key).unwrap();
        let mut out = vec![0u8; 64];
        assert!(bcg.generate(&mut out).is_err());
    }
}
