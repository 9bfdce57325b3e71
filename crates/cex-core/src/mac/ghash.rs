//! GHASH (§4.3, NIST SP 800-38D §6.4): a universal hash over GF(2^128),
//! keyed directly by the 16-byte hash subkey `H` rather than by a block
//! cipher. Input is zero-padded to a `BlockSize` multiple and followed by
//! one length block carrying the bit length of the message, mirroring the
//! `A || 0* || C || 0* || [len(A)]64 || [len(C)]64` construction GCM feeds
//! it — `Gcm` in `aead::gcm` drives this accumulator directly with its own
//! AAD/ciphertext framing rather than going through this standalone form.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::primitives::gf::ghash_mul;

use super::Mac;

pub struct Ghash {
    h: [u8; BLOCK_SIZE],
    y: [u8; BLOCK_SIZE],
    buffer: Vec<u8>,
    initialized: bool,
}

impl Ghash {
    pub fn new() -> Self {
        Ghash { h: [0u8; BLOCK_SIZE], y: [0u8; BLOCK_SIZE], buffer: Vec::new(), initialized: false }
    }

    /// Absorbs one already-16-byte block into the running hash.
    pub(crate) fn absorb_block(y: &mut [u8; BLOCK_SIZE], h: &[u8; BLOCK_SIZE], block: &[u8]) {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        let mut mixed = [0u8; BLOCK_SIZE];
        for j in 0..BLOCK_SIZE {
            mixed[j] = y[j] ^ block[j];
        }
        *y = ghash_mul(&mixed, h);
    }
}

impl Default for Ghash {
    fn default() -> Self {
        Self::new()
    }
}

impl Mac for Ghash {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()> {
        if key.key.len() != BLOCK_SIZE {
            return Err(CryptoError::invalid_key("Ghash::initialize", "H must be exactly 16 bytes"));
        }
        self.h.copy_from_slice(&key.key);
        self.y = [0u8; BLOCK_SIZE];
        self.buffer.clear();
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ghash::update"));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ghash::finalize"));
        }
        if out.len() != super::MAC_SIZE {
            return Err(CryptoError::invalid_size("Ghash::finalize", "output buffer must be MAC_SIZE bytes"));
        }
        let bit_len = (self.buffer.len() as u64).wrapping_mul(8);
        for chunk in self.buffer.chunks(BLOCK_SIZE) {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            Self::absorb_block(&mut self.y, &self.h, &block);
        }
        let mut len_block = [0u8; BLOCK_SIZE];
        len_block[8..].copy_from_slice(&bit_len.to_be_bytes());
        Self::absorb_block(&mut self.y, &self.h, &len_block);

        out.copy_from_slice(&self.y);
        self.y = [0u8; BLOCK_SIZE];
        self.buffer.clear();
        Ok(())
    }

    fn reset(&mut self) {
        self.y = [0u8; BLOCK_SIZE];
        self.buffer.clear();
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghash_of_empty_message_is_not_all_zero_with_nonzero_h() {
        let key = SymmetricKey::new(vec![0x11u8; 16]);
        let mut mac = Ghash::new();
        mac.initialize(&key).unwrap();
        let mut tag = [0u8; 16];
        mac.finalize(&mut tag).unwrap();
        assert_ne!(tag, [0u8; 16]);
    }

    #[test]
    fn ghash_is_deterministic() {
        let key = SymmetricKey::new(vec![0x11u8; 16]);
        let mut a = Ghash::new();
        a.initialize(&key).unwrap();
        a.update(b"some associated data and ciphertext").unwrap();
        let mut tag_a = [0u8; 16];
        a.finalize(&mut tag_a).unwrap();

        let mut b = Ghash::new();
        b.initialize(&key).unwrap();
        b.update(b"some associated data and ciphertext").unwrap();
        let mut tag_b = [0u8; 16];
        b.finalize(&mut tag_b).unwrap();

        assert_eq!(tag_a, tag_b);
    }

    #[test]
    fn rejects_wrong_key_length() {
        let key = SymmetricKey::new(vec![0x11u8; 15]);
        let mut mac = Ghash::new();
        assert!(mac.initialize(&key).is_err());
    }
}
