//! GMAC (§4.3, NIST SP 800-38D): GCM's authentication path used on its
//! own, with no ciphertext — `Tag = E_K(J0) XOR GHASH_H(AAD)`. The 96-bit
//! nonce fast path (`J0 = IV || 0^31 || 1`) and the general GHASH-derived
//! `J0` for other nonce lengths both apply, matching `aead::gcm`'s own J0
//! derivation so the two stay interchangeable for a 96-bit nonce.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mode::BlockCipherOwnership;

use super::ghash::Ghash;
use super::Mac;

pub struct Gmac<'a> {
    cipher: BlockCipherOwnership<'a>,
    h: [u8; BLOCK_SIZE],
    j0: [u8; BLOCK_SIZE],
    aad: Vec<u8>,
    initialized: bool,
}

impl<'a> Gmac<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Gmac { cipher, h: [0u8; BLOCK_SIZE], j0: [0u8; BLOCK_SIZE], aad: Vec::new(), initialized: false }
    }

    pub(crate) fn derive_j0(h: &[u8; BLOCK_SIZE], nonce: &[u8]) -> [u8; BLOCK_SIZE] {
        if nonce.len() == 12 {
            let mut j0 = [0u8; BLOCK_SIZE];
            j0[..12].copy_from_slice(nonce);
            j0[15] = 1;
            j0
        } else {
            let mut y = [0u8; BLOCK_SIZE];
            for chunk in nonce.chunks(BLOCK_SIZE) {
                let mut block = [0u8; BLOCK_SIZE];
                block[..chunk.len()].copy_from_slice(chunk);
                Ghash::absorb_block(&mut y, h, &block);
            }
            let mut len_block = [0u8; BLOCK_SIZE];
            let bit_len = (nonce.len() as u64).wrapping_mul(8);
            len_block[8..].copy_from_slice(&bit_len.to_be_bytes());
            Ghash::absorb_block(&mut y, h, &len_block);
            y
        }
    }
}

impl<'a> Mac for Gmac<'a> {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()> {
        if key.nonce.is_empty() {
            return Err(CryptoError::invalid_nonce("Gmac::initialize", "GMAC requires a nonce"));
        }
        self.cipher.cipher_mut().initialize(true, key)?;
        self.cipher.cipher().encrypt_block(&[0u8; BLOCK_SIZE], &mut self.h)?;
        self.j0 = Self::derive_j0(&self.h, &key.nonce);
        self.aad.clear();
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Gmac::update"));
        }
        self.aad.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Gmac::finalize"));
        }
        if out.len() != super::MAC_SIZE {
            return Err(CryptoError::invalid_size("Gmac::finalize", "output buffer must be MAC_SIZE bytes"));
        }
        let mut y = [0u8; BLOCK_SIZE];
        for chunk in self.aad.chunks(BLOCK_SIZE) {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            Ghash::absorb_block(&mut y, &self.h, &block);
        }
        let mut len_block = [0u8; BLOCK_SIZE];
        let aad_bit_len = (self.aad.len() as u64).wrapping_mul(8);
        len_block[..8].copy_from_slice(&aad_bit_len.to_be_bytes());
        Ghash::absorb_block(&mut y, &self.h, &len_block);

        let mut e_j0 = [0u8; BLOCK_SIZE];
        self.cipher.cipher().encrypt_block(&self.j0, &mut e_j0)?;
        for i in 0..BLOCK_SIZE {
            out[i] = e_j0[i] ^ y[i];
        }
        self.aad.clear();
        Ok(())
    }

    fn reset(&mut self) {
        self.aad.clear();
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
    fn gmac_is_deterministic_and_aad_sensitive() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0u8; 12]);

        let mut cipher_a = Rijndael::new();
        let mut mac_a = Gmac::new(BlockCipherOwnership::Borrowed(&mut cipher_a));
        mac_a.initialize(&key).unwrap();
        mac_a.update(b"header").unwrap();
        let mut tag_a = [0u8; 16];
        mac_a.finalize(&mut tag_a).unwrap();

        let mut cipher_b = Rijndael::new();
        let mut mac_b = Gmac::new(BlockCipherOwnership::Borrowed(&mut cipher_b));
        mac_b.initialize(&key).unwrap();
        mac_b.update(b"header").unwrap();
        let mut tag_b = [0u8; 16];
        mac_b.finalize(&mut tag_b).unwrap();
        assert_eq!(tag_a, tag_b);

        mac_b.update(b"different").unwrap();
        let mut tag_c = [0u8; 16];
        mac_b.finalize(&mut tag_c).unwrap();
        assert_ne!(tag_a, tag_c);
    }

    #[test]
    fn rejects_missing_nonce() {
        let key = SymmetricKey::new(vec![0x2bu8; 16]);
        let mut cipher = Rijndael::new();
        let mut mac = Gmac::new(BlockCipherOwnership::Borrowed(&mut cipher));
        assert!(mac.initialize(&key).is_err());
    }
}
