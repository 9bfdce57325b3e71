//! CMAC (§4.3, NIST SP 800-38B), built directly on a `BlockCipher`: the
//! first `n-1` blocks run an ordinary CBC-MAC chain, and the last block is
//! XORed with a subkey derived from `double()` before the final encrypt —
//! `K1` when the message's length is a non-zero multiple of `BlockSize`,
//! `K2` with `0x80`-then-zero padding otherwise.

use crate::cipher::{BlockCipher, SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mode::BlockCipherOwnership;
use crate::primitives::gf::double_cmac;

use super::Mac;

/// Derives `(K1, K2)` from an already-keyed cipher (§4.3). Shared with
/// `aead::eax`, which drives CMAC over three domains on one underlying
/// cipher instance rather than three separate `Cmac` objects.
pub(crate) fn derive_subkeys(cipher: &dyn BlockCipher) -> Result<([u8; BLOCK_SIZE], [u8; BLOCK_SIZE])> {
    let mut l = [0u8; BLOCK_SIZE];
    cipher.encrypt_block(&[0u8; BLOCK_SIZE], &mut l)?;
    let k1 = double_cmac(&l);
    let k2 = double_cmac(&k1);
    Ok((k1, k2))
}

/// One-shot CMAC over `data` given precomputed subkeys, without the
/// buffering a streaming `Mac` instance needs.
pub(crate) fn cmac_oneshot(cipher: &dyn BlockCipher, k1: &[u8; BLOCK_SIZE], k2: &[u8; BLOCK_SIZE], data: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    let block_count = if data.is_empty() { 1 } else { (data.len() + BLOCK_SIZE - 1) / BLOCK_SIZE };
    let last_is_complete = !data.is_empty() && data.len() % BLOCK_SIZE == 0;

    let mut mac = [0u8; BLOCK_SIZE];
    for i in 0..block_count - 1 {
        let block = &data[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE];
        let mut mixed = [0u8; BLOCK_SIZE];
        for j in 0..BLOCK_SIZE {
            mixed[j] = mac[j] ^ block[j];
        }
        cipher.encrypt_block(&mixed, &mut mac)?;
    }

    let mut last = [0u8; BLOCK_SIZE];
    if last_is_complete {
        let start = (block_count - 1) * BLOCK_SIZE;
        last.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        for j in 0..BLOCK_SIZE {
            last[j] ^= k1[j];
        }
    } else {
        let start = (block_count - 1) * BLOCK_SIZE;
        let rem = &data[start..];
        last[..rem.len()].copy_from_slice(rem);
        last[rem.len()] = 0x80;
        for j in 0..BLOCK_SIZE {
            last[j] ^= k2[j];
        }
    }

    let mut mixed = [0u8; BLOCK_SIZE];
    for j in 0..BLOCK_SIZE {
        mixed[j] = mac[j] ^ last[j];
    }
    cipher.encrypt_block(&mixed, &mut mac)?;
    Ok(mac)
}

pub struct Cmac<'a> {
    cipher: BlockCipherOwnership<'a>,
    k1: [u8; BLOCK_SIZE],
    k2: [u8; BLOCK_SIZE],
    buffer: Vec<u8>,
    initialized: bool,
}

impl<'a> Cmac<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Cmac { cipher, k1: [0u8; BLOCK_SIZE], k2: [0u8; BLOCK_SIZE], buffer: Vec::new(), initialized: false }
    }
}

impl<'a> Mac for Cmac<'a> {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()> {
        self.cipher.cipher_mut().initialize(true, key)?;
        let (k1, k2) = derive_subkeys(self.cipher.cipher())?;
        self.k1 = k1;
        self.k2 = k2;
        self.buffer.clear();
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Cmac::update"));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Cmac::finalize"));
        }
        if out.len() != super::MAC_SIZE {
            return Err(CryptoError::invalid_size("Cmac::finalize", "output buffer must be MAC_SIZE bytes"));
        }
        let mac = cmac_oneshot(self.cipher.cipher(), &self.k1, &self.k2, &self.buffer)?;
        out.copy_from_slice(&mac);
        self.buffer.clear();
        Ok(())
    }

    fn reset(&mut self) {
        self.buffer.clear();
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
    fn cmac_is_deterministic_and_length_sensitive() {
        let key = SymmetricKey::new(vec![0x2bu8; 16]);

        let mut cipher_a = Rijndael::new();
        let mut mac_a = Cmac::new(BlockCipherOwnership::Borrowed(&mut cipher_a));
        mac_a.initialize(&key).unwrap();
        mac_a.update(b"hello world").unwrap();
        let mut tag_a = [0u8; 16];
        mac_a.finalize(&mut tag_a).unwrap();

        let mut cipher_b = Rijndael::new();
        let mut mac_b = Cmac::new(BlockCipherOwnership::Borrowed(&mut cipher_b));
        mac_b.initialize(&key).unwrap();
        mac_b.update(b"hello world").unwrap();
        let mut tag_b = [0u8; 16];
        mac_b.finalize(&mut tag_b).unwrap();
        assert_eq!(tag_a, tag_b);

        mac_b.update(b"!").unwrap();
        let mut tag_c = [0u8; 16];
        mac_b.finalize(&mut tag_c).unwrap();
        assert_ne!(tag_a, tag_c);
    }

    #[test]
    fn cmac_handles_empty_and_exact_block_messages() {
        let key = SymmetricKey::new(vec![0x2bu8; 16]);
        let mut cipher = Rijndael::new();
        let mut mac = Cmac::new(BlockCipherOwnership::Borrowed(&mut cipher));
        mac.initialize(&key).unwrap();
        let mut tag = [0u8; 16];
        mac.finalize(&mut tag).unwrap();

        mac.update(&[0u8; 16]).unwrap();
        let mut tag2 = [0u8; 16];
        mac.finalize(&mut tag2).unwrap();
        assert_ne!(tag, tag2);
    }
}
