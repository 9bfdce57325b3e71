//! GCM (§4.4, NIST SP 800-38D). CTR-encrypts with initial counter `J0`
//! derived from the nonce, absorbing AAD then ciphertext into GHASH; the
//! tag is `GHASH(AAD, C) XOR E_k(J0)`. Decryption computes the expected
//! tag before the caller may trust the plaintext `transform` already wrote.

use subtle::ConstantTimeEq;

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mac::ghash::Ghash;
use crate::mac::gmac::Gmac;
use crate::mode::BlockCipherOwnership;
use crate::util::pack::increment_be;

use super::AeadCipher;

pub struct Gcm<'a> {
    cipher: BlockCipherOwnership<'a>,
    h: [u8; BLOCK_SIZE],
    j0: [u8; BLOCK_SIZE],
    aad: Vec<u8>,
    encrypt: bool,
    aad_locked: bool,
    transformed: bool,
    y: [u8; BLOCK_SIZE],
    initialized: bool,
}

impl<'a> Gcm<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Gcm {
            cipher,
            h: [0u8; BLOCK_SIZE],
            j0: [0u8; BLOCK_SIZE],
            aad: Vec::new(),
            encrypt: true,
            aad_locked: false,
            transformed: false,
            y: [0u8; BLOCK_SIZE],
            initialized: false,
        }
    }

    fn absorb_padded(&mut self, data: &[u8]) {
        for chunk in data.chunks(BLOCK_SIZE) {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            Ghash::absorb_block(&mut self.y, &self.h, &block);
        }
    }

    fn absorb_length_block(&mut self, aad_len: usize, ct_len: usize) {
        let mut block = [0u8; BLOCK_SIZE];
        block[..8].copy_from_slice(&((aad_len as u64) * 8).to_be_bytes());
        block[8..].copy_from_slice(&((ct_len as u64) * 8).to_be_bytes());
        Ghash::absorb_block(&mut self.y, &self.h, &block);
    }

    fn expected_tag(&self) -> Result<[u8; BLOCK_SIZE]> {
        let mut e_j0 = [0u8; BLOCK_SIZE];
        self.cipher.cipher().encrypt_block(&self.j0, &mut e_j0)?;
        let mut tag = [0u8; BLOCK_SIZE];
        for i in 0..BLOCK_SIZE {
            tag[i] = e_j0[i] ^ self.y[i];
        }
        Ok(tag)
    }
}

impl<'a> AeadCipher for Gcm<'a> {
    fn enumeral(&self) -> super::AeadModes {
        super::AeadModes::GCM
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        if key.nonce.is_empty() {
            return Err(CryptoError::invalid_nonce("Gcm::initialize", "GCM requires a nonce"));
        }
        self.cipher.cipher_mut().initialize(true, key)?;
        self.cipher.cipher().encrypt_block(&[0u8; BLOCK_SIZE], &mut self.h)?;
        self.j0 = Gmac::derive_j0(&self.h, &key.nonce);
        self.aad.clear();
        self.y = [0u8; BLOCK_SIZE];
        self.encrypt = encrypt;
        self.aad_locked = false;
        self.transformed = false;
        self.initialized = true;
        Ok(())
    }

    fn set_associated_data(&mut self, aad: &[u8]) -> Result<()> {
        if self.aad_locked {
            return Err(CryptoError::illegal_operation("Gcm::set_associated_data", "AAD must be set before transform"));
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Gcm::transform"));
        }
        if self.transformed {
            return Err(CryptoError::illegal_operation("Gcm::transform", "transform may be called only once per session"));
        }
        if input.len() != output.len() {
            return Err(CryptoError::invalid_size("Gcm::transform", "input and output must be the same length"));
        }
        self.aad_locked = true;
        let aad = core::mem::take(&mut self.aad);
        self.absorb_padded(&aad);

        let mut counter = self.j0;
        for (in_chunk, out_chunk) in input.chunks(BLOCK_SIZE).zip(output.chunks_mut(BLOCK_SIZE)) {
            increment_be(&mut counter);
            let mut keystream = [0u8; BLOCK_SIZE];
            self.cipher.cipher().encrypt_block(&counter, &mut keystream)?;
            for j in 0..in_chunk.len() {
                out_chunk[j] = in_chunk[j] ^ keystream[j];
            }
            let ciphertext_chunk: &[u8] = if self.encrypt { out_chunk } else { in_chunk };
            let mut block = [0u8; BLOCK_SIZE];
            block[..ciphertext_chunk.len()].copy_from_slice(ciphertext_chunk);
            Ghash::absorb_block(&mut self.y, &self.h, &block);
        }
        self.absorb_length_block(aad.len(), input.len());
        self.transformed = true;
        Ok(())
    }

    fn finalize(&mut self, tag_out: &mut [u8]) -> Result<()> {
        if !self.encrypt {
            return Err(CryptoError::illegal_operation("Gcm::finalize", "finalize is for the encrypt direction; use verify"));
        }
        if tag_out.len() < super::MIN_TAG_SIZE || tag_out.len() > super::MAX_TAG_SIZE {
            return Err(CryptoError::invalid_size("Gcm::finalize", "tag length out of range"));
        }
        let tag = self.expected_tag()?;
        tag_out.copy_from_slice(&tag[..tag_out.len()]);
        Ok(())
    }

    fn verify(&mut self, tag: &[u8], output: &mut [u8]) -> Result<()> {
        if self.encrypt {
            return Err(CryptoError::illegal_operation("Gcm::verify", "verify is for the decrypt direction; use finalize"));
        }
        let expected = self.expected_tag()?;
        let ok: bool = expected[..tag.len()].ct_eq(tag).into();
        if !ok {
            output.iter_mut().for_each(|b| *b = 0);
            return Err(CryptoError::authentication_failure("Gcm::verify"));
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

    fn seal(key: &SymmetricKey, aad: &[u8], pt: &[u8]) -> (Vec<u8>, [u8; 16]) {
        let mut cipher = Rijndael::new();
        let mut gcm = Gcm::new(BlockCipherOwnership::Borrowed(&mut cipher));
        gcm.initialize(true, key).unwrap();
        gcm.set_associated_data(aad).unwrap();
        let mut ct = vec![0u8; pt.len()];
        gcm.transform(pt, &mut ct).unwrap();
        let mut tag = [0u8; 16];
        gcm.finalize(&mut tag).unwrap();
        (ct, tag)
    }

    #[test]
    fn gcm_roundtrips_and_authenticates() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 32], vec![0u8; 12]);
        let pt = vec![0u8; 1024];
        let (ct, tag) = seal(&key, b"header", &pt);

        let mut cipher = Rijndael::new();
        let mut gcm = Gcm::new(BlockCipherOwnership::Borrowed(&mut cipher));
        gcm.initialize(false, &key).unwrap();
        gcm.set_associated_data(b"header").unwrap();
        let mut recovered = vec![0u8; ct.len()];
        gcm.transform(&ct, &mut recovered).unwrap();
        gcm.verify(&tag, &mut recovered).unwrap();
        assert_eq!(recovered, pt);
    }

    #[test]
    fn tampered_ciphertext_fails_and_zeroises_output() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 32], vec![0u8; 12]);
        let pt = vec![0u8; 1024];
        let (mut ct, tag) = seal(&key, b"header", &pt);
        ct[16] ^= 0x01;

        let mut cipher = Rijndael::new();
        let mut gcm = Gcm::new(BlockCipherOwnership::Borrowed(&mut cipher));
        gcm.initialize(false, &key).unwrap();
        gcm.set_associated_data(b"header").unwrap();
        let mut recovered = vec![0u8; ct.len()];
        gcm.transform(&ct, &mut recovered).unwrap();
        let err = gcm.verify(&tag, &mut recovered).unwrap_err();
        assert_eq!(err.kind(), CryptoError::authentication_failure("x").kind());
        assert!(recovered.iter().all(|&b| b == 0));
    }

    #[test]
    fn tampered_tag_fails() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 32], vec![0u8; 12]);
        let pt = vec![0u8; 64];
        let (ct, mut tag) = seal(&key, b"", &pt);
        tag[0] ^= 0x01;

        let mut cipher = Rijndael::new();
        let mut gcm = Gcm::new(BlockCipherOwnership::Borrowed(&mut cipher));
        gcm.initialize(false, &key).unwrap();
        let mut recovered = vec![0u8; ct.len()];
        gcm.transform(&ct, &mut recovered).unwrap();
        assert!(gcm.verify(&tag, &mut recovered).is_err());
    }

    #[test]
    fn tampered_aad_fails() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 32], vec![0u8; 12]);
        let pt = vec![0u8; 32];
        let (ct, tag) = seal(&key, b"correct-aad", &pt);

        let mut cipher = Rijndael::new();
        let mut gcm = Gcm::new(BlockCipherOwnership::Borrowed(&mut cipher));
        gcm.initialize(false, &key).unwrap();
        gcm.set_associated_data(b"wrong-aad!!!").unwrap();
        let mut recovered = vec![0u8; ct.len()];
        gcm.transform(&ct, &mut recovered).unwrap();
        assert!(gcm.verify(&tag, &mut recovered).is_err());
    }
}
