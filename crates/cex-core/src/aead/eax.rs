//! EAX (§4.4). Three independent CMAC domains over the same keyed cipher,
//! tagged by a one-byte prefix carried in an otherwise-zero leading block:
//! `0x00` for the nonce, `0x01` for associated data, `0x02` for
//! ciphertext. `N` doubles as the CTR mode's starting counter.

use subtle::ConstantTimeEq;

use crate::cipher::{BlockCipher, SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mac::cmac::{cmac_oneshot, derive_subkeys};
use crate::mode::BlockCipherOwnership;
use crate::util::pack::increment_be;

use super::AeadCipher;

pub struct Eax<'a> {
    cipher: BlockCipherOwnership<'a>,
    k1: [u8; BLOCK_SIZE],
    k2: [u8; BLOCK_SIZE],
    n: [u8; BLOCK_SIZE],
    h: [u8; BLOCK_SIZE],
    aad: Vec<u8>,
    ciphertext: Vec<u8>,
    encrypt: bool,
    aad_locked: bool,
    transformed: bool,
    initialized: bool,
}

impl<'a> Eax<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Eax {
            cipher,
            k1: [0u8; BLOCK_SIZE],
            k2: [0u8; BLOCK_SIZE],
            n: [0u8; BLOCK_SIZE],
            h: [0u8; BLOCK_SIZE],
            aad: Vec::new(),
            ciphertext: Vec::new(),
            encrypt: true,
            aad_locked: false,
            transformed: false,
            initialized: false,
        }
    }

    fn domain_cmac(cipher: &dyn BlockCipher, k1: &[u8; BLOCK_SIZE], k2: &[u8; BLOCK_SIZE], domain: u8, data: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
        let mut msg = Vec::with_capacity(BLOCK_SIZE + data.len());
        msg.extend_from_slice(&[0u8; BLOCK_SIZE]);
        msg[BLOCK_SIZE - 1] = domain;
        msg.extend_from_slice(data);
        cmac_oneshot(cipher, k1, k2, &msg)
    }
}

impl<'a> AeadCipher for Eax<'a> {
    fn enumeral(&self) -> super::AeadModes {
        super::AeadModes::EAX
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        if key.nonce.is_empty() {
            return Err(CryptoError::invalid_nonce("Eax::initialize", "EAX requires a nonce"));
        }
        self.cipher.cipher_mut().initialize(true, key)?;
        let (k1, k2) = derive_subkeys(self.cipher.cipher())?;
        self.k1 = k1;
        self.k2 = k2;
        self.n = Self::domain_cmac(self.cipher.cipher(), &k1, &k2, 0x00, &key.nonce)?;
        self.h = [0u8; BLOCK_SIZE];
        self.aad.clear();
        self.ciphertext.clear();
        self.encrypt = encrypt;
        self.aad_locked = false;
        self.transformed = false;
        self.initialized = true;
        Ok(())
    }

    fn set_associated_data(&mut self, aad: &[u8]) -> Result<()> {
        if self.aad_locked {
            return Err(CryptoError::illegal_operation("Eax::set_associated_data", "AAD must be set before transform"));
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Eax::transform"));
        }
        if self.transformed {
            return Err(CryptoError::illegal_operation("Eax::transform", "transform may be called only once per session"));
        }
        if input.len() != output.len() {
            return Err(CryptoError::invalid_size("Eax::transform", "input and output must be the same length"));
        }
        self.aad_locked = true;
        self.h = Self::domain_cmac(self.cipher.cipher(), &self.k1, &self.k2, 0x01, &self.aad)?;

        let mut counter = self.n;
        for (in_chunk, out_chunk) in input.chunks(BLOCK_SIZE).zip(output.chunks_mut(BLOCK_SIZE)) {
            let mut keystream = [0u8; BLOCK_SIZE];
            self.cipher.cipher().encrypt_block(&counter, &mut keystream)?;
            for j in 0..in_chunk.len() {
                out_chunk[j] = in_chunk[j] ^ keystream[j];
            }
            increment_be(&mut counter);
        }

        self.ciphertext = if self.encrypt { output.to_vec() } else { input.to_vec() };
        self.transformed = true;
        Ok(())
    }

    fn finalize(&mut self, tag_out: &mut [u8]) -> Result<()> {
        if !self.encrypt {
            return Err(CryptoError::illegal_operation("Eax::finalize", "finalize is for the encrypt direction; use verify"));
        }
        if tag_out.len() < super::MIN_TAG_SIZE || tag_out.len() > super::MAX_TAG_SIZE {
            return Err(CryptoError::invalid_size("Eax::finalize", "tag length out of range"));
        }
        let c_mac = Self::domain_cmac(self.cipher.cipher(), &self.k1, &self.k2, 0x02, &self.ciphertext)?;
        for (i, byte) in tag_out.iter_mut().enumerate() {
            *byte = c_mac[i] ^ self.n[i] ^ self.h[i];
        }
        Ok(())
    }

    fn verify(&mut self, tag: &[u8], output: &mut [u8]) -> Result<()> {
        if self.encrypt {
            return Err(CryptoError::illegal_operation("Eax::verify", "verify is for the decrypt direction; use finalize"));
        }
        let c_mac = Self::domain_cmac(self.cipher.cipher(), &self.k1, &self.k2, 0x02, &self.ciphertext)?;
        let mut expected = [0u8; BLOCK_SIZE];
        for i in 0..BLOCK_SIZE {
            expected[i] = c_mac[i] ^ self.n[i] ^ self.h[i];
        }
        let ok: bool = expected[..tag.len()].ct_eq(tag).into();
        if !ok {
            output.iter_mut().for_each(|b| *b = 0);
            return Err(CryptoError::authentication_failure("Eax::verify"));
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
        let mut eax = Eax::new(BlockCipherOwnership::Borrowed(&mut cipher));
        eax.initialize(true, key).unwrap();
        eax.set_associated_data(aad).unwrap();
        let mut ct = vec![0u8; pt.len()];
        eax.transform(pt, &mut ct).unwrap();
        let mut tag = [0u8; 16];
        eax.finalize(&mut tag).unwrap();
        (ct, tag)
    }

    #[test]
    fn eax_roundtrips_and_authenticates() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..200u8).cycle().take(500).collect();
        let (ct, tag) = seal(&key, b"associated", &pt);

        let mut cipher = Rijndael::new();
        let mut eax = Eax::new(BlockCipherOwnership::Borrowed(&mut cipher));
        eax.initialize(false, &key).unwrap();
        eax.set_associated_data(b"associated").unwrap();
        let mut recovered = vec![0u8; ct.len()];
        eax.transform(&ct, &mut recovered).unwrap();
        eax.verify(&tag, &mut recovered).unwrap();
        assert_eq!(recovered, pt);
    }

    #[test]
    fn tampered_ciphertext_fails_and_zeroises_output() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt = vec![0x42u8; 64];
        let (mut ct, tag) = seal(&key, b"", &pt);
        ct[0] ^= 0x01;

        let mut cipher = Rijndael::new();
        let mut eax = Eax::new(BlockCipherOwnership::Borrowed(&mut cipher));
        eax.initialize(false, &key).unwrap();
        let mut recovered = vec![0u8; ct.len()];
        eax.transform(&ct, &mut recovered).unwrap();
        assert!(eax.verify(&tag, &mut recovered).is_err());
        assert!(recovered.iter().all(|&b| b == 0));
    }
}
