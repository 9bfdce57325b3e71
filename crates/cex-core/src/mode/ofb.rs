//! Output Feedback (§4.2). The keystream register chains independently of
//! the data stream (`register_{i+1} = E(register_i)`), so unlike CFB/CBC
//! there is no direction in which this mode is context-free — both
//! encryption and decryption run the same sequential keystream generator.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::util::ParallelOptions;

use super::{check_block_multiple, check_iv, BlockCipherOwnership, CipherMode, CipherModes};

pub struct Ofb<'a> {
    cipher: BlockCipherOwnership<'a>,
    iv: Vec<u8>,
    initialized: bool,
    parallel: ParallelOptions,
}

impl<'a> Ofb<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Ofb { cipher, iv: Vec::new(), initialized: false, parallel: ParallelOptions::sequential(BLOCK_SIZE) }
    }
}

impl<'a> CipherMode for Ofb<'a> {
    fn enumeral(&self) -> CipherModes {
        CipherModes::OFB
    }

    fn is_parallelizable_direction(&self, _encrypt: bool) -> bool {
        false
    }

    fn initialize(&mut self, _encrypt: bool, key: &SymmetricKey) -> Result<()> {
        check_iv("Ofb::initialize", &key.nonce)?;
        self.cipher.cipher_mut().initialize(true, key)?;
        self.iv = key.nonce.clone();
        self.initialized = true;
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ofb::transform"));
        }
        check_block_multiple("Ofb::transform", input, output)?;
        let cipher = self.cipher.cipher();
        let mut register = [0u8; BLOCK_SIZE];
        register.copy_from_slice(&self.iv);
        for (in_chunk, out_chunk) in input.chunks_exact(BLOCK_SIZE).zip(output.chunks_exact_mut(BLOCK_SIZE)) {
            let mut keystream = [0u8; BLOCK_SIZE];
            cipher.encrypt_block(&register, &mut keystream)?;
            register.copy_from_slice(&keystream);
            for j in 0..BLOCK_SIZE {
                out_chunk[j] = in_chunk[j] ^ keystream[j];
            }
        }
        self.iv.copy_from_slice(&register);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn parallel_options(&self) -> ParallelOptions {
        self.parallel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::rijndael::Rijndael;

    #[test]
    fn ofb_roundtrips() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..48u8).collect();

        let mut enc_cipher = Rijndael::new();
        let mut enc = Ofb::new(BlockCipherOwnership::Borrowed(&mut enc_cipher));
        enc.initialize(true, &key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        enc.transform(&pt, &mut ct).unwrap();

        let mut dec_cipher = Rijndael::new();
        let mut dec = Ofb::new(BlockCipherOwnership::Borrowed(&mut dec_cipher));
        dec.initialize(false, &key).unwrap();
        let mut back = vec![0u8; pt.len()];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
    }

    #[test]
    fn ofb_is_symmetric_encrypt_equals_decrypt_function() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt = [0x42u8; 16];

        let mut c1 = Rijndael::new();
        let mut enc = Ofb::new(BlockCipherOwnership::Borrowed(&mut c1));
        enc.initialize(true, &key).unwrap();
        let mut ct = [0u8; 16];
        enc.transform(&pt, &mut ct).unwrap();

        let mut c2 = Rijndael::new();
        let mut as_decrypt = Ofb::new(BlockCipherOwnership::Borrowed(&mut c2));
        as_decrypt.initialize(false, &key).unwrap();
        let mut roundtrip = [0u8; 16];
        as_decrypt.transform(&ct, &mut roundtrip).unwrap();
        assert_eq!(roundtrip, pt);
    }
}
