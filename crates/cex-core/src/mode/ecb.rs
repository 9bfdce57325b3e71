//! Electronic Codebook (§4.2). Each block is transformed independently;
//! callers are warned in the enumeration's ordering (`ECB` sorts before
//! the chained modes) but this crate does not refuse to construct one —
//! that judgment belongs to the caller.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::util::ParallelOptions;

use super::{check_block_multiple, dispatch_indexed_block_pairs, BlockCipherOwnership, CipherMode, CipherModes};

pub struct Ecb<'a> {
    cipher: BlockCipherOwnership<'a>,
    encrypt: bool,
    initialized: bool,
    parallel: ParallelOptions,
}

impl<'a> Ecb<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Ecb { cipher, encrypt: true, initialized: false, parallel: ParallelOptions::default_for(BLOCK_SIZE) }
    }

    pub fn with_parallel_options(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }
}

impl<'a> CipherMode for Ecb<'a> {
    fn enumeral(&self) -> CipherModes {
        CipherModes::ECB
    }

    fn is_parallelizable_direction(&self, _encrypt: bool) -> bool {
        true
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        self.cipher.cipher_mut().initialize(encrypt, key)?;
        self.encrypt = encrypt;
        self.initialized = true;
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ecb::transform"));
        }
        check_block_multiple("Ecb::transform", input, output)?;
        let cipher = self.cipher.cipher();
        let encrypt = self.encrypt;
        dispatch_indexed_block_pairs(&self.parallel, input, output, BLOCK_SIZE, move |_i, in_block, out_block| {
            let result = if encrypt {
                cipher.encrypt_block(in_block, out_block)
            } else {
                cipher.decrypt_block(in_block, out_block)
            };
            result.expect("block size already validated");
        });
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
    fn ecb_roundtrips() {
        let key = SymmetricKey::new(vec![0x2bu8; 16]);
        let pt = [0x11u8; 32];

        let mut enc_cipher = Rijndael::new();
        let mut enc = Ecb::new(BlockCipherOwnership::Borrowed(&mut enc_cipher));
        enc.initialize(true, &key).unwrap();
        let mut ct = [0u8; 32];
        enc.transform(&pt, &mut ct).unwrap();

        let mut dec_cipher = Rijndael::new();
        let mut dec = Ecb::new(BlockCipherOwnership::Borrowed(&mut dec_cipher));
        dec.initialize(false, &key).unwrap();
        let mut back = [0u8; 32];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
        assert_ne!(ct[..], pt[..]);
    }

    #[test]
    fn rejects_non_block_multiple() {
        let key = SymmetricKey::new(vec![0x2bu8; 16]);
        let mut cipher = Rijndael::new();
        let mut mode = Ecb::new(BlockCipherOwnership::Borrowed(&mut cipher));
        mode.initialize(true, &key).unwrap();
        let mut out = [0u8; 15];
        assert!(mode.transform(&[0u8; 15], &mut out).is_err());
    }
}
