//! Cipher Feedback (§4.2). The shift register is `BlockSize` bytes wide but
//! only the leftmost `register_size` (`r`, 1..=BlockSize) bytes of each
//! keystream block are used per segment: `C_i = P_i XOR leftmost_r(E_k(I_i))`,
//! after which the register is shifted left by `r` bytes and the new
//! ciphertext segment is copied into the freed space. With `r == BlockSize`
//! this degenerates to full-block CFB. Because the register at segment `i`
//! is a deterministic function of the IV and the preceding ciphertext bytes
//! alone, decryption is context-free and parallelizable; encryption chains
//! sequentially. Both directions drive the underlying block cipher in its
//! encrypt direction only — CFB is a stream-cipher construction.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::util::ParallelOptions;

use super::{check_iv, dispatch_indexed_block_pairs, BlockCipherOwnership, CipherMode, CipherModes};

pub struct Cfb<'a> {
    cipher: BlockCipherOwnership<'a>,
    encrypt: bool,
    iv: Vec<u8>,
    register_size: usize,
    initialized: bool,
    parallel: ParallelOptions,
}

impl<'a> Cfb<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Cfb {
            cipher,
            encrypt: true,
            iv: Vec::new(),
            register_size: BLOCK_SIZE,
            initialized: false,
            parallel: ParallelOptions::default_for(BLOCK_SIZE),
        }
    }

    /// Sets the shift-register width in bytes. Must be in `1..=BlockSize`
    /// (§4.2's configurable `r`, default full-block).
    pub fn with_register_size(mut self, register_size: usize) -> Result<Self> {
        Self::check_register_size(register_size)?;
        self.register_size = register_size;
        Ok(self)
    }

    fn check_register_size(register_size: usize) -> Result<()> {
        if register_size == 0 || register_size > BLOCK_SIZE {
            Err(CryptoError::invalid_size("Cfb::with_register_size", "register size must be in 1..=BlockSize"))
        } else {
            Ok(())
        }
    }

    /// Reconstructs the `BlockSize`-wide shift register as it stood before
    /// processing segment `i`, from the IV and the ciphertext segments that
    /// precede it: the trailing `BlockSize` bytes of `iv ‖ ciphertext` ending
    /// at offset `i * r + BlockSize`.
    fn register_at(iv: &[u8], ciphertext: &[u8], i: usize, r: usize) -> [u8; BLOCK_SIZE] {
        let mut register = [0u8; BLOCK_SIZE];
        let start = i * r;
        for (k, slot) in register.iter_mut().enumerate() {
            let pos = start + k;
            *slot = if pos < iv.len() { iv[pos] } else { ciphertext[pos - iv.len()] };
        }
        register
    }
}

impl<'a> CipherMode for Cfb<'a> {
    fn enumeral(&self) -> CipherModes {
        CipherModes::CFB
    }

    fn is_parallelizable_direction(&self, encrypt: bool) -> bool {
        !encrypt
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        check_iv("Cfb::initialize", &key.nonce)?;
        Self::check_register_size(self.register_size)?;
        // CFB always runs the block cipher forward, even when decrypting.
        self.cipher.cipher_mut().initialize(true, key)?;
        self.iv = key.nonce.clone();
        self.encrypt = encrypt;
        self.initialized = true;
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Cfb::transform"));
        }
        let r = self.register_size;
        if input.len() != output.len() || input.len() % r != 0 {
            return Err(CryptoError::invalid_size("Cfb::transform", "input/output length must be equal and a non-zero multiple of the register size"));
        }

        if self.encrypt {
            let cipher = self.cipher.cipher();
            let mut register = [0u8; BLOCK_SIZE];
            register.copy_from_slice(&self.iv);
            for (in_chunk, out_chunk) in input.chunks_exact(r).zip(output.chunks_exact_mut(r)) {
                let mut keystream = [0u8; BLOCK_SIZE];
                cipher.encrypt_block(&register, &mut keystream)?;
                for j in 0..r {
                    out_chunk[j] = in_chunk[j] ^ keystream[j];
                }
                register.copy_within(r.., 0);
                register[BLOCK_SIZE - r..].copy_from_slice(out_chunk);
            }
            self.iv.copy_from_slice(&register);
        } else {
            let cipher = self.cipher.cipher();
            let iv = self.iv.clone();
            dispatch_indexed_block_pairs(&self.parallel, input, output, r, move |i, in_chunk, out_chunk| {
                let register = Self::register_at(&iv, input, i, r);
                let mut keystream = [0u8; BLOCK_SIZE];
                cipher.encrypt_block(&register, &mut keystream).expect("block size already validated");
                for j in 0..r {
                    out_chunk[j] = in_chunk[j] ^ keystream[j];
                }
            });
            let segments = input.len() / r;
            let last_register = Self::register_at(&self.iv, input, segments, r);
            self.iv.copy_from_slice(&last_register);
        }
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
    fn cfb_roundtrips() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..48u8).collect();

        let mut enc_cipher = Rijndael::new();
        let mut enc = Cfb::new(BlockCipherOwnership::Borrowed(&mut enc_cipher));
        enc.initialize(true, &key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        enc.transform(&pt, &mut ct).unwrap();

        let mut dec_cipher = Rijndael::new();
        let mut dec = Cfb::new(BlockCipherOwnership::Borrowed(&mut dec_cipher));
        dec.initialize(false, &key).unwrap();
        let mut back = vec![0u8; pt.len()];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
    }

    #[test]
    fn cfb_roundtrips_with_narrow_register() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..48u8).collect();

        let mut enc_cipher = Rijndael::new();
        let mut enc = Cfb::new(BlockCipherOwnership::Borrowed(&mut enc_cipher)).with_register_size(1).unwrap();
        enc.initialize(true, &key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        enc.transform(&pt, &mut ct).unwrap();

        let mut dec_cipher = Rijndael::new();
        let mut dec = Cfb::new(BlockCipherOwnership::Borrowed(&mut dec_cipher)).with_register_size(1).unwrap();
        dec.initialize(false, &key).unwrap();
        let mut back = vec![0u8; pt.len()];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
    }

    #[test]
    fn rejects_register_size_out_of_range() {
        let mut cipher = Rijndael::new();
        assert!(Cfb::new(BlockCipherOwnership::Borrowed(&mut cipher)).with_register_size(0).is_err());
        let mut cipher2 = Rijndael::new();
        assert!(Cfb::new(BlockCipherOwnership::Borrowed(&mut cipher2)).with_register_size(BLOCK_SIZE + 1).is_err());
    }
}
