//! Cipher Block Chaining (§4.2). Encryption is inherently sequential;
//! decryption only needs the *previous ciphertext block*, so it is
//! context-free and parallelizable like ECB/CTR.

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::util::{xor_into, ParallelOptions};

use super::{check_block_multiple, check_iv, dispatch_indexed_block_pairs, BlockCipherOwnership, CipherMode, CipherModes};

pub struct Cbc<'a> {
    cipher: BlockCipherOwnership<'a>,
    encrypt: bool,
    iv: Vec<u8>,
    initialized: bool,
    parallel: ParallelOptions,
}

impl<'a> Cbc<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Cbc { cipher, encrypt: true, iv: Vec::new(), initialized: false, parallel: ParallelOptions::default_for(BLOCK_SIZE) }
    }
}

impl<'a> CipherMode for Cbc<'a> {
    fn enumeral(&self) -> CipherModes {
        CipherModes::CBC
    }

    fn is_parallelizable_direction(&self, encrypt: bool) -> bool {
        !encrypt
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        check_iv("Cbc::initialize", &key.nonce)?;
        self.cipher.cipher_mut().initialize(encrypt, key)?;
        self.iv = key.nonce.clone();
        self.encrypt = encrypt;
        self.initialized = true;
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Cbc::transform"));
        }
        check_block_multiple("Cbc::transform", input, output)?;

        if self.encrypt {
            let cipher = self.cipher.cipher();
            let mut prev = [0u8; BLOCK_SIZE];
            prev.copy_from_slice(&self.iv);
            for (in_chunk, out_chunk) in input.chunks_exact(BLOCK_SIZE).zip(output.chunks_exact_mut(BLOCK_SIZE)) {
                let mut mixed = [0u8; BLOCK_SIZE];
                mixed.copy_from_slice(in_chunk);
                xor_into(&mut mixed, &prev);
                cipher.encrypt_block(&mixed, out_chunk)?;
                prev.copy_from_slice(out_chunk);
            }
            if let Some(last) = output.chunks_exact(BLOCK_SIZE).last() {
                self.iv.copy_from_slice(last);
            }
        } else {
            let cipher = self.cipher.cipher();
            let iv = self.iv.clone();
            dispatch_indexed_block_pairs(&self.parallel, input, output, BLOCK_SIZE, move |i, in_chunk, out_chunk| {
                let prev: &[u8] = if i == 0 { &iv } else { &input[(i - 1) * BLOCK_SIZE..i * BLOCK_SIZE] };
                let mut decrypted = [0u8; BLOCK_SIZE];
                cipher.decrypt_block(in_chunk, &mut decrypted).expect("block size already validated");
                for j in 0..BLOCK_SIZE {
                    out_chunk[j] = decrypted[j] ^ prev[j];
                }
            });
            if let Some(last) = input.chunks_exact(BLOCK_SIZE).last() {
                self.iv.copy_from_slice(last);
            }
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
    fn cbc_roundtrips_across_chained_blocks() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..48u8).collect();

        let mut enc_cipher = Rijndael::new();
        let mut enc = Cbc::new(BlockCipherOwnership::Borrowed(&mut enc_cipher));
        enc.initialize(true, &key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        enc.transform(&pt, &mut ct).unwrap();

        let mut dec_cipher = Rijndael::new();
        let mut dec = Cbc::new(BlockCipherOwnership::Borrowed(&mut dec_cipher));
        dec.initialize(false, &key).unwrap();
        let mut back = vec![0u8; pt.len()];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
        assert_ne!(ct[0..16], ct[16..32]);
    }

    #[test]
    fn aes128_cbc_nist_kat() {
        // NIST SP800-38A F.2.1, block 0.
        let key = SymmetricKey::with_nonce(
            hex_literal::hex!("2B7E151628AED2A6ABF7158809CF4F3C").to_vec(),
            hex_literal::hex!("000102030405060708090A0B0C0D0E0F").to_vec(),
        );
        let pt = hex_literal::hex!("6BC1BEE22E409F96E93D7E117393172A");
        let mut cipher = Rijndael::new();
        let mut enc = Cbc::new(BlockCipherOwnership::Borrowed(&mut cipher));
        enc.initialize(true, &key).unwrap();
        let mut ct = [0u8; 16];
        enc.transform(&pt, &mut ct).unwrap();
        assert_eq!(ct, hex_literal::hex!("7649ABAC8119B246CEE98E9B12E9197D"));
    }

    #[test]
    fn rejects_short_iv() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0u8; 15]);
        let mut cipher = Rijndael::new();
        let mut mode = Cbc::new(BlockCipherOwnership::Borrowed(&mut cipher));
        assert!(mode.initialize(true, &key).is_err());
    }
}
