//! Counter mode / Integer Counter Mode (§4.2). The keystream for block `i`
//! is `E(nonce + i)`, computable independently of every other block, so
//! both directions are fully parallelizable and symmetric (XOR with
//! keystream either way).

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::util::pack::{increment_be, increment_le};
use crate::util::ParallelOptions;

use super::{check_block_multiple, check_iv, dispatch_indexed_block_pairs, BlockCipherOwnership, CipherMode, CipherModes};

/// Counter-increment convention (§4.2: "big-endian / little-endian
/// counter variants", the latter historically called ICM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEndian {
    Big,
    Little,
}

pub struct Ctr<'a> {
    cipher: BlockCipherOwnership<'a>,
    nonce: [u8; BLOCK_SIZE],
    endian: CounterEndian,
    initialized: bool,
    parallel: ParallelOptions,
}

impl<'a> Ctr<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>, endian: CounterEndian) -> Self {
        Ctr { cipher, nonce: [0u8; BLOCK_SIZE], endian, initialized: false, parallel: ParallelOptions::default_for(BLOCK_SIZE) }
    }

    pub fn with_parallel_options(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    fn enumeral_for(endian: CounterEndian) -> CipherModes {
        match endian {
            CounterEndian::Big => CipherModes::CTR,
            CounterEndian::Little => CipherModes::ICM,
        }
    }

    /// Counter block for index `i`, derived from the base nonce by `i`
    /// successive increments in the configured endianness. Block-at-a-time
    /// encryption keeps this cheap; a production-grade fast path would add
    /// the index as a wide integer instead of looping, but this crate
    /// favors the auditable form.
    fn counter_at(&self, i: u64) -> [u8; BLOCK_SIZE] {
        let mut block = self.nonce;
        for _ in 0..i {
            match self.endian {
                CounterEndian::Big => increment_be(&mut block),
                CounterEndian::Little => increment_le(&mut block),
            }
        }
        block
    }

    /// The counter block the next `transform` call will start from. Used by
    /// `drbg::Bcg` to fold the running counter into its reseed salt.
    pub(crate) fn counter_snapshot(&self) -> [u8; BLOCK_SIZE] {
        self.nonce
    }
}

impl<'a> CipherMode for Ctr<'a> {
    fn enumeral(&self) -> CipherModes {
        Self::enumeral_for(self.endian)
    }

    fn is_parallelizable_direction(&self, _encrypt: bool) -> bool {
        true
    }

    fn initialize(&mut self, _encrypt: bool, key: &SymmetricKey) -> Result<()> {
        check_iv("Ctr::initialize", &key.nonce)?;
        // CTR always runs the block cipher forward; direction only affects
        // which buffer is plaintext and which is ciphertext, not the cipher.
        self.cipher.cipher_mut().initialize(true, key)?;
        self.nonce.copy_from_slice(&key.nonce);
        self.initialized = true;
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ctr::transform"));
        }
        check_block_multiple("Ctr::transform", input, output)?;
        let cipher = self.cipher.cipher();
        let base = self.nonce;
        let endian = self.endian;
        dispatch_indexed_block_pairs(&self.parallel, input, output, BLOCK_SIZE, move |i, in_chunk, out_chunk| {
            let mut counter = base;
            for _ in 0..i {
                match endian {
                    CounterEndian::Big => increment_be(&mut counter),
                    CounterEndian::Little => increment_le(&mut counter),
                }
            }
            let mut keystream = [0u8; BLOCK_SIZE];
            cipher.encrypt_block(&counter, &mut keystream).expect("block size already validated");
            for j in 0..BLOCK_SIZE {
                out_chunk[j] = in_chunk[j] ^ keystream[j];
            }
        });
        let total_blocks = (input.len() / BLOCK_SIZE) as u64;
        self.nonce = self.counter_at(total_blocks);
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
    fn ctr_roundtrips_big_endian() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let pt: Vec<u8> = (0..64u8).collect();

        let mut c1 = Rijndael::new();
        let mut enc = Ctr::new(BlockCipherOwnership::Borrowed(&mut c1), CounterEndian::Big);
        enc.initialize(true, &key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        enc.transform(&pt, &mut ct).unwrap();

        let mut c2 = Rijndael::new();
        let mut dec = Ctr::new(BlockCipherOwnership::Borrowed(&mut c2), CounterEndian::Big);
        dec.initialize(false, &key).unwrap();
        let mut back = vec![0u8; pt.len()];
        dec.transform(&ct, &mut back).unwrap();

        assert_eq!(back, pt);
    }

    #[test]
    fn ctr_advances_counter_across_calls() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let mut cipher = Rijndael::new();
        let mut enc = Ctr::new(BlockCipherOwnership::Borrowed(&mut cipher), CounterEndian::Big);
        enc.initialize(true, &key).unwrap();

        let mut ct_a = [0u8; 16];
        enc.transform(&[0u8; 16], &mut ct_a).unwrap();
        let mut ct_b = [0u8; 16];
        enc.transform(&[0u8; 16], &mut ct_b).unwrap();

        assert_ne!(ct_a, ct_b, "the counter must advance between calls");
    }

    #[test]
    fn aes256_ctr_nist_kat() {
        // NIST SP800-38A F.5.5, block 0.
        let key = SymmetricKey::with_nonce(
            hex_literal::hex!("603DEB1015CA71BE2B73AEF0857D77811F352C073B6108D72D9810A30914DFF4").to_vec(),
            hex_literal::hex!("F0F1F2F3F4F5F6F7F8F9FAFBFCFDFEFF").to_vec(),
        );
        let pt = hex_literal::hex!("6BC1BEE22E409F96E93D7E117393172A");
        let mut cipher = Rijndael::new();
        let mut enc = Ctr::new(BlockCipherOwnership::Borrowed(&mut cipher), CounterEndian::Big);
        enc.initialize(true, &key).unwrap();
        let mut ct = [0u8; 16];
        enc.transform(&pt, &mut ct).unwrap();
        assert_eq!(ct, hex_literal::hex!("601EC313775789A5B7A7F504BBF3D228"));
    }

    #[test]
    fn little_endian_variant_is_icm() {
        let key = SymmetricKey::with_nonce(vec![0x2bu8; 16], vec![0x00u8; 16]);
        let mut cipher = Rijndael::new();
        let mode = Ctr::new(BlockCipherOwnership::Borrowed(&mut cipher), CounterEndian::Little);
        assert_eq!(mode.enumeral(), CipherModes::ICM);
    }
}
