//! The `BlockCipher` capability (§4.1): a uniform keyed 128-bit block
//! permutation implemented by Rijndael, Serpent, and Twofish, each with a
//! standard form and an HKDF-extended (HX) form.

pub mod hx;
pub mod rijndael;
pub mod serpent;
pub mod twofish;

use crate::error::{CryptoError, Result};
use zeroize::ZeroizeOnDrop;

/// All key, IV, and context material a cipher/mode instance is initialized
/// with (§3 Data Model: `SymmetricKey`). Contents are zeroised on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SymmetricKey {
    pub key: Vec<u8>,
    #[zeroize(skip)]
    pub nonce: Vec<u8>,
    #[zeroize(skip)]
    pub info: Vec<u8>,
}

impl SymmetricKey {
    pub fn new(key: Vec<u8>) -> Self {
        SymmetricKey { key, nonce: Vec::new(), info: Vec::new() }
    }

    pub fn with_nonce(key: Vec<u8>, nonce: Vec<u8>) -> Self {
        SymmetricKey { key, nonce, info: Vec::new() }
    }

    pub fn with_nonce_info(key: Vec<u8>, nonce: Vec<u8>, info: Vec<u8>) -> Self {
        SymmetricKey { key, nonce, info }
    }
}

/// Stable numeric bindings for the cipher family enumeration (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockCiphers {
    None = 0,
    AHX = 1,
    Rijndael = 2,
    RHX = 4,
    Serpent = 8,
    SHX = 16,
    Twofish = 32,
    THX = 64,
}

/// Block width in bytes, identical across every cipher family in this
/// crate (§4.1: "`BlockSize` is 16 bytes for all three families").
pub const BLOCK_SIZE: usize = 16;

/// The `BlockCipher` capability (§4.1). Implementors hold round-key state
/// produced at `initialize` and immutable thereafter until `reset`/drop.
pub trait BlockCipher {
    /// Legal key sizes in bytes for this cipher's *native* (non-HX) form,
    /// or the HX-extended set when the instance was constructed in HX mode.
    fn legal_key_sizes(&self) -> &'static [usize];

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()>;

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()>;

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()>;

    /// Bulk transform of `n` contiguous blocks in the cipher's configured
    /// direction, permitting SIMD-style batching (§4.1). The default
    /// implementation calls the scalar path per block; concrete ciphers may
    /// override for real batching.
    fn transform_n_blocks(&self, input: &[u8], output: &mut [u8], encrypt: bool) -> Result<()> {
        let bs = self.block_size();
        if input.len() % bs != 0 || input.len() != output.len() {
            return Err(CryptoError::invalid_size("BlockCipher::transform_n_blocks", "length must be a non-zero multiple of BlockSize"));
        }
        for (chunk_in, chunk_out) in input.chunks_exact(bs).zip(output.chunks_exact_mut(bs)) {
            if encrypt {
                self.encrypt_block(chunk_in, chunk_out)?;
            } else {
                self.decrypt_block(chunk_in, chunk_out)?;
            }
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool;
}

pub(crate) fn check_key_size(location: &'static str, legal: &[usize], len: usize) -> Result<()> {
    if legal.contains(&len) {
        Ok(())
    } else {
        Err(CryptoError::invalid_key(location, format!("key length {len} is not one of {legal:?}")))
    }
}

/// Key schedules that can also be HKDF-extended accept any of the native
/// sizes, 64 bytes, or `64 + k * digest_size` (§4.1).
pub(crate) fn is_legal_hx_key_len(len: usize, native: &[usize], digest_size: usize) -> bool {
    if native.contains(&len) || len == 64 {
        return true;
    }
    len > 64 && (len - 64) % digest_size == 0
}
