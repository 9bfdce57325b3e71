//! Serpent and its HKDF-extended form SHX (§4.1). A 32-round substitution-
//! permutation network operating on four 32-bit words per block, standard
//! round count 32 (native) or `{32,40,48,56,64}` (SHX).
//!
//! The eight 4-bit S-boxes are the published Serpent S-boxes, applied
//! bitslice-style: bit `i` of each of the four round words forms one
//! nibble, substituted through the S-box, and scattered back. The linear
//! transform (`lt`/`inv_lt`) is the standard Serpent rotate/XOR network;
//! its inverse is derived mechanically by reversing step order (every step
//! is an XOR, hence self-inverting once its *other* operands are held at
//! the value they had during the forward pass).

use crate::cipher::hx::expand_round_key_material;
use crate::cipher::{check_key_size, is_legal_hx_key_len, BlockCipher, SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::primitives::hkdf::HashId;
use zeroize::Zeroize;

const NATIVE_KEY_SIZES: [usize; 3] = [16, 24, 32];
const NATIVE_ROUNDS: usize = 32;
const SHX_ROUNDS: [usize; 5] = [32, 40, 48, 56, 64];

#[rustfmt::skip]
const SBOX: [[u8; 16]; 8] = [
    [3, 8, 15, 1, 10, 6, 5, 11, 14, 13, 4, 2, 7, 0, 9, 12],
    [15, 12, 2, 7, 9, 0, 5, 10, 1, 11, 14, 8, 6, 13, 3, 4],
    [8, 6, 7, 9, 3, 12, 10, 15, 13, 1, 14, 4, 0, 11, 5, 2],
    [0, 15, 11, 8, 12, 9, 6, 3, 13, 1, 2, 4, 10, 7, 5, 14],
    [1, 15, 8, 3, 12, 0, 11, 6, 2, 5, 4, 10, 9, 14, 7, 13],
    [15, 5, 2, 11, 4, 10, 9, 12, 0, 3, 14, 8, 13, 6, 7, 1],
    [7, 2, 12, 5, 8, 4, 6, 11, 14, 9, 1, 15, 13, 3, 10, 0],
    [1, 13, 15, 0, 14, 8, 2, 11, 7, 4, 12, 10, 9, 3, 5, 6],
];

const PHI: u32 = 0x9E3779B9;

fn inv_sbox_table(sbox: &[u8; 16]) -> [u8; 16] {
    let mut inv = [0u8; 16];
    for (i, &v) in sbox.iter().enumerate() {
        inv[v as usize] = i as u8;
    }
    inv
}

/// Applies a 4-bit S-box bitslice-style across four 32-bit words: bit `i`
/// of `(x0,x1,x2,x3)` forms a nibble, which is substituted and scattered
/// back to bit `i` of the outputs.
fn apply_sbox(sbox: &[u8; 16], x: [u32; 4]) -> [u32; 4] {
    let mut out = [0u32; 4];
    for i in 0..32 {
        let nibble = ((x[0] >> i) & 1) | (((x[1] >> i) & 1) << 1) | (((x[2] >> i) & 1) << 2) | (((x[3] >> i) & 1) << 3);
        let s = sbox[nibble as usize] as u32;
        for (j, word) in out.iter_mut().enumerate() {
            *word |= ((s >> j) & 1) << i;
        }
    }
    out
}

fn lt(x: [u32; 4]) -> [u32; 4] {
    let [mut x0, mut x1, mut x2, mut x3] = x;
    x0 = x0.rotate_left(13);
    x2 = x2.rotate_left(3);
    x1 ^= x0 ^ x2;
    x3 ^= x2 ^ (x0 << 3);
    x1 = x1.rotate_left(1);
    x3 = x3.rotate_left(7);
    x0 ^= x1 ^ x3;
    x2 ^= x3 ^ (x1 << 7);
    x0 = x0.rotate_left(5);
    x2 = x2.rotate_left(22);
    [x0, x1, x2, x3]
}

fn inv_lt(x: [u32; 4]) -> [u32; 4] {
    let [mut x0, mut x1, mut x2, mut x3] = x;
    x2 = x2.rotate_right(22);
    x0 = x0.rotate_right(5);
    x2 ^= x3 ^ (x1 << 7);
    x0 ^= x1 ^ x3;
    x3 = x3.rotate_right(7);
    x1 = x1.rotate_right(1);
    x3 ^= x2 ^ (x0 << 3);
    x1 ^= x0 ^ x2;
    x2 = x2.rotate_right(3);
    x0 = x0.rotate_right(13);
    [x0, x1, x2, x3]
}

/// Native Serpent key schedule (affine recurrence + S-box confusion),
/// generalized to `rounds` so SHX's extended round counts reuse it.
fn native_key_schedule(key: &[u8], rounds: usize) -> Vec<[u32; 4]> {
    // Pad the key to 256 bits: append a single 1 bit then zeros (§ original
    // Serpent padding rule for keys shorter than 256 bits).
    let mut padded = [0u8; 32];
    padded[..key.len()].copy_from_slice(key);
    if key.len() < 32 {
        padded[key.len()] = 0x01;
    }
    let mut w = [0u32; 8];
    for i in 0..8 {
        w[i] = u32::from_le_bytes(padded[4 * i..4 * i + 4].try_into().unwrap());
    }

    let subkey_words = 4 * (rounds + 1);
    let mut expanded = vec![0u32; subkey_words];
    let history_len = 8 + subkey_words;
    let mut history = vec![0u32; history_len];
    history[..8].copy_from_slice(&w);
    for i in 8..history_len {
        let idx = i - 8;
        let val = history[i - 8] ^ history[i - 5] ^ history[i - 3] ^ history[i - 1] ^ PHI ^ (idx as u32);
        history[i] = val.rotate_left(11);
    }
    expanded.copy_from_slice(&history[8..]);

    let groups = rounds + 1;
    let mut subkeys = Vec::with_capacity(groups);
    for i in 0..groups {
        let raw = [expanded[4 * i], expanded[4 * i + 1], expanded[4 * i + 2], expanded[4 * i + 3]];
        let sbox_index = (32 + 3 - i) % 8;
        subkeys.push(apply_sbox(&SBOX[sbox_index], raw));
    }
    subkeys
}

pub struct Serpent {
    round_keys: Vec<[u32; 4]>,
    rounds: usize,
    hx: bool,
    hx_hash: HashId,
    distribution_code: Vec<u8>,
    hx_rounds: usize,
    initialized: bool,
}

impl Serpent {
    pub fn new() -> Self {
        Serpent {
            round_keys: Vec::new(),
            rounds: NATIVE_ROUNDS,
            hx: false,
            hx_hash: HashId::Sha256,
            distribution_code: Vec::new(),
            hx_rounds: NATIVE_ROUNDS,
            initialized: false,
        }
    }

    pub fn new_hx(hx_hash: HashId, hx_rounds: usize, distribution_code: Vec<u8>) -> Result<Self> {
        if !SHX_ROUNDS.contains(&hx_rounds) {
            return Err(CryptoError::invalid_param("Serpent::new_hx", "hx_rounds must be one of {32,40,48,56,64}"));
        }
        Ok(Serpent {
            round_keys: Vec::new(),
            rounds: hx_rounds,
            hx: true,
            hx_hash,
            distribution_code,
            hx_rounds,
            initialized: false,
        })
    }

    fn words_from_block(input: &[u8]) -> [u32; 4] {
        [
            u32::from_le_bytes(input[0..4].try_into().unwrap()),
            u32::from_le_bytes(input[4..8].try_into().unwrap()),
            u32::from_le_bytes(input[8..12].try_into().unwrap()),
            u32::from_le_bytes(input[12..16].try_into().unwrap()),
        ]
    }

    fn block_from_words(words: [u32; 4], out: &mut [u8]) {
        for (i, w) in words.iter().enumerate() {
            out[4 * i..4 * i + 4].copy_from_slice(&w.to_le_bytes());
        }
    }

    fn encrypt_core(&self, input: &[u8], output: &mut [u8]) {
        let mut x = Self::words_from_block(input);
        for r in 0..self.rounds {
            for i in 0..4 {
                x[i] ^= self.round_keys[r][i];
            }
            let sbox_index = r % 8;
            x = apply_sbox(&SBOX[sbox_index], x);
            if r != self.rounds - 1 {
                x = lt(x);
            }
        }
        for i in 0..4 {
            x[i] ^= self.round_keys[self.rounds][i];
        }
        Self::block_from_words(x, output);
    }

    fn decrypt_core(&self, input: &[u8], output: &mut [u8]) {
        let mut x = Self::words_from_block(input);
        for i in 0..4 {
            x[i] ^= self.round_keys[self.rounds][i];
        }
        for r in (0..self.rounds).rev() {
            if r != self.rounds - 1 {
                x = inv_lt(x);
            }
            let sbox_index = r % 8;
            let inv = inv_sbox_table(&SBOX[sbox_index]);
            x = apply_sbox(&inv, x);
            for i in 0..4 {
                x[i] ^= self.round_keys[r][i];
            }
        }
        Self::block_from_words(x, output);
    }
}

impl Default for Serpent {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Serpent {
    fn drop(&mut self) {
        for rk in self.round_keys.iter_mut() {
            rk.zeroize();
        }
    }
}

impl BlockCipher for Serpent {
    fn legal_key_sizes(&self) -> &'static [usize] {
        &NATIVE_KEY_SIZES
    }

    fn initialize(&mut self, _encrypt: bool, key: &SymmetricKey) -> Result<()> {
        let klen = key.key.len();
        if self.hx {
            if !is_legal_hx_key_len(klen, &NATIVE_KEY_SIZES, self.hx_hash.digest_size()) {
                return Err(CryptoError::invalid_key("Serpent::initialize", "HX key length not legal for SHX"));
            }
            let groups = self.hx_rounds + 1;
            let mut material = vec![0u8; groups * 16];
            expand_round_key_material(self.hx_hash, &key.key, "SHX", &self.distribution_code, &mut material)?;
            self.round_keys = material
                .chunks_exact(16)
                .map(|chunk| {
                    let mut words = [0u32; 4];
                    for (i, w) in words.iter_mut().enumerate() {
                        *w = u32::from_le_bytes(chunk[4 * i..4 * i + 4].try_into().unwrap());
                    }
                    words
                })
                .collect();
            self.rounds = self.hx_rounds;
        } else {
            check_key_size("Serpent::initialize", &NATIVE_KEY_SIZES, klen)?;
            self.rounds = NATIVE_ROUNDS;
            self.round_keys = native_key_schedule(&key.key, self.rounds);
        }
        self.initialized = true;
        Ok(())
    }

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Serpent::encrypt_block"));
        }
        if input.len() != BLOCK_SIZE || output.len() != BLOCK_SIZE {
            return Err(CryptoError::invalid_size("Serpent::encrypt_block", "block must be 16 bytes"));
        }
        self.encrypt_core(input, output);
        Ok(())
    }

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Serpent::decrypt_block"));
        }
        if input.len() != BLOCK_SIZE || output.len() != BLOCK_SIZE {
            return Err(CryptoError::invalid_size("Serpent::decrypt_block", "block must be 16 bytes"));
        }
        self.decrypt_core(input, output);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lt_and_inv_lt_are_inverses() {
        let x = [0x01234567u32, 0x89abcdef, 0xfedcba98, 0x76543210];
        assert_eq!(inv_lt(lt(x)), x);
    }

    #[test]
    fn sbox_and_inverse_round_trip() {
        for sbox in SBOX.iter() {
            let inv = inv_sbox_table(sbox);
            let x = [0x0f0f0f0fu32, 0x33333333, 0x55555555, 0xaaaaaaaa];
            let forward = apply_sbox(sbox, x);
            let back = apply_sbox(&inv, forward);
            assert_eq!(back, x);
        }
    }

    #[test]
    fn encrypt_decrypt_roundtrip_all_key_sizes() {
        for &klen in &NATIVE_KEY_SIZES {
            let key = vec![0x24u8; klen];
            let pt = [0x99u8; 16];
            let mut enc = Serpent::new();
            enc.initialize(true, &SymmetricKey::new(key.clone())).unwrap();
            let mut ct = [0u8; 16];
            enc.encrypt_block(&pt, &mut ct).unwrap();
            assert_ne!(&ct[..], &pt[..]);

            let mut dec = Serpent::new();
            dec.initialize(false, &SymmetricKey::new(key)).unwrap();
            let mut back = [0u8; 16];
            dec.decrypt_block(&ct, &mut back).unwrap();
            assert_eq!(pt, back);
        }
    }

    #[test]
    fn shx_roundtrips_for_every_legal_round_count() {
        for &rounds in &SHX_ROUNDS {
            let key = vec![0x7Eu8; 64];
            let dist = b"cex-rs/shx-test".to_vec();
            let mut enc = Serpent::new_hx(HashId::Sha256, rounds, dist.clone()).unwrap();
            enc.initialize(true, &SymmetricKey::new(key.clone())).unwrap();
            let pt = [0x0Au8; 16];
            let mut ct = [0u8; 16];
            enc.encrypt_block(&pt, &mut ct).unwrap();

            let mut dec = Serpent::new_hx(HashId::Sha256, rounds, dist).unwrap();
            dec.initialize(false, &SymmetricKey::new(key)).unwrap();
            let mut back = [0u8; 16];
            dec.decrypt_block(&ct, &mut back).unwrap();
            assert_eq!(pt, back);
        }
    }
}
