//! OCB (§4.4, RFC 7253). Nonce-derived offsets chain across blocks via a
//! lazily-extended `L` table built from repeated `double()`; associated
//! data is absorbed through its own, independently-zeroed offset chain
//! over the same `L` table. This implementation fixes `TAGLEN = 128` in
//! the nonce-processing step (so the nonce block's leading 7 bits are
//! always zero) and only truncates at the final tag — RFC 7253 permits
//! shorter tags to perturb that field, but every caller in this crate
//! asks for the full 16-byte tag or a truncation of it, not a distinct
//! authentication regime.

use subtle::ConstantTimeEq;

use crate::cipher::{SymmetricKey, BLOCK_SIZE};
use crate::error::{CryptoError, Result};
use crate::mode::BlockCipherOwnership;
use crate::primitives::gf::double_cmac;
use crate::util::ntz;

use super::AeadCipher;

struct LTable {
    l_star: [u8; BLOCK_SIZE],
    l_dollar: [u8; BLOCK_SIZE],
    table: Vec<[u8; BLOCK_SIZE]>,
}

impl LTable {
    fn new(l_star: [u8; BLOCK_SIZE]) -> Self {
        let l_dollar = double_cmac(&l_star);
        let l0 = double_cmac(&l_dollar);
        LTable { l_star, l_dollar, table: vec![l0] }
    }

    fn get(&mut self, k: usize) -> [u8; BLOCK_SIZE] {
        while self.table.len() <= k {
            let prev = *self.table.last().expect("table seeded with L_0 in new()");
            self.table.push(double_cmac(&prev));
        }
        self.table[k]
    }
}

pub struct Ocb<'a> {
    cipher: BlockCipherOwnership<'a>,
    l: Option<LTable>,
    offset0: [u8; BLOCK_SIZE],
    aad: Vec<u8>,
    aad_hash: [u8; BLOCK_SIZE],
    checksum: [u8; BLOCK_SIZE],
    final_offset: [u8; BLOCK_SIZE],
    encrypt: bool,
    aad_locked: bool,
    transformed: bool,
    initialized: bool,
}

impl<'a> Ocb<'a> {
    pub fn new(cipher: BlockCipherOwnership<'a>) -> Self {
        Ocb {
            cipher,
            l: None,
            offset0: [0u8; BLOCK_SIZE],
            aad: Vec::new(),
            aad_hash: [0u8; BLOCK_SIZE],
            checksum: [0u8; BLOCK_SIZE],
            final_offset: [0u8; BLOCK_SIZE],
            encrypt: true,
            aad_locked: false,
            transformed: false,
            initialized: false,
        }
    }

    fn extract_bits(stretch: &[u8; 24], bottom: u8) -> [u8; BLOCK_SIZE] {
        let byte_offset = (bottom / 8) as usize;
        let bit_shift = (bottom % 8) as u32;
        let mut out = [0u8; BLOCK_SIZE];
        if bit_shift == 0 {
            out.copy_from_slice(&stretch[byte_offset..byte_offset + BLOCK_SIZE]);
        } else {
            for i in 0..BLOCK_SIZE {
                let hi = stretch[byte_offset + i] as u16;
                let lo = stretch[byte_offset + i + 1] as u16;
                out[i] = ((hi << bit_shift) | (lo >> (8 - bit_shift))) as u8;
            }
        }
        out
    }

    fn hash_aad(&mut self, aad: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
        let full_blocks = aad.len() / BLOCK_SIZE;
        let remainder = aad.len() % BLOCK_SIZE;
        let mut offset = [0u8; BLOCK_SIZE];
        let mut sum = [0u8; BLOCK_SIZE];
        let cipher = self.cipher.cipher();
        let l_table = self.l.as_mut().expect("hash_aad only called after initialize");

        for i in 1..=full_blocks {
            let l_i = l_table.get(ntz(i as u64) as usize);
            for j in 0..BLOCK_SIZE {
                offset[j] ^= l_i[j];
            }
            let block = &aad[(i - 1) * BLOCK_SIZE..i * BLOCK_SIZE];
            let mut mixed = [0u8; BLOCK_SIZE];
            for j in 0..BLOCK_SIZE {
                mixed[j] = block[j] ^ offset[j];
            }
            let mut enc = [0u8; BLOCK_SIZE];
            cipher.encrypt_block(&mixed, &mut enc)?;
            for j in 0..BLOCK_SIZE {
                sum[j] ^= enc[j];
            }
        }

        if remainder > 0 {
            let mut off_star = offset;
            for j in 0..BLOCK_SIZE {
                off_star[j] ^= l_table.l_star[j];
            }
            let mut padded = [0u8; BLOCK_SIZE];
            padded[..remainder].copy_from_slice(&aad[full_blocks * BLOCK_SIZE..]);
            padded[remainder] = 0x80;
            for j in 0..BLOCK_SIZE {
                padded[j] ^= off_star[j];
            }
            let mut enc = [0u8; BLOCK_SIZE];
            cipher.encrypt_block(&padded, &mut enc)?;
            for j in 0..BLOCK_SIZE {
                sum[j] ^= enc[j];
            }
        }
        Ok(sum)
    }
}

impl<'a> AeadCipher for Ocb<'a> {
    fn enumeral(&self) -> super::AeadModes {
        super::AeadModes::OCB
    }

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()> {
        if key.nonce.is_empty() || key.nonce.len() > 15 {
            return Err(CryptoError::invalid_nonce("Ocb::initialize", "OCB nonce must be 1..=15 bytes"));
        }
        self.cipher.cipher_mut().initialize(true, key)?;

        let mut l_star = [0u8; BLOCK_SIZE];
        self.cipher.cipher().encrypt_block(&[0u8; BLOCK_SIZE], &mut l_star)?;
        self.l = Some(LTable::new(l_star));

        let len = key.nonce.len();
        let mut nonce_block = [0u8; BLOCK_SIZE];
        nonce_block[BLOCK_SIZE - 1 - len] = 0x01;
        nonce_block[BLOCK_SIZE - len..].copy_from_slice(&key.nonce);
        let bottom = nonce_block[BLOCK_SIZE - 1] & 0x3F;
        let mut ktop_in = nonce_block;
        ktop_in[BLOCK_SIZE - 1] &= 0xC0;

        let mut ktop = [0u8; BLOCK_SIZE];
        self.cipher.cipher().encrypt_block(&ktop_in, &mut ktop)?;
        let mut stretch = [0u8; 24];
        stretch[..BLOCK_SIZE].copy_from_slice(&ktop);
        for i in 0..8 {
            stretch[BLOCK_SIZE + i] = ktop[i] ^ ktop[i + 1];
        }
        self.offset0 = Self::extract_bits(&stretch, bottom);

        self.aad.clear();
        self.checksum = [0u8; BLOCK_SIZE];
        self.final_offset = [0u8; BLOCK_SIZE];
        self.encrypt = encrypt;
        self.aad_locked = false;
        self.transformed = false;
        self.initialized = true;
        Ok(())
    }

    fn set_associated_data(&mut self, aad: &[u8]) -> Result<()> {
        if self.aad_locked {
            return Err(CryptoError::illegal_operation("Ocb::set_associated_data", "AAD must be set before transform"));
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoError::not_initialized("Ocb::transform"));
        }
        if self.transformed {
            return Err(CryptoError::illegal_operation("Ocb::transform", "transform may be called only once per session"));
        }
        if input.len() != output.len() {
            return Err(CryptoError::invalid_size("Ocb::transform", "input and output must be the same length"));
        }
        self.aad_locked = true;
        let aad = core::mem::take(&mut self.aad);
        self.aad_hash = self.hash_aad(&aad)?;

        let full_blocks = input.len() / BLOCK_SIZE;
        let remainder = input.len() % BLOCK_SIZE;
        let mut offset = self.offset0;
        let mut checksum = [0u8; BLOCK_SIZE];
        let encrypt = self.encrypt;

        {
            let cipher = self.cipher.cipher();
            let l_table = self.l.as_mut().expect("transform only called after initialize");
            for i in 1..=full_blocks {
                let l_i = l_table.get(ntz(i as u64) as usize);
                for j in 0..BLOCK_SIZE {
                    offset[j] ^= l_i[j];
                }
                let in_chunk = &input[(i - 1) * BLOCK_SIZE..i * BLOCK_SIZE];
                let mut mixed = [0u8; BLOCK_SIZE];
                for j in 0..BLOCK_SIZE {
                    mixed[j] = in_chunk[j] ^ offset[j];
                }
                let mut enc = [0u8; BLOCK_SIZE];
                cipher.encrypt_block(&mixed, &mut enc)?;
                let out_chunk = &mut output[(i - 1) * BLOCK_SIZE..i * BLOCK_SIZE];
                for j in 0..BLOCK_SIZE {
                    out_chunk[j] = enc[j] ^ offset[j];
                }
                let plain_role: &[u8] = if encrypt { in_chunk } else { out_chunk };
                for j in 0..BLOCK_SIZE {
                    checksum[j] ^= plain_role[j];
                }
            }

            let mut final_offset = offset;
            if remainder > 0 {
                let mut star_offset = offset;
                for j in 0..BLOCK_SIZE {
                    star_offset[j] ^= l_table.l_star[j];
                }
                let mut pad = [0u8; BLOCK_SIZE];
                cipher.encrypt_block(&star_offset, &mut pad)?;
                let in_chunk = &input[full_blocks * BLOCK_SIZE..];
                let out_chunk = &mut output[full_blocks * BLOCK_SIZE..];
                for j in 0..remainder {
                    out_chunk[j] = in_chunk[j] ^ pad[j];
                }
                let plain_role: &[u8] = if encrypt { in_chunk } else { out_chunk };
                let mut padded = [0u8; BLOCK_SIZE];
                padded[..remainder].copy_from_slice(plain_role);
                padded[remainder] = 0x80;
                for j in 0..BLOCK_SIZE {
                    checksum[j] ^= padded[j];
                }
                final_offset = star_offset;
            }

            self.checksum = checksum;
            self.final_offset = final_offset;
        }

        self.transformed = true;
        Ok(())
    }

    fn finalize(&mut self, tag_out: &mut [u8]) -> Result<()> {
        if !self.encrypt {
            return Err(CryptoError::illegal_operation("Ocb::finalize", "finalize is for the encrypt direction; use verify"));
        }
        if tag_out.len() < super::MIN_TAG_SIZE || tag_out.len() > super::MAX_TAG_SIZE {
            return Err(CryptoError::invalid_size("Ocb::finalize", "tag length out of range"));
        }
        let tag = self.compute_tag()?;
        tag_out.copy_from_slice(&tag[..tag_out.len()]);
        Ok(())
    }

    fn verify(&mut self, tag: &[u8], output: &mut [u8]) -> Result<()> {
        if self.encrypt {
            return Err(CryptoError::illegal_operation("Ocb::verify", "verify is for the decrypt direction; use finalize"));
        }
        let expected = self.compute_tag()?;
        let ok: bool = expected[..tag.len()].ct_eq(tag).into();
        if !ok {
            output.iter_mut().for_each(|b| *b = 0);
            return Err(CryptoError::authentication_failure("Ocb::verify"));
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl<'a> Ocb<'a> {
    fn compute_tag(&mut self) -> Result<[u8; BLOCK_SIZE]> {
        let l_dollar = self.l.as_ref().expect("compute_tag only called after initialize").l_dollar;
        let mut mixed = [0u8; BLOCK_SIZE];
        for j in 0..BLOCK_SIZE {
            mixed[j] = self.checksum[j] ^ self.final_offset[j] ^ l_dollar[j];
        }
        let mut tag = [0u8; BLOCK_SIZE];
        self.cipher.cipher().encrypt_block(&mixed, &mut tag)?;
        for j in 0..BLOCK_SIZE {
            tag[j] ^= self.aad_hash[j];
        }
        Ok(tag)
    }
}
