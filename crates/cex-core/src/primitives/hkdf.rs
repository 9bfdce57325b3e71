//! HKDF-Expand wrapper used by the HX block-cipher key schedules (§4.1) and
//! by the BCG reseed mixing step (§4.5). Thin adapter over the `hkdf` crate
//! so the HX modules can stay generic over the hash the caller selects
//! (`HashId`, per the §9 design note on HX/hash coupling).

use crate::error::{CryptoError, Result};
use blake2::Blake2b512;
use hkdf::Hkdf;
use sha2::{Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};

/// Hash primitive selectable for an HX key schedule or BCG reseed mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashId {
    Sha256,
    Sha512,
    Sha3_256,
    Sha3_512,
    Blake2b512,
}

impl HashId {
    pub fn digest_size(self) -> usize {
        match self {
            HashId::Sha256 | HashId::Sha3_256 => 32,
            HashId::Sha512 | HashId::Sha3_512 | HashId::Blake2b512 => 64,
        }
    }
}

/// Runs HKDF-Expand (no Extract step: salt is empty per §4.1) over `ikm`
/// with the given `info`, filling `out` with expanded key material.
pub fn hkdf_expand(hash: HashId, ikm: &[u8], info: &[u8], out: &mut [u8]) -> Result<()> {
    hkdf_expand_with_salt(hash, None, ikm, info, out)
}

/// Full HKDF-Extract-then-Expand with an explicit salt, used by the BCG
/// reseed mix (§4.5: "mixes it into the current key via HKDF with salt =
/// previous counter").
pub fn hkdf_expand_with_salt(hash: HashId, salt: Option<&[u8]>, ikm: &[u8], info: &[u8], out: &mut [u8]) -> Result<()> {
    let result = match hash {
        HashId::Sha256 => {
            let hk = Hkdf::<Sha256>::new(salt, ikm);
            hk.expand(info, out)
        }
        HashId::Sha512 => {
            let hk = Hkdf::<Sha512>::new(salt, ikm);
            hk.expand(info, out)
        }
        HashId::Sha3_256 => {
            let hk = Hkdf::<Sha3_256>::new(salt, ikm);
            hk.expand(info, out)
        }
        HashId::Sha3_512 => {
            let hk = Hkdf::<Sha3_512>::new(salt, ikm);
            hk.expand(info, out)
        }
        HashId::Blake2b512 => {
            let hk = Hkdf::<Blake2b512>::new(salt, ikm);
            hk.expand(info, out)
        }
    };
    result.map_err(|_| CryptoError::invalid_size("hkdf_expand", "requested output exceeds 255 * digest_size"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_is_deterministic() {
        let ikm = b"some-input-key-material-0123456789";
        let info = b"cex-rs/hx/test";
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        hkdf_expand(HashId::Sha256, ikm, info, &mut a).unwrap();
        hkdf_expand(HashId::Sha256, ikm, info, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_info_gives_different_output() {
        let ikm = b"some-input-key-material-0123456789";
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        hkdf_expand(HashId::Sha256, ikm, b"a", &mut a).unwrap();
        hkdf_expand(HashId::Sha256, ikm, b"b", &mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn blake2b512_expansion_is_deterministic() {
        let ikm = b"some-input-key-material-0123456789";
        let info = b"cex-rs/hx/blake2";
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        hkdf_expand(HashId::Blake2b512, ikm, info, &mut a).unwrap();
        hkdf_expand(HashId::Blake2b512, ikm, info, &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(HashId::Blake2b512.digest_size(), 64);
    }
}
