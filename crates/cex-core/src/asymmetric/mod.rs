//! `AsymmetricKey`/`AsymmetricKeyPair`/`Signer` (§3 Data Model, §4.6,
//! §6.1-§6.3): one bit-exact key envelope shared by four signature
//! families. Dilithium and ECDSA-over-Edwards wrap ecosystem crates;
//! XMSS/XMSS-MT and Rainbow are implemented from scratch, grounded on
//! `original_source/CEX/XMSS.h` and `original_source/CEX/Rainbow.h`.

#[cfg(feature = "pq")]
pub mod dilithium;
pub mod ecdsa;
pub mod rainbow;
pub mod xmss;

use crate::error::{CryptoError, Result};
use zeroize::Zeroize;

/// Stable numeric bindings for the asymmetric primitive family. `spec.md`
/// gives no external reference numbering for these four signature
/// families (unlike `BlockCiphers`/`AsymmetricKeyTypes`), so this is this
/// crate's own dense binding, documented the same way `mode::CipherModes`
/// documents its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AsymmetricPrimitives {
    None = 0,
    Dilithium = 1,
    Xmss = 2,
    Rainbow = 3,
    Ecdsa = 4,
}

impl AsymmetricPrimitives {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Dilithium),
            2 => Some(Self::Xmss),
            3 => Some(Self::Rainbow),
            4 => Some(Self::Ecdsa),
            _ => None,
        }
    }
}

/// Stable numeric bindings for the key-class enumeration (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AsymmetricKeyTypes {
    None = 0,
    CipherPrivateKey = 1,
    CipherPublicKey = 2,
    SignaturePrivateKey = 3,
    SignaturePublicKey = 4,
}

impl AsymmetricKeyTypes {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::CipherPrivateKey),
            2 => Some(Self::CipherPublicKey),
            3 => Some(Self::SignaturePrivateKey),
            4 => Some(Self::SignaturePublicKey),
            _ => None,
        }
    }
}

/// An opaque key blob plus metadata (§3 Data Model). `parameters` is
/// scheme-specific; each signer module interprets it against its own dense
/// parameter-set enumeration.
#[derive(Clone)]
pub struct AsymmetricKey {
    pub primitive: AsymmetricPrimitives,
    pub class: AsymmetricKeyTypes,
    pub parameters: u8,
    pub polynomial: Vec<u8>,
}

impl Drop for AsymmetricKey {
    fn drop(&mut self) {
        self.polynomial.zeroize();
    }
}

impl AsymmetricKey {
    pub fn new(primitive: AsymmetricPrimitives, class: AsymmetricKeyTypes, parameters: u8, polynomial: Vec<u8>) -> Self {
        AsymmetricKey { primitive, class, parameters, polynomial }
    }

    /// Bit-exact wire serialization (§6.1): `primitive | class | parameters
    /// | u32-LE length | polynomial bytes`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7 + self.polynomial.len());
        out.push(self.primitive as u8);
        out.push(self.class as u8);
        out.push(self.parameters);
        out.extend_from_slice(&(self.polynomial.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.polynomial);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 7 {
            return Err(CryptoError::invalid_size("AsymmetricKey::from_bytes", "stream shorter than the fixed 7-byte header"));
        }
        let primitive = AsymmetricPrimitives::from_u8(bytes[0])
            .filter(|p| !matches!(p, AsymmetricPrimitives::None))
            .ok_or_else(|| CryptoError::invalid_param("AsymmetricKey::from_bytes", "primitive byte is zero or unrecognized"))?;
        let class = AsymmetricKeyTypes::from_u8(bytes[1])
            .filter(|c| !matches!(c, AsymmetricKeyTypes::None))
            .ok_or_else(|| CryptoError::invalid_param("AsymmetricKey::from_bytes", "class byte is zero or unrecognized"))?;
        let parameters = bytes[2];
        if parameters == 0 {
            return Err(CryptoError::invalid_param("AsymmetricKey::from_bytes", "parameters byte must be non-zero"));
        }
        let len = u32::from_le_bytes(bytes[3..7].try_into().unwrap()) as usize;
        let body = bytes
            .get(7..7 + len)
            .ok_or_else(|| CryptoError::invalid_size("AsymmetricKey::from_bytes", "polynomial length overruns the input"))?;
        Ok(AsymmetricKey { primitive, class, parameters, polynomial: body.to_vec() })
    }
}

/// Owner of a matched public/private pair (§3 Data Model).
pub struct AsymmetricKeyPair {
    pub public: AsymmetricKey,
    pub private: AsymmetricKey,
    pub tag: Option<Vec<u8>>,
}

/// The `Signer` capability (§4.6): generate a pair, initialize with one
/// half, sign or verify. `verify` populates `message_out` with the
/// recovered message on success and clears it on failure.
pub trait Signer {
    fn generate(&mut self) -> Result<AsymmetricKeyPair>;
    fn initialize(&mut self, key: AsymmetricKey) -> Result<()>;
    fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>>;
    fn verify(&mut self, signature: &[u8], message_out: &mut Vec<u8>) -> Result<bool>;
    fn is_initialized(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_serialization_round_trips() {
        let key = AsymmetricKey::new(AsymmetricPrimitives::Dilithium, AsymmetricKeyTypes::SignaturePublicKey, 3, vec![0xABu8; 100]);
        let bytes = key.to_bytes();
        let back = AsymmetricKey::from_bytes(&bytes).unwrap();
        assert_eq!(back.primitive, key.primitive);
        assert_eq!(back.class, key.class);
        assert_eq!(back.parameters, key.parameters);
        assert_eq!(back.polynomial, key.polynomial);
    }

    #[test]
    fn rejects_zero_primitive_class_or_parameters() {
        let mut bytes = AsymmetricKey::new(AsymmetricPrimitives::Xmss, AsymmetricKeyTypes::SignaturePrivateKey, 1, vec![1, 2, 3]).to_bytes();
        bytes[0] = 0;
        assert!(AsymmetricKey::from_bytes(&bytes).is_err());

        bytes[0] = AsymmetricPrimitives::Xmss as u8;
        bytes[1] = 0;
        assert!(AsymmetricKey::from_bytes(&bytes).is_err());

        bytes[1] = AsymmetricKeyTypes::SignaturePrivateKey as u8;
        bytes[2] = 0;
        assert!(AsymmetricKey::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_length_overrunning_input() {
        let mut bytes = AsymmetricKey::new(AsymmetricPrimitives::Rainbow, AsymmetricKeyTypes::SignaturePublicKey, 2, vec![1, 2, 3]).to_bytes();
        bytes[3..7].copy_from_slice(&1_000_000u32.to_le_bytes());
        assert!(AsymmetricKey::from_bytes(&bytes).is_err());
    }
}
