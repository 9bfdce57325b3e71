//! ECDSA-over-Edwards (§4.6.4), adapted from `ed25519-dalek`'s Ed25519
//! implementation. This module owns the key envelope and RNG-pluggability
//! contract around the underlying crate's deterministic-nonce signing and
//! clamped-scalar key generation.

use ed25519_dalek::{Signature, SigningKey, VerifyingKey};

use crate::error::{CryptoError, Result};
use crate::rng::IRandom;

use super::{AsymmetricKey, AsymmetricKeyPair, AsymmetricKeyTypes, AsymmetricPrimitives, Signer};

/// Dense parameter-set binding; Ed25519 is the only curve this adapter
/// exposes (§4.6.4 names "Edwards25519" as the reference curve).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EcdsaParameters {
    Ed25519 = 1,
}

impl EcdsaParameters {
    fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::Ed25519),
            _ => Err(CryptoError::unsupported("EcdsaParameters::from_u8", "unrecognized ECDSA parameter byte")),
        }
    }
}

enum KeyState {
    Uninitialized,
    Sign(SigningKey),
    Verify(VerifyingKey),
}

/// Bridges this crate's `IRandom` to `rand_core::RngCore`/`CryptoRng`, which
/// `SigningKey::generate` requires. `RngCore`'s infallible methods have no
/// channel to report an entropy-source failure, so a `fill` error there
/// surfaces as a panic; this mirrors how `rand`'s own `OsRng` behaves on the
/// same class of failure.
struct RngAdapter<'a>(&'a mut dyn IRandom);

impl<'a> rand_core::RngCore for RngAdapter<'a> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.0.fill(&mut buf).expect("entropy source failure");
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.0.fill(&mut buf).expect("entropy source failure");
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill(dest).expect("entropy source failure");
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.0.fill(dest).map_err(|_| rand_core::Error::new("entropy source failure"))
    }
}

impl<'a> rand_core::CryptoRng for RngAdapter<'a> {}

/// A `Signer` over Ed25519, with the RNG supplied at construction consulted
/// only by `generate` (signing itself is deterministic per RFC 8032).
pub struct Ecdsa {
    state: KeyState,
    rng: Box<dyn IRandom + Send>,
}

impl Ecdsa {
    pub fn new(rng: Box<dyn IRandom + Send>) -> Self {
        Ecdsa { state: KeyState::Uninitialized, rng }
    }
}

impl Signer for Ecdsa {
    fn generate(&mut self) -> Result<AsymmetricKeyPair> {
        let mut adapter = RngAdapter(self.rng.as_mut());
        let signing_key = SigningKey::generate(&mut adapter);
        let verifying_key = signing_key.verifying_key();

        let public = AsymmetricKey::new(
            AsymmetricPrimitives::Ecdsa,
            AsymmetricKeyTypes::SignaturePublicKey,
            EcdsaParameters::Ed25519 as u8,
            verifying_key.to_bytes().to_vec(),
        );
        let private = AsymmetricKey::new(
            AsymmetricPrimitives::Ecdsa,
            AsymmetricKeyTypes::SignaturePrivateKey,
            EcdsaParameters::Ed25519 as u8,
            signing_key.to_bytes().to_vec(),
        );
        Ok(AsymmetricKeyPair { public, private, tag: None })
    }

    fn initialize(&mut self, key: AsymmetricKey) -> Result<()> {
        if key.primitive != AsymmetricPrimitives::Ecdsa {
            return Err(CryptoError::invalid_param("Ecdsa::initialize", "key is not an ECDSA key"));
        }
        let _ = EcdsaParameters::from_u8(key.parameters)?;
        self.state = match key.class {
            AsymmetricKeyTypes::SignaturePrivateKey => {
                let bytes: [u8; 32] = key
                    .polynomial
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::invalid_key("Ecdsa::initialize", "secret key must be 32 bytes"))?;
                KeyState::Sign(SigningKey::from_bytes(&bytes))
            }
            AsymmetricKeyTypes::SignaturePublicKey => {
                let bytes: [u8; 32] = key
                    .polynomial
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::invalid_key("Ecdsa::initialize", "public key must be 32 bytes"))?;
                let verifying_key = VerifyingKey::from_bytes(&bytes)
                    .map_err(|_| CryptoError::invalid_key("Ecdsa::initialize", "malformed Edwards public key"))?;
                KeyState::Verify(verifying_key)
            }
            _ => return Err(CryptoError::invalid_param("Ecdsa::initialize", "key class must be a signature key")),
        };
        Ok(())
    }

    fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        use ed25519_dalek::Signer as _;
        match &self.state {
            KeyState::Sign(signing_key) => {
                let signature = signing_key.sign(message);
                let mut out = Vec::with_capacity(64 + message.len());
                out.extend_from_slice(&signature.to_bytes());
                out.extend_from_slice(message);
                Ok(out)
            }
            _ => Err(CryptoError::not_initialized("Ecdsa::sign")),
        }
    }

    fn verify(&mut self, signature: &[u8], message_out: &mut Vec<u8>) -> Result<bool> {
        use ed25519_dalek::Verifier as _;
        match &self.state {
            KeyState::Verify(verifying_key) => {
                if signature.len() < 64 {
                    return Err(CryptoError::invalid_size("Ecdsa::verify", "signature shorter than the fixed 64-byte Ed25519 signature"));
                }
                let sig_bytes: [u8; 64] = signature[..64].try_into().expect("length checked above");
                let sig = Signature::from_bytes(&sig_bytes);
                let message = &signature[64..];
                match verifying_key.verify(message, &sig) {
                    Ok(()) => {
                        *message_out = message.to_vec();
                        Ok(true)
                    }
                    Err(_) => {
                        message_out.clear();
                        Ok(false)
                    }
                }
            }
            _ => Err(CryptoError::not_initialized("Ecdsa::verify")),
        }
    }

    fn is_initialized(&self) -> bool {
        !matches!(self.state, KeyState::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::NistRng;

    fn rng() -> Box<dyn IRandom + Send> {
        Box::new(NistRng::new(&[0x77u8; 48]).unwrap())
    }

    #[test]
    fn sign_then_verify_recovers_message() {
        let mut signer = Ecdsa::new(rng());
        let pair = signer.generate().unwrap();

        let mut signing = Ecdsa::new(rng());
        signing.initialize(pair.private).unwrap();
        let message = b"cex-rs ecdsa self-consistency";
        let signature = signing.sign(message).unwrap();

        let mut verifying = Ecdsa::new(rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&signature, &mut recovered).unwrap());
        assert_eq!(recovered, message);
    }

    #[test]
    fn tampered_signature_fails() {
        let mut signer = Ecdsa::new(rng());
        let pair = signer.generate().unwrap();

        let mut signing = Ecdsa::new(rng());
        signing.initialize(pair.private).unwrap();
        let mut signature = signing.sign(b"message").unwrap();
        signature[0] ^= 0x01;

        let mut verifying = Ecdsa::new(rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(!verifying.verify(&signature, &mut recovered).unwrap());
        assert!(recovered.is_empty());
    }

    #[test]
    fn rejects_short_signature() {
        let mut signer = Ecdsa::new(rng());
        let pair = signer.generate().unwrap();
        let mut verifying = Ecdsa::new(rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&[0u8; 10], &mut recovered).is_err());
    }
}
