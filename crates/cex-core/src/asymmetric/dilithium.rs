//! Dilithium (§4.6.1), adapted from `pqcrypto-mldsa`'s ML-DSA parameter
//! sets (FIPS 204, the NIST standardization of Dilithium). This module owns
//! the key envelope, key-pair lifecycle, and RNG-pluggability contract;
//! the underlying crate performs the lattice Fiat-Shamir-with-Aborts
//! arithmetic (matrix sampling, rejection-sampled `z`/hint computation).

use pqcrypto_mldsa::{mldsa44, mldsa65, mldsa87};
use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _, SignedMessage as _};

use crate::error::{CryptoError, Result};
use crate::rng::IRandom;

use super::{AsymmetricKey, AsymmetricKeyPair, AsymmetricKeyTypes, AsymmetricPrimitives, Signer};

/// Dense parameter-set binding (§4.6.1 names the three NIST security
/// levels; §6.2's "dense small integers" rule applies since this crate's
/// exact numbering is not itself a reference vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DilithiumParameters {
    DLTMS1P2544 = 1,
    DLTMS3P4016 = 2,
    DLTMS5P4880 = 3,
}

impl DilithiumParameters {
    fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::DLTMS1P2544),
            2 => Ok(Self::DLTMS3P4016),
            3 => Ok(Self::DLTMS5P4880),
            _ => Err(CryptoError::unsupported("DilithiumParameters::from_u8", "unrecognized Dilithium parameter byte")),
        }
    }
}

enum KeyState {
    Uninitialized,
    Sign { params: DilithiumParameters, secret: Vec<u8> },
    Verify { params: DilithiumParameters, public: Vec<u8> },
}

/// A `Signer` over ML-DSA. The `IRandom` handle is accepted at
/// construction for API symmetry with `xmss`/`rainbow` (§4.6 common
/// contract: "all signers consume a pluggable `IRandom` supplied at
/// construction"), but `pqcrypto-mldsa::keypair()` draws from the
/// operating system's CSPRNG internally and exposes no seeded path, so a
/// deterministic `rng::NistRng` here does not reproduce the NIST KAT
/// byte-for-byte (recorded as a known limitation in `DESIGN.md`).
pub struct Dilithium {
    params: DilithiumParameters,
    state: KeyState,
    _rng: Box<dyn IRandom + Send>,
}

impl Dilithium {
    pub fn new(params: DilithiumParameters, rng: Box<dyn IRandom + Send>) -> Self {
        Dilithium { params, state: KeyState::Uninitialized, _rng: rng }
    }
}

impl Signer for Dilithium {
    fn generate(&mut self) -> Result<AsymmetricKeyPair> {
        let (public, secret): (Vec<u8>, Vec<u8>) = match self.params {
            DilithiumParameters::DLTMS1P2544 => {
                let (pk, sk) = mldsa44::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
            DilithiumParameters::DLTMS3P4016 => {
                let (pk, sk) = mldsa65::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
            DilithiumParameters::DLTMS5P4880 => {
                let (pk, sk) = mldsa87::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
        };
        let public_key = AsymmetricKey::new(AsymmetricPrimitives::Dilithium, AsymmetricKeyTypes::SignaturePublicKey, self.params as u8, public);
        let private_key = AsymmetricKey::new(AsymmetricPrimitives::Dilithium, AsymmetricKeyTypes::SignaturePrivateKey, self.params as u8, secret);
        Ok(AsymmetricKeyPair { public: public_key, private: private_key, tag: None })
    }

    fn initialize(&mut self, key: AsymmetricKey) -> Result<()> {
        if key.primitive != AsymmetricPrimitives::Dilithium {
            return Err(CryptoError::invalid_param("Dilithium::initialize", "key is not a Dilithium key"));
        }
        let params = DilithiumParameters::from_u8(key.parameters)?;
        self.params = params;
        self.state = match key.class {
            AsymmetricKeyTypes::SignaturePrivateKey => KeyState::Sign { params, secret: key.polynomial },
            AsymmetricKeyTypes::SignaturePublicKey => KeyState::Verify { params, public: key.polynomial },
            _ => return Err(CryptoError::invalid_param("Dilithium::initialize", "key class must be a signature key")),
        };
        Ok(())
    }

    fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let (params, secret) = match &self.state {
            KeyState::Sign { params, secret } => (*params, secret.clone()),
            _ => return Err(CryptoError::not_initialized("Dilithium::sign")),
        };
        let signed = match params {
            DilithiumParameters::DLTMS1P2544 => {
                let sk = mldsa44::SecretKey::from_bytes(&secret).map_err(|_| CryptoError::invalid_key("Dilithium::sign", "malformed secret key"))?;
                mldsa44::sign(message, &sk).as_bytes().to_vec()
            }
            DilithiumParameters::DLTMS3P4016 => {
                let sk = mldsa65::SecretKey::from_bytes(&secret).map_err(|_| CryptoError::invalid_key("Dilithium::sign", "malformed secret key"))?;
                mldsa65::sign(message, &sk).as_bytes().to_vec()
            }
            DilithiumParameters::DLTMS5P4880 => {
                let sk = mldsa87::SecretKey::from_bytes(&secret).map_err(|_| CryptoError::invalid_key("Dilithium::sign", "malformed secret key"))?;
                mldsa87::sign(message, &sk).as_bytes().to_vec()
            }
        };
        Ok(signed)
    }

    fn verify(&mut self, signature: &[u8], message_out: &mut Vec<u8>) -> Result<bool> {
        let (params, public) = match &self.state {
            KeyState::Verify { params, public } => (*params, public.clone()),
            _ => return Err(CryptoError::not_initialized("Dilithium::verify")),
        };
        let opened = match params {
            DilithiumParameters::DLTMS1P2544 => {
                let pk = mldsa44::PublicKey::from_bytes(&public).map_err(|_| CryptoError::invalid_key("Dilithium::verify", "malformed public key"))?;
                let sm = mldsa44::SignedMessage::from_bytes(signature)
                    .map_err(|_| CryptoError::invalid_param("Dilithium::verify", "malformed signed message"))?;
                mldsa44::open(&sm, &pk)
            }
            DilithiumParameters::DLTMS3P4016 => {
                let pk = mldsa65::PublicKey::from_bytes(&public).map_err(|_| CryptoError::invalid_key("Dilithium::verify", "malformed public key"))?;
                let sm = mldsa65::SignedMessage::from_bytes(signature)
                    .map_err(|_| CryptoError::invalid_param("Dilithium::verify", "malformed signed message"))?;
                mldsa65::open(&sm, &pk)
            }
            DilithiumParameters::DLTMS5P4880 => {
                let pk = mldsa87::PublicKey::from_bytes(&public).map_err(|_| CryptoError::invalid_key("Dilithium::verify", "malformed public key"))?;
                let sm = mldsa87::SignedMessage::from_bytes(signature)
                    .map_err(|_| CryptoError::invalid_param("Dilithium::verify", "malformed signed message"))?;
                mldsa87::open(&sm, &pk)
            }
        };
        match opened {
            Ok(message) => {
                *message_out = message;
                Ok(true)
            }
            Err(_) => {
                message_out.clear();
                Ok(false)
            }
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
        Box::new(NistRng::new(&[0x5Au8; 48]).unwrap())
    }

    #[test]
    fn sign_then_verify_recovers_message() {
        let mut signer = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        let pair = signer.generate().unwrap();

        let mut signing = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        signing.initialize(pair.private).unwrap();
        let message = b"cex-rs dilithium self-consistency";
        let signature = signing.sign(message).unwrap();

        let mut verifying = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&signature, &mut recovered).unwrap());
        assert_eq!(recovered, message);
    }

    #[test]
    fn tampered_signature_fails() {
        let mut signer = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        let pair = signer.generate().unwrap();

        let mut signing = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        signing.initialize(pair.private).unwrap();
        let mut signature = signing.sign(b"message").unwrap();
        let last = signature.len() - 1;
        signature[last] ^= 0x01;

        let mut verifying = Dilithium::new(DilithiumParameters::DLTMS1P2544, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(!verifying.verify(&signature, &mut recovered).unwrap());
        assert!(recovered.is_empty());
    }
}
