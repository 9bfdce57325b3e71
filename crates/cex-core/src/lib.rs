//! `cex-core`: the symmetric and post-quantum cryptographic core of the
//! CEX library — block ciphers, cipher modes, MACs, AEAD constructions, a
//! block-cipher-counter DRBG, and four asymmetric signature schemes.
//!
//! Every primitive is reached through a small trait surface
//! ([`cipher::BlockCipher`], [`mode::CipherMode`], [`mac::Mac`],
//! [`aead::AeadCipher`], [`drbg::Drbg`], [`asymmetric::Signer`]) rather
//! than free functions, so callers can swap an implementation without
//! touching call sites. Fallible operations return [`error::Result`]; this
//! crate never panics on adversary-controlled input.

pub mod aead;
pub mod asymmetric;
pub mod cipher;
pub mod drbg;
pub mod error;
pub mod mac;
pub mod mode;
pub mod primitives;
pub mod rng;
pub mod util;

pub use aead::{AeadCipher, AeadModes};
pub use asymmetric::{AsymmetricKey, AsymmetricKeyPair, AsymmetricKeyTypes, AsymmetricPrimitives, Signer};
pub use cipher::{BlockCipher, BlockCiphers, SymmetricKey, BLOCK_SIZE};
pub use drbg::{Bcg, Drbg};
pub use error::{CryptoError, CryptoErrorKind, Result};
pub use mac::{Mac, MAC_SIZE};
pub use mode::{CipherMode, CipherModes};
pub use rng::{IRandom, NistRng, OsRandom};
