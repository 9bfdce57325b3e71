//! The `AeadCipher` capability (§4.4, §3 Data Model): authenticated
//! encryption composing a cipher mode (or, for OCB, its own offset engine)
//! with a MAC. Every scheme in this crate requires its entire message in
//! one `transform` call — AAD is fixed beforehand via
//! `set_associated_data`, and `finalize`/`verify` close the session.

pub mod eax;
pub mod gcm;
pub mod ocb;

use crate::cipher::SymmetricKey;
use crate::error::Result;

pub const MIN_TAG_SIZE: usize = 12;
pub const MAX_TAG_SIZE: usize = 16;

/// Stable numeric bindings for the AEAD-scheme enumeration (§6.2), the
/// `AeadCipher` counterpart of `mode::CipherModes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AeadModes {
    None = 0,
    EAX = 1,
    GCM = 2,
    OCB = 3,
}

pub trait AeadCipher {
    fn enumeral(&self) -> AeadModes;

    fn initialize(&mut self, encrypt: bool, key: &SymmetricKey) -> Result<()>;

    /// Accepted only before the (single) `transform` call for this session.
    fn set_associated_data(&mut self, aad: &[u8]) -> Result<()>;

    /// Processes the entire plaintext (encrypt) or ciphertext (decrypt) in
    /// one call. May be called exactly once per `initialize`.
    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()>;

    /// Encrypt-direction only: writes the authentication tag.
    fn finalize(&mut self, tag_out: &mut [u8]) -> Result<()>;

    /// Decrypt-direction only: checks `tag` in constant time against the
    /// value computed from the preceding `transform` call. On mismatch,
    /// zeroises `output` (which must be the same buffer `transform` wrote
    /// plaintext into) and returns `AuthenticationFailure`.
    fn verify(&mut self, tag: &[u8], output: &mut [u8]) -> Result<()>;

    fn is_initialized(&self) -> bool;
}
