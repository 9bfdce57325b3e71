//! Constant-time finite-field arithmetic and hash/KDF primitives shared by
//! the higher layers (§2: "Primitives (~15%)"). Block ciphers, GHASH/CMAC,
//! and the HX key schedules all compose these.

pub mod gf;
pub mod hkdf;

/// Re-exported hash/XOF primitives. The crate never re-implements SHA-2,
/// SHA-3/SHAKE, or Blake2 — it uses the RustCrypto crates the teacher and
/// the wider example pack already depend on.
pub mod hash {
    pub use sha2::{Digest, Sha256, Sha512};
    pub use sha3::{Sha3_256, Sha3_512, Shake128, Shake256};
    pub use sha3::digest::{ExtendableOutput, Update, XofReader};
    pub use blake2::Blake2b512;
}
