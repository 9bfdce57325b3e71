//! The `Mac` capability (§4.3): keyed authentication tags over an
//! arbitrary-length message, built either directly on a `BlockCipher`
//! (CMAC) or on GF(2^128) multiplication (GHASH/GMAC).

pub mod cmac;
pub mod ghash;
pub mod gmac;

use crate::cipher::SymmetricKey;
use crate::error::Result;

/// Tag width in bytes for every MAC in this crate (§4.3: "`MacSize` is 16
/// bytes for CMAC, GHASH, and GMAC").
pub const MAC_SIZE: usize = 16;

pub trait Mac {
    fn initialize(&mut self, key: &SymmetricKey) -> Result<()>;

    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Consumes all buffered input and writes the `MAC_SIZE`-byte tag to
    /// `out`, then resets internal state so the instance can be reused.
    fn finalize(&mut self, out: &mut [u8]) -> Result<()>;

    fn reset(&mut self);

    fn is_initialized(&self) -> bool;

    fn mac_size(&self) -> usize {
        MAC_SIZE
    }
}
