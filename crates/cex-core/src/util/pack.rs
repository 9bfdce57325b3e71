//! Byte/word packing helpers used by the block cipher and mode
//! implementations. All ciphers in this crate operate on 16-byte blocks as
//! four little-endian or big-endian 32-bit words depending on the cipher's
//! native convention (Rijndael/Serpent/Twofish each fix their own).

#[inline]
pub fn u32_to_le_bytes(words: &[u32], out: &mut [u8]) {
    debug_assert_eq!(out.len(), words.len() * 4);
    for (w, chunk) in words.iter().zip(out.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&w.to_le_bytes());
    }
}

#[inline]
pub fn le_bytes_to_u32(bytes: &[u8], out: &mut [u32]) {
    debug_assert_eq!(bytes.len(), out.len() * 4);
    for (chunk, w) in bytes.chunks_exact(4).zip(out.iter_mut()) {
        *w = u32::from_le_bytes(chunk.try_into().unwrap());
    }
}

#[inline]
pub fn u32_to_be_bytes(words: &[u32], out: &mut [u8]) {
    debug_assert_eq!(out.len(), words.len() * 4);
    for (w, chunk) in words.iter().zip(out.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&w.to_be_bytes());
    }
}

#[inline]
pub fn be_bytes_to_u32(bytes: &[u8], out: &mut [u32]) {
    debug_assert_eq!(bytes.len(), out.len() * 4);
    for (chunk, w) in bytes.chunks_exact(4).zip(out.iter_mut()) {
        *w = u32::from_be_bytes(chunk.try_into().unwrap());
    }
}

/// Increments a big-endian counter block in place (CTR mode, §4.2).
#[inline]
pub fn increment_be(block: &mut [u8; 16]) {
    for byte in block.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Increments a little-endian counter block in place (ICM variant of CTR, §4.2).
#[inline]
pub fn increment_le(block: &mut [u8; 16]) {
    for byte in block.iter_mut() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_counter_wraps_high_bytes() {
        let mut block = [0xFFu8; 16];
        increment_be(&mut block);
        assert_eq!(block, [0u8; 16]);
    }

    #[test]
    fn le_counter_increments_low_byte_first() {
        let mut block = [0u8; 16];
        increment_le(&mut block);
        assert_eq!(block[0], 1);
        assert_eq!(&block[1..], &[0u8; 15]);
    }

    #[test]
    fn word_roundtrip() {
        let words = [0x01020304u32, 0xAABBCCDDu32];
        let mut bytes = [0u8; 8];
        u32_to_be_bytes(&words, &mut bytes);
        let mut back = [0u32; 2];
        be_bytes_to_u32(&bytes, &mut back);
        assert_eq!(words, back);
    }
}
