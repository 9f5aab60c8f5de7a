use crate::base32::Base32Error;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NO_VALUE: u8 = 255;
const BITS_PER_CHAR: u32 = 5;

/// Characters needed for 64 bits: ceil(64 / 5).
pub(crate) const ENCODED_LEN: usize = 13;

/// Lookup table for Crockford base32 decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    // Main alphabet, allow lower-case
    while i < 32 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    // Crockford-specific aliases
    lut[b'O' as usize] = 0;
    lut[b'o' as usize] = 0;
    lut[b'I' as usize] = 1;
    lut[b'i' as usize] = 1;
    lut[b'L' as usize] = 1;
    lut[b'l' as usize] = 1;
    lut
};

/// Encodes `value` as 13 upper-case Crockford characters, most significant
/// first. The output is fixed-width, so it sorts like the integer.
pub(crate) const fn encode_u64(value: u64) -> [u8; ENCODED_LEN] {
    let mut buf = [0_u8; ENCODED_LEN];
    let mut i = ENCODED_LEN;
    let mut acc = value;
    while i > 0 {
        i -= 1;
        buf[i] = ALPHABET[(acc & 0x1F) as usize];
        acc >>= BITS_PER_CHAR;
    }
    buf
}

/// Decodes exactly 13 Crockford characters. Lower case and the `O`, `I`, `L`
/// aliases are accepted.
pub(crate) fn decode_u64(encoded: &str) -> Result<u64, Base32Error> {
    let bytes = encoded.as_bytes();
    if bytes.len() != ENCODED_LEN {
        return Err(Base32Error::DecodeInvalidLen { len: bytes.len() });
    }

    let mut acc = 0_u64;
    for (index, &byte) in bytes.iter().enumerate() {
        let val = LOOKUP[byte as usize];
        if val == NO_VALUE {
            return Err(Base32Error::DecodeInvalidAscii { byte, index });
        }
        // 13 * 5 = 65 bits, so the leading character carries one spare bit
        if index == 0 && val > 0x0F {
            return Err(Base32Error::DecodeOverflow);
        }
        acc = (acc << BITS_PER_CHAR) | u64::from(val);
    }
    Ok(acc)
}
