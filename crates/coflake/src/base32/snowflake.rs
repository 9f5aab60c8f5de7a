use core::fmt;

use crate::{
    base32::crockford::{ENCODED_LEN, decode_u64, encode_u64},
    error::Result,
    id::SnowflakeId,
};

impl SnowflakeId {
    /// Returns the 13-character Crockford base32 form of the ID.
    ///
    /// The encoding is fixed-width and upper case, so encoded IDs sort
    /// lexicographically in the same order as the integers.
    ///
    /// # Example
    /// ```
    /// use coflake::SnowflakeId;
    ///
    /// let id = SnowflakeId::from_raw(2_424_242_424_242_424_242);
    /// assert_eq!(id.encode(), "23953MG16DJDJ");
    /// assert_eq!(id.encode().to_string(), "23953MG16DJDJ");
    /// ```
    pub const fn encode(&self) -> Base32Formatter {
        Base32Formatter {
            buf: encode_u64(self.to_raw()),
        }
    }

    /// Decodes a 13-character Crockford base32 string.
    ///
    /// Decoding is case-insensitive and accepts the Crockford aliases `O`,
    /// `I` and `L`.
    ///
    /// # Errors
    ///
    /// - [`Error::Base32`] for a wrong length, a character outside the
    ///   alphabet, or a value wider than 64 bits
    /// - [`Error::ReservedBitSet`] if the value sets the reserved bit
    ///
    /// [`Error::Base32`]: crate::Error::Base32
    /// [`Error::ReservedBitSet`]: crate::Error::ReservedBitSet
    pub fn decode(s: impl AsRef<str>) -> Result<Self> {
        let raw = decode_u64(s.as_ref())?;
        Self::try_from_raw(raw)
    }
}

/// A stack-allocated Crockford base32 rendering of one ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Base32Formatter {
    buf: [u8; ENCODED_LEN],
}

impl Base32Formatter {
    pub fn as_str(&self) -> &str {
        // SAFETY: every byte comes from the ASCII alphabet
        unsafe { core::str::from_utf8_unchecked(&self.buf) }
    }
}

impl AsRef<str> for Base32Formatter {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Base32Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Base32Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Base32Formatter").field(&self.as_str()).finish()
    }
}

impl PartialEq<str> for Base32Formatter {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Base32Formatter {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
