/// Failures decoding a Crockford base32 string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Base32Error {
    #[error("invalid length: expected 13 characters, got {len}")]
    DecodeInvalidLen { len: usize },

    #[error("invalid ascii byte {byte:#04x} at index {index}")]
    DecodeInvalidAscii { byte: u8, index: usize },

    /// The string encodes a value wider than 64 bits.
    #[error("decoded value does not fit in 64 bits")]
    DecodeOverflow,
}
