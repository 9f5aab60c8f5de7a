use core::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// A 64-bit coordinated Snowflake ID.
///
/// - 1 bit reserved (always zero)
/// - 41 bits timestamp (ms since the generator's custom epoch)
/// - 10 bits machine ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21             12 11             0
///              +--------------+----------------+-----------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | machine ID (10) | sequence (12) |
///              +--------------+----------------+-----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// The layout orders time before machine before sequence, so IDs sort
/// approximately by creation time even across machines.
///
/// # Example
///
/// ```
/// use coflake::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.machine_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 10-bit machine ID field. Occupies bits 12
    /// through 21.
    pub const MACHINE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the machine ID to its correct position (bit 12).
    pub const MACHINE_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// The reserved most significant bit.
    pub const RESERVED_MASK: u64 = 1 << 63;

    /// Packs the three fields into one ID. Each field is truncated to its
    /// width.
    pub const fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_id = (machine_id & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_id | sequence,
        }
    }

    /// Extracts the timestamp delta from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the machine ID from the packed ID.
    pub const fn machine_id(&self) -> u64 {
        (self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the absolute Unix timestamp (ms) given the epoch the ID was
    /// minted against.
    pub const fn timestamp_millis(&self, epoch: u64) -> u64 {
        self.timestamp() + epoch
    }

    /// Returns the raw integer.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw integer without validation. See [`Self::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Wraps a raw integer, rejecting values with the reserved bit set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedBitSet`] if bit 63 is set.
    pub fn try_from_raw(raw: u64) -> Result<Self> {
        let id = Self::from_raw(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(Error::ReservedBitSet { raw })
        }
    }

    /// Returns true if the reserved bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Returns the largest timestamp delta the layout can hold.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the largest machine ID the layout can hold.
    pub const fn max_machine_id() -> u64 {
        Self::MACHINE_ID_MASK
    }

    /// Returns the largest sequence the layout can hold.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl TryFrom<u64> for SnowflakeId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        Self::try_from_raw(raw)
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    /// Parses the decimal form, with or without zero padding.
    fn from_str(s: &str) -> Result<Self> {
        let raw: u64 = s.parse()?;
        Self::try_from_raw(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &format_args!("{:#018x} ({})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_documented_scenario() {
        let epoch = 1_600_000_000_000;
        let now = 1_700_000_000_000;
        let id = SnowflakeId::from_components(now - epoch, 5, 1);

        assert_eq!(id.to_raw(), (100_000_000_000 << 22) | (5 << 12) | 1);
        assert_eq!(id.timestamp_millis(epoch), now);
        assert!(id.is_valid());
    }

    #[test]
    fn fields_are_truncated_to_width() {
        let id = SnowflakeId::from_components(u64::MAX, u64::MAX, u64::MAX);
        assert_eq!(id.timestamp(), SnowflakeId::max_timestamp());
        assert_eq!(id.machine_id(), SnowflakeId::max_machine_id());
        assert_eq!(id.sequence(), SnowflakeId::max_sequence());
        // the reserved bit is never set by packing
        assert!(id.is_valid());
        assert_eq!(id.to_raw(), i64::MAX as u64);
    }

    #[test]
    fn ordering_follows_time_then_machine_then_sequence() {
        let a = SnowflakeId::from_components(10, 1023, 4095);
        let b = SnowflakeId::from_components(11, 0, 0);
        let c = SnowflakeId::from_components(11, 0, 1);
        let d = SnowflakeId::from_components(11, 1, 0);
        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn reserved_bit_is_rejected() {
        let err = SnowflakeId::try_from_raw(1 << 63).unwrap_err();
        assert!(matches!(err, Error::ReservedBitSet { .. }));
        assert!(!SnowflakeId::from_raw(u64::MAX).is_valid());
    }

    #[test]
    fn parses_decimal_and_padded_forms() {
        let id = SnowflakeId::from_components(123_456, 7, 89);
        let padded = id.to_padded_string();
        assert_eq!(padded.len(), 20);
        assert_eq!(padded.parse::<SnowflakeId>().unwrap(), id);
        assert_eq!(id.to_string().parse::<SnowflakeId>().unwrap(), id);
        assert!(matches!(
            "not-a-number".parse::<SnowflakeId>(),
            Err(Error::ParseInt(_))
        ));
    }

    #[test]
    fn debug_shows_fields() {
        let id = SnowflakeId::from_components(3, 2, 1);
        let dbg = format!("{id:?}");
        assert!(dbg.contains("timestamp: 3"));
        assert!(dbg.contains("machine_id: 2"));
        assert!(dbg.contains("sequence: 1"));
    }
}
