use core::fmt;

use crate::id::SnowflakeId;

/// The fields of a [`SnowflakeId`] resolved against the epoch it was minted
/// with.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedId {
    /// Absolute Unix timestamp in milliseconds.
    pub timestamp_millis: u64,
    pub machine_id: u64,
    pub sequence: u64,
}

impl DecodedId {
    pub const fn new(id: SnowflakeId, epoch: u64) -> Self {
        Self {
            timestamp_millis: id.timestamp_millis(epoch),
            machine_id: id.machine_id(),
            sequence: id.sequence(),
        }
    }
}

impl fmt::Display for DecodedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp={}ms machine_id={} sequence={}",
            self.timestamp_millis, self.machine_id, self.sequence
        )
    }
}
