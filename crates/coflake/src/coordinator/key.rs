use core::fmt;

/// The coordinator key for one (prefix, machine id, millisecond) counter.
///
/// Renders as `"{prefix}-{machine_id}-{timestamp}"`, where `timestamp` is the
/// absolute Unix millisecond (not the epoch-relative delta). The format is a
/// wire contract: every process sharing a machine id must render keys the same
/// way or their counters will not meet.
///
/// ```
/// use coflake::SequenceKey;
///
/// let key = SequenceKey::new("orders", 5, 1_700_000_000_000);
/// assert_eq!(key.to_string(), "orders-5-1700000000000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SequenceKey<'a> {
    pub prefix: &'a str,
    pub machine_id: u64,
    pub timestamp: u64,
}

impl<'a> SequenceKey<'a> {
    pub const fn new(prefix: &'a str, machine_id: u64, timestamp: u64) -> Self {
        Self {
            prefix,
            machine_id,
            timestamp,
        }
    }

    /// Renders the key into `buf`, reusing its allocation.
    pub fn write_into(&self, buf: &mut String) {
        use core::fmt::Write;
        buf.clear();
        // Writing into a String cannot fail.
        let _ = write!(buf, "{self}");
    }
}

impl fmt::Display for SequenceKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.prefix, self.machine_id, self.timestamp)
    }
}
