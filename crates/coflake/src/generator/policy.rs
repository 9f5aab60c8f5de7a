/// What a call emits after its millisecond's sequence space is exhausted and
/// the clock has moved on.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RolloverPolicy {
    /// Emit sequence 0 at the new millisecond without asking the coordinator
    /// again.
    ///
    /// Fresh counters start at 1, so slot 0 of every millisecond is reserved
    /// for this path. It is unique as long as at most one caller per machine
    /// id overflows into any given millisecond, which holds for sequential
    /// callers but not for heavy concurrent bursts past 4096 IDs/ms.
    #[default]
    EmitZero,

    /// Take a fresh counter for the new millisecond, exactly like a new call.
    /// Unique under any load; the rollover call never emits sequence 0.
    Reacquire,
}

/// How the generator reacts to a clock reading earlier than a timestamp it
/// has already issued.
///
/// Any policy other than [`RollbackPolicy::Ignore`] keeps one atomic
/// high-water mark per generator. The mark is process-local: it cannot see
/// timestamps issued by other processes sharing the machine id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RollbackPolicy {
    /// Use whatever the clock says. IDs minted during a rollback sort before
    /// IDs already emitted, and a rollback longer than the key TTL can
    /// reissue an ID.
    #[default]
    Ignore,

    /// Fail with [`Error::ClockMovedBackwards`].
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    Reject,

    /// Wait, bounded by the wait timeout, until the clock reaches the last
    /// issued timestamp again.
    Stall,
}
