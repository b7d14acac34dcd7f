/// Counters for things the world absorbs instead of reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    pub casts_started: u64,
    pub casts_completed: u64,
    pub casts_cancelled: u64,
    /// Timers that fired for a session, actor or group that no longer exists.
    pub timers_absorbed: u64,
    pub groups_created: u64,
    pub groups_removed: u64,
    pub placement_failures: u64,
    /// Cell triggers skipped because nesting went too deep.
    pub trigger_depth_overruns: u64,
}
