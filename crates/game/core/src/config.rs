/// Skill-system configuration constants and tunable parameters.
///
/// Durations are expressed in milliseconds, which is also the unit of
/// [`Tick`](crate::state::Tick).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Length of one world step. `World::advance` moves the clock by this amount.
    pub tick_ms: u64,

    /// Global cast-time rate in percent (100 = unchanged).
    pub cast_rate: u32,

    /// Global post-cast delay rate in percent (100 = unchanged).
    pub delay_rate: u32,

    /// Dexterity at which variable cast time reaches zero.
    pub dex_cast_scale: u32,

    /// Whether post-cast delay is scaled by dexterity like cast time.
    pub delay_depends_on_dex: bool,

    /// Floor applied to every post-cast delay.
    pub min_delay_ms: u64,

    /// Remaining lifetime given to a trap cell after its latched victim leaves.
    pub trap_spent_ms: u64,

    /// Spacing between follow-up hits of multi-hit skills.
    pub follow_up_interval_ms: u64,

    /// Default cap of concurrent groups per caster per skill.
    pub max_groups_per_skill: usize,

    /// Total number of live unit groups in the world.
    pub max_unit_groups: usize,

    /// Upper bound of the group id counter before it wraps.
    pub group_id_bound: u32,

    /// Maximum number of concurrent cast sessions.
    pub max_cast_sessions: usize,

    /// Tickset size at which a group starts pruning entries whose interval
    /// has elapsed.
    pub tickset_capacity: usize,

    /// Maximum nesting of cell triggers (knockback into another footprint, etc).
    pub max_trigger_depth: u32,

    /// Seed mixed into every random roll.
    pub world_seed: u64,
}

impl GameConfig {
    // ===== compile-time constants =====
    pub const MAX_SKILL_LEVEL: u8 = 10;
    pub const MAX_STATUS_EFFECTS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_MS: u64 = 20;
    pub const DEFAULT_DEX_CAST_SCALE: u32 = 150;
    pub const DEFAULT_MIN_DELAY_MS: u64 = 100;
    pub const DEFAULT_TRAP_SPENT_MS: u64 = 1_500;
    pub const DEFAULT_FOLLOW_UP_INTERVAL_MS: u64 = 200;
    pub const DEFAULT_MAX_GROUPS_PER_SKILL: usize = 25;
    pub const DEFAULT_MAX_UNIT_GROUPS: usize = 4_096;
    pub const DEFAULT_GROUP_ID_BOUND: u32 = 65_535;
    pub const DEFAULT_MAX_CAST_SESSIONS: usize = 4_096;
    pub const DEFAULT_TICKSET_CAPACITY: usize = 25;
    pub const DEFAULT_MAX_TRIGGER_DEPTH: u32 = 8;

    pub fn new() -> Self {
        Self {
            tick_ms: Self::DEFAULT_TICK_MS,
            cast_rate: 100,
            delay_rate: 100,
            dex_cast_scale: Self::DEFAULT_DEX_CAST_SCALE,
            delay_depends_on_dex: false,
            min_delay_ms: Self::DEFAULT_MIN_DELAY_MS,
            trap_spent_ms: Self::DEFAULT_TRAP_SPENT_MS,
            follow_up_interval_ms: Self::DEFAULT_FOLLOW_UP_INTERVAL_MS,
            max_groups_per_skill: Self::DEFAULT_MAX_GROUPS_PER_SKILL,
            max_unit_groups: Self::DEFAULT_MAX_UNIT_GROUPS,
            group_id_bound: Self::DEFAULT_GROUP_ID_BOUND,
            max_cast_sessions: Self::DEFAULT_MAX_CAST_SESSIONS,
            tickset_capacity: Self::DEFAULT_TICKSET_CAPACITY,
            max_trigger_depth: Self::DEFAULT_MAX_TRIGGER_DEPTH,
            world_seed: 0,
        }
    }

    pub fn with_seed(mut self, world_seed: u64) -> Self {
        self.world_seed = world_seed;
        self
    }

    pub fn with_group_id_bound(mut self, bound: u32) -> Self {
        self.group_id_bound = bound.max(1);
        self
    }

    pub fn with_max_unit_groups(mut self, limit: usize) -> Self {
        self.max_unit_groups = limit;
        self
    }

    pub fn with_max_cast_sessions(mut self, limit: usize) -> Self {
        self.max_cast_sessions = limit;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
