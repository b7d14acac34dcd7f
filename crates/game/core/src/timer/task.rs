use std::fmt;
use std::sync::Arc;

use crate::cast::SessionId;
use crate::skill::{SkillDefinition, SkillLevel};
use crate::state::{EntityId, Tick};
use crate::unit::GroupHandle;

/// Scheduler-assigned timer identity. Never reused within one scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer:{}", self.0)
    }
}

/// What a timer is tied to. Destroying the owner cancels its timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Entity(EntityId),
    Group(GroupHandle),
    World,
}

/// Payload of a scheduled callback.
///
/// Tasks carry ids, never references: whatever they point at is looked up
/// again when they fire and may be gone by then.
#[derive(Clone, Debug)]
pub enum TimerTask {
    /// A cast session reached its completion tick.
    CastComplete { caster: EntityId, session: SessionId },
    /// One of a multi-hit skill's later hits.
    FollowUpHit {
        caster: EntityId,
        target: EntityId,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        hit: u8,
    },
    /// Periodic evaluation of a ground footprint.
    GroupInterval { group: GroupHandle },
}

impl TimerTask {
    pub fn label(&self) -> &'static str {
        match self {
            TimerTask::CastComplete { .. } => "cast_complete",
            TimerTask::FollowUpHit { .. } => "follow_up_hit",
            TimerTask::GroupInterval { .. } => "group_interval",
        }
    }
}

/// Result of running a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    /// Run the same task again at `due` under the same id.
    Reschedule { due: Tick },
}
