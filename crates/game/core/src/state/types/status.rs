//! Status effect table carried by every actor.
//!
//! Effects store `expires_at: Tick` and are considered active while
//! `current_tick < expires_at`. Each effect remembers its source so that the
//! ground unit system can end exactly the effects a footprint applied when an
//! entity leaves it or the footprint is destroyed.

use arrayvec::ArrayVec;

use crate::config::GameConfig;
use crate::state::{EntityId, Tick};
use crate::unit::GroupHandle;

/// Active status effects on an actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<StatusEffect, { GameConfig::MAX_STATUS_EFFECTS }>,
}

/// A single status effect with expiration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Tick at which this effect expires.
    pub expires_at: Tick,
    /// Magnitude (percent reduction, combo opener id, attack bonus, ...).
    pub value: i32,
    pub source: StatusSource,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, expires_at: Tick) -> Self {
        Self {
            kind,
            expires_at,
            value: 0,
            source: StatusSource::Intrinsic,
        }
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }

    pub fn with_source(mut self, source: StatusSource) -> Self {
        self.source = source;
        self
    }
}

/// Who applied a status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusSource {
    /// Applied by the world itself (scripts, equipment, tests).
    #[default]
    Intrinsic,
    /// Applied directly by another actor's skill.
    Actor(EntityId),
    /// Applied by a ground footprint; ends when the footprint lets go.
    Group(GroupHandle),
}

/// Types of status effects understood by the skill system.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    // ========================================================================
    // Crowd control
    // ========================================================================
    /// Cannot act or move.
    Stunned,
    /// Cannot act or move; element temporarily becomes water.
    Frozen,
    /// Cannot act or move until woken.
    Sleep,
    /// Cannot use skills.
    Silenced,
    /// Held in place by a trap; skills remain usable.
    Snared,

    // ========================================================================
    // Debuffs
    // ========================================================================
    Blind,
    Poisoned,
    Burning,

    // ========================================================================
    // Buffs and skill states
    // ========================================================================
    /// Channel status of a performer; its end removes the linked footprint.
    Dancing,
    /// Percent reduction of cast time and post-cast delay.
    CastReduction,
    /// Next cast skips its variable cast time entirely.
    InstantCast,
    /// Follow-up window; `value` is the id of the opening skill.
    Combo,
    /// Flat attack bonus.
    AttackBoost,
    /// Percent bonus to maximum health.
    VitalityBoost,
}

impl StatusKind {
    /// Statuses that prevent starting or continuing a cast.
    pub const fn forbids_casting(self) -> bool {
        matches!(
            self,
            StatusKind::Stunned | StatusKind::Frozen | StatusKind::Sleep | StatusKind::Silenced
        )
    }

    /// Statuses that prevent voluntary movement.
    pub const fn forbids_movement(self) -> bool {
        matches!(
            self,
            StatusKind::Stunned | StatusKind::Frozen | StatusKind::Sleep | StatusKind::Snared
        )
    }

    /// Negative statuses removed by death and resisted by stats.
    pub const fn is_ailment(self) -> bool {
        matches!(
            self,
            StatusKind::Stunned
                | StatusKind::Frozen
                | StatusKind::Sleep
                | StatusKind::Silenced
                | StatusKind::Blind
                | StatusKind::Poisoned
                | StatusKind::Burning
        )
    }
}

impl StatusEffects {
    /// Creates an empty status effect set.
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Checks if a specific status effect is active at the given tick.
    pub fn has(&self, kind: StatusKind, current_tick: Tick) -> bool {
        self.get(kind, current_tick).is_some()
    }

    pub fn get(&self, kind: StatusKind, current_tick: Tick) -> Option<&StatusEffect> {
        self.effects
            .iter()
            .find(|e| e.kind == kind && e.expires_at > current_tick)
    }

    /// Value of an active effect, zero when absent.
    pub fn value_of(&self, kind: StatusKind, current_tick: Tick) -> i32 {
        self.get(kind, current_tick).map_or(0, |e| e.value)
    }

    /// Adds or refreshes a status effect.
    ///
    /// An existing effect of the same kind is replaced: the later expiry wins
    /// and value and source follow the newer application. Returns false when
    /// the table is full.
    pub fn add(&mut self, effect: StatusEffect) -> bool {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.expires_at = existing.expires_at.max(effect.expires_at);
            existing.value = effect.value;
            existing.source = effect.source;
            return true;
        }

        self.effects.try_push(effect).is_ok()
    }

    /// Removes a status effect immediately.
    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(index))
    }

    /// Removes an effect only if it was applied by `source`.
    pub fn remove_from(&mut self, kind: StatusKind, source: StatusSource) -> Option<StatusEffect> {
        let index = self
            .effects
            .iter()
            .position(|e| e.kind == kind && e.source == source)?;
        Some(self.effects.remove(index))
    }

    /// Removes every effect applied by `source`.
    pub fn remove_all_from(&mut self, source: StatusSource) -> Vec<StatusEffect> {
        let mut removed = Vec::new();
        self.effects.retain(|e| {
            if e.source == source {
                removed.push(*e);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Removes all expired status effects at the current tick and returns them.
    pub fn remove_expired(&mut self, current_tick: Tick) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        self.effects.retain(|e| {
            if e.expires_at <= current_tick {
                expired.push(*e);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Removes every ailment (death clears them).
    pub fn clear_ailments(&mut self) -> Vec<StatusEffect> {
        let mut removed = Vec::new();
        self.effects.retain(|e| {
            if e.kind.is_ailment() {
                removed.push(*e);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Removes every effect.
    pub fn clear(&mut self) -> Vec<StatusEffect> {
        self.effects.drain(..).collect()
    }

    /// Returns an iterator over all active effects at the given tick.
    pub fn active_at(&self, current_tick: Tick) -> impl Iterator<Item = &StatusEffect> + '_ {
        self.effects
            .iter()
            .filter(move |e| e.expires_at > current_tick)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
