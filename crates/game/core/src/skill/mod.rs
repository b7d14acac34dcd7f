//! Skill registry: definitions, footprint layouts, per-skill behaviors and the
//! hot-swappable table that holds them.
pub mod behavior;
pub mod catalog;
mod definition;
mod id;
mod layout;
mod registry;

pub use behavior::{
    BehaviorTable, DefaultBehavior, EffectSubject, HitSummary, HookContext, SideEffect,
    SkillBehavior, UnitPlaceAction,
};
pub use definition::{
    CastKind, ComboRule, ComboWaiver, CostTiming, DamageSpec, DelayExemption, ItemCost,
    LevelTable, Requirements, SkillDefinition, SkillFlags, StatusEntry, TargetMask, UnitEffect,
    UnitFlags, UnitSpec,
};
pub use id::{SkillId, SkillLevel};
pub use layout::UnitLayout;
#[cfg(feature = "serde")]
pub use registry::definition_digest;
pub use registry::{RegistryError, ReloadSummary, SkillRegistry, SkillTable};
