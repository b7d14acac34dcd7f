mod actor;
mod common;
mod entities;
mod status;

pub use actor::{
    ActorKind, ActorState, ActorStats, Affiliation, EquipmentBonuses, Inventory, ItemId, Relation,
    WeaponClass,
};
pub use common::{Direction, EntityId, Position, ResourceMeter, Tick};
pub use entities::EntitiesState;
pub use status::{StatusEffect, StatusEffects, StatusKind, StatusSource};
