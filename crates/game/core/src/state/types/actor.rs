use std::collections::BTreeMap;

use crate::combat::{Element, Race, Size};
use crate::skill::SkillId;
use crate::state::{Direction, EntityId, Position, ResourceMeter, StatusEffects, Tick};

/// Broad classification of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActorKind {
    #[default]
    Player,
    Monster,
    Npc,
}

/// Inventory item identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(pub u32);

/// Equipped weapon class; skills may require one of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponClass {
    #[default]
    Fist,
    Dagger,
    Sword,
    TwoHandSword,
    Spear,
    Axe,
    Mace,
    Staff,
    Bow,
    Knuckle,
    Instrument,
    Whip,
    Book,
    Katar,
}

/// Primary and derived combat statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActorStats {
    pub level: u16,
    pub strength: u16,
    pub agility: u16,
    pub vitality: u16,
    pub intelligence: u16,
    pub dexterity: u16,
    pub luck: u16,
    pub attack: u32,
    pub magic_attack: u32,
    /// Percent physical reduction, capped at 99 when applied.
    pub defense: u32,
    /// Percent magical reduction, capped at 99 when applied.
    pub magic_defense: u32,
    pub hit: u32,
    pub flee: u32,
}

impl Default for ActorStats {
    fn default() -> Self {
        Self {
            level: 1,
            strength: 1,
            agility: 1,
            vitality: 1,
            intelligence: 1,
            dexterity: 1,
            luck: 1,
            attack: 10,
            magic_attack: 10,
            defense: 0,
            magic_defense: 0,
            hit: 10,
            flee: 1,
        }
    }
}

/// Team, party and guild membership used by skill target masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affiliation {
    /// Actors on different teams are enemies.
    pub team: u32,
    pub party: Option<u32>,
    pub guild: Option<u32>,
}

/// Percentage bonuses granted by equipment.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EquipmentBonuses {
    pub versus_race: BTreeMap<Race, i32>,
    pub versus_size: BTreeMap<Size, i32>,
    pub versus_element: BTreeMap<Element, i32>,
    /// Percent reduction of variable cast time.
    pub cast_reduction: i32,
}

/// Items and currency an actor carries.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    items: BTreeMap<ItemId, u32>,
    pub zeny: u64,
}

impl Inventory {
    pub fn count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: ItemId, amount: u32) {
        *self.items.entry(item).or_insert(0) += amount;
    }

    /// Removes `amount` of `item`. Callers check availability first.
    pub fn take(&mut self, item: ItemId, amount: u32) -> bool {
        match self.items.get_mut(&item) {
            Some(count) if *count >= amount => {
                *count -= amount;
                if *count == 0 {
                    self.items.remove(&item);
                }
                true
            }
            _ => false,
        }
    }
}

/// How a skill's target mask sees another actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relation {
    pub is_self: bool,
    pub enemy: bool,
    pub party: bool,
    pub guild: bool,
}

/// Complete per-actor state consumed by the skill system.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorState {
    pub id: EntityId,
    pub kind: ActorKind,
    pub position: Position,
    pub facing: Direction,
    pub hp: ResourceMeter,
    pub sp: ResourceMeter,
    pub stats: ActorStats,
    pub element: Element,
    pub race: Race,
    pub size: Size,
    pub affiliation: Affiliation,
    pub weapon: WeaponClass,
    pub bonuses: EquipmentBonuses,
    pub inventory: Inventory,
    /// Spirit spheres and similar consumable charges.
    pub charges: u8,
    pub statuses: StatusEffects,
    pub cooldowns: BTreeMap<SkillId, Tick>,
    /// Post-cast delay: the actor may not start another skill before this tick.
    pub can_act_at: Tick,
}

impl ActorState {
    pub fn new(id: EntityId, kind: ActorKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            facing: Direction::default(),
            hp: ResourceMeter::full(100),
            sp: ResourceMeter::full(100),
            stats: ActorStats::default(),
            element: Element::Neutral,
            race: Race::DemiHuman,
            size: Size::Medium,
            affiliation: Affiliation::default(),
            weapon: WeaponClass::default(),
            bonuses: EquipmentBonuses::default(),
            inventory: Inventory::default(),
            charges: 0,
            statuses: StatusEffects::empty(),
            cooldowns: BTreeMap::new(),
            can_act_at: Tick::ZERO,
        }
    }

    pub fn with_stats(mut self, stats: ActorStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_hp(mut self, current: u32, maximum: u32) -> Self {
        self.hp = ResourceMeter::new(current, maximum);
        self
    }

    pub fn with_sp(mut self, current: u32, maximum: u32) -> Self {
        self.sp = ResourceMeter::new(current, maximum);
        self
    }

    pub fn with_team(mut self, team: u32) -> Self {
        self.affiliation.team = team;
        self
    }

    pub fn with_party(mut self, party: u32) -> Self {
        self.affiliation.party = Some(party);
        self
    }

    pub fn with_guild(mut self, guild: u32) -> Self {
        self.affiliation.guild = Some(guild);
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponClass) -> Self {
        self.weapon = weapon;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_race(mut self, race: Race, size: Size) -> Self {
        self.race = race;
        self.size = size;
        self
    }

    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_item(mut self, item: ItemId, amount: u32) -> Self {
        self.inventory.add(item, amount);
        self
    }

    pub fn with_zeny(mut self, zeny: u64) -> Self {
        self.inventory.zeny = zeny;
        self
    }

    pub fn with_charges(mut self, charges: u8) -> Self {
        self.charges = charges;
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.hp.is_empty()
    }

    pub fn cooldown_until(&self, skill: SkillId) -> Option<Tick> {
        self.cooldowns.get(&skill).copied()
    }

    /// First active status that forbids casting, if any.
    pub fn casting_blocker(&self, now: Tick) -> Option<crate::state::StatusKind> {
        self.statuses
            .active_at(now)
            .map(|e| e.kind)
            .find(|kind| kind.forbids_casting())
    }

    pub fn movement_blocker(&self, now: Tick) -> Option<crate::state::StatusKind> {
        self.statuses
            .active_at(now)
            .map(|e| e.kind)
            .find(|kind| kind.forbids_movement())
    }

    pub fn relation_to(&self, other: &ActorState) -> Relation {
        let is_self = self.id == other.id;
        let shared = |a: Option<u32>, b: Option<u32>| matches!((a, b), (Some(x), Some(y)) if x == y);
        Relation {
            is_self,
            enemy: !is_self && self.affiliation.team != other.affiliation.team,
            party: !is_self && shared(self.affiliation.party, other.affiliation.party),
            guild: !is_self && shared(self.affiliation.guild, other.affiliation.guild),
        }
    }
}
