//! Shared fixtures for unit tests: an open test map, stock actors and a small
//! skill table covering every footprint and cast shape.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::combat::{DamageKind, Element};
use crate::config::GameConfig;
use crate::env::{GameEnv, MapDimensions, MapOracle, StaticTile, TerrainKind, ZoneFlags};
use crate::events::SkillEvent;
use crate::skill::{
    CastKind, ComboRule, ComboWaiver, DamageSpec, LevelTable, SkillDefinition, SkillFlags, SkillTable,
    StatusEntry, TargetMask, UnitEffect, UnitFlags, UnitLayout, UnitSpec, catalog,
};
use crate::state::{ActorKind, ActorState, ActorStats, EntityId, Position, StatusKind, Tick};
use crate::world::World;

// ============================================================================
// Map
// ============================================================================

/// Floor everywhere except the listed walls.
#[derive(Clone, Debug, Default)]
pub struct OpenField {
    width: u32,
    height: u32,
    walls: HashSet<Position>,
    zones: HashMap<Position, ZoneFlags>,
}

impl OpenField {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_wall(mut self, position: Position) -> Self {
        self.walls.insert(position);
        self
    }

    pub fn with_zone(mut self, position: Position, flags: ZoneFlags) -> Self {
        self.zones.insert(position, flags);
        self
    }
}

impl MapOracle for OpenField {
    fn dimensions(&self) -> MapDimensions {
        MapDimensions::new(self.width, self.height)
    }

    fn tile(&self, position: Position) -> Option<StaticTile> {
        if !self.dimensions().contains(position) {
            return None;
        }
        let terrain = if self.walls.contains(&position) {
            TerrainKind::Wall
        } else {
            TerrainKind::Floor
        };
        Some(StaticTile::new(terrain))
    }

    fn zone(&self, position: Position) -> ZoneFlags {
        self.zones.get(&position).copied().unwrap_or_default()
    }
}

// ============================================================================
// Actors
// ============================================================================

/// A team 1 player with enough of everything for the stock skills.
pub fn hero(id: u32, position: Position) -> ActorState {
    ActorState::new(EntityId(id), ActorKind::Player, position)
        .with_team(1)
        .with_hp(500, 500)
        .with_sp(300, 300)
        .with_stats(ActorStats {
            level: 50,
            strength: 40,
            agility: 30,
            vitality: 30,
            intelligence: 60,
            dexterity: 30,
            luck: 10,
            attack: 120,
            magic_attack: 150,
            hit: 80,
            flee: 40,
            ..ActorStats::default()
        })
}

/// A team 2 monster with no stats.
pub fn target_dummy(id: u32, position: Position) -> ActorState {
    ActorState::new(EntityId(id), ActorKind::Monster, position)
        .with_team(2)
        .with_hp(300, 300)
}

// ============================================================================
// Skills
// ============================================================================

fn bolt(id: crate::skill::SkillId, name: &str, element: Element) -> SkillDefinition {
    SkillDefinition::new(id, name, CastKind::Targeted)
        .with_range(LevelTable::constant(9))
        .with_cast_time(LevelTable::<u64>::linear(700, 700, 10))
        .with_delay(LevelTable::<u64>::linear(1_000, 200, 10))
        .with_sp(LevelTable::<u32>::linear(12, 2, 10))
        .with_flags(SkillFlags::INTERRUPTIBLE)
        .with_damage(DamageSpec {
            kind: DamageKind::Magical,
            ratio: LevelTable::constant(100),
            hits: LevelTable::constant(1),
            element,
            ..DamageSpec::default()
        })
}

/// The stock table used by world tests.
pub fn skill_table() -> SkillTable {
    let mut cold_bolt = bolt(catalog::COLD_BOLT, "Cold Bolt", Element::Water);
    cold_bolt.follow_up_hits = LevelTable::new((0..10).collect());

    let heal = SkillDefinition::new(catalog::HEAL, "Heal", CastKind::Targeted)
        .with_target(TargetMask::FRIEND)
        .with_range(LevelTable::constant(9))
        .with_sp(LevelTable::<u32>::linear(13, 3, 10))
        .with_damage(DamageSpec {
            kind: DamageKind::Heal,
            ratio: LevelTable::<u32>::linear(150, 100, 10),
            ..DamageSpec::default()
        });

    let mut magnum_break = SkillDefinition::new(catalog::MAGNUM_BREAK, "Magnum Break", CastKind::SelfCast)
        .with_target(TargetMask::ENEMY)
        .with_sp(LevelTable::constant(30))
        .with_delay(LevelTable::constant(2_000))
        .with_knockback(LevelTable::constant(2))
        .with_damage(DamageSpec {
            kind: DamageKind::Physical,
            ratio: LevelTable::<u32>::linear(120, 20, 10),
            hits: LevelTable::constant(1),
            element: Element::Fire,
            area: LevelTable::constant(2),
            ..DamageSpec::default()
        });
    magnum_break.requirements.hp = LevelTable::constant(15);

    let jupitel = SkillDefinition::new(catalog::JUPITEL_THUNDER, "Jupitel Thunder", CastKind::Targeted)
        .with_range(LevelTable::constant(9))
        .with_cast_time(LevelTable::<u64>::linear(2_500, 500, 10))
        .with_sp(LevelTable::<u32>::linear(20, 3, 10))
        .with_knockback(LevelTable::new(vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 11]))
        .with_damage(DamageSpec {
            kind: DamageKind::Magical,
            ratio: LevelTable::constant(100),
            hits: LevelTable::new(vec![3, 4, 5, 6, 7, 8, 9, 10, 11, 12]),
            element: Element::Wind,
            ..DamageSpec::default()
        });

    let storm_gust = SkillDefinition::new(catalog::STORM_GUST, "Storm Gust", CastKind::Ground)
        .with_range(LevelTable::constant(9))
        .with_cast_time(LevelTable::<u64>::linear(6_000, 1_000, 10))
        .with_delay(LevelTable::constant(1_000))
        .with_sp(LevelTable::constant(78))
        .with_flags(SkillFlags::INTERRUPTIBLE)
        .with_damage(DamageSpec {
            kind: DamageKind::Magical,
            ratio: LevelTable::<u32>::linear(140, 40, 10),
            hits: LevelTable::constant(1),
            element: Element::Water,
            ..DamageSpec::default()
        })
        .with_status(StatusEntry::new(
            StatusKind::Frozen,
            LevelTable::constant(150),
            LevelTable::constant(3_000),
        ))
        .with_unit(UnitSpec {
            layout: LevelTable::constant(UnitLayout::Square { radius: 4 }),
            interval_ms: 450,
            lifetime_ms: LevelTable::constant(4_600),
            target: TargetMask::ENEMY,
            effect: UnitEffect::Damage,
            ..UnitSpec::default()
        });

    let ankle_snare = SkillDefinition::new(catalog::ANKLE_SNARE, "Ankle Snare", CastKind::Ground)
        .with_range(LevelTable::constant(5))
        .with_sp(LevelTable::constant(12))
        .with_delay(LevelTable::constant(500))
        .with_flags(SkillFlags::TRAP)
        .with_unit(UnitSpec {
            layout: LevelTable::constant(UnitLayout::Diamond { radius: 1 }),
            lifetime_ms: LevelTable::constant(30_000),
            target: TargetMask::ENEMY,
            flags: UnitFlags::NO_REITERATION | UnitFlags::NO_FOOTSET,
            effect: UnitEffect::Snare {
                duration: LevelTable::<u64>::linear(4_000, 1_000, 5),
            },
            ..UnitSpec::default()
        })
        .with_max_level(5);

    let land_protector = SkillDefinition::new(catalog::LAND_PROTECTOR, "Land Protector", CastKind::Ground)
        .with_range(LevelTable::constant(9))
        .with_sp(LevelTable::constant(66))
        .with_unit(UnitSpec {
            layout: LevelTable::constant(UnitLayout::Square { radius: 3 }),
            lifetime_ms: LevelTable::constant(60_000),
            flags: UnitFlags::CLEANSE,
            ..UnitSpec::default()
        });

    let bragi = SkillDefinition::new(catalog::POEM_OF_BRAGI, "A Poem of Bragi", CastKind::SelfCast)
        .with_sp(LevelTable::<u32>::linear(40, 5, 10))
        .with_channel(StatusKind::Dancing)
        .with_unit(UnitSpec {
            layout: LevelTable::constant(UnitLayout::Square { radius: 3 }),
            interval_ms: 1_000,
            lifetime_ms: LevelTable::constant(180_000),
            target: TargetMask::ALLY | TargetMask::PARTY | TargetMask::GUILD,
            effect: UnitEffect::ZoneStatus {
                kind: StatusKind::CastReduction,
                value: LevelTable::<i32>::new((1..=10).map(|lv| 3 * lv).collect()),
            },
            ..UnitSpec::default()
        });

    let triple_attack = SkillDefinition::new(catalog::TRIPLE_ATTACK, "Raging Trifecta Blow", CastKind::Targeted)
        .with_range(LevelTable::constant(1))
        .with_delay(LevelTable::constant(300))
        .with_damage(DamageSpec {
            kind: DamageKind::Physical,
            ratio: LevelTable::<u32>::linear(120, 20, 10),
            hits: LevelTable::constant(3),
            ..DamageSpec::default()
        });

    let chain_combo = SkillDefinition::new(catalog::CHAIN_COMBO, "Raging Quadruple Blow", CastKind::Targeted)
        .with_range(LevelTable::constant(1))
        .with_sp(LevelTable::constant(11))
        .with_combo(ComboRule {
            follows: catalog::TRIPLE_ATTACK,
            waive: ComboWaiver::RANGE | ComboWaiver::CAST_TIME,
        })
        .with_damage(DamageSpec {
            kind: DamageKind::Physical,
            ratio: LevelTable::<u32>::linear(200, 50, 5),
            hits: LevelTable::constant(4),
            ..DamageSpec::default()
        })
        .with_max_level(5);

    let definitions = vec![
        bolt(catalog::FIRE_BOLT, "Fire Bolt", Element::Fire),
        cold_bolt,
        heal,
        magnum_break,
        jupitel,
        storm_gust,
        ankle_snare,
        land_protector,
        bragi,
        triple_attack,
        chain_combo,
    ];
    match SkillTable::from_definitions(definitions) {
        Ok(table) => table,
        Err(error) => panic!("stock test table is invalid: {error}"),
    }
}

// ============================================================================
// World fixture
// ============================================================================

/// A world on an open 30x30 field with the stock skill table.
pub struct Fixture {
    pub world: World,
}

impl Fixture {
    pub fn new() -> Self {
        Self::on(OpenField::new(30, 30))
    }

    pub fn on(map: OpenField) -> Self {
        Self::build(map, GameConfig::new())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::build(OpenField::new(30, 30), config)
    }

    fn build(map: OpenField, config: GameConfig) -> Self {
        let env = GameEnv::with_map(Arc::new(map));
        Self {
            world: World::new(config, skill_table(), env),
        }
    }

    pub fn spawn(&mut self, actor: ActorState) -> EntityId {
        let id = actor.id;
        self.world.spawn_actor(actor).expect("spawn actor");
        id
    }

    pub fn drain(&mut self) -> Vec<SkillEvent> {
        self.world.drain_events()
    }

    pub fn run_until(&mut self, tick: Tick) {
        self.world.advance_to(tick).expect("advance clock");
    }

    pub fn run_for(&mut self, ms: u64) {
        self.world.advance_by(ms).expect("advance clock");
    }

    /// Runs until `id` is past its post-cast delay.
    pub fn wait_until_ready(&mut self, id: EntityId) {
        let until = self.world.actor(id).map_or(Tick::ZERO, |actor| actor.can_act_at);
        self.run_until(until);
    }
}
