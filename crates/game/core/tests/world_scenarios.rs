//! End-to-end scenarios driven only through the public `World` API.

use std::sync::Arc;

use game_core::combat::{DamageKind, Element};
use game_core::skill::{
    CastKind, DamageSpec, LevelTable, SkillDefinition, SkillFlags, TargetMask, UnitEffect,
    UnitLayout, UnitSpec, catalog,
};
use game_core::{
    ActorKind, ActorState, ActorStats, CancelReason, EntityId, GameConfig, GameEnv, GroupRemoval,
    MapDimensions, MapOracle, Position, SkillError, SkillEvent, SkillTable, StaticTile,
    TerrainKind, World, ZoneFlags,
};

const CASTER: EntityId = EntityId(1);
const MONSTER: EntityId = EntityId(2);

struct Field;

impl MapOracle for Field {
    fn dimensions(&self) -> MapDimensions {
        MapDimensions::new(40, 40)
    }

    fn tile(&self, position: Position) -> Option<StaticTile> {
        self.dimensions()
            .contains(position)
            .then(|| StaticTile::new(TerrainKind::Floor))
    }

    fn zone(&self, _position: Position) -> ZoneFlags {
        ZoneFlags::empty()
    }
}

fn fire_bolt() -> SkillDefinition {
    SkillDefinition::new(catalog::FIRE_BOLT, "Fire Bolt", CastKind::Targeted)
        .with_range(LevelTable::constant(9))
        .with_cast_time(LevelTable::<u64>::linear(700, 700, 10))
        .with_delay(LevelTable::<u64>::linear(1_000, 200, 10))
        .with_sp(LevelTable::<u32>::linear(12, 2, 10))
        .with_flags(SkillFlags::INTERRUPTIBLE)
        .with_damage(DamageSpec {
            kind: DamageKind::Magical,
            ratio: LevelTable::constant(100),
            hits: LevelTable::new((1..=10).collect()),
            element: Element::Fire,
            ..DamageSpec::default()
        })
}

fn storm_gust() -> SkillDefinition {
    SkillDefinition::new(catalog::STORM_GUST, "Storm Gust", CastKind::Ground)
        .with_range(LevelTable::constant(9))
        .with_cast_time(LevelTable::<u64>::linear(6_000, 1_000, 10))
        .with_sp(LevelTable::constant(78))
        .with_damage(DamageSpec {
            kind: DamageKind::Magical,
            ratio: LevelTable::<u32>::linear(140, 40, 10),
            hits: LevelTable::constant(1),
            element: Element::Water,
            ..DamageSpec::default()
        })
        .with_unit(UnitSpec {
            layout: LevelTable::constant(UnitLayout::Square { radius: 4 }),
            interval_ms: 450,
            lifetime_ms: LevelTable::constant(4_600),
            target: TargetMask::ENEMY,
            effect: UnitEffect::Damage,
            ..UnitSpec::default()
        })
}

fn table(definitions: Vec<SkillDefinition>) -> SkillTable {
    match SkillTable::from_definitions(definitions) {
        Ok(table) => table,
        Err(error) => panic!("invalid table: {error}"),
    }
}

fn world() -> World {
    let mut world = World::new(
        GameConfig::new(),
        table(vec![fire_bolt(), storm_gust()]),
        GameEnv::with_map(Arc::new(Field)),
    );
    world
        .spawn_actor(
            ActorState::new(CASTER, ActorKind::Player, Position::new(10, 10))
                .with_team(1)
                .with_hp(500, 500)
                .with_sp(300, 300)
                .with_stats(ActorStats {
                    level: 50,
                    intelligence: 60,
                    dexterity: 30,
                    magic_attack: 150,
                    ..ActorStats::default()
                }),
        )
        .unwrap();
    world
        .spawn_actor(
            ActorState::new(MONSTER, ActorKind::Monster, Position::new(14, 10))
                .with_team(2)
                .with_hp(100_000, 100_000),
        )
        .unwrap();
    world.drain_events();
    world
}

fn damage_taken(world: &World) -> u32 {
    let hp = world.actor(MONSTER).unwrap().hp;
    hp.maximum - hp.current
}

#[test]
fn cast_lock_then_resolve_then_delay() {
    let mut world = world();

    let ticket = world
        .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 3, MONSTER)
        .unwrap();
    assert!(world.is_blocked(CASTER));
    assert!(
        world
            .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 1, MONSTER)
            .is_err()
    );

    world.advance_to(ticket.completes_at).unwrap();
    assert!(damage_taken(&world) > 0);
    let events = world.drain_events();
    let hits: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            SkillEvent::Damage { hits, .. } => Some(*hits),
            _ => None,
        })
        .collect();
    assert_eq!(hits, vec![3]);

    // Post-cast delay still holds the caster.
    assert!(world.is_blocked(CASTER));
    let ready_at = world.actor(CASTER).unwrap().can_act_at;
    world.advance_to(ready_at).unwrap();
    assert!(!world.is_blocked(CASTER));
}

#[test]
fn damage_interrupts_and_cancel_leaves_no_delay() {
    let mut world = world();

    world
        .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 5, MONSTER)
        .unwrap();
    world.advance_by(100).unwrap();
    world.notify_damage(CASTER, 10).unwrap();

    assert!(!world.is_blocked(CASTER));
    assert_eq!(world.session_count(), 0);
    assert!(world.drain_events().iter().any(|event| matches!(
        event,
        SkillEvent::CastCancelled {
            reason: CancelReason::DamageTaken,
            ..
        }
    )));
    assert_eq!(damage_taken(&world), 0);
}

#[test]
fn reload_does_not_disturb_casts_in_flight() {
    let mut world = world();

    let ticket = world
        .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 1, MONSTER)
        .unwrap();
    let summary = world.reload_skills(table(vec![storm_gust()])).unwrap();
    assert_eq!(summary.removed, vec![catalog::FIRE_BOLT]);

    world.advance_to(ticket.completes_at).unwrap();
    assert!(damage_taken(&world) > 0);

    let ready_at = world.actor(CASTER).unwrap().can_act_at;
    world.advance_to(ready_at).unwrap();
    assert!(
        world
            .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 1, MONSTER)
            .is_err()
    );
}

#[test]
fn ground_unit_ticks_until_its_lifetime_ends() {
    let mut world = world();

    let ticket = world
        .use_skill_on_ground(CASTER, catalog::STORM_GUST, 1, Position::new(14, 12))
        .unwrap();
    world.advance_to(ticket.completes_at).unwrap();
    assert_eq!(world.group_count(), 1);
    assert!(!world.groups_at(Position::new(14, 10)).is_empty());

    world.advance_by(5_000).unwrap();
    let events = world.drain_events();

    let unit_hits = events
        .iter()
        .filter(|event| matches!(event, SkillEvent::Damage { group: Some(_), .. }))
        .count();
    assert!(unit_hits >= 3, "only {unit_hits} hits landed");
    assert!(events.iter().any(|event| matches!(
        event,
        SkillEvent::GroupRemoved {
            reason: GroupRemoval::Expired,
            ..
        }
    )));
    assert_eq!(world.group_count(), 0);
    assert_eq!(world.timer_count(), 0);
}

#[test]
fn shutdown_clears_everything_and_refuses_new_work() {
    let mut world = world();

    world
        .use_skill_on_target(CASTER, catalog::FIRE_BOLT, 1, MONSTER)
        .unwrap();
    world.shutdown();

    assert!(!world.is_running());
    assert_eq!(world.session_count(), 0);
    assert_eq!(world.timer_count(), 0);
    assert_eq!(
        world.use_skill_on_target(CASTER, catalog::FIRE_BOLT, 1, MONSTER),
        Err(SkillError::NotRunning)
    );
    assert_eq!(world.advance(), Err(SkillError::NotRunning));
}
