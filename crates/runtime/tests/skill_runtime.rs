use std::time::Duration;

use game_content::SkillTableLoader;
use game_core::skill::catalog;
use game_core::state::ItemId;
use game_core::{
    ActorKind, ActorState, ActorStats, CastRequest, EntityId, GroupRemoval, Position, SkillError,
    SkillEvent, SkillId,
};
use runtime::{
    Event, MapOracleImpl, Runtime, RuntimeConfig, RuntimeError, ScriptedCastProvider, Topic,
};
use tokio::sync::broadcast;

const CASTER: EntityId = EntityId(1);
const MONSTER: EntityId = EntityId(2);

fn wizard() -> ActorState {
    ActorState::new(CASTER, ActorKind::Player, Position::new(5, 5))
        .with_team(1)
        .with_hp(500, 500)
        .with_sp(300, 300)
        .with_item(ItemId(1065), 3)
        .with_stats(ActorStats {
            level: 50,
            intelligence: 60,
            dexterity: 30,
            magic_attack: 150,
            hit: 80,
            ..ActorStats::default()
        })
}

fn monster() -> ActorState {
    ActorState::new(MONSTER, ActorKind::Monster, Position::new(8, 5))
        .with_team(2)
        .with_hp(5_000, 5_000)
}

async fn start(config: RuntimeConfig) -> Runtime {
    Runtime::builder()
        .config(config)
        .skills(SkillTableLoader::builtin().expect("builtin skills"))
        .map(MapOracleImpl::open_field(30, 30))
        .actors([wizard(), monster()])
        .build()
        .await
        .expect("runtime should start")
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<SkillEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.payload);
    }
    events
}

#[tokio::test]
async fn timed_cast_resolves_after_manual_advance() {
    let runtime = start(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut cast_rx = handle.subscribe(Topic::Cast);
    let mut combat_rx = handle.subscribe(Topic::Combat);

    let ticket = handle
        .use_skill_on_target(CASTER, catalog::COLD_BOLT, 1, MONSTER)
        .await
        .expect("cast accepted");
    assert!(!ticket.resolved);
    assert!(handle.is_blocked(CASTER).await.unwrap());
    assert!(matches!(
        drain(&mut cast_rx).as_slice(),
        [SkillEvent::CastStarted { caster, .. }] if *caster == CASTER
    ));

    handle.advance(ticket.completes_at.0 + 20).await.unwrap();

    let cast_events = drain(&mut cast_rx);
    assert!(
        cast_events
            .iter()
            .any(|event| matches!(event, SkillEvent::CastCompleted { .. }))
    );
    let combat_events = drain(&mut combat_rx);
    assert!(combat_events.iter().any(|event| matches!(
        event,
        SkillEvent::Damage { target, amount, .. } if *target == MONSTER && *amount > 0
    )));

    let hp = handle.actor(MONSTER).await.unwrap().expect("monster alive").hp;
    assert!(hp.current < hp.maximum);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn rejected_casts_surface_as_skill_errors() {
    let runtime = start(RuntimeConfig::default()).await;
    let handle = runtime.handle();

    let error = handle
        .use_skill_on_target(CASTER, SkillId(9_999), 1, MONSTER)
        .await
        .unwrap_err();
    assert!(error.is_rejection());
    assert!(matches!(
        error,
        RuntimeError::Skill(SkillError::Validation(_))
    ));

    // The runtime keeps serving after a rejection.
    assert_eq!(handle.clock().await.unwrap().0, 0);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_removes_ground_units() {
    let runtime = start(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut unit_rx = handle.subscribe(Topic::Unit);

    let ticket = handle
        .use_skill_on_ground(CASTER, catalog::ANKLE_SNARE, 1, Position::new(5, 7))
        .await
        .expect("trap placed");
    assert!(ticket.resolved);
    assert_eq!(handle.query(|world| world.group_count()).await.unwrap(), 1);
    assert!(
        drain(&mut unit_rx)
            .iter()
            .any(|event| matches!(event, SkillEvent::GroupCreated { skill, .. } if *skill == catalog::ANKLE_SNARE))
    );

    runtime.shutdown().await.unwrap();

    let events = drain(&mut unit_rx);
    assert!(events.iter().any(|event| matches!(
        event,
        SkillEvent::GroupRemoved {
            reason: GroupRemoval::Shutdown,
            ..
        }
    )));
}

#[tokio::test]
async fn scripted_provider_casts_through_the_handle() {
    let mut runtime = start(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    runtime.set_cast_provider(ScriptedCastProvider::new([CastRequest::on_target(
        CASTER,
        catalog::COLD_BOLT,
        1,
        MONSTER,
    )]));

    assert_eq!(runtime.step_providers().await.unwrap(), 1);
    assert!(handle.query(|world| world.session(CASTER).is_some()).await.unwrap());
    // The script is spent.
    assert_eq!(runtime.step_providers().await.unwrap(), 0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn auto_tick_completes_casts_without_manual_steps() {
    let mut config = RuntimeConfig::default();
    config.auto_tick = true;
    config.game_config.tick_ms = 10;
    config.game_config.cast_rate = 10;

    let runtime = start(config).await;
    let handle = runtime.handle();
    let mut cast_rx = handle.subscribe(Topic::Cast);

    handle
        .use_skill_on_target(CASTER, catalog::COLD_BOLT, 1, MONSTER)
        .await
        .expect("cast accepted");

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match cast_rx.recv().await {
                Ok(event) if matches!(event.payload, SkillEvent::CastCompleted { .. }) => {
                    return event;
                }
                Ok(_) => continue,
                Err(error) => panic!("event stream ended: {error}"),
            }
        }
    })
    .await
    .expect("cast should complete on its own");
    assert!(completed.tick.0 > 0);

    runtime.shutdown().await.unwrap();
}
