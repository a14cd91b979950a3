//! Lifecycle integration test
//!
//! Полный headless цикл через `create_headless_app` + `SimulationPlugin`:
//! spawn → урон → смерть → анимация → respawn, и та же жизнь глазами
//! наблюдателя, которому frames приходят текстом (RON).
//!
//! Проверяем:
//! - Health ∈ [0, MaxHealth], Damage = 0 после каждого тика
//! - Ровно одна смерть на жизнь
//! - Наблюдатель совпадает с authority по атрибутам и состоянию

use bevy::prelude::*;
use codealpha_simulation::*;

const HERO: &str = include_str!("../assets/characters/hero.ron");

fn hero() -> CharacterConfig {
    CharacterConfig::from_ron(HERO, "hero.ron").unwrap()
}

/// Helper: App с плагином, часы уже запущены (следующий update = один тик)
fn create_lifecycle_app(plugin: SimulationPlugin, seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(plugin);
    app.update();
    app
}

fn spawn_hero(app: &mut App, network_id: u64) -> Entity {
    let world = app.world_mut();
    let character = spawn_character(&mut world.commands(), hero(), NetworkId(network_id));
    world.flush();
    character
}

fn possess(app: &mut App, character: Entity, source: PossessionSource) -> Entity {
    let config = app.world().resource::<SimulationConfig>().clone();
    let world = app.world_mut();
    let pawn = spawn_pawn(&mut world.commands(), &config, character, Vec3::ZERO);
    world.flush();
    world.send_event(Possessed {
        character,
        pawn,
        source,
    });
    pawn
}

fn lifecycle_state(app: &App, character: Entity) -> CharacterLifecycleState {
    app.world().get::<Lifecycle>(character).unwrap().state()
}

fn check_invariants(app: &App, character: Entity, tick: usize) {
    let attributes = app.world().get::<AttributeSet>(character).unwrap();
    assert!(
        attributes.health() >= 0.0 && attributes.health() <= attributes.max_health(),
        "Tick {}: health {} out of [0, {}]",
        tick,
        attributes.health(),
        attributes.max_health()
    );
    assert!(
        attributes.mana() >= 0.0 && attributes.mana() <= attributes.max_mana(),
        "Tick {}: mana invariant broken",
        tick
    );
    assert_eq!(
        attributes.current(Attribute::Damage),
        0.0,
        "Tick {}: Damage meta attribute not reset",
        tick
    );
}

fn count_events<E: Event>(app: &mut App) -> usize {
    app.world_mut().resource_mut::<Events<E>>().drain().count()
}

/// Test: две жизни подряд на authority
#[test]
fn test_hero_dies_and_respawns() {
    let mut app = create_lifecycle_app(SimulationPlugin::server(), 42);
    let hero = spawn_hero(&mut app, 1);
    let first_pawn = possess(&mut app, hero, PossessionSource::Takeover);
    app.update();

    assert_eq!(lifecycle_state(&app, hero), CharacterLifecycleState::Alive);
    assert_eq!(count_events::<CharacterInitialized>(&mut app), 1);

    let mut deaths = 0;
    for tick in 0..200 {
        if lifecycle_state(&app, hero) == CharacterLifecycleState::Alive {
            app.world_mut().send_event(DamageRequest {
                target: hero,
                source: None,
                amount: 7.5,
            });
        }
        app.update();
        deaths += count_events::<CharacterDied>(&mut app);
        check_invariants(&app, hero, tick);

        if lifecycle_state(&app, hero) == CharacterLifecycleState::Dead {
            break;
        }
    }

    // 100 HP / 7.5 → 14 попаданий, потом 1.5 s анимации
    assert_eq!(deaths, 1);
    assert_eq!(lifecycle_state(&app, hero), CharacterLifecycleState::Dead);
    assert!(app.world().get_entity(first_pawn).is_err());
    assert_eq!(count_events::<PawnDespawnRequested>(&mut app), 1);

    let abilities = app.world().get::<AbilitySystem>(hero).unwrap();
    assert!(abilities.activatable_abilities().is_empty());
    assert!(abilities.active_effects().is_empty());
    assert_eq!(abilities.tags.tag_count(&GameplayTag::DEAD), 1);

    // Respawn на новом pawn'е
    let second_pawn = possess(&mut app, hero, PossessionSource::Takeover);
    app.update();

    assert_eq!(lifecycle_state(&app, hero), CharacterLifecycleState::Alive);
    assert_eq!(app.world().get::<Lifecycle>(hero).unwrap().pawn(), Some(second_pawn));
    let attributes = app.world().get::<AttributeSet>(hero).unwrap();
    assert_eq!(attributes.health(), attributes.max_health());
    assert_eq!(attributes.mana(), attributes.max_mana());

    let abilities = app.world().get::<AbilitySystem>(hero).unwrap();
    assert_eq!(abilities.activatable_abilities().len(), 2);
    assert_eq!(abilities.active_effects().len(), 1);
    assert_eq!(abilities.tags.tag_count(&GameplayTag::DEAD), 0);

    let respawned = app
        .world_mut()
        .resource_mut::<Events<CharacterInitialized>>()
        .drain()
        .filter(|event| event.respawn)
        .count();
    assert_eq!(respawned, 1);
}

/// Test: наблюдатель получает frames через RON и отражает смерть
#[test]
fn test_observer_mirrors_authority_over_ron() {
    let mut server = create_lifecycle_app(SimulationPlugin::server(), 7);
    let mut observer = create_lifecycle_app(SimulationPlugin::observer(), 7);

    // Entity id на узлах разные, общий только NetworkId
    let server_hero = spawn_hero(&mut server, 1);
    let observer_hero = spawn_hero(&mut observer, 1);

    possess(&mut server, server_hero, PossessionSource::Takeover);
    possess(&mut observer, observer_hero, PossessionSource::StateReplicated);

    // Оба узла инициализируются до первого урона: локальный Initialize
    // наблюдателя перезаписал бы replicated Health того же тика
    let mut transported = sync(&mut server, &mut observer);
    assert_eq!(lifecycle_state(&observer, observer_hero), CharacterLifecycleState::Alive);

    let mut observer_deaths = 0;
    for tick in 0..300 {
        if lifecycle_state(&server, server_hero) == CharacterLifecycleState::Alive {
            server.world_mut().send_event(DamageRequest {
                target: server_hero,
                source: None,
                amount: 12.0,
            });
        }
        // Урон на наблюдателе не применяется
        observer.world_mut().send_event(DamageRequest {
            target: observer_hero,
            source: None,
            amount: 1000.0,
        });

        transported += sync(&mut server, &mut observer);
        observer_deaths += count_events::<CharacterDied>(&mut observer);

        let server_health = server.world().get::<AttributeSet>(server_hero).unwrap().health();
        let observer_health = observer
            .world()
            .get::<AttributeSet>(observer_hero)
            .unwrap()
            .health();
        assert_eq!(server_health, observer_health, "Tick {}: health diverged", tick);

        if lifecycle_state(&server, server_hero) == CharacterLifecycleState::Dead
            && lifecycle_state(&observer, observer_hero) == CharacterLifecycleState::Dead
        {
            break;
        }
    }

    assert!(transported > 0);
    assert_eq!(observer_deaths, 1);
    assert_eq!(lifecycle_state(&observer, observer_hero), CharacterLifecycleState::Dead);

    let server_tags = server.world().get::<AbilitySystem>(server_hero).unwrap();
    let observer_tags = observer.world().get::<AbilitySystem>(observer_hero).unwrap();
    assert_eq!(
        server_tags.tags.tag_count(&GameplayTag::DEAD),
        observer_tags.tags.tag_count(&GameplayTag::DEAD)
    );

    // Наблюдатель сам abilities не выдаёт
    assert!(observer_tags.activatable_abilities().is_empty());
}

/// Один тик authority → frames текстом → один тик наблюдателя
fn sync(server: &mut App, observer: &mut App) -> usize {
    server.update();

    let frames = server.world_mut().resource_mut::<ReplicationOutbox>().drain();
    let sent = frames.len();
    for frame in frames {
        let text = frame.to_ron().unwrap();
        observer
            .world_mut()
            .resource_mut::<ReplicationInbox>()
            .receive_ron(&text)
            .unwrap();
    }

    observer.update();
    sent
}

/// Test: input после смерти не доходит до pawn'а
#[test]
fn test_dead_pawn_ignores_input() {
    let mut app = create_lifecycle_app(SimulationPlugin::server(), 1);
    let hero = spawn_hero(&mut app, 1);
    let pawn = possess(&mut app, hero, PossessionSource::Takeover);
    app.update();

    app.world_mut().send_event(DamageRequest {
        target: hero,
        source: None,
        amount: 1000.0,
    });
    app.update();
    assert_eq!(lifecycle_state(&app, hero), CharacterLifecycleState::Dying);

    let before = app.world().get::<Transform>(pawn).unwrap().translation;
    for _ in 0..10 {
        app.world_mut().send_event(CharacterInput {
            pawn,
            action: InputAction::MoveForward(1.0),
        });
        app.update();
    }

    assert_eq!(app.world().get::<Transform>(pawn).unwrap().translation, before);
}
