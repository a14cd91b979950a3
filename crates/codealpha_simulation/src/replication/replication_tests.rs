use bevy::prelude::*;

use super::*;
use crate::authority::ExecutionContext;
use crate::config::{CharacterConfig, SimulationConfig};
use crate::lifecycle::{CharacterLifecycleState, Lifecycle, LifecyclePlugin};
use crate::pawn::PawnPlugin;

fn create_test_app(ctx: ExecutionContext) -> App {
    let mut app = App::new();
    app.insert_resource(ctx)
        .insert_resource(SimulationConfig::default())
        .add_plugins((LifecyclePlugin, PawnPlugin, ReplicationPlugin));
    app
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

#[test]
fn test_frame_survives_ron_transport() {
    let mut frame = ReplicationFrame::new(NetworkId(7), 12);
    frame.attributes.push(AttributeDelta {
        attribute: Attribute::Health,
        value: 35.5,
    });
    frame.tags.push(TagDelta {
        tag: GameplayTag::DEAD,
        count: 1,
    });

    let text = frame.to_ron().unwrap();
    assert!(text.contains("State.Dead"));
    assert_eq!(ReplicationFrame::from_ron(&text).unwrap(), frame);
}

#[test]
fn test_frame_without_deltas_parses() {
    let frame = ReplicationFrame::from_ron("(network_id: (3), tick: 1)").unwrap();
    assert!(frame.is_empty());
    assert_eq!(frame.network_id, NetworkId(3));
}

#[test]
fn test_malformed_frame_is_decode_error() {
    let mut inbox = ReplicationInbox::default();
    let err = inbox.receive_ron("(network_id: oops)").unwrap_err();

    assert!(matches!(err, ReplicationError::Decode(_)));
    assert!(inbox.is_empty());
}

#[test]
fn test_authority_collects_replicated_changes_only() {
    let mut app = create_test_app(ExecutionContext::server());
    let character = app.world_mut().spawn((Character, NetworkId(1))).id();
    let other = app.world_mut().spawn((Character, NetworkId(2))).id();

    // AttributeChanged/TagCountChanged как их публикуют Reactions системы
    app.world_mut().send_event(AttributeChanged {
        character,
        attribute: Attribute::Damage,
        old_value: 0.0,
        new_value: 30.0,
    });
    app.world_mut().send_event(AttributeChanged {
        character,
        attribute: Attribute::Health,
        old_value: 100.0,
        new_value: 70.0,
    });
    app.world_mut().send_event(TagCountChanged {
        character: other,
        tag: GameplayTag::STUN,
        new_count: 1,
    });
    tick(&mut app);

    let mut outbox = app.world_mut().resource_mut::<ReplicationOutbox>();
    assert_eq!(outbox.tick(), 1);
    let frames = outbox.drain();

    // BTreeMap: порядок по NetworkId
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].network_id, NetworkId(1));
    assert_eq!(
        frames[0].attributes,
        vec![AttributeDelta {
            attribute: Attribute::Health,
            value: 70.0
        }]
    );
    assert!(frames[0].tags.is_empty());
    assert_eq!(frames[1].network_id, NetworkId(2));
    assert_eq!(frames[1].tags[0].tag, GameplayTag::STUN);
    assert!(outbox.frames().is_empty());
}

#[test]
fn test_observer_does_not_collect() {
    let mut app = create_test_app(ExecutionContext::observer());
    let character = app.world_mut().spawn((Character, NetworkId(1))).id();

    app.world_mut().send_event(AttributeChanged {
        character,
        attribute: Attribute::Health,
        old_value: 100.0,
        new_value: 70.0,
    });
    tick(&mut app);

    let outbox = app.world().resource::<ReplicationOutbox>();
    assert_eq!(outbox.tick(), 0);
    assert!(outbox.frames().is_empty());
}

#[test]
fn test_observer_applies_frame_without_clamping() {
    let mut app = create_test_app(ExecutionContext::observer());
    let character = app.world_mut().spawn((Character, NetworkId(5))).id();

    let mut frame = ReplicationFrame::new(NetworkId(5), 1);
    frame.attributes.push(AttributeDelta {
        attribute: Attribute::Health,
        value: 150.0,
    });
    frame.tags.push(TagDelta {
        tag: GameplayTag::STUN,
        count: 2,
    });
    app.world_mut().resource_mut::<ReplicationInbox>().push(frame);
    tick(&mut app);

    assert!(app.world().resource::<ReplicationInbox>().is_empty());
    let attributes = app.world().get::<AttributeSet>(character).unwrap();
    assert_eq!(attributes.health(), 150.0);
    let abilities = app.world().get::<AbilitySystem>(character).unwrap();
    assert_eq!(abilities.tags.tag_count(&GameplayTag::STUN), 2);
}

#[test]
fn test_frame_for_unknown_character_is_dropped() {
    let mut app = create_test_app(ExecutionContext::observer());
    app.world_mut().spawn((Character, NetworkId(1)));

    app.world_mut()
        .resource_mut::<ReplicationInbox>()
        .push(ReplicationFrame::new(NetworkId(99), 1));
    tick(&mut app);

    assert!(app.world().resource::<ReplicationInbox>().is_empty());
}

#[test]
fn test_replicated_dead_tag_mirrors_death_on_observer() {
    let mut app = create_test_app(ExecutionContext::observer());
    let character = app
        .world_mut()
        .spawn((Character, CharacterConfig::default(), NetworkId(1)))
        .id();

    // Observer поднимает персонажа локально (Alive), дальше authority шлёт смерть
    app.world_mut().get_mut::<Lifecycle>(character).unwrap().state = CharacterLifecycleState::Alive;

    let mut frame = ReplicationFrame::new(NetworkId(1), 1);
    frame.attributes.push(AttributeDelta {
        attribute: Attribute::Health,
        value: 0.0,
    });
    frame.tags.push(TagDelta {
        tag: GameplayTag::DEAD,
        count: 1,
    });
    app.world_mut().resource_mut::<ReplicationInbox>().push(frame);
    tick(&mut app);

    // Без pawn'а и анимации: сразу Dead
    let lifecycle = app.world().get::<Lifecycle>(character).unwrap();
    assert_eq!(lifecycle.state(), CharacterLifecycleState::Dead);
}
