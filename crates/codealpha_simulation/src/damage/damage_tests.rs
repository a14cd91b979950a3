//! Tests for damage resolution.

use super::*;
use crate::ability_system::{AbilitySystem, EffectDefinition, ModifierOp};

#[test]
fn test_resolve_removes_exact_damage() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);

    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 30.0).unwrap();

    assert_eq!(delta, -30.0);
    assert_eq!(attributes.health(), 70.0);
    assert_eq!(attributes.current(Attribute::Damage), 0.0);
}

#[test]
fn test_overkill_floors_at_zero() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);

    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 150.0).unwrap();

    // Снимается min(damage, health)
    assert_eq!(delta, -100.0);
    assert_eq!(attributes.health(), 0.0);
    assert_eq!(attributes.current(Attribute::Damage), 0.0);

    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 10.0).unwrap();
    assert_eq!(delta, 0.0);
    assert_eq!(attributes.health(), 0.0);
}

#[test]
fn test_health_buff_does_not_absorb_damage() {
    let mut asc = AbilitySystem::default();
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);
    let vigor =
        EffectDefinition::infinite("Vigor").with_modifier(Attribute::Health, ModifierOp::Add, 20.0);
    asc.apply_effect(&mut attributes, &vigor, 1.0, None).unwrap();
    assert_eq!(attributes.health(), 100.0);

    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 10.0).unwrap();
    assert_eq!(delta, -10.0);
    assert_eq!(attributes.health(), 90.0);

    // Остаток вместе с баффом снимается полностью
    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 500.0).unwrap();
    assert_eq!(delta, -90.0);
    assert_eq!(attributes.health(), 0.0);
    assert!(!attributes.has_health());
}

#[test]
fn test_damage_meta_written_before_health_and_reset_after() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);

    resolve_damage(ExecutionContext::server(), &mut attributes, 25.0).unwrap();

    let order: Vec<_> = attributes
        .take_changes()
        .into_iter()
        .map(|change| (change.attribute, change.new_value))
        .collect();
    assert_eq!(
        order,
        vec![
            (Attribute::Damage, 25.0),
            (Attribute::Health, 75.0),
            (Attribute::Damage, 0.0),
        ]
    );
}

#[test]
fn test_zero_damage_is_noop_for_health() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);

    let delta = resolve_damage(ExecutionContext::server(), &mut attributes, 0.0).unwrap();

    assert_eq!(delta, 0.0);
    assert!(attributes
        .pending_changes()
        .iter()
        .all(|change| change.attribute != Attribute::Health));
}

#[test]
fn test_negative_damage_rejected() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);
    attributes.apply_delta(Attribute::Health, -40.0).unwrap();
    attributes.take_changes();

    for bad in [-5.0, f32::NAN, f32::INFINITY] {
        let err = resolve_damage(ExecutionContext::server(), &mut attributes, bad).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidInput { attribute: Some(Attribute::Damage), .. }
        ));
    }

    // Отрицательный урон не превращается в лечение
    assert_eq!(attributes.health(), 60.0);
    assert!(attributes.pending_changes().is_empty());
}

#[test]
fn test_observer_cannot_resolve() {
    let mut attributes = AttributeSet::with_resources(100.0, 50.0);

    let err = resolve_damage(ExecutionContext::observer(), &mut attributes, 30.0).unwrap_err();

    assert_eq!(err, LifecycleError::AuthorityViolation { operation: "resolve_damage" });
    assert_eq!(attributes.health(), 100.0);
    assert!(attributes.pending_changes().is_empty());
}

#[test]
fn test_received_damage_event() {
    let event = ReceivedDamage {
        target: Entity::PLACEHOLDER,
        source: None,
        unmitigated: 150.0,
        mitigated: 100.0,
    };

    assert!(event.mitigated <= event.unmitigated);
}
