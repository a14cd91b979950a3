//! Tests for AttributeSet.

use super::*;
use crate::error::LifecycleError;

fn assert_resource_invariants(set: &AttributeSet) {
    assert!(set.health() >= 0.0, "health = {}", set.health());
    assert!(set.health() <= set.max_health(), "health {} > max {}", set.health(), set.max_health());
    assert!(set.mana() >= 0.0, "mana = {}", set.mana());
    assert!(set.mana() <= set.max_mana(), "mana {} > max {}", set.mana(), set.max_mana());
}

#[test]
fn test_default_set() {
    let set = AttributeSet::default();
    assert_eq!(set.health(), 0.0);
    assert_eq!(set.max_health(), 0.0);
    assert_eq!(set.character_level(), 1.0);
    assert!(!set.has_health());
    assert!(set.pending_changes().is_empty());
}

#[test]
fn test_health_clamped_to_max_health() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    let health = set.set_base(Attribute::Health, 250.0).unwrap();
    assert_eq!(health, 100.0);
    assert_resource_invariants(&set);
}

#[test]
fn test_health_floor_is_zero() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    let health = set.apply_delta(Attribute::Health, -150.0).unwrap();
    assert_eq!(health, 0.0);

    let mana = set.set_base(Attribute::Mana, -5.0).unwrap();
    assert_eq!(mana, 0.0);
    assert_resource_invariants(&set);
}

#[test]
fn test_lowering_max_health_clamps_health() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    set.set_base(Attribute::MaxHealth, 60.0).unwrap();
    assert_eq!(set.health(), 60.0);
    assert_resource_invariants(&set);

    // Подняли max обратно: Health остаётся 60 (не "вспоминает" 100)
    set.set_base(Attribute::MaxHealth, 100.0).unwrap();
    assert_eq!(set.health(), 60.0);
}

#[test]
fn test_change_notifications() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    set.apply_delta(Attribute::Health, -30.0).unwrap();
    set.apply_delta(Attribute::Health, 0.0).unwrap(); // Без изменения → без notification

    let changes = set.take_changes();
    assert_eq!(
        changes,
        vec![AttributeChange {
            attribute: Attribute::Health,
            old_value: 100.0,
            new_value: 70.0,
        }]
    );
    assert!(set.pending_changes().is_empty());
}

#[test]
fn test_max_change_notifies_paired_attribute() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    set.set_base(Attribute::MaxMana, 20.0).unwrap();

    let changes = set.take_changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].attribute, Attribute::MaxMana);
    assert_eq!(changes[1].attribute, Attribute::Mana);
    assert_eq!(changes[1].new_value, 20.0);
}

#[test]
fn test_non_finite_values_rejected() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    let err = set.set_base(Attribute::Health, f32::NAN).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput {
            attribute: Some(Attribute::Health),
            ..
        }
    ));

    assert!(set.apply_delta(Attribute::Mana, f32::INFINITY).is_err());

    // Store не изменился
    assert_eq!(set.health(), 100.0);
    assert_eq!(set.mana(), 50.0);
    assert!(set.pending_changes().is_empty());
}

#[test]
fn test_modifiers_affect_current_not_base() {
    let mut set = AttributeSet::with_resources(100.0, 50.0);

    set.add_modifier(Attribute::MaxHealth, 25.0).unwrap();
    assert_eq!(set.max_health(), 125.0);
    assert_eq!(set.base(Attribute::MaxHealth), 100.0);

    set.set_base(Attribute::Health, 125.0).unwrap();
    assert_eq!(set.health(), 125.0);

    // Модификатор снят → MaxHealth 100, Health поджат
    set.add_modifier(Attribute::MaxHealth, -25.0).unwrap();
    assert_eq!(set.max_health(), 100.0);
    assert_eq!(set.health(), 100.0);
    assert_resource_invariants(&set);
}

#[test]
fn test_replicated_values_skip_clamp() {
    let mut set = AttributeSet::default();

    // Health пришёл раньше MaxHealth
    set.apply_replicated(Attribute::Health, 80.0).unwrap();
    assert_eq!(set.health(), 80.0);

    set.apply_replicated(Attribute::MaxHealth, 100.0).unwrap();
    assert_resource_invariants(&set);
    assert_eq!(set.take_changes().len(), 2);
}

#[test]
fn test_invariants_hold_over_mutation_sequence() {
    let mut set = AttributeSet::with_resources(100.0, 40.0);

    let steps: [(Attribute, f32); 8] = [
        (Attribute::Health, -35.0),
        (Attribute::MaxHealth, -80.0),
        (Attribute::Mana, 100.0),
        (Attribute::MaxMana, 10.0),
        (Attribute::Health, 500.0),
        (Attribute::MaxHealth, 200.0),
        (Attribute::Mana, -1000.0),
        (Attribute::Health, -1.0),
    ];

    for (attribute, delta) in steps {
        set.apply_delta(attribute, delta).unwrap();
        assert_resource_invariants(&set);
    }
}
