//! Attributes: Health, MaxHealth, Mana, MaxMana, CharacterLevel + meta Damage
//!
//! ECS ответственность:
//! - `AttributeSet` компонент на character record
//! - `AttributeChanged` события (replication layer, UI, death trigger)

use bevy::prelude::*;

pub mod attribute;
pub mod store;

#[cfg(test)]
mod store_tests;

pub use attribute::{Attribute, AttributeChange, AttributeSpec};
pub use store::AttributeSet;

/// Событие: current value атрибута изменился
///
/// Порядок доставки per-attribute сохраняется (одна очередь на персонажа).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttributeChanged {
    pub character: Entity,
    pub attribute: Attribute,
    pub old_value: f32,
    pub new_value: f32,
}

impl AttributeChanged {
    pub fn from_change(character: Entity, change: AttributeChange) -> Self {
        Self {
            character,
            attribute: change.attribute,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}
