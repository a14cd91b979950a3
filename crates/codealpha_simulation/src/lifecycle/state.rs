//! Lifecycle state + character record компоненты

use bevy::prelude::*;

use crate::ability_system::AbilitySystem;
use crate::attributes::AttributeSet;
use crate::grants::AbilityGrantState;

/// Состояние жизненного цикла персонажа
///
/// Переходы:
/// - Uninitialized → Alive (initialize)
/// - Alive → Dying (die)
/// - Dying → Dead (finish_dying)
/// - Dead → Alive (initialize = respawn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum CharacterLifecycleState {
    #[default]
    Uninitialized,
    Alive,
    Dying,
    Dead,
}

/// Маркер: character record (player state)
///
/// Живёт дольше pawn'а: атрибуты, теги и abilities переживают смерть,
/// на respawn сбрасываются, а не пересоздаются.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Lifecycle, AttributeSet, AbilityGrantState, AbilitySystem)]
pub struct Character;

/// Lifecycle компонент на character record
///
/// `pawn`: capability handle на presentation entity: резолвится на
/// initialize (после liveness check), сбрасывается на finish_dying.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Lifecycle {
    pub(crate) state: CharacterLifecycleState,
    pub(crate) pawn: Option<Entity>,
}

impl Lifecycle {
    pub fn state(&self) -> CharacterLifecycleState {
        self.state
    }

    pub fn pawn(&self) -> Option<Entity> {
        self.pawn
    }

    /// IsAlive: только lifecycle state (Health > 0: `AttributeSet::has_health`)
    pub fn is_alive(&self) -> bool {
        self.state == CharacterLifecycleState::Alive
    }
}
