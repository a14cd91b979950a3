//! Pawn: presentation entity персонажа
//!
//! Архитектура:
//! - Character record (атрибуты, теги, abilities) живёт дольше pawn'а
//! - Pawn: Transform + Rapier коллайдер + kinematic движение + control rotation
//! - На смерти pawn выключается (RigidBodyDisabled/ColliderDisabled),
//!   после FinishDying: despawn. Respawn = новый pawn + Possessed.
//!
//! Rapier здесь только data (коллизии), velocity интегрируем сами.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub mod input;
pub mod presentation;


pub use input::{CharacterInput, ControlRotation, InputAction, MovementInput};
pub use presentation::{DeathAnimationPlayback, PawnFrozen};

use crate::config::SimulationConfig;
use crate::lifecycle::LifecycleSet;

/// Pawn, которым управляет персонаж `character`
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
#[require(MovementInput, ControlRotation, PawnController, Velocity)]
pub struct Pawn {
    pub character: Entity,
}

/// Kinematic контроллер pawn'а
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PawnController {
    /// m/s
    pub move_speed: f32,
    /// Начальная вертикальная скорость прыжка (m/s)
    pub jump_speed: f32,
    /// m/s²
    pub gravity: f32,
    pub grounded: bool,
}

impl Default for PawnController {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl PawnController {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            jump_speed: config.jump_speed,
            gravity: -9.81, // Earth gravity
            grounded: true,
        }
    }
}

/// Pawn Plugin
///
/// Input фаза: gate_character_input → apply_movement_input → integrate_pawn_motion
/// Presentation фаза: disable → start animation → tick animation → despawn
pub struct PawnPlugin;

impl Plugin for PawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CharacterInput>();

        app.add_systems(
            FixedUpdate,
            (
                input::gate_character_input,
                input::apply_movement_input,
                input::integrate_pawn_motion,
            )
                .chain()
                .in_set(LifecycleSet::Input),
        )
        .add_systems(
            FixedUpdate,
            (
                presentation::disable_pawn_on_death,
                presentation::start_death_animations,
                presentation::tick_death_animations,
                presentation::despawn_released_pawns,
            )
                .chain()
                .in_set(LifecycleSet::Presentation),
        );
    }
}

/// Spawn helper: pawn для персонажа
///
/// - Transform
/// - Pawn (required: MovementInput, ControlRotation, Velocity)
/// - PawnController из SimulationConfig
/// - Rapier: RigidBody + Collider (capsule)
///
/// Possession не шлётся: это решает host (Takeover/StateReplicated).
pub fn spawn_pawn(
    commands: &mut Commands,
    config: &SimulationConfig,
    character: Entity,
    position: Vec3,
) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Pawn { character },
            PawnController::from_config(config),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.4), // Высота 1.8m (0.5 + 0.5 + 2×0.4)
        ))
        .id()
}
