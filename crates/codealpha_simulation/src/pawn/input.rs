//! Input gating + kinematic движение pawn'а
//!
//! Input не копится: всё, что пришло не в Alive, отбрасывается.
//! Movement относительно yaw control rotation.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{Pawn, PawnController};
use crate::ability_system::{AbilityInputId, AbilitySystem};
use crate::config::SimulationConfig;
use crate::lifecycle::Lifecycle;
use crate::log;

/// Действие игрока/AI (оси в [-1, 1], кнопки без значения)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    MoveForward(f32),
    MoveRight(f32),
    /// Мышь: градусы как есть
    Turn(f32),
    /// Стик: × base_turn_rate × dt
    TurnRate(f32),
    LookUp(f32),
    LookUpRate(f32),
    Jump,
    StopJumping,
    /// Ability input (Confirm/Cancel: подтверждение/отмена цели)
    AbilityPressed(AbilityInputId),
    AbilityReleased(AbilityInputId),
}

/// Событие: input для pawn'а (опрашивается каждый тик)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CharacterInput {
    pub pawn: Entity,
    pub action: InputAction,
}

/// Накопленный за тик input движения
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MovementInput {
    pub forward: f32,
    pub right: f32,
    pub jump: bool,
}

/// Control rotation (градусы)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ControlRotation {
    pub yaw: f32,
    pub pitch: f32,
}

impl ControlRotation {
    pub const MAX_PITCH: f32 = 89.0;

    pub fn add_yaw(&mut self, degrees: f32) {
        self.yaw = (self.yaw + degrees).rem_euclid(360.0);
    }

    pub fn add_pitch(&mut self, degrees: f32) {
        self.pitch = (self.pitch + degrees).clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
    }

    /// Forward/right в горизонтальной плоскости (yaw 0 → -Z)
    pub fn basis(&self) -> (Vec3, Vec3) {
        let rotation = Quat::from_rotation_y(-self.yaw.to_radians());
        (rotation * Vec3::NEG_Z, rotation * Vec3::X)
    }
}

/// Применяет только input живых персонажей
pub fn gate_character_input(
    mut inputs: EventReader<CharacterInput>,
    mut pawns: Query<(&Pawn, &mut MovementInput, &mut ControlRotation)>,
    mut characters: Query<(&Lifecycle, &mut AbilitySystem)>,
    config: Res<SimulationConfig>,
) {
    let dt = config.fixed_delta_secs();

    for event in inputs.read() {
        let Ok((pawn, mut movement, mut rotation)) = pawns.get_mut(event.pawn) else {
            continue;
        };

        let Ok((lifecycle, mut abilities)) = characters.get_mut(pawn.character) else {
            continue;
        };
        if !lifecycle.is_alive() {
            log(&format!("Input {:?} for {:?} rejected: not alive", event.action, event.pawn));
            continue;
        }

        match event.action {
            InputAction::MoveForward(value) => movement.forward += value,
            InputAction::MoveRight(value) => movement.right += value,
            InputAction::Turn(value) => rotation.add_yaw(value),
            InputAction::TurnRate(rate) => rotation.add_yaw(rate * config.base_turn_rate * dt),
            InputAction::LookUp(value) => rotation.add_pitch(value),
            InputAction::LookUpRate(rate) => {
                rotation.add_pitch(rate * config.base_look_up_rate * dt)
            }
            InputAction::Jump => movement.jump = true,
            InputAction::StopJumping => movement.jump = false,
            InputAction::AbilityPressed(input_id) => {
                let changed = abilities.ability_input_pressed(input_id);
                log(&format!("{:?} pressed {:?}: {} abilities", pawn.character, input_id, changed));
            }
            InputAction::AbilityReleased(input_id) => {
                abilities.ability_input_released(input_id);
            }
        }
    }
}

/// MovementInput → velocity (без замороженных pawn'ов)
///
/// Оси сбрасываются после применения, jump держится до StopJumping.
pub fn apply_movement_input(
    mut query: Query<
        (&mut MovementInput, &ControlRotation, &mut PawnController, &mut Velocity),
        Without<super::PawnFrozen>,
    >,
    config: Res<SimulationConfig>,
) {
    let dt = config.fixed_delta_secs();

    for (mut input, rotation, mut controller, mut velocity) in query.iter_mut() {
        let (forward, right) = rotation.basis();
        let wish = forward * input.forward.clamp(-1.0, 1.0) + right * input.right.clamp(-1.0, 1.0);

        if wish.length_squared() > 0.01 {
            let direction = wish.normalize();
            velocity.linvel.x = direction.x * controller.move_speed;
            velocity.linvel.z = direction.z * controller.move_speed;
        } else {
            // Трение
            velocity.linvel.x = 0.0;
            velocity.linvel.z = 0.0;
        }

        if controller.grounded {
            if input.jump {
                velocity.linvel.y = controller.jump_speed;
                controller.grounded = false;
            }
        } else {
            velocity.linvel.y += controller.gravity * dt;
        }

        input.forward = 0.0;
        input.right = 0.0;
    }
}

/// velocity → Transform (headless, без Rapier step), пол на y = 0
pub fn integrate_pawn_motion(
    mut query: Query<(&mut Velocity, &mut PawnController, &mut Transform), With<Pawn>>,
    config: Res<SimulationConfig>,
) {
    let dt = config.fixed_delta_secs();

    for (mut velocity, mut controller, mut transform) in query.iter_mut() {
        transform.translation += velocity.linvel * dt;

        if transform.translation.y <= 0.0 && velocity.linvel.y <= 0.0 {
            transform.translation.y = 0.0;
            velocity.linvel.y = 0.0;
            controller.grounded = true;
        }
    }
}
