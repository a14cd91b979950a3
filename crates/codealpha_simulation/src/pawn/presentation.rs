//! Presentation реакции pawn'а на смерть
//!
//! - PawnDisabled → выключить коллизию/движение
//! - DeathAnimationStarted → таймер анимации на pawn'е → DeathAnimationFinished
//! - PawnDespawnRequested → despawn

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{MovementInput, Pawn};
use crate::config::SimulationConfig;
use crate::lifecycle::{
    DeathAnimationFinished, DeathAnimationStarted, PawnDespawnRequested, PawnDisabled,
};
use crate::{log, log_warning};

/// Маркер: pawn мёртв, движение выключено
///
/// Трупы не двигаются; despawn только после FinishDying.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PawnFrozen;

/// Проигрывается анимация смерти (headless: просто таймер)
#[derive(Component, Debug, Clone)]
pub struct DeathAnimationPlayback {
    pub character: Entity,
    pub animation: String,
    pub timer: Timer,
}

pub fn disable_pawn_on_death(
    mut commands: Commands,
    mut events: EventReader<PawnDisabled>,
    mut pawns: Query<(&mut Velocity, &mut MovementInput), With<Pawn>>,
) {
    for event in events.read() {
        // Обнуляем сразу (не через Commands)
        if let Ok((mut velocity, mut input)) = pawns.get_mut(event.pawn) {
            *velocity = Velocity::zero();
            *input = MovementInput::default();
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.pawn) {
            entity_commands.insert((RigidBodyDisabled, ColliderDisabled, PawnFrozen));
            log(&format!("Disabled pawn {:?} of {:?}", event.pawn, event.character));
        }
    }
}

pub fn start_death_animations(
    mut commands: Commands,
    mut events: EventReader<DeathAnimationStarted>,
) {
    for event in events.read() {
        let Ok(mut entity_commands) = commands.get_entity(event.pawn) else {
            log_warning(&format!(
                "Death animation '{}': pawn {:?} is gone",
                event.animation.name, event.pawn
            ));
            continue;
        };

        entity_commands.insert(DeathAnimationPlayback {
            character: event.character,
            animation: event.animation.name.clone(),
            timer: Timer::new(event.animation.duration(), TimerMode::Once),
        });
    }
}

/// Тикает на fixed шаг (детерминизм), по окончании: completion callback
pub fn tick_death_animations(
    mut commands: Commands,
    mut playbacks: Query<(Entity, &mut DeathAnimationPlayback)>,
    mut finished: EventWriter<DeathAnimationFinished>,
    config: Res<SimulationConfig>,
) {
    let step = config.fixed_delta();

    for (pawn, mut playback) in playbacks.iter_mut() {
        playback.timer.tick(step);
        if !playback.timer.finished() {
            continue;
        }

        finished.write(DeathAnimationFinished {
            character: playback.character,
        });
        commands.entity(pawn).remove::<DeathAnimationPlayback>();
        log(&format!("Death animation '{}' finished on {:?}", playback.animation, pawn));
    }
}

pub fn despawn_released_pawns(
    mut commands: Commands,
    mut events: EventReader<PawnDespawnRequested>,
) {
    for event in events.read() {
        if let Ok(mut entity_commands) = commands.get_entity(event.pawn) {
            entity_commands.despawn();
            log(&format!("Despawned pawn {:?} of {:?}", event.pawn, event.character));
        }
    }
}
