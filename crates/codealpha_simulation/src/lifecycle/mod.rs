//! Lifecycle module: spawn → Alive → Dying → Dead → respawn
//!
//! ECS ответственность:
//! - `Character` record: Lifecycle + AttributeSet + AbilityGrantState + AbilitySystem
//! - `LifecycleController`: Initialize / Die / FinishDying (синхронно, без ECS)
//! - Системы: possession, damage, death trigger, stun, publish сигналов
//!
//! Presentation ответственность (pawn module / host):
//! - выключение движения/коллизии, анимация смерти, despawn pawn'а
//!
//! Единственная асинхронная точка: анимация смерти: после Die() персонаж
//! может оставаться в Dying до `DeathAnimationFinished`.

use bevy::prelude::*;

pub mod controller;
pub mod events;
pub mod state;
pub mod systems;


pub use controller::{DeathOutcome, InitializeReport, LifecycleController, LifecycleSignal};
pub use events::{
    CharacterDied, CharacterInitialized, DeathAnimationFinished, DeathAnimationStarted,
    PawnDespawnRequested, PawnDisabled, Possessed, PossessionSource,
};
pub use state::{Character, CharacterLifecycleState, Lifecycle};
pub use systems::LifecycleOutbox;

use crate::attributes::AttributeChanged;
use crate::authority::ExecutionContext;
use crate::damage::{DamageRequest, ReceivedDamage};
use crate::tags::TagCountChanged;

/// Порядок фаз внутри FixedUpdate
///
/// Inbound (replication) → Possession → Input → Damage → Reactions →
/// Signals → Presentation → Outbound (replication)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleSet {
    Inbound,
    Possession,
    Input,
    Damage,
    Reactions,
    Signals,
    Presentation,
    Outbound,
}

/// Lifecycle Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. handle_possession: Initialize на Takeover/StateReplicated
/// 2. apply_damage_requests: DamageResolver + death trigger
/// 3. publish_attribute_changes → react_to_tag_changes → finish_death_animations
/// 4. publish_lifecycle_signals: сигналы контроллеров → события
pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExecutionContext>()
            .init_resource::<LifecycleOutbox>();

        // Регистрация событий
        app.add_event::<Possessed>()
            .add_event::<CharacterInitialized>()
            .add_event::<DamageRequest>()
            .add_event::<ReceivedDamage>()
            .add_event::<AttributeChanged>()
            .add_event::<TagCountChanged>()
            .add_event::<PawnDisabled>()
            .add_event::<CharacterDied>()
            .add_event::<DeathAnimationStarted>()
            .add_event::<DeathAnimationFinished>()
            .add_event::<PawnDespawnRequested>();

        app.configure_sets(
            FixedUpdate,
            (
                LifecycleSet::Inbound,
                LifecycleSet::Possession,
                LifecycleSet::Input,
                LifecycleSet::Damage,
                LifecycleSet::Reactions,
                LifecycleSet::Signals,
                LifecycleSet::Presentation,
                LifecycleSet::Outbound,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            systems::handle_possession.in_set(LifecycleSet::Possession),
        )
        .add_systems(
            FixedUpdate,
            systems::apply_damage_requests.in_set(LifecycleSet::Damage),
        )
        .add_systems(
            FixedUpdate,
            (
                systems::publish_attribute_changes,
                // Die() из предыдущей системы выставляет Dead → подхватываем в том же тике
                systems::react_to_tag_changes,
                systems::finish_death_animations,
            )
                .chain()
                .in_set(LifecycleSet::Reactions),
        )
        .add_systems(
            FixedUpdate,
            systems::publish_lifecycle_signals.in_set(LifecycleSet::Signals),
        );
    }
}
