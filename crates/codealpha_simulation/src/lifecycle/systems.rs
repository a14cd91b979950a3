//! Lifecycle ECS системы
//!
//! # Systems
//!
//! **Possession:**
//! - `handle_possession`: Possessed → Initialize (spawn/respawn)
//!
//! **Damage:**
//! - `apply_damage_requests`: DamageRequest → DamageResolver + death trigger
//!
//! **Reactions:**
//! - `publish_attribute_changes`: очередь AttributeSet → AttributeChanged, death trigger
//! - `react_to_tag_changes`: очередь тегов → TagCountChanged, stun, mirrored death
//! - `finish_death_animations`: DeathAnimationFinished → FinishDying
//!
//! **Signals:**
//! - `publish_lifecycle_signals`: LifecycleOutbox → typed события

use bevy::prelude::*;

use super::controller::{LifecycleController, LifecycleSignal};
use super::events::*;
use super::state::{Character, Lifecycle};
use crate::ability_system::AbilitySystem;
use crate::attributes::{AttributeChanged, AttributeSet};
use crate::authority::ExecutionContext;
use crate::config::CharacterConfig;
use crate::damage::{DamageRequest, ReceivedDamage};
use crate::error::LifecycleError;
use crate::grants::AbilityGrantState;
use crate::pawn::Pawn;
use crate::tags::{GameplayTag, TagCountChanged};
use crate::{log, log_error, log_warning};

/// Компоненты character record, нужные контроллеру
pub type CharacterParts = (
    Entity,
    &'static mut Lifecycle,
    &'static mut AttributeSet,
    &'static mut AbilityGrantState,
    &'static mut AbilitySystem,
    &'static CharacterConfig,
);

/// Сигналы контроллеров, ждущие публикации (один flush на тик)
#[derive(Resource, Debug, Default)]
pub struct LifecycleOutbox {
    signals: Vec<(Entity, LifecycleSignal)>,
}

impl LifecycleOutbox {
    pub fn extend(&mut self, character: Entity, signals: Vec<LifecycleSignal>) {
        self.signals
            .extend(signals.into_iter().map(|signal| (character, signal)));
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, (Entity, LifecycleSignal)> {
        self.signals.drain(..)
    }
}

// ============================================================================
// Possession
// ============================================================================

/// Possessed → Initialize
///
/// Pawn handle проходит liveness check: entity жива и принадлежит этому персонажу.
pub fn handle_possession(
    ctx: Res<ExecutionContext>,
    mut possessions: EventReader<Possessed>,
    mut characters: Query<CharacterParts, With<Character>>,
    pawns: Query<&Pawn>,
    mut outbox: ResMut<LifecycleOutbox>,
) {
    for possession in possessions.read() {
        let Ok((entity, mut lifecycle, mut attributes, mut grants, mut abilities, config)) =
            characters.get_mut(possession.character)
        else {
            log_error(&format!("Possessed: {:?} is not a character", possession.character));
            continue;
        };

        let owned = pawns
            .get(possession.pawn)
            .is_ok_and(|pawn| pawn.character == entity);
        if !owned {
            log_warning(&format!(
                "Possessed: pawn {:?} is not alive or not owned by {:?}",
                possession.pawn, entity
            ));
            continue;
        }

        let mut controller = LifecycleController::new(
            entity,
            *ctx,
            &mut lifecycle,
            &mut attributes,
            &mut grants,
            &mut abilities,
            config,
        );
        match controller.initialize(Some(possession.pawn)) {
            Ok(report) => log(&format!(
                "{:?} possessed {:?} via {:?} (effects: {}, abilities: {})",
                entity,
                possession.pawn,
                possession.source,
                report.startup_effects_applied,
                report.abilities_granted
            )),
            Err(err) => log(&format!("{:?}: {}", entity, err)),
        }
        outbox.extend(entity, controller.into_signals());
    }
}

// ============================================================================
// Damage
// ============================================================================

pub fn apply_damage_requests(
    ctx: Res<ExecutionContext>,
    mut requests: EventReader<DamageRequest>,
    mut characters: Query<CharacterParts, With<Character>>,
    mut outbox: ResMut<LifecycleOutbox>,
) {
    for request in requests.read() {
        let Ok((entity, mut lifecycle, mut attributes, mut grants, mut abilities, config)) =
            characters.get_mut(request.target)
        else {
            log_error(&format!("DamageRequest: target {:?} is not a character", request.target));
            continue;
        };

        let mut controller = LifecycleController::new(
            entity,
            *ctx,
            &mut lifecycle,
            &mut attributes,
            &mut grants,
            &mut abilities,
            config,
        );
        match controller.receive_damage(request.amount, request.source) {
            Ok(_) => {}
            Err(err @ LifecycleError::AuthorityViolation { .. }) => {
                log(&format!("DamageRequest on observer ignored: {}", err))
            }
            Err(err) => log_warning(&format!("DamageRequest for {:?} rejected: {}", entity, err)),
        }
        outbox.extend(entity, controller.into_signals());
    }
}

// ============================================================================
// Reactions
// ============================================================================

/// Дренирует очереди AttributeSet в события; Health ≤ 0 → Die
///
/// Ловит смерть от изменений мимо DamageResolver (instant эффекты и т.п.).
pub fn publish_attribute_changes(
    ctx: Res<ExecutionContext>,
    mut characters: Query<CharacterParts, With<Character>>,
    mut changed_events: EventWriter<AttributeChanged>,
    mut outbox: ResMut<LifecycleOutbox>,
) {
    for (entity, mut lifecycle, mut attributes, mut grants, mut abilities, config) in
        characters.iter_mut()
    {
        if attributes.pending_changes().is_empty() {
            continue;
        }

        let changes = attributes.take_changes();
        for change in &changes {
            changed_events.write(AttributeChanged::from_change(entity, *change));
        }

        let mut controller = LifecycleController::new(
            entity,
            *ctx,
            &mut lifecycle,
            &mut attributes,
            &mut grants,
            &mut abilities,
            config,
        );
        controller.handle_attribute_changes(&changes);
        outbox.extend(entity, controller.into_signals());
    }
}

/// Дренирует очереди тегов: TagCountChanged, stun реакция, mirrored death
pub fn react_to_tag_changes(
    ctx: Res<ExecutionContext>,
    mut characters: Query<CharacterParts, With<Character>>,
    mut tag_events: EventWriter<TagCountChanged>,
    mut outbox: ResMut<LifecycleOutbox>,
) {
    for (entity, mut lifecycle, mut attributes, mut grants, mut abilities, config) in
        characters.iter_mut()
    {
        if abilities.tags.pending_changes().is_empty() {
            continue;
        }

        let changes = abilities.tags.take_changes();
        let mut controller = LifecycleController::new(
            entity,
            *ctx,
            &mut lifecycle,
            &mut attributes,
            &mut grants,
            &mut abilities,
            config,
        );

        for change in changes {
            controller.handle_tag_count_changed(&change.tag, change.new_count);
            if change.tag == GameplayTag::DEAD && change.new_count > 0 {
                // No-op на authority: там Dead выставил сам die()
                controller.mirror_remote_death();
            }

            tag_events.write(TagCountChanged {
                character: entity,
                tag: change.tag,
                new_count: change.new_count,
            });
        }
        outbox.extend(entity, controller.into_signals());
    }
}

/// Completion callback анимации смерти → FinishDying
pub fn finish_death_animations(
    ctx: Res<ExecutionContext>,
    mut finished: EventReader<DeathAnimationFinished>,
    mut characters: Query<CharacterParts, With<Character>>,
    mut outbox: ResMut<LifecycleOutbox>,
) {
    for event in finished.read() {
        let Ok((entity, mut lifecycle, mut attributes, mut grants, mut abilities, config)) =
            characters.get_mut(event.character)
        else {
            continue;
        };

        let mut controller = LifecycleController::new(
            entity,
            *ctx,
            &mut lifecycle,
            &mut attributes,
            &mut grants,
            &mut abilities,
            config,
        );
        if let Err(err) = controller.finish_dying() {
            log(&format!("{:?}: {}", entity, err));
        }
        outbox.extend(entity, controller.into_signals());
    }
}

// ============================================================================
// Signals
// ============================================================================

/// LifecycleOutbox → typed события для presentation/UI/hosting слоя
pub fn publish_lifecycle_signals(
    mut outbox: ResMut<LifecycleOutbox>,
    mut initialized: EventWriter<CharacterInitialized>,
    mut received: EventWriter<ReceivedDamage>,
    mut disabled: EventWriter<PawnDisabled>,
    mut died: EventWriter<CharacterDied>,
    mut animations: EventWriter<DeathAnimationStarted>,
    mut despawns: EventWriter<PawnDespawnRequested>,
) {
    if outbox.is_empty() {
        return;
    }

    for (character, signal) in outbox.drain() {
        match signal {
            LifecycleSignal::Initialized { respawn } => {
                initialized.write(CharacterInitialized { character, respawn });
            }
            LifecycleSignal::DamageReceived {
                source,
                unmitigated,
                mitigated,
            } => {
                received.write(ReceivedDamage {
                    target: character,
                    source,
                    unmitigated,
                    mitigated,
                });
            }
            LifecycleSignal::PawnDisabled { pawn } => {
                disabled.write(PawnDisabled { character, pawn });
            }
            LifecycleSignal::Died { pawn } => {
                died.write(CharacterDied { character, pawn });
            }
            LifecycleSignal::DeathAnimationStarted { pawn, animation } => {
                animations.write(DeathAnimationStarted {
                    character,
                    pawn,
                    animation,
                });
            }
            LifecycleSignal::PawnReleased { pawn } => {
                despawns.write(PawnDespawnRequested { character, pawn });
            }
        }
    }
}
