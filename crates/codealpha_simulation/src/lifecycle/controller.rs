//! LifecycleController: Initialize / Die / FinishDying для одного персонажа
//!
//! Контроллер синхронный и ничего не знает про ECS: он мутирует компоненты
//! character record по ссылкам и копит `LifecycleSignal`. Системы потом
//! превращают сигналы в события (presentation, UI, replication).

use bevy::prelude::*;

use super::state::{CharacterLifecycleState, Lifecycle};
use crate::ability_system::{AbilityDefinition, AbilitySystem, EffectDefinition};
use crate::attributes::{Attribute, AttributeChange, AttributeSet};
use crate::authority::ExecutionContext;
use crate::config::{CharacterConfig, DeathAnimation};
use crate::damage::resolve_damage;
use crate::error::LifecycleError;
use crate::grants::{AbilityGrantController, AbilityGrantState};
use crate::logger;
use crate::tags::GameplayTag;

/// Побочные эффекты переходов, которые исполняет не контроллер
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleSignal {
    Initialized {
        respawn: bool,
    },
    DamageReceived {
        source: Option<Entity>,
        unmitigated: f32,
        mitigated: f32,
    },
    /// Выключить движение/коллизию pawn'а
    PawnDisabled {
        pawn: Entity,
    },
    Died {
        pawn: Option<Entity>,
    },
    DeathAnimationStarted {
        pawn: Entity,
        animation: DeathAnimation,
    },
    /// Pawn больше не принадлежит персонажу → despawn
    PawnReleased {
        pawn: Entity,
    },
}

/// Результат `die()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathOutcome {
    /// Нет authority или персонаж не Alive: ничего не произошло
    Ignored,
    /// Анимация смерти запущена, FinishDying по completion callback
    Dying,
    /// Анимации нет, FinishDying отработал в том же вызове
    Dead,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializeReport {
    pub respawn: bool,
    pub startup_effects_applied: usize,
    pub abilities_granted: usize,
    /// Нефатальные ошибки (нет default attributes, битый эффект)
    pub errors: Vec<LifecycleError>,
}

pub struct LifecycleController<'a> {
    pub owner: Entity,
    pub ctx: ExecutionContext,
    pub lifecycle: &'a mut Lifecycle,
    pub attributes: &'a mut AttributeSet,
    pub grants: &'a mut AbilityGrantState,
    pub abilities: &'a mut AbilitySystem,
    pub config: &'a CharacterConfig,
    signals: Vec<LifecycleSignal>,
}

impl<'a> LifecycleController<'a> {
    pub fn new(
        owner: Entity,
        ctx: ExecutionContext,
        lifecycle: &'a mut Lifecycle,
        attributes: &'a mut AttributeSet,
        grants: &'a mut AbilityGrantState,
        abilities: &'a mut AbilitySystem,
        config: &'a CharacterConfig,
    ) -> Self {
        Self {
            owner,
            ctx,
            lifecycle,
            attributes,
            grants,
            abilities,
            config,
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> CharacterLifecycleState {
        self.lifecycle.state
    }

    pub fn signals(&self) -> &[LifecycleSignal] {
        &self.signals
    }

    pub fn into_signals(self) -> Vec<LifecycleSignal> {
        self.signals
    }

    /// Initialize из конфига персонажа (spawn, respawn, redundant init)
    pub fn initialize(&mut self, pawn: Option<Entity>) -> Result<InitializeReport, LifecycleError> {
        let config = self.config;
        self.initialize_with(
            pawn,
            config.default_attributes.as_ref(),
            &config.startup_effects,
            &config.abilities,
        )
    }

    /// Uninitialized/Dead/Alive → Alive.
    ///
    /// Из Dying: `StateViolation`, ничего не меняется. Повторный вызов в Alive
    /// разрешён: one-shot флаги grant'ов не дают выдать abilities дважды.
    pub fn initialize_with(
        &mut self,
        pawn: Option<Entity>,
        defaults: Option<&EffectDefinition>,
        startup_effects: &[EffectDefinition],
        ability_list: &[AbilityDefinition],
    ) -> Result<InitializeReport, LifecycleError> {
        let previous = self.lifecycle.state;
        if previous == CharacterLifecycleState::Dying {
            return Err(LifecycleError::StateViolation {
                operation: "initialize",
                state: previous,
            });
        }

        let owner = self.owner;
        let respawn = previous == CharacterLifecycleState::Dead;
        let mut report = InitializeReport {
            respawn,
            ..Default::default()
        };

        let mut grants = AbilityGrantController {
            owner,
            ctx: self.ctx,
            state: &mut *self.grants,
            abilities: &mut *self.abilities,
        };

        if respawn {
            grants.begin_new_life(self.attributes);
        }

        if pawn.is_some() {
            self.lifecycle.pawn = pawn;
        }
        self.lifecycle.state = CharacterLifecycleState::Alive;
        grants.abilities.tags.force_tag_count(&GameplayTag::DEAD, 0);

        match defaults {
            Some(effect) => {
                let level = self.attributes.character_level();
                if let Err(err) = grants
                    .abilities
                    .apply_effect(self.attributes, effect, level, Some(owner))
                {
                    logger::log_error(&format!(
                        "Default attributes '{}' for {:?} rejected: {}",
                        effect.name, owner, err
                    ));
                    report.errors.push(err);
                }
            }
            None => {
                let err = LifecycleError::Configuration(format!(
                    "{:?} has no default attributes effect",
                    owner
                ));
                logger::log_error(&err.to_string());
                report.errors.push(err);
            }
        }

        // Полные ресурсы после defaults: на respawn defaults и replication max'ов
        // могут разъехаться, оба пути должны оставить персонажа full
        let max_health = self.attributes.max_health();
        let max_mana = self.attributes.max_mana();
        self.attributes.set_base(Attribute::Health, max_health)?;
        self.attributes.set_base(Attribute::Mana, max_mana)?;

        match grants.apply_startup_effects(self.attributes, startup_effects) {
            Ok(applied) => report.startup_effects_applied = applied,
            Err(err) => log_skipped(owner, &err),
        }

        let level = self.attributes.character_level();
        match grants.grant_startup_abilities(ability_list, level) {
            Ok(granted) => report.abilities_granted = granted,
            Err(err) => log_skipped(owner, &err),
        }

        logger::log_info(&format!(
            "{:?} initialized (respawn: {}, health: {}/{}, mana: {}/{})",
            owner,
            respawn,
            self.attributes.health(),
            self.attributes.max_health(),
            self.attributes.mana(),
            self.attributes.max_mana()
        ));
        self.signals.push(LifecycleSignal::Initialized { respawn });
        Ok(report)
    }

    /// Alive → Dying (→ Dead если анимации нет). Только на authority.
    ///
    /// Порядок: revoke abilities, выключить pawn, cancel всех abilities,
    /// снять RemoveOnDeath эффекты, Dead тег, Died.
    pub fn die(&mut self) -> DeathOutcome {
        let owner = self.owner;
        if let Err(err) = self.ctx.require_authority("die") {
            logger::log(&format!("{:?}: {}", owner, err));
            return DeathOutcome::Ignored;
        }
        if self.lifecycle.state != CharacterLifecycleState::Alive {
            logger::log(&format!("{:?}: die() ignored in {:?}", owner, self.lifecycle.state));
            return DeathOutcome::Ignored;
        }

        let mut grants = AbilityGrantController {
            owner,
            ctx: self.ctx,
            state: &mut *self.grants,
            abilities: &mut *self.abilities,
        };
        let revoked = grants.revoke_all().unwrap_or_else(|err| {
            logger::log_error(&format!("{:?}: revoke on death failed: {}", owner, err));
            0
        });

        if let Some(pawn) = self.lifecycle.pawn {
            self.signals.push(LifecycleSignal::PawnDisabled { pawn });
        }

        let cancelled = self.abilities.cancel_all_abilities();
        let removed = self
            .abilities
            .remove_active_effects_with_tags(self.attributes, &[GameplayTag::REMOVE_ON_DEATH]);
        self.abilities.tags.set_tag(&GameplayTag::DEAD, true);

        logger::log_info(&format!(
            "{:?} died (revoked: {}, cancelled: {}, effects removed: {})",
            owner, revoked, cancelled, removed
        ));
        self.enter_dying()
    }

    /// Dying → Dead. Pawn отпускается (despawn делает host).
    pub fn finish_dying(&mut self) -> Result<(), LifecycleError> {
        if self.lifecycle.state != CharacterLifecycleState::Dying {
            return Err(LifecycleError::StateViolation {
                operation: "finish_dying",
                state: self.lifecycle.state,
            });
        }

        self.complete_death();
        Ok(())
    }

    /// Урон через DamageResolver + death trigger.
    ///
    /// Вне Alive: no-op (смерть уже sequenced), возвращает 0.
    pub fn receive_damage(
        &mut self,
        amount: f32,
        source: Option<Entity>,
    ) -> Result<f32, LifecycleError> {
        if self.lifecycle.state != CharacterLifecycleState::Alive {
            logger::log(&format!(
                "{:?}: damage {} ignored in {:?}",
                self.owner, amount, self.lifecycle.state
            ));
            return Ok(0.0);
        }

        let delta = resolve_damage(self.ctx, self.attributes, amount)?;
        self.signals.push(LifecycleSignal::DamageReceived {
            source,
            unmitigated: amount,
            mitigated: -delta,
        });

        if delta < 0.0 && self.attributes.health() <= 0.0 {
            self.die();
        }
        Ok(delta)
    }

    /// Death trigger по уведомлениям AttributeStore (Health: единственный триггер)
    pub fn handle_attribute_changes(&mut self, changes: &[AttributeChange]) -> DeathOutcome {
        let health_depleted = changes
            .iter()
            .any(|change| change.attribute == Attribute::Health && change.new_value <= 0.0);

        if health_depleted && self.lifecycle.state == CharacterLifecycleState::Alive {
            self.die()
        } else {
            DeathOutcome::Ignored
        }
    }

    /// Stun реакция: count > 0 отменяет активные Ability.* кроме NotCanceledByStun
    pub fn handle_tag_count_changed(&mut self, tag: &GameplayTag, new_count: u32) -> usize {
        if *tag != GameplayTag::STUN || new_count == 0 {
            return 0;
        }

        let cancelled = self
            .abilities
            .cancel_abilities(&[GameplayTag::ABILITY], &[GameplayTag::NOT_CANCELED_BY_STUN]);
        if cancelled > 0 {
            logger::log(&format!("{:?} stunned: cancelled {} abilities", self.owner, cancelled));
        }
        cancelled
    }

    /// Наблюдатель: replicated Dead тег → отражаем смерть.
    ///
    /// Только presentation сигналы. Revoke/cancel/снятие эффектов уже сделала
    /// authority, их результат придёт репликацией.
    pub fn mirror_remote_death(&mut self) -> DeathOutcome {
        if self.ctx.has_authority || self.lifecycle.state != CharacterLifecycleState::Alive {
            return DeathOutcome::Ignored;
        }

        if let Some(pawn) = self.lifecycle.pawn {
            self.signals.push(LifecycleSignal::PawnDisabled { pawn });
        }
        logger::log_info(&format!("{:?} died (mirrored from authority)", self.owner));
        self.enter_dying()
    }

    fn enter_dying(&mut self) -> DeathOutcome {
        let config = self.config;
        let pawn = self.lifecycle.pawn;
        self.signals.push(LifecycleSignal::Died { pawn });
        self.lifecycle.state = CharacterLifecycleState::Dying;

        match (&config.death_animation, pawn) {
            (Some(animation), Some(pawn)) => {
                self.signals.push(LifecycleSignal::DeathAnimationStarted {
                    pawn,
                    animation: animation.clone(),
                });
                DeathOutcome::Dying
            }
            _ => {
                self.complete_death();
                DeathOutcome::Dead
            }
        }
    }

    fn complete_death(&mut self) {
        if let Some(pawn) = self.lifecycle.pawn.take() {
            self.signals.push(LifecycleSignal::PawnReleased { pawn });
        }
        self.lifecycle.state = CharacterLifecycleState::Dead;
        logger::log(&format!("{:?} finished dying", self.owner));
    }
}

fn log_skipped(owner: Entity, err: &LifecycleError) {
    match err {
        // Наблюдатель: grant/apply: только на authority, нормальный путь
        LifecycleError::AuthorityViolation { .. } => {
            logger::log(&format!("{:?}: skipped on observer ({})", owner, err))
        }
        _ => logger::log_error(&format!("{:?}: {}", owner, err)),
    }
}
