//! Startup abilities/effects с one-shot гейтингом
//!
//! Два call site (takeover на сервере и replication player state) могут
//! прилететь в любом порядке в одном тике: one-shot флаги делают grant/apply
//! идемпотентными. Флаги меняются только внутри `AbilityGrantController`.

use bevy::prelude::*;

use crate::ability_system::{
    AbilityDefinition, AbilityHandle, AbilitySystem, EffectDefinition, EffectHandle,
};
use crate::attributes::AttributeSet;
use crate::authority::ExecutionContext;
use crate::error::LifecycleError;
use crate::logger;


/// One-shot состояние grant'ов на одну жизнь персонажа
///
/// Инвариант: abilities_given ⇔ granted_abilities соответствует startup списку.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AbilityGrantState {
    abilities_given: bool,
    startup_effects_applied: bool,
    granted_abilities: Vec<AbilityHandle>,
    startup_effect_handles: Vec<EffectHandle>,
}

impl AbilityGrantState {
    pub fn abilities_given(&self) -> bool {
        self.abilities_given
    }

    pub fn startup_effects_applied(&self) -> bool {
        self.startup_effects_applied
    }

    pub fn granted_abilities(&self) -> &[AbilityHandle] {
        &self.granted_abilities
    }
}

/// Уровень, на котором выдаются startup abilities
pub fn ability_level(character_level: f32) -> u32 {
    if character_level.is_finite() {
        character_level.floor().max(1.0) as u32
    } else {
        1
    }
}

/// Grant/revoke startup abilities и apply startup effects для одного персонажа
pub struct AbilityGrantController<'a> {
    pub owner: Entity,
    pub ctx: ExecutionContext,
    pub state: &'a mut AbilityGrantState,
    pub abilities: &'a mut AbilitySystem,
}

impl<'a> AbilityGrantController<'a> {
    /// Выдаёт abilities в порядке списка. Возвращает сколько выдано
    /// (0 если уже выданы в этой жизни).
    pub fn grant_startup_abilities(
        &mut self,
        ability_list: &[AbilityDefinition],
        character_level: f32,
    ) -> Result<usize, LifecycleError> {
        self.ctx.require_authority("grant_startup_abilities")?;
        if self.state.abilities_given {
            return Ok(0);
        }

        let level = ability_level(character_level);
        for ability in ability_list {
            let handle = self
                .abilities
                .give_ability(ability, level, ability.input_id, Some(self.owner));
            self.state.granted_abilities.push(handle);
        }
        self.state.abilities_given = true;

        logger::log(&format!(
            "Granted {} startup abilities to {:?} at level {}",
            ability_list.len(),
            self.owner,
            level
        ));
        Ok(ability_list.len())
    }

    /// Снимает ровно те abilities, которые выдал этот контроллер этому персонажу.
    /// Abilities от других источников не трогаем.
    pub fn revoke_all(&mut self) -> Result<usize, LifecycleError> {
        self.ctx.require_authority("revoke_all")?;
        if !self.state.abilities_given {
            return Ok(0);
        }

        let owner = Some(self.owner);
        let owned: Vec<AbilityHandle> = self
            .state
            .granted_abilities
            .iter()
            .copied()
            .filter(|handle| {
                self.abilities
                    .find_spec(*handle)
                    .is_some_and(|spec| spec.source == owner)
            })
            .collect();

        let removed = owned
            .into_iter()
            .filter(|handle| self.abilities.clear_ability(*handle))
            .count();

        self.state.granted_abilities.clear();
        self.state.abilities_given = false;
        Ok(removed)
    }

    /// Применяет startup эффекты в порядке списка, один раз за жизнь.
    ///
    /// Невалидный эффект логируется и пропускается, остальные применяются.
    pub fn apply_startup_effects(
        &mut self,
        attributes: &mut AttributeSet,
        effect_list: &[EffectDefinition],
    ) -> Result<usize, LifecycleError> {
        self.ctx.require_authority("apply_startup_effects")?;
        if self.state.startup_effects_applied {
            return Ok(0);
        }

        let level = attributes.character_level();
        let mut applied = 0;
        for effect in effect_list {
            match self
                .abilities
                .apply_effect(attributes, effect, level, Some(self.owner))
            {
                Ok(handle) => {
                    if self.abilities.is_effect_active(handle) {
                        self.state.startup_effect_handles.push(handle);
                    }
                    applied += 1;
                }
                Err(err) => logger::log_error(&format!(
                    "Startup effect '{}' for {:?} rejected: {}",
                    effect.name, self.owner, err
                )),
            }
        }
        self.state.startup_effects_applied = true;
        Ok(applied)
    }

    /// Начало новой жизни (respawn): снимаем уцелевшие startup эффекты
    /// прошлой жизни и сбрасываем one-shot флаги до повторного grant'а.
    pub fn begin_new_life(&mut self, attributes: &mut AttributeSet) {
        for handle in std::mem::take(&mut self.state.startup_effect_handles) {
            self.abilities.remove_active_effect(attributes, handle);
        }
        self.state.startup_effects_applied = false;

        if self.state.abilities_given {
            // revoke на смерти не прошёл (например Die() без authority): не выдаём дубли
            logger::log_warning(&format!(
                "{:?} starts a new life with abilities still granted",
                self.owner
            ));
        }
    }
}
