//! Ability system: коллаборатор lifecycle ядра
//!
//! Минимальная реализация примитивов, которые ядро ожидает снаружи:
//! - apply effect (instant/infinite) → handle
//! - tag counts (через `TagState`)
//! - give/clear ability, cancel by tags, active abilities
//!
//! Host может держать свою систему эффектов; ядро ходит только через эти методы.
//! Живёт на character record и переживает смерть pawn'а.

use bevy::prelude::*;

pub mod abilities;
pub mod effects;


pub use abilities::{AbilityDefinition, AbilityHandle, AbilityInputId, AbilitySpec};
pub use effects::{
    ActiveEffect, AttributeModifier, EffectDefinition, EffectDuration, EffectHandle, ModifierOp,
    ScalableFloat,
};

use crate::attributes::AttributeSet;
use crate::error::LifecycleError;
use crate::tags::{GameplayTag, TagState};

#[derive(Component, Debug, Default)]
pub struct AbilitySystem {
    pub tags: TagState,
    specs: Vec<AbilitySpec>,
    active_effects: Vec<ActiveEffect>,
    next_handle: u64,
}

impl AbilitySystem {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    // --- Effects ---

    /// Применяет эффект к атрибутам владельца на уровне `level`.
    ///
    /// Instant: Add сдвигает current, Multiply/Override меняют base (в порядке модификаторов).
    /// Infinite: additive модификаторы + granted tags, регистрируется как активный.
    pub fn apply_effect(
        &mut self,
        attributes: &mut AttributeSet,
        definition: &EffectDefinition,
        level: f32,
        source: Option<Entity>,
    ) -> Result<EffectHandle, LifecycleError> {
        definition.validate()?;
        let handle = EffectHandle(self.next_handle());

        match definition.duration {
            EffectDuration::Instant => {
                for modifier in &definition.modifiers {
                    let magnitude = modifier.magnitude.at(level);
                    let attribute = modifier.attribute;
                    match modifier.op {
                        // Add идёт от current, как урон
                        ModifierOp::Add => attributes.apply_delta(attribute, magnitude)?,
                        ModifierOp::Multiply => {
                            attributes.set_base(attribute, attributes.base(attribute) * magnitude)?
                        }
                        ModifierOp::Override => attributes.set_base(attribute, magnitude)?,
                    };
                }
            }
            EffectDuration::Infinite => {
                let mut contributions = Vec::with_capacity(definition.modifiers.len());
                for modifier in &definition.modifiers {
                    let magnitude = modifier.magnitude.at(level);
                    attributes.add_modifier(modifier.attribute, magnitude)?;
                    contributions.push((modifier.attribute, magnitude));
                }
                for tag in &definition.granted_tags {
                    self.tags.add_tag_count(tag);
                }

                self.active_effects.push(ActiveEffect {
                    handle,
                    definition: definition.clone(),
                    level,
                    source,
                    contributions,
                });
            }
        }

        Ok(handle)
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active_effects
    }

    pub fn is_effect_active(&self, handle: EffectHandle) -> bool {
        self.active_effects.iter().any(|effect| effect.handle == handle)
    }

    /// Снимает активный эффект: откатывает модификаторы и granted tags
    pub fn remove_active_effect(
        &mut self,
        attributes: &mut AttributeSet,
        handle: EffectHandle,
    ) -> bool {
        let Some(index) = self.active_effects.iter().position(|e| e.handle == handle) else {
            return false;
        };

        let effect = self.active_effects.remove(index);
        for (attribute, amount) in effect.contributions {
            // amount уже провалидирован при apply → конечный
            let _ = attributes.add_modifier(attribute, -amount);
        }
        for tag in &effect.definition.granted_tags {
            self.tags.remove_tag_count(tag);
        }
        true
    }

    /// Снимает все активные эффекты с matching asset/granted тегом
    pub fn remove_active_effects_with_tags(
        &mut self,
        attributes: &mut AttributeSet,
        tags: &[GameplayTag],
    ) -> usize {
        let handles: Vec<EffectHandle> = self
            .active_effects
            .iter()
            .filter(|effect| effect.definition.has_any_tag(tags))
            .map(|effect| effect.handle)
            .collect();

        // Два прохода: сначала собрали, потом снимаем
        handles
            .into_iter()
            .filter(|handle| self.remove_active_effect(attributes, *handle))
            .count()
    }

    // --- Abilities ---

    pub fn give_ability(
        &mut self,
        ability: &AbilityDefinition,
        level: u32,
        input_id: AbilityInputId,
        source: Option<Entity>,
    ) -> AbilityHandle {
        let handle = AbilityHandle(self.next_handle());
        self.specs.push(AbilitySpec {
            handle,
            ability: ability.clone(),
            level,
            input_id,
            source,
            active: false,
        });
        handle
    }

    pub fn clear_ability(&mut self, handle: AbilityHandle) -> bool {
        let before = self.specs.len();
        self.specs.retain(|spec| spec.handle != handle);
        self.specs.len() != before
    }

    pub fn activatable_abilities(&self) -> &[AbilitySpec] {
        &self.specs
    }

    pub fn find_spec(&self, handle: AbilityHandle) -> Option<&AbilitySpec> {
        self.specs.iter().find(|spec| spec.handle == handle)
    }

    /// Spec, привязанный к input (None ни к чему не привязан)
    pub fn find_spec_by_input(&self, input_id: AbilityInputId) -> Option<&AbilitySpec> {
        if input_id == AbilityInputId::None {
            return None;
        }
        self.specs.iter().find(|spec| spec.input_id == input_id)
    }

    /// Уровень ability на этом input
    pub fn ability_level(&self, input_id: AbilityInputId) -> Option<u32> {
        self.find_spec_by_input(input_id).map(|spec| spec.level)
    }

    /// Нажатие ability input.
    ///
    /// Confirm завершает активные abilities (цель подтверждена), Cancel их
    /// отменяет, остальные id активируют привязанные specs.
    /// Возвращает сколько abilities сменили состояние.
    pub fn ability_input_pressed(&mut self, input_id: AbilityInputId) -> usize {
        match input_id {
            AbilityInputId::None => 0,
            AbilityInputId::Confirm => self
                .active_abilities()
                .into_iter()
                .filter(|handle| self.end_ability(*handle))
                .count(),
            AbilityInputId::Cancel => self.cancel_all_abilities(),
            _ => self
                .handles_for_input(input_id)
                .into_iter()
                .filter(|handle| self.try_activate_ability(*handle))
                .count(),
        }
    }

    /// Отпускание: hold-abilities на этом input заканчиваются
    pub fn ability_input_released(&mut self, input_id: AbilityInputId) -> usize {
        if matches!(
            input_id,
            AbilityInputId::None | AbilityInputId::Confirm | AbilityInputId::Cancel
        ) {
            return 0;
        }

        self.handles_for_input(input_id)
            .into_iter()
            .filter(|handle| self.end_ability(*handle))
            .count()
    }

    fn handles_for_input(&self, input_id: AbilityInputId) -> Vec<AbilityHandle> {
        self.specs
            .iter()
            .filter(|spec| spec.input_id == input_id)
            .map(|spec| spec.handle)
            .collect()
    }

    /// Активирует ability. Отказ если мёртв, уже активна или stun
    /// (кроме Ability.NotCanceledByStun).
    pub fn try_activate_ability(&mut self, handle: AbilityHandle) -> bool {
        let dead = self.tags.has_tag(&GameplayTag::DEAD);
        let stunned = self.tags.has_tag(&GameplayTag::STUN);

        let Some(spec) = self.specs.iter_mut().find(|spec| spec.handle == handle) else {
            return false;
        };

        let ignores_stun = spec.ability.has_any_tag(&[GameplayTag::NOT_CANCELED_BY_STUN]);
        if spec.active || dead || (stunned && !ignores_stun) {
            return false;
        }

        spec.active = true;
        true
    }

    pub fn end_ability(&mut self, handle: AbilityHandle) -> bool {
        match self.specs.iter_mut().find(|spec| spec.handle == handle) {
            Some(spec) if spec.active => {
                spec.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn active_abilities(&self) -> Vec<AbilityHandle> {
        self.specs
            .iter()
            .filter(|spec| spec.active)
            .map(|spec| spec.handle)
            .collect()
    }

    /// Отменяет активные abilities с тегом из `match_tags` (пустой = все),
    /// пропуская те, у которых есть тег из `exclude_tags`.
    pub fn cancel_abilities(
        &mut self,
        match_tags: &[GameplayTag],
        exclude_tags: &[GameplayTag],
    ) -> usize {
        let mut cancelled = 0;
        for spec in self.specs.iter_mut().filter(|spec| spec.active) {
            let matched = match_tags.is_empty() || spec.ability.has_any_tag(match_tags);
            if matched && !spec.ability.has_any_tag(exclude_tags) {
                spec.active = false;
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn cancel_all_abilities(&mut self) -> usize {
        self.cancel_abilities(&[], &[])
    }
}
