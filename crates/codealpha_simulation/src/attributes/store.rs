//! AttributeSet: server-authoritative хранилище атрибутов персонажа
//!
//! Мутации только через typed setters. Каждая успешная мутация, изменившая
//! current value, кладёт `AttributeChange` в очередь. Очередь синхронно
//! читает `LifecycleController` (death trigger) и дренирует
//! `publish_attribute_changes` в `AttributeChanged` события.

use bevy::prelude::*;

use super::attribute::{Attribute, AttributeChange, AttributeSpec};
use crate::error::LifecycleError;

/// Полный набор атрибутов одного персонажа
///
/// Инварианты после каждой операции:
/// - 0 ≤ Health ≤ MaxHealth
/// - 0 ≤ Mana ≤ MaxMana
/// - ни один атрибут не ниже своего min_value
///
/// Создаётся при инициализации персонажа, на respawn сбрасывается (не пересоздаётся).
#[derive(Component, Debug, Clone)]
pub struct AttributeSet {
    specs: [AttributeSpec; 6],
    changes: Vec<AttributeChange>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self {
            specs: Attribute::ALL.map(AttributeSpec::default_for),
            changes: Vec::new(),
        }
    }
}

impl AttributeSet {
    /// Персонаж с полными ресурсами (удобно для тестов и AI без конфига)
    pub fn with_resources(max_health: f32, max_mana: f32) -> Self {
        let mut set = Self::default();
        for (attribute, value) in [
            (Attribute::MaxHealth, max_health),
            (Attribute::Health, max_health),
            (Attribute::MaxMana, max_mana),
            (Attribute::Mana, max_mana),
        ] {
            let spec = &mut set.specs[attribute.index()];
            let value = value.max(spec.min_value);
            spec.base_value = value;
            spec.current_value = value;
        }
        set
    }

    pub fn spec(&self, attribute: Attribute) -> &AttributeSpec {
        &self.specs[attribute.index()]
    }

    pub fn current(&self, attribute: Attribute) -> f32 {
        self.specs[attribute.index()].current_value
    }

    pub fn base(&self, attribute: Attribute) -> f32 {
        self.specs[attribute.index()].base_value
    }

    pub fn health(&self) -> f32 {
        self.current(Attribute::Health)
    }

    pub fn max_health(&self) -> f32 {
        self.current(Attribute::MaxHealth)
    }

    pub fn mana(&self) -> f32 {
        self.current(Attribute::Mana)
    }

    pub fn max_mana(&self) -> f32 {
        self.current(Attribute::MaxMana)
    }

    pub fn character_level(&self) -> f32 {
        self.current(Attribute::CharacterLevel)
    }

    /// Attribute-level проверка (lifecycle state: отдельная истина)
    pub fn has_health(&self) -> bool {
        self.health() > 0.0
    }

    /// Устанавливает base value с clamp в [min, max] (и ≤ paired max).
    ///
    /// NaN/inf отклоняются как InvalidInput, store не меняется.
    /// Возвращает новое current value.
    pub fn set_base(&mut self, attribute: Attribute, value: f32) -> Result<f32, LifecycleError> {
        if !value.is_finite() {
            return Err(LifecycleError::invalid(
                Some(attribute),
                format!("non-finite base value {}", value),
            ));
        }

        let clamped = self.clamp_to_bounds(attribute, value);
        self.specs[attribute.index()].base_value = clamped;
        self.recompute(attribute);
        Ok(self.current(attribute))
    }

    /// current += delta, затем clamp.
    ///
    /// Delta считается от current value: активные модификаторы не съедают
    /// урон. Base становится `current - modifier_total` и может уйти ниже
    /// min_value, пока модификатор активен.
    pub fn apply_delta(&mut self, attribute: Attribute, delta: f32) -> Result<f32, LifecycleError> {
        if !delta.is_finite() {
            return Err(LifecycleError::invalid(
                Some(attribute),
                format!("non-finite delta {}", delta),
            ));
        }

        let target = self.current(attribute) + delta;
        self.write_current(attribute, target);
        Ok(self.current(attribute))
    }

    /// Additive модификатор от Infinite эффекта (влияет на current, не на base)
    pub(crate) fn add_modifier(
        &mut self,
        attribute: Attribute,
        amount: f32,
    ) -> Result<f32, LifecycleError> {
        if !amount.is_finite() {
            return Err(LifecycleError::invalid(
                Some(attribute),
                format!("non-finite modifier {}", amount),
            ));
        }

        self.specs[attribute.index()].modifier_total += amount;
        self.recompute(attribute);
        Ok(self.current(attribute))
    }

    /// Значение пришло от authority: ставим как есть, без clamp.
    ///
    /// Между атрибутами порядок доставки не гарантирован (Health может прийти
    /// раньше MaxHealth), поэтому clamp против локального paired max исказил бы значение.
    pub fn apply_replicated(
        &mut self,
        attribute: Attribute,
        value: f32,
    ) -> Result<f32, LifecycleError> {
        if !value.is_finite() {
            return Err(LifecycleError::invalid(
                Some(attribute),
                format!("non-finite replicated value {}", value),
            ));
        }

        let spec = &mut self.specs[attribute.index()];
        let old_value = spec.current_value;
        spec.base_value = value;
        spec.modifier_total = 0.0;
        spec.current_value = value;
        self.record(attribute, old_value, value);
        Ok(value)
    }

    /// Очередь изменений, ещё не опубликованных в event bus
    pub fn pending_changes(&self) -> &[AttributeChange] {
        &self.changes
    }

    pub fn take_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.changes)
    }

    fn upper_bound(&self, attribute: Attribute) -> Option<f32> {
        let own = self.specs[attribute.index()].max_value;
        let paired = attribute.paired_max().map(|max| self.current(max));

        match (own, paired) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn clamp_to_bounds(&self, attribute: Attribute, value: f32) -> f32 {
        let min_value = self.specs[attribute.index()].min_value;
        let mut clamped = value.max(min_value);
        if let Some(max) = self.upper_bound(attribute) {
            clamped = clamped.min(max.max(min_value));
        }
        clamped
    }

    fn recompute(&mut self, attribute: Attribute) {
        let spec = self.specs[attribute.index()];
        let new_value = self.clamp_to_bounds(attribute, spec.base_value + spec.modifier_total);
        let old_value = spec.current_value;
        self.specs[attribute.index()].current_value = new_value;
        self.record(attribute, old_value, new_value);

        // MaxHealth упал ниже Health → Health тоже поджимаем
        if let Some(bounded) = attribute.bounded_by_this() {
            let bounded_current = self.current(bounded);
            if self.clamp_to_bounds(bounded, bounded_current) != bounded_current {
                self.write_current(bounded, bounded_current);
            }
        }
    }

    /// Ставит current = clamp(value), base подгоняется под активные модификаторы
    fn write_current(&mut self, attribute: Attribute, value: f32) {
        let target = self.clamp_to_bounds(attribute, value);
        let spec = &mut self.specs[attribute.index()];
        spec.base_value = target - spec.modifier_total;
        self.recompute(attribute);
    }

    fn record(&mut self, attribute: Attribute, old_value: f32, new_value: f32) {
        if old_value != new_value {
            self.changes.push(AttributeChange {
                attribute,
                old_value,
                new_value,
            });
        }
    }
}
