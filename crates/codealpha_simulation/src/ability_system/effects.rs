//! Effect definitions (data) и активные эффекты

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::error::LifecycleError;
use crate::tags::GameplayTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectDuration {
    /// Меняет base values и сразу заканчивается
    #[default]
    Instant,
    /// Висит до явного снятия: additive модификаторы + granted tags
    Infinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    Add,
    Multiply,
    Override,
}

/// Magnitude, масштабируемая от уровня: base + per_level × (level − 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalableFloat {
    pub base: f32,
    #[serde(default)]
    pub per_level: f32,
}

impl ScalableFloat {
    pub fn flat(base: f32) -> Self {
        Self { base, per_level: 0.0 }
    }

    pub fn at(&self, level: f32) -> f32 {
        self.base + self.per_level * (level - 1.0).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifier {
    pub attribute: Attribute,
    pub op: ModifierOp,
    pub magnitude: ScalableFloat,
}

/// Определение эффекта (из RON конфига персонажа)
///
/// Модификаторы применяются в порядке списка: для default attributes
/// MaxHealth должен идти раньше Health, иначе Health упрётся в старый max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub name: String,
    #[serde(default)]
    pub duration: EffectDuration,
    #[serde(default)]
    pub modifiers: Vec<AttributeModifier>,
    /// Теги самого эффекта (для RemoveOnDeath и подобных запросов)
    #[serde(default)]
    pub asset_tags: Vec<GameplayTag>,
    /// Теги, которые владелец получает пока эффект активен (только Infinite)
    #[serde(default)]
    pub granted_tags: Vec<GameplayTag>,
}

impl EffectDefinition {
    pub fn instant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: EffectDuration::Instant,
            modifiers: Vec::new(),
            asset_tags: Vec::new(),
            granted_tags: Vec::new(),
        }
    }

    pub fn infinite(name: impl Into<String>) -> Self {
        Self {
            duration: EffectDuration::Infinite,
            ..Self::instant(name)
        }
    }

    pub fn with_modifier(mut self, attribute: Attribute, op: ModifierOp, magnitude: f32) -> Self {
        self.modifiers.push(AttributeModifier {
            attribute,
            op,
            magnitude: ScalableFloat::flat(magnitude),
        });
        self
    }

    pub fn with_asset_tag(mut self, tag: GameplayTag) -> Self {
        self.asset_tags.push(tag);
        self
    }

    pub fn with_granted_tag(mut self, tag: GameplayTag) -> Self {
        self.granted_tags.push(tag);
        self
    }

    /// Asset или granted тег matches одному из `tags`
    pub fn has_any_tag(&self, tags: &[GameplayTag]) -> bool {
        self.asset_tags
            .iter()
            .chain(self.granted_tags.iter())
            .any(|tag| tag.matches_any(tags))
    }

    /// Проверка до применения: эффект либо применяется целиком, либо никак
    pub fn validate(&self) -> Result<(), LifecycleError> {
        for modifier in &self.modifiers {
            if !modifier.magnitude.base.is_finite() || !modifier.magnitude.per_level.is_finite() {
                return Err(LifecycleError::invalid(
                    Some(modifier.attribute),
                    format!("effect '{}' has non-finite magnitude", self.name),
                ));
            }

            if self.duration == EffectDuration::Infinite && modifier.op != ModifierOp::Add {
                return Err(LifecycleError::Configuration(format!(
                    "effect '{}': infinite effects support only Add modifiers, got {:?} on {}",
                    self.name,
                    modifier.op,
                    modifier.attribute.as_str()
                )));
            }
        }

        if self.duration == EffectDuration::Instant && !self.granted_tags.is_empty() {
            return Err(LifecycleError::Configuration(format!(
                "effect '{}': instant effects cannot grant tags",
                self.name
            )));
        }

        Ok(())
    }
}

/// Handle применённого эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(pub(crate) u64);

/// Активный (Infinite) эффект и то, что он внёс в атрибуты
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub handle: EffectHandle,
    pub definition: EffectDefinition,
    pub level: f32,
    pub source: Option<Entity>,
    pub(crate) contributions: Vec<(Attribute, f32)>,
}
