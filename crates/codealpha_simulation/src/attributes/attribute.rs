//! Attribute идентификаторы и их спецификации

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Атрибут персонажа
///
/// `Damage`: meta-атрибут: scratch space для входящего урона,
/// не реплицируется и не хранит persistent состояние.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect,
)]
pub enum Attribute {
    CharacterLevel,
    Health,
    MaxHealth,
    Mana,
    MaxMana,
    Damage,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::CharacterLevel,
        Attribute::Health,
        Attribute::MaxHealth,
        Attribute::Mana,
        Attribute::MaxMana,
        Attribute::Damage,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Attribute::CharacterLevel => 0,
            Attribute::Health => 1,
            Attribute::MaxHealth => 2,
            Attribute::Mana => 3,
            Attribute::MaxMana => 4,
            Attribute::Damage => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::CharacterLevel => "CharacterLevel",
            Attribute::Health => "Health",
            Attribute::MaxHealth => "MaxHealth",
            Attribute::Mana => "Mana",
            Attribute::MaxMana => "MaxMana",
            Attribute::Damage => "Damage",
        }
    }

    /// Meta-атрибуты живут только на authority
    pub fn is_meta(self) -> bool {
        matches!(self, Attribute::Damage)
    }

    /// "Replicate on change" флаг
    pub fn replicates(self) -> bool {
        !self.is_meta()
    }

    /// Max-атрибут, ограничивающий этот (Health → MaxHealth)
    pub fn paired_max(self) -> Option<Attribute> {
        match self {
            Attribute::Health => Some(Attribute::MaxHealth),
            Attribute::Mana => Some(Attribute::MaxMana),
            _ => None,
        }
    }

    /// Обратная связь: MaxHealth → Health
    pub fn bounded_by_this(self) -> Option<Attribute> {
        match self {
            Attribute::MaxHealth => Some(Attribute::Health),
            Attribute::MaxMana => Some(Attribute::Mana),
            _ => None,
        }
    }
}

/// Значение одного атрибута
///
/// Инвариант: min_value ≤ current_value (≤ max_value, ≤ paired max)
///
/// `current_value = clamp(base_value + modifier_total)`, где modifier_total это
/// сумма additive модификаторов от активных Infinite эффектов.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AttributeSpec {
    pub current_value: f32,
    pub base_value: f32,
    pub min_value: f32,
    pub max_value: Option<f32>,
    pub modifier_total: f32,
}

impl AttributeSpec {
    pub fn new(base: f32, min_value: f32, max_value: Option<f32>) -> Self {
        Self {
            current_value: base,
            base_value: base,
            min_value,
            max_value,
            modifier_total: 0.0,
        }
    }

    /// Дефолт для атрибута: всё по нулям, CharacterLevel начинается с 1
    pub fn default_for(attribute: Attribute) -> Self {
        match attribute {
            Attribute::CharacterLevel => Self::new(1.0, 1.0, None),
            _ => Self::new(0.0, 0.0, None),
        }
    }
}

/// Запись об изменении current value (old → new)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeChange {
    pub attribute: Attribute,
    pub old_value: f32,
    pub new_value: f32,
}
