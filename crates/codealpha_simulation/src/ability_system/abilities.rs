//! Ability definitions и granted specs

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tags::GameplayTag;

/// Input binding для ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AbilityInputId {
    #[default]
    None,
    Confirm,
    Cancel,
    Ability1,
    Ability2,
    Ability3,
    Ability4,
    Ability5,
}

/// Определение ability (из конфига)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub name: String,
    #[serde(default)]
    pub input_id: AbilityInputId,
    #[serde(default)]
    pub tags: Vec<GameplayTag>,
}

impl AbilityDefinition {
    pub fn new(name: impl Into<String>, input_id: AbilityInputId) -> Self {
        Self {
            name: name.into(),
            input_id,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: GameplayTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn has_any_tag(&self, tags: &[GameplayTag]) -> bool {
        self.tags.iter().any(|tag| tag.matches_any(tags))
    }
}

/// Opaque handle выданной ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbilityHandle(pub(crate) u64);

/// Выданная (activatable) ability
#[derive(Debug, Clone, PartialEq)]
pub struct AbilitySpec {
    pub handle: AbilityHandle,
    pub ability: AbilityDefinition,
    pub level: u32,
    pub input_id: AbilityInputId,
    /// Кто выдал (фильтр при revoke: чужие abilities не трогаем)
    pub source: Option<Entity>,
    /// Ability сейчас исполняется
    pub active: bool,
}
