//! Gameplay tags: иерархические имена ("State.Debuff.Stun") + счётчики
//!
//! count > 0 ⇔ тег присутствует. Counted теги (Stun) стакаются от нескольких
//! источников, boolean теги (Dead) выставляются через `set_tag`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};


/// Имя тега (string symbol)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameplayTag(Cow<'static, str>);

impl GameplayTag {
    /// Персонаж мёртв
    pub const DEAD: GameplayTag = GameplayTag::from_static("State.Dead");
    /// Эффекты с этим тегом снимаются при смерти
    pub const REMOVE_ON_DEATH: GameplayTag = GameplayTag::from_static("State.RemoveOnDeath");
    /// Stun debuff (counted)
    pub const STUN: GameplayTag = GameplayTag::from_static("State.Debuff.Stun");
    /// Корень всех ability тегов
    pub const ABILITY: GameplayTag = GameplayTag::from_static("Ability");
    /// Abilities, которые stun не отменяет
    pub const NOT_CANCELED_BY_STUN: GameplayTag =
        GameplayTag::from_static("Ability.NotCanceledByStun");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Иерархическое сравнение: "Ability.Fire.Bolt" matches "Ability.Fire" и "Ability"
    pub fn matches(&self, parent: &GameplayTag) -> bool {
        let own = self.as_str();
        let parent = parent.as_str();
        own == parent
            || (own.len() > parent.len()
                && own.starts_with(parent)
                && own.as_bytes()[parent.len()] == b'.')
    }

    pub fn matches_any(&self, parents: &[GameplayTag]) -> bool {
        parents.iter().any(|parent| self.matches(parent))
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Новое значение счётчика тега (onTagCountChanged)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCountChange {
    pub tag: GameplayTag,
    pub new_count: u32,
}

/// Событие: счётчик тега у персонажа изменился
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct TagCountChanged {
    pub character: Entity,
    pub tag: GameplayTag,
    pub new_count: u32,
}

/// TagCounterMap + очередь изменений
///
/// Счётчик не уходит ниже 0: лишний remove: no-op, не ошибка.
#[derive(Debug, Clone, Default)]
pub struct TagState {
    counts: HashMap<GameplayTag, u32>,
    changes: Vec<TagCountChange>,
}

impl TagState {
    pub fn tag_count(&self, tag: &GameplayTag) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.tag_count(tag) > 0
    }

    /// Есть ли присутствующий тег, который matches `parent` (иерархически)
    pub fn has_matching_tag(&self, parent: &GameplayTag) -> bool {
        self.counts
            .iter()
            .any(|(tag, count)| *count > 0 && tag.matches(parent))
    }

    /// Boolean тег: present → count 1 (если был 0), absent → count 0
    pub fn set_tag(&mut self, tag: &GameplayTag, present: bool) {
        let count = self.tag_count(tag);
        match (present, count) {
            (true, 0) => self.write_count(tag, 1),
            (false, c) if c > 0 => self.write_count(tag, 0),
            _ => {}
        }
    }

    pub fn add_tag_count(&mut self, tag: &GameplayTag) -> u32 {
        let count = self.tag_count(tag).saturating_add(1);
        self.write_count(tag, count);
        count
    }

    /// Возвращает false если тега не было (count остаётся 0)
    pub fn remove_tag_count(&mut self, tag: &GameplayTag) -> bool {
        let count = self.tag_count(tag);
        if count == 0 {
            return false;
        }
        self.write_count(tag, count - 1);
        true
    }

    /// Privileged: форсирует счётчик в обход add/remove баланса.
    /// Используется на reset lifecycle (Dead → 0) и при применении replicated тегов.
    pub fn force_tag_count(&mut self, tag: &GameplayTag, count: u32) {
        self.write_count(tag, count);
    }

    /// Присутствующие теги (для replication snapshot / debug)
    pub fn present_tags(&self) -> impl Iterator<Item = (&GameplayTag, u32)> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(tag, count)| (tag, *count))
    }

    pub fn pending_changes(&self) -> &[TagCountChange] {
        &self.changes
    }

    pub fn take_changes(&mut self) -> Vec<TagCountChange> {
        std::mem::take(&mut self.changes)
    }

    fn write_count(&mut self, tag: &GameplayTag, count: u32) {
        let old = self.tag_count(tag);
        if old == count {
            return;
        }

        if count == 0 {
            self.counts.remove(tag);
        } else {
            self.counts.insert(tag.clone(), count);
        }
        self.changes.push(TagCountChange {
            tag: tag.clone(),
            new_count: count,
        });
    }
}
