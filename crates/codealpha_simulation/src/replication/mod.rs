//! Replication: authority → наблюдатели
//!
//! Вместо code-generated replication таблиц: явный diff слой:
//! - authority собирает AttributeChanged/TagCountChanged в `ReplicationFrame`
//!   (ключ: `NetworkId`, порядок per-attribute сохраняется)
//! - frame сериализуется в RON (транспорт: забота host'а)
//! - наблюдатель применяет frame: атрибуты как есть, теги force-set.
//!   Replicated Dead отражает смерть без authority side effects.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ability_system::AbilitySystem;
use crate::attributes::{Attribute, AttributeChanged, AttributeSet};
use crate::authority::{has_authority, is_observer};
use crate::error::ReplicationError;
use crate::lifecycle::{Character, LifecycleSet};
use crate::tags::{GameplayTag, TagCountChanged};
use crate::{log, log_error, log_warning};

#[cfg(test)]
mod replication_tests;

/// Стабильный сетевой идентификатор character record
///
/// Entity id на разных узлах не совпадают: frames адресуются по NetworkId.
#[derive(
    Component,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Reflect,
)]
#[reflect(Component)]
pub struct NetworkId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeDelta {
    pub attribute: Attribute,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    pub tag: GameplayTag,
    pub count: u32,
}

/// Изменения одного персонажа за один тик
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationFrame {
    pub network_id: NetworkId,
    pub tick: u64,
    #[serde(default)]
    pub attributes: Vec<AttributeDelta>,
    #[serde(default)]
    pub tags: Vec<TagDelta>,
}

impl ReplicationFrame {
    pub fn new(network_id: NetworkId, tick: u64) -> Self {
        Self {
            network_id,
            tick,
            attributes: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.tags.is_empty()
    }

    pub fn to_ron(&self) -> Result<String, ReplicationError> {
        Ok(ron::to_string(self)?)
    }

    pub fn from_ron(text: &str) -> Result<Self, ReplicationError> {
        Ok(ron::from_str(text)?)
    }
}

/// Исходящие frames (authority). Host забирает через `drain`.
#[derive(Resource, Debug, Default)]
pub struct ReplicationOutbox {
    tick: u64,
    frames: Vec<ReplicationFrame>,
}

impl ReplicationOutbox {
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn frames(&self) -> &[ReplicationFrame] {
        &self.frames
    }

    pub fn drain(&mut self) -> Vec<ReplicationFrame> {
        std::mem::take(&mut self.frames)
    }
}

/// Входящие frames (наблюдатель)
#[derive(Resource, Debug, Default)]
pub struct ReplicationInbox {
    frames: Vec<ReplicationFrame>,
}

impl ReplicationInbox {
    pub fn push(&mut self, frame: ReplicationFrame) {
        self.frames.push(frame);
    }

    pub fn receive_ron(&mut self, text: &str) -> Result<(), ReplicationError> {
        self.frames.push(ReplicationFrame::from_ron(text)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Authority: события изменений → frames (по одному на NetworkId за тик)
pub fn collect_replication(
    mut attribute_events: EventReader<AttributeChanged>,
    mut tag_events: EventReader<TagCountChanged>,
    ids: Query<&NetworkId, With<Character>>,
    mut outbox: ResMut<ReplicationOutbox>,
) {
    outbox.tick += 1;
    let tick = outbox.tick;

    // BTreeMap: порядок frames детерминирован
    let mut frames: BTreeMap<NetworkId, ReplicationFrame> = BTreeMap::new();

    for event in attribute_events.read() {
        if !event.attribute.replicates() {
            continue;
        }
        let Ok(id) = ids.get(event.character) else {
            continue;
        };

        frames
            .entry(*id)
            .or_insert_with(|| ReplicationFrame::new(*id, tick))
            .attributes
            .push(AttributeDelta {
                attribute: event.attribute,
                value: event.new_value,
            });
    }

    for event in tag_events.read() {
        let Ok(id) = ids.get(event.character) else {
            continue;
        };

        frames
            .entry(*id)
            .or_insert_with(|| ReplicationFrame::new(*id, tick))
            .tags
            .push(TagDelta {
                tag: event.tag.clone(),
                count: event.new_count,
            });
    }

    outbox.frames.extend(frames.into_values());
}

/// Наблюдатель: применяет входящие frames
///
/// Реакции (mirrored death, stun) отрабатывают в Reactions фазе того же тика
/// через обычные очереди изменений.
pub fn apply_replication_frames(
    mut inbox: ResMut<ReplicationInbox>,
    mut characters: Query<(&NetworkId, &mut AttributeSet, &mut AbilitySystem), With<Character>>,
) {
    if inbox.frames.is_empty() {
        return;
    }

    let frames = std::mem::take(&mut inbox.frames);
    for frame in frames {
        let Some((_, mut attributes, mut abilities)) = characters
            .iter_mut()
            .find(|(id, _, _)| **id == frame.network_id)
        else {
            log_warning(&format!("Replication frame for unknown {:?}", frame.network_id));
            continue;
        };

        for delta in &frame.attributes {
            if let Err(err) = attributes.apply_replicated(delta.attribute, delta.value) {
                log_error(&format!("{:?}: {}", frame.network_id, err));
            }
        }
        for delta in &frame.tags {
            abilities.tags.force_tag_count(&delta.tag, delta.count);
        }

        log(&format!(
            "Applied replication frame {} for {:?} ({} attributes, {} tags)",
            frame.tick,
            frame.network_id,
            frame.attributes.len(),
            frame.tags.len()
        ));
    }
}

/// Replication Plugin
///
/// - authority: collect_replication в Outbound фазе
/// - наблюдатель: apply_replication_frames в Inbound фазе
pub struct ReplicationPlugin;

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReplicationOutbox>()
            .init_resource::<ReplicationInbox>()
            .add_systems(
                FixedUpdate,
                (
                    apply_replication_frames
                        .run_if(is_observer)
                        .in_set(LifecycleSet::Inbound),
                    collect_replication
                        .run_if(has_authority)
                        .in_set(LifecycleSet::Outbound),
                ),
            );
    }
}
