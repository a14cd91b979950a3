//! Damage resolution: meta attribute Damage → Health delta
//!
//! Урон сначала пишется в transient атрибут Damage (scratch space для будущих
//! armor/shield модификаторов), потом переводится в отрицательный delta Health.
//! Health никогда не видит unmitigated число.
//!
//! Death trigger здесь не живёт: `LifecycleController::receive_damage`
//! оборачивает resolve и смотрит на очередь изменений Health.

use bevy::prelude::*;

use crate::attributes::{Attribute, AttributeSet};
use crate::authority::ExecutionContext;
use crate::error::LifecycleError;

#[cfg(test)]
mod damage_tests;

/// Запрос: нанести урон персонажу (от AI, projectile, host'а)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub target: Entity,
    pub source: Option<Entity>,
    pub amount: f32,
}

/// Событие: урон разрешён
///
/// `unmitigated`: входящее значение, `mitigated`: реально снятое Health.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ReceivedDamage {
    pub target: Entity,
    pub source: Option<Entity>,
    pub unmitigated: f32,
    pub mitigated: f32,
}

/// Переводит входящий урон в изменение Health.
///
/// Возвращает применённый delta (≤ 0): ровно `-min(incoming, health)`.
/// Damage после вызова всегда 0.
///
/// Ошибки (store не меняется):
/// - нет authority → `AuthorityViolation`
/// - отрицательный / NaN / inf урон → `InvalidInput`
pub fn resolve_damage(
    ctx: ExecutionContext,
    attributes: &mut AttributeSet,
    incoming_damage: f32,
) -> Result<f32, LifecycleError> {
    ctx.require_authority("resolve_damage")?;

    if !incoming_damage.is_finite() || incoming_damage < 0.0 {
        return Err(LifecycleError::invalid(
            Some(Attribute::Damage),
            format!("incoming damage must be finite and >= 0, got {}", incoming_damage),
        ));
    }

    attributes.set_base(Attribute::Damage, incoming_damage)?;
    // Здесь будут armor/shield модификаторы, читающие Damage
    let local_damage = attributes.current(Attribute::Damage);

    // Delta от current Health: Infinite бафф на Health урон не поглощает
    let old_health = attributes.health();
    let new_health = attributes.apply_delta(Attribute::Health, -local_damage)?;

    // Scratch value живёт до записи в Health, потом сразу 0
    attributes.set_base(Attribute::Damage, 0.0)?;
    Ok(new_health - old_health)
}
