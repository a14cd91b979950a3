//! Lifecycle события (event bus вместо delegate/multicast полей)

use bevy::prelude::*;

use crate::config::DeathAnimation;

/// Откуда пришла possession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PossessionSource {
    /// Authority: контроллер захватил pawn
    Takeover,
    /// Наблюдатель: прилетел replicated player state
    StateReplicated,
}

/// Событие: pawn получил character record → Initialize
///
/// Оба пути безопасны в любом порядке и в одном тике.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Possessed {
    pub character: Entity,
    pub pawn: Entity,
    pub source: PossessionSource,
}

/// Событие: персонаж (пере)инициализирован
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterInitialized {
    pub character: Entity,
    pub respawn: bool,
}

/// Событие: персонаж умер (ровно одно на жизнь)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterDied {
    pub character: Entity,
    pub pawn: Option<Entity>,
}

/// Запрос presentation слою: выключить движение и коллизию pawn'а
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PawnDisabled {
    pub character: Entity,
    pub pawn: Entity,
}

/// Запрос presentation слою: проиграть анимацию смерти
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DeathAnimationStarted {
    pub character: Entity,
    pub pawn: Entity,
    pub animation: DeathAnimation,
}

/// Completion callback анимации смерти → FinishDying
///
/// Шлёт headless таймер на pawn'е или host сам.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathAnimationFinished {
    pub character: Entity,
}

/// Запрос hosting слою: уничтожить pawn
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PawnDespawnRequested {
    pub character: Entity,
    pub pawn: Entity,
}
