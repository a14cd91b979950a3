//! CodeAlpha Simulation Core
//!
//! Жизненный цикл персонажа на Bevy 0.16 ECS (headless):
//! атрибуты → урон → смерть по Health ≤ 0 → респавн с полными ресурсами
//! и повторной выдачей abilities.
//!
//! - ECS = game state (атрибуты, теги, abilities, lifecycle)
//! - Host = presentation/transport (рендер, анимации, сеть)
//!
//! Один и тот же lifecycle крутится на authority и на наблюдателях
//! (`ExecutionContext`), наблюдатели получают состояние через `replication`.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ability_system;
pub mod attributes;
pub mod authority;
pub mod config;
pub mod damage;
pub mod error;
pub mod grants;
pub mod lifecycle;
pub mod logger;
pub mod pawn;
pub mod replication;
pub mod tags;

// Re-export базовых типов для удобства
pub use ability_system::{
    AbilityDefinition, AbilityHandle, AbilityInputId, AbilitySystem, EffectDefinition,
    EffectDuration, EffectHandle, ModifierOp,
};
pub use attributes::{Attribute, AttributeChanged, AttributeSet};
pub use authority::ExecutionContext;
pub use config::{CharacterConfig, DeathAnimation, SimulationConfig};
pub use damage::{resolve_damage, DamageRequest, ReceivedDamage};
pub use error::{ConfigError, LifecycleError, ReplicationError};
pub use grants::{AbilityGrantController, AbilityGrantState};
pub use lifecycle::{
    Character, CharacterDied, CharacterInitialized, CharacterLifecycleState,
    DeathAnimationFinished, DeathAnimationStarted, DeathOutcome, Lifecycle, LifecycleController,
    LifecyclePlugin, LifecycleSet, PawnDespawnRequested, PawnDisabled, Possessed,
    PossessionSource,
};
pub use pawn::{spawn_pawn, CharacterInput, InputAction, Pawn, PawnPlugin};
pub use replication::{
    NetworkId, ReplicationFrame, ReplicationInbox, ReplicationOutbox, ReplicationPlugin,
};
pub use tags::{GameplayTag, TagCountChanged};

// Logger на уровне crate (как `crate::log(...)` в системах)
pub use logger::{init_logger, log, log_error, log_info, log_warning};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin {
    pub context: ExecutionContext,
    pub config: SimulationConfig,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self::server()
    }
}

impl SimulationPlugin {
    /// Authoritative узел
    pub fn server() -> Self {
        Self {
            context: ExecutionContext::server(),
            config: SimulationConfig::default(),
        }
    }

    /// Наблюдатель: применяет replication frames
    pub fn observer() -> Self {
        Self {
            context: ExecutionContext::observer(),
            config: SimulationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(self.config.fixed_hz))
            .insert_resource(self.context)
            .insert_resource(self.config.clone());

        // create_headless_app уже мог поставить RNG со своим seed
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(self.config.seed));
        }

        // Подсистемы
        app.add_plugins((LifecyclePlugin, PawnPlugin, ReplicationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается ровно на один fixed шаг за `app.update()` (wall clock
/// не участвует). Первый update только запускает часы, FixedUpdate в нём
/// не выполняется.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();

    let step = SimulationConfig::default().fixed_delta();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_duration(step))
        .insert_resource(TimeUpdateStrategy::ManualDuration(step));

    app
}

/// Spawn helper: character record
///
/// - Character (required: Lifecycle, AttributeSet, AbilityGrantState, AbilitySystem)
/// - CharacterConfig
/// - NetworkId
///
/// Pawn и Possessed: отдельно (`spawn_pawn` + событие от host'а).
pub fn spawn_character(
    commands: &mut Commands,
    config: CharacterConfig,
    network_id: NetworkId,
) -> Entity {
    commands.spawn((Character, config, network_id)).id()
}

/// Один детерминированный тик FixedUpdate (тесты, lockstep host)
pub fn run_fixed_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Snapshot всех character records для проверки детерминизма
///
/// Сортировка по NetworkId: порядок query не гарантирован.
pub fn world_snapshot(world: &mut World) -> Vec<u8> {
    let mut query = world.query::<(&NetworkId, &Lifecycle, &AttributeSet, &AbilitySystem)>();
    let mut records: Vec<_> = query.iter(world).collect();
    records.sort_by_key(|(id, ..)| **id);

    let mut snapshot = Vec::new();
    for (id, lifecycle, attributes, abilities) in records {
        snapshot.extend_from_slice(&id.0.to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", lifecycle.state()).as_bytes());
        for attribute in Attribute::ALL {
            snapshot.extend_from_slice(&attributes.current(attribute).to_le_bytes());
        }

        let mut tags: Vec<_> = abilities.tags.present_tags().collect();
        tags.sort();
        for (tag, count) in tags {
            snapshot.extend_from_slice(tag.as_str().as_bytes());
            snapshot.extend_from_slice(&count.to_le_bytes());
        }
    }
    snapshot
}
