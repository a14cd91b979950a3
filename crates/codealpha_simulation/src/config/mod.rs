//! Конфигурация: персонажи (RON) + параметры симуляции
//!
//! Формат: RON, как остальные data файлы. Путь к персонажам:
//! `assets/characters/*.ron`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ability_system::{AbilityDefinition, EffectDefinition};
use crate::error::ConfigError;
use crate::logger;


/// Анимация смерти: пока играет, персонаж в Dying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathAnimation {
    pub name: String,
    pub duration_secs: f32,
}

impl DeathAnimation {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.duration_secs.max(0.0))
    }
}

/// Per-character конфиг (на character record)
///
/// Без `default_attributes` персонаж всё равно инициализируется,
/// но с текущими (обычно нулевыми) атрибутами: configuration error в лог.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub name: String,
    /// Instant override Health/MaxHealth/Mana/MaxMana на спавне
    #[serde(default)]
    pub default_attributes: Option<EffectDefinition>,
    #[serde(default)]
    pub startup_effects: Vec<EffectDefinition>,
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
    #[serde(default)]
    pub death_animation: Option<DeathAnimation>,
}

impl CharacterConfig {
    /// Парсит и валидирует. `source`: для сообщений об ошибках.
    pub fn from_ron(text: &str, source: &str) -> Result<Self, ConfigError> {
        let config: Self = parse_ron(text, source)?;
        config.validate(source)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: source.clone(),
            details: e.to_string(),
        })?;

        let config = Self::from_ron(&text, &source)?;
        logger::log_info(&format!("Loaded character config '{}' from {}", config.name, source));
        Ok(config)
    }

    pub fn validate(&self, source: &str) -> Result<(), ConfigError> {
        let invalid = |details: String| ConfigError::Invalid {
            path: source.to_string(),
            details,
        };

        let effects = self.default_attributes.iter().chain(self.startup_effects.iter());
        for effect in effects {
            effect.validate().map_err(|e| invalid(e.to_string()))?;
        }

        if let Some(animation) = &self.death_animation {
            if !animation.duration_secs.is_finite() || animation.duration_secs < 0.0 {
                return Err(invalid(format!(
                    "death animation '{}' has invalid duration {}",
                    animation.name, animation.duration_secs
                )));
            }
        }

        Ok(())
    }
}

/// Параметры симуляции (resource)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// FixedUpdate частота
    pub fixed_hz: f64,
    pub seed: u64,
    /// Градусы/сек при полном отклонении стика
    pub base_turn_rate: f32,
    pub base_look_up_rate: f32,
    /// м/с
    pub move_speed: f32,
    pub jump_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60.0,
            seed: 42,
            base_turn_rate: 45.0,
            base_look_up_rate: 45.0,
            move_speed: 5.0,
            jump_speed: 7.0,
        }
    }
}

impl SimulationConfig {
    /// Длительность одного fixed тика
    pub fn fixed_delta(&self) -> Duration {
        if self.fixed_hz > 0.0 && self.fixed_hz.is_finite() {
            Duration::from_secs_f64(1.0 / self.fixed_hz)
        } else {
            Duration::from_secs_f64(1.0 / 60.0)
        }
    }

    pub fn fixed_delta_secs(&self) -> f32 {
        self.fixed_delta().as_secs_f32()
    }

    pub fn from_ron(text: &str, source: &str) -> Result<Self, ConfigError> {
        parse_ron(text, source)
    }

    /// Нет файла → defaults (не ошибка); битый файл → ошибка
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text, &path.display().to_string()),
            Err(e) => {
                logger::log_warning(&format!(
                    "Could not read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                Ok(Self::default())
            }
        }
    }
}

fn parse_ron<T: DeserializeOwned>(text: &str, source: &str) -> Result<T, ConfigError> {
    ron::from_str(text).map_err(|e| ConfigError::Parse {
        path: source.to_string(),
        details: e.to_string(),
    })
}
