//! Error types для lifecycle ядра и загрузки конфигов.
//!
//! Ни одна ошибка не фатальна: системы логируют и продолжают тик.

use thiserror::Error;

use crate::attributes::Attribute;
use crate::lifecycle::CharacterLifecycleState;

/// Ошибки операций над персонажем (attributes, grants, lifecycle)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    /// Нет обязательного определения (например default attributes effect).
    /// Персонаж продолжает жить с текущими атрибутами.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Mutating операция вызвана без server authority
    #[error("'{operation}' requires server authority")]
    AuthorityViolation { operation: &'static str },

    /// Отрицательный урон, NaN/inf значение атрибута и т.п.
    #[error("Invalid input for {attribute:?}: {details}")]
    InvalidInput {
        attribute: Option<Attribute>,
        details: String,
    },

    /// Операция недопустима в текущем lifecycle состоянии (no-op)
    #[error("Cannot {operation} while {state:?}")]
    StateViolation {
        operation: &'static str,
        state: CharacterLifecycleState,
    },
}

impl LifecycleError {
    pub fn invalid(attribute: Option<Attribute>, details: impl Into<String>) -> Self {
        Self::InvalidInput {
            attribute,
            details: details.into(),
        }
    }
}

/// Ошибки загрузки RON конфигов
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Файл не прочитан
    #[error("Failed to read config '{path}': {details}")]
    Read { path: String, details: String },

    /// RON не распарсился
    #[error("Parse error in '{path}': {details}")]
    Parse { path: String, details: String },

    /// Значения распарсились, но невалидны (NaN magnitude, Override на Infinite effect)
    #[error("Invalid config '{path}': {details}")]
    Invalid { path: String, details: String },
}

/// Ошибки кодирования replication frames
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("Failed to encode replication frame: {0}")]
    Encode(#[from] ron::Error),

    #[error("Failed to decode replication frame: {0}")]
    Decode(#[from] ron::error::SpannedError),
}
