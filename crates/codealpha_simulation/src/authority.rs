//! Execution context: есть ли у текущего узла server authority
//!
//! Один и тот же lifecycle крутится на сервере и на наблюдателях.
//! Authority проверяется один раз на входе в каждую mutating операцию,
//! а не выводится из глобальной роли.

use bevy::prelude::*;

use crate::error::LifecycleError;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Resource)]
pub struct ExecutionContext {
    pub has_authority: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::server()
    }
}

impl ExecutionContext {
    /// Authoritative узел (dedicated/listen server, single-player)
    pub fn server() -> Self {
        Self { has_authority: true }
    }

    /// Наблюдатель (клиент): отражает состояние, side effects не запускает
    pub fn observer() -> Self {
        Self { has_authority: false }
    }

    pub fn require_authority(&self, operation: &'static str) -> Result<(), LifecycleError> {
        if self.has_authority {
            Ok(())
        } else {
            Err(LifecycleError::AuthorityViolation { operation })
        }
    }
}

/// Run condition: системы только для authority
pub fn has_authority(ctx: Res<ExecutionContext>) -> bool {
    ctx.has_authority
}

/// Run condition: системы только для наблюдателя
pub fn is_observer(ctx: Res<ExecutionContext>) -> bool {
    !ctx.has_authority
}
