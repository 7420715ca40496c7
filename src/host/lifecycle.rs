// SPDX-License-Identifier: MIT
use crate::error::{Result, TelemetryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Uninitialized,
    Started,
    Enabled,
    Disabled,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Enable,
    Disable,
    Stop,
}

impl PluginState {
    /// Applies `event`, returning the next state.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` for any pair not in the lifecycle table; the
    /// current state is unchanged.
    pub fn transition(self, event: LifecycleEvent) -> Result<Self> {
        use LifecycleEvent as E;
        use PluginState as S;

        match (self, event) {
            (S::Uninitialized, E::Start) => Ok(S::Started),
            (S::Started | S::Disabled, E::Enable) => Ok(S::Enabled),
            (S::Enabled, E::Disable) => Ok(S::Disabled),
            (S::Started | S::Disabled, E::Stop) => Ok(S::Stopped),
            (from, event) => Err(TelemetryError::IllegalTransition { from, event }),
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}
