// SPDX-License-Identifier: MIT
//! The on/off switch behind every plugin menu item and toggle command.

use anyhow::Result;

/// A sink that can be switched on and off. `is_active` reports the sink's own
/// session state and is the authority for every toggle decision.
pub trait ToggleTarget<C: ?Sized> {
    fn is_active(&self) -> bool;

    /// # Errors
    ///
    /// Returns an error if the session could not be opened; the target must
    /// then still report inactive.
    fn activate(&mut self, ctx: &mut C) -> Result<()>;

    fn deactivate(&mut self, ctx: &mut C);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated,
    Deactivated,
    AlreadyActive,
    AlreadyIdle,
}

#[derive(Debug, Default)]
pub struct ToggleController {
    on: bool,
}

impl ToggleController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flips the switch.
    ///
    /// # Errors
    ///
    /// Propagates the target's activation error; the switch stays off.
    pub fn toggle<C, T>(&mut self, target: &mut T, ctx: &mut C) -> Result<Transition>
    where
        C: ?Sized,
        T: ToggleTarget<C> + ?Sized,
    {
        let want = !self.on;
        self.set(target, ctx, want)
    }

    /// Drives the target towards `want`.
    ///
    /// # Errors
    ///
    /// Propagates the target's activation error; the switch stays off.
    pub fn set<C, T>(&mut self, target: &mut T, ctx: &mut C, want: bool) -> Result<Transition>
    where
        C: ?Sized,
        T: ToggleTarget<C> + ?Sized,
    {
        let result = match (want, target.is_active()) {
            (true, true) => Ok(Transition::AlreadyActive),
            (false, false) => Ok(Transition::AlreadyIdle),
            (true, false) => target.activate(ctx).map(|()| Transition::Activated),
            (false, true) => {
                target.deactivate(ctx);
                Ok(Transition::Deactivated)
            }
        };

        self.on = target.is_active();
        result
    }

    /// Re-reads the target's state after it changed on its own, e.g. a
    /// session that closed itself on a write failure.
    pub fn sync<C, T>(&mut self, target: &T)
    where
        C: ?Sized,
        T: ToggleTarget<C> + ?Sized,
    {
        self.on = target.is_active();
    }
}
