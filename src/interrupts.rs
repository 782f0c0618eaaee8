//! Interrupt-safe sections around device registration.
//!
//! Registering a device can make the host engine allocate and evaluate,
//! which must not be interrupted halfway. [`InterruptGuard`] funnels all
//! access to the engine's process-wide interrupt flags: it suspends
//! delivery, runs the critical action, restores the previous state, and
//! replays an interrupt that became pending in between.
//!
//! The guard is not reentrant-safe across concurrent callers; it relies on
//! the engine itself being single-threaded.

use crate::engine::GraphicsEngine;

pub struct InterruptGuard<'a> {
    engine: &'a dyn GraphicsEngine,
}

impl<'a> InterruptGuard<'a> {
    pub fn new(engine: &'a dyn GraphicsEngine) -> Self {
        Self { engine }
    }

    pub fn suspended(&self) -> bool {
        self.engine.interrupts_suspended()
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.engine.set_interrupts_suspended(suspended);
    }

    pub fn pending(&self) -> bool {
        self.engine.interrupts_pending()
    }

    /// Run `action` with interrupt delivery suspended, restoring the prior
    /// suspension state afterwards. An interrupt that arrived while
    /// suspended is not dropped: if one is pending and delivery ended up
    /// unsuspended, the engine's interrupt entry point runs exactly once
    /// before this returns.
    pub fn with_suspended<T>(&self, action: impl FnOnce() -> T) -> T {
        let previous = self.suspended();
        self.set_suspended(true);
        let output = action();
        self.set_suspended(previous);
        if self.pending() && !self.suspended() {
            self.engine.run_pending_interrupt();
        }
        output
    }
}
