//! Controller shared between execution contexts.
//!
//! A tick's intermediate state is meaningless on its own, so the lock is
//! held for one whole [`output`](RotorSpeedController::output) call.
//! Setters and getters go through [`SharedRotorController::with`] and
//! therefore never interleave with a tick.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::{GovernorPid, OutputPort, TimeSource};
use crate::control::pid::PidController;
use crate::rsc::{RotorControlState, RotorSpeedController};

/// A [`RotorSpeedController`] behind a critical-section mutex.
pub struct SharedRotorController<P = PidController> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RotorSpeedController<P>>>,
}

impl<P: GovernorPid> SharedRotorController<P> {
    pub const fn new(rsc: RotorSpeedController<P>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(rsc)),
        }
    }

    /// Run one full tick under the lock.
    pub fn tick(
        &self,
        state: RotorControlState,
        clock: &impl TimeSource,
        out: &mut impl OutputPort,
    ) {
        self.inner
            .lock(|rsc| rsc.borrow_mut().output(state, clock, out));
    }

    /// Locked access for setters and getters.
    pub fn with<R>(&self, f: impl FnOnce(&mut RotorSpeedController<P>) -> R) -> R {
        self.inner.lock(|rsc| f(&mut rsc.borrow_mut()))
    }

    pub fn into_inner(self) -> RotorSpeedController<P> {
        self.inner.into_inner().into_inner()
    }
}
