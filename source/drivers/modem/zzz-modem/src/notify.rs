// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interrupt fan-out to the space-available and data-available wait sets.
//!
//! The modem raises a single interrupt line for any pointer movement, so it says nothing
//! about which direction became ready. Both condition variables are woken on every
//! interrupt and each waiter re-tests its own predicate.
//!
//! A waiter snapshots the interrupt epoch *before* reading pointers and only sleeps while
//! the epoch is unchanged, so an interrupt landing between the pointer read and the sleep
//! is never lost.

use std::sync::Arc;

use log::trace;
use parking_lot::{Condvar, Mutex};

/// Which wait set a caller joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Condition {
    /// Writers waiting for TX space.
    Space,
    /// Readers waiting for RX data.
    Data,
}

#[derive(Debug, Default)]
pub(crate) struct Notifier {
    epoch: Mutex<u64>,
    space: Condvar,
    data: Condvar,
}

impl Notifier {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current interrupt count.
    pub(crate) fn epoch(&self) -> u64 {
        *self.epoch.lock()
    }

    /// Interrupt: bump the epoch and wake every waiter in both sets.
    pub(crate) fn raise(&self) {
        {
            let mut epoch = self.epoch.lock();
            *epoch = epoch.wrapping_add(1);
        }
        self.space.notify_all();
        self.data.notify_all();
    }

    /// Parks until the epoch moves past `seen`; returns the new epoch.
    pub(crate) fn sleep(&self, cond: Condition, seen: u64) -> u64 {
        let cv = match cond {
            Condition::Space => &self.space,
            Condition::Data => &self.data,
        };
        let mut epoch = self.epoch.lock();
        while *epoch == seen {
            cv.wait(&mut epoch);
        }
        trace!("notify: {cond:?} waiter woke at epoch {}", *epoch);
        *epoch
    }
}

/// Interrupt source handle for one device.
///
/// Whatever services the modem's interrupt line (an IRQ thread, a simulator, a test)
/// holds an `IrqLine` and calls [`IrqLine::raise`] on every edge.
#[derive(Clone, Debug)]
pub struct IrqLine {
    notifier: Arc<Notifier>,
}

impl IrqLine {
    pub(crate) fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }

    /// Signals one interrupt: wakes blocked writers and readers alike.
    pub fn raise(&self) {
        self.notifier.raise();
    }

    /// Number of interrupts raised so far.
    pub fn count(&self) -> u64 {
        self.notifier.epoch()
    }
}
