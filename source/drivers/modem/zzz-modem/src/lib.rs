// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: zzz-modem message device over the shared TX/RX rings
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable (bring-up)
//! TEST_COVERAGE: unit tests (notify, config, device) + tests/blocking.rs
//!
//! PUBLIC API:
//!   - ModemDevice: open/close session owning the register port
//!   - ModemWriter / ModemReader: one-message-per-call write/read halves
//!   - IrqLine: handle the interrupt source uses to wake both wait sets
//!   - Policy: blocking vs non-blocking back-pressure
//!   - DeviceConfig: register map + policy, loadable from TOML
//!
//! INVARIANTS:
//!   - exactly one writer and one reader per device (enforced by ownership)
//!   - an interrupt wakes space and data waiters alike; waiters always re-read pointers
//!   - blocking calls have no timeout: a stalled peer blocks the caller indefinitely
//!
//! DEPENDENCIES:
//!   - modem-ring: framing, flow control, single-attempt engines
//!   - parking_lot: notifier mutex + condition variables
//!   - serde/toml: configuration
//!   - thiserror/log: errors and diagnostics

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod config;
mod device;
mod notify;

pub use config::{DeviceConfig, RegisterMapConfig};
pub use device::{ModemDevice, ModemReader, ModemWriter, Policy};
pub use modem_ring::{RxOutcome, TxOutcome};
pub use notify::IrqLine;

use modem_hal::PortError;
use modem_ring::{LayoutError, RingError};

/// Result alias for device operations.
pub type Result<T> = core::result::Result<T, DeviceError>;

/// Errors surfaced by the device layer.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Ring protocol or transport failure.
    #[error("ring: {0}")]
    Ring(#[from] RingError),
    /// Register map describes an unusable ring.
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),
    /// Configuration file could not be parsed.
    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
    /// Configuration file could not be read.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PortError> for DeviceError {
    fn from(err: PortError) -> Self {
        Self::Ring(RingError::Port(err))
    }
}
