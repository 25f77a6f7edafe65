// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Register port contract shared by the modem ring core and its transports
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 4 unit tests + tests/port.rs
//!
//! PUBLIC API:
//!   - RegisterPort: single 32-bit register read/write primitive + publication barrier
//!   - PortError: transport failure (terminal for the caller)
//!   - MmioPort: volatile load/store against a mapped register window
//!   - RegisterFile: in-memory shared register window for host builds
//!
//! INVARIANTS:
//!   - Addresses are byte offsets inside the register window, 4-byte aligned
//!   - A port never retries; an `Err` means the session is gone

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

use alloc::sync::Arc;
use core::fmt;

mod mmio;
mod regfile;

pub use mmio::MmioPort;
pub use regfile::RegisterFile;

/// Size of one register in bytes.
pub const REGISTER_BYTES: u32 = 4;

/// Failures surfaced by a register transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortError {
    /// The link to the register window went away.
    Disconnected,
    /// Underlying I/O failed.
    Io,
    /// Peer answered with an unexpected reply code.
    Protocol {
        /// Reply code the request expects.
        expected: u32,
        /// Reply code actually received.
        got: u32,
    },
    /// Address lies outside the register window.
    OutOfRange {
        /// Offending byte offset.
        addr: u32,
    },
    /// Address is not register aligned.
    Unaligned {
        /// Offending byte offset.
        addr: u32,
    },
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "register transport disconnected"),
            Self::Io => write!(f, "register transport i/o failure"),
            Self::Protocol { expected, got } => {
                write!(f, "unexpected reply code {got} (expected {expected})")
            }
            Self::OutOfRange { addr } => write!(f, "register address {addr:#x} out of range"),
            Self::Unaligned { addr } => write!(f, "register address {addr:#x} not aligned"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PortError {}

/// Single-register access to the shared window.
///
/// Implementations decide how a register travels (load/store, socket round trip);
/// callers only rely on program order plus [`RegisterPort::barrier`].
pub trait RegisterPort {
    /// Reads the 32-bit register at byte offset `addr`.
    fn read(&self, addr: u32) -> Result<u32, PortError>;

    /// Writes `value` to the 32-bit register at byte offset `addr`.
    fn write(&self, addr: u32, value: u32) -> Result<(), PortError>;

    /// Orders every access issued before the call ahead of every access issued after it.
    ///
    /// Transports that complete each request before returning need nothing here.
    fn barrier(&self) {}
}

impl<P: RegisterPort + ?Sized> RegisterPort for &P {
    fn read(&self, addr: u32) -> Result<u32, PortError> {
        (**self).read(addr)
    }

    fn write(&self, addr: u32, value: u32) -> Result<(), PortError> {
        (**self).write(addr, value)
    }

    fn barrier(&self) {
        (**self).barrier()
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for Arc<P> {
    fn read(&self, addr: u32) -> Result<u32, PortError> {
        (**self).read(addr)
    }

    fn write(&self, addr: u32, value: u32) -> Result<(), PortError> {
        (**self).write(addr, value)
    }

    fn barrier(&self) {
        (**self).barrier()
    }
}

/// Rejects addresses that do not sit on a register boundary.
pub fn check_aligned(addr: u32) -> Result<(), PortError> {
    if addr % REGISTER_BYTES != 0 {
        return Err(PortError::Unaligned { addr });
    }
    Ok(())
}
