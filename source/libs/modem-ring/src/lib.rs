// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Ring-buffer framing protocol between the host and the modem core
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: unit tests per module + tests/{scenario,wrap,props}.rs
//!
//! PUBLIC API:
//!   - RegisterMap / RingBuffer: fixed register layout and per-direction ring geometry
//!   - free_space() / used_space(): flow-control arithmetic with one guard word
//!   - codec::{encode, decode, pack_words, unpack_words}: length-prefixed word framing
//!   - Producer / Consumer: single-attempt enqueue and dequeue against a RegisterPort
//!   - LoopbackPeer: hardware-side stand-in that echoes TX messages into RX
//!
//! INVARIANTS:
//!   - rp == wp means empty; one word is always left unused
//!   - every offset and every pointer commit is wrapped modulo capacity
//!   - payload words are published (barrier) before the write pointer moves
//!   - pointer values outside the ring are corruption and panic
//!
//! DEPENDENCIES:
//!   - modem-hal::RegisterPort: register transport
//!   - log: per-message tracing

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

extern crate alloc;

use core::fmt;

pub mod codec;
mod engine;
mod flow;
mod layout;
mod peer;

pub use engine::{Consumer, Pointers, Producer, RxOutcome, TxOutcome};
pub use flow::{free_space, used_space, GUARD};
pub use layout::{LayoutError, RegisterMap, RingBuffer, MIN_CAPACITY, WORD};
pub use modem_hal::{PortError, RegisterPort};
pub use peer::LoopbackPeer;

/// Result alias for ring operations.
pub type Result<T> = core::result::Result<T, RingError>;

/// Errors surfaced by the ring engines.
///
/// Back-pressure is not an error: see [`TxOutcome::Dropped`] and [`RxOutcome::Empty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingError {
    /// The register transport failed.
    Port(PortError),
    /// Payload can never fit in this ring.
    MessageTooLarge {
        /// Requested payload length.
        len: usize,
        /// Largest payload the ring carries.
        max: usize,
    },
    /// Destination buffer is shorter than the pending message; nothing was consumed.
    BufferTooSmall {
        /// Length of the pending message.
        needed: usize,
        /// Length of the caller's buffer.
        available: usize,
    },
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(err) => write!(f, "port: {err}"),
            Self::MessageTooLarge { len, max } => {
                write!(f, "message of {len} bytes exceeds ring maximum {max}")
            }
            Self::BufferTooSmall { needed, available } => {
                write!(f, "pending message needs {needed} bytes, buffer holds {available}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Port(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PortError> for RingError {
    fn from(err: PortError) -> Self {
        Self::Port(err)
    }
}
