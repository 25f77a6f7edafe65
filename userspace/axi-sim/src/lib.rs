// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Simulated AXI register transport for host bring-up of the modem rings
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable (bring-up)
//! TEST_COVERAGE: unit tests (wire, port, server) + tests/socket.rs
//!
//! PUBLIC API:
//!   - Record / Opcode: 12-byte request/response record
//!   - SocketPort: RegisterPort over the `<base>.sync` stream, one outstanding request
//!   - SimServer: serves a shared RegisterFile to one client connection at a time
//!   - SocketPaths: `<base>.sync` / `<base>.async` naming
//!
//! INVARIANTS:
//!   - Every command is answered by exactly one ack before the next command is read
//!   - A mismatched ack or short read ends the session; nothing is retried
//!
//! DEPENDENCIES:
//!   - modem-hal: RegisterPort contract + RegisterFile
//!   - parking_lot: serializes requests on the sync stream
//!   - thiserror/log: errors and diagnostics

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};

mod port;
mod server;
pub mod wire;

pub use port::SocketPort;
pub use server::{serve_connection, SimServer};
pub use wire::{Opcode, Record, WireError, RECORD_LEN};

use modem_hal::PortError;

/// Base path the reference harness and simulator agree on.
pub const DEFAULT_BASE: &str = "/tmp/axi_master";

/// Result alias for simulator operations.
pub type Result<T> = core::result::Result<T, SimError>;

/// Errors raised by the simulated transport.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Socket I/O failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be decoded.
    #[error("wire: {0}")]
    Wire(#[from] WireError),
    /// Register access inside the simulator failed.
    #[error("register: {0}")]
    Port(#[from] PortError),
    /// Peer sent a record that is not valid at this point of the exchange.
    #[error("unexpected {0:?} record")]
    Unexpected(Opcode),
}

/// Socket pair derived from one base path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketPaths {
    /// Register request/response stream.
    pub sync: PathBuf,
    /// Notification stream; connected but carries no traffic yet.
    pub notify: PathBuf,
}

impl SocketPaths {
    /// `<base>.sync` and `<base>.async`.
    pub fn new(base: &Path) -> Self {
        Self { sync: with_suffix(base, "sync"), notify: with_suffix(base, "async") }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
