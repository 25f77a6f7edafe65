// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Register port over the simulator's sync socket.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::Path;

use log::{error, info};
use modem_hal::{PortError, RegisterPort};
use parking_lot::Mutex;

use crate::wire::{self, Opcode, Record, WireError};
use crate::{Result, SimError, SocketPaths};

/// Blocking call/response register port.
///
/// Each access sends one command and waits for its ack; the stream mutex keeps a
/// second request from interleaving with an outstanding one.
#[derive(Debug)]
pub struct SocketPort {
    sync: Mutex<UnixStream>,
    // Held open for the session; the register path never reads it.
    _notify: UnixStream,
}

impl SocketPort {
    /// Connects to `<base>.sync` then `<base>.async`.
    pub fn connect(base: &Path) -> Result<Self> {
        let paths = SocketPaths::new(base);
        let sync = UnixStream::connect(&paths.sync)?;
        let notify = UnixStream::connect(&paths.notify)?;
        info!("axi-sim: connected to {}", paths.sync.display());
        Ok(Self::from_streams(sync, notify))
    }

    /// Wraps already connected streams.
    pub fn from_streams(sync: UnixStream, notify: UnixStream) -> Self {
        Self { sync: Mutex::new(sync), _notify: notify }
    }

    fn call(&self, request: Record, expected: Opcode) -> core::result::Result<Record, PortError> {
        let mut stream = self.sync.lock();
        wire::write_record(&mut *stream, &request).map_err(|err| transport_error(&request, err))?;
        let reply = match wire::read_record(&mut *stream) {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                error!(
                    "axi-sim: simulator closed the stream during {:?} {:#x}",
                    request.opcode, request.address
                );
                return Err(PortError::Disconnected);
            }
            Err(err) => return Err(transport_error(&request, err)),
        };
        if reply.opcode != expected {
            error!(
                "axi-sim: expected {expected:?}, got {:?} for {:#x}",
                reply.opcode, request.address
            );
            return Err(PortError::Protocol { expected: expected.code(), got: reply.opcode.code() });
        }
        Ok(reply)
    }
}

fn transport_error(request: &Record, err: SimError) -> PortError {
    error!("axi-sim: {:?} {:#x} failed: {err}", request.opcode, request.address);
    match err {
        SimError::Io(io) => match io.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => PortError::Disconnected,
            _ => PortError::Io,
        },
        SimError::Wire(WireError::Truncated { .. }) => PortError::Disconnected,
        SimError::Wire(WireError::BadOpcode(got)) => PortError::Protocol {
            expected: request.opcode.ack().map_or(u32::MAX, Opcode::code),
            got,
        },
        SimError::Port(port) => port,
        SimError::Unexpected(op) => PortError::Protocol {
            expected: request.opcode.ack().map_or(u32::MAX, Opcode::code),
            got: op.code(),
        },
    }
}

impl RegisterPort for SocketPort {
    fn read(&self, addr: u32) -> core::result::Result<u32, PortError> {
        Ok(self.call(Record::read_cmd(addr), Opcode::ReadAck)?.data)
    }

    fn write(&self, addr: u32, value: u32) -> core::result::Result<(), PortError> {
        self.call(Record::write_cmd(addr, value), Opcode::WriteAck)?;
        Ok(())
    }
}
