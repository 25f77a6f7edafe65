// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulator side of the register transport.

use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use log::{debug, info, trace, warn};
use modem_hal::{RegisterFile, RegisterPort};

use crate::wire::{self, Opcode, Record};
use crate::{Result, SimError, SocketPaths};

/// Serves a shared register window over `<base>.sync` / `<base>.async`.
///
/// The socket files are created by [`SimServer::bind`] and removed on drop.
#[derive(Debug)]
pub struct SimServer {
    paths: SocketPaths,
    sync: UnixListener,
    notify: UnixListener,
    regs: Arc<RegisterFile>,
}

impl SimServer {
    /// Binds both sockets, replacing stale socket files left by an earlier run.
    pub fn bind(base: &Path, regs: Arc<RegisterFile>) -> Result<Self> {
        let paths = SocketPaths::new(base);
        remove_stale(&paths.sync)?;
        remove_stale(&paths.notify)?;
        let sync = UnixListener::bind(&paths.sync)?;
        let notify = UnixListener::bind(&paths.notify)?;
        info!("axi-sim: listening on {} ({} byte window)", paths.sync.display(), regs.len());
        Ok(Self { paths, sync, notify, regs })
    }

    /// Register window being served.
    pub fn registers(&self) -> &Arc<RegisterFile> {
        &self.regs
    }

    /// Socket paths in use.
    pub fn paths(&self) -> &SocketPaths {
        &self.paths
    }

    /// Accepts one client and serves it until it disconnects; returns the command count.
    pub fn serve_one(&self) -> Result<u64> {
        let mut sync = self.accept()?;
        self.session(&mut sync)
    }

    /// Serves clients one after another until accepting fails.
    ///
    /// A client that breaks the protocol is dropped; the next one is accepted.
    pub fn run(&self) -> Result<()> {
        loop {
            let mut sync = self.accept()?;
            if let Err(err) = self.session(&mut sync) {
                warn!("axi-sim: client dropped: {err}");
            }
        }
    }

    fn accept(&self) -> Result<UnixStream> {
        let (sync, _) = self.sync.accept()?;
        // The notification stream carries no traffic; accepting it lets the client finish connecting.
        let _ = self.notify.accept()?;
        info!("axi-sim: client connected");
        Ok(sync)
    }

    fn session(&self, sync: &mut UnixStream) -> Result<u64> {
        let served = serve_connection(&self.regs, sync)?;
        info!("axi-sim: client left after {served} commands");
        Ok(served)
    }

    /// Runs [`SimServer::run`] on a background thread.
    pub fn spawn(self) -> thread::JoinHandle<Result<()>> {
        thread::spawn(move || self.run())
    }
}

impl Drop for SimServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.paths.sync);
        let _ = fs::remove_file(&self.paths.notify);
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("axi-sim: removed stale {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Answers commands on `stream` until it ends cleanly; returns the command count.
pub fn serve_connection<S>(regs: &RegisterFile, stream: &mut S) -> Result<u64>
where
    S: Read + Write + ?Sized,
{
    let mut served = 0;
    while let Some(request) = wire::read_record(stream)? {
        let reply = handle(regs, request)?;
        wire::write_record(stream, &reply)?;
        served += 1;
    }
    Ok(served)
}

fn handle(regs: &RegisterFile, request: Record) -> Result<Record> {
    let reply = match request.opcode {
        Opcode::ReadCmd => {
            let data = regs.read(request.address)?;
            Record { opcode: Opcode::ReadAck, address: request.address, data }
        }
        Opcode::WriteCmd => {
            regs.write(request.address, request.data)?;
            Record { opcode: Opcode::WriteAck, ..request }
        }
        op @ (Opcode::ReadAck | Opcode::WriteAck) => return Err(SimError::Unexpected(op)),
    };
    trace!("axi-sim: {:?} {:#06x} = {:#010x}", request.opcode, request.address, reply.data);
    Ok(reply)
}
