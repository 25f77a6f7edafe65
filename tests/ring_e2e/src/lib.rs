// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axi_sim::{SimServer, SocketPort};
use modem_hal::RegisterFile;
use modem_ring::RegisterMap;
use tempfile::TempDir;

/// Simulator serving a reference-layout register window from a private socket directory.
pub struct Sim {
    _dir: TempDir,
    base: PathBuf,
    regs: Arc<RegisterFile>,
}

impl Sim {
    /// Binds `<tmp>/axi_master.{sync,async}` and serves clients on a background thread.
    pub fn start() -> Self {
        let dir = tempfile::tempdir().expect("socket dir");
        let base = dir.path().join("axi_master");
        let regs = Arc::new(RegisterFile::new(RegisterMap::REFERENCE.window_len()));
        let server = SimServer::bind(&base, Arc::clone(&regs)).expect("bind simulator");
        server.spawn();
        Self { _dir: dir, base, regs }
    }

    /// Socket base path.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The simulated register window, as the hardware side sees it.
    pub fn regs(&self) -> &Arc<RegisterFile> {
        &self.regs
    }

    /// Opens a new host connection.
    pub fn connect(&self) -> Arc<SocketPort> {
        Arc::new(SocketPort::connect(&self.base).expect("connect simulator"))
    }
}
