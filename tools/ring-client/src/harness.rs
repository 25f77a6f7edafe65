// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bring-up commands shared by every transport.
//!
//! Output goes to a caller-supplied writer so the same sequence can be checked in tests.

use std::io::Write;
use std::sync::Arc;

use log::warn;
use modem_hal::RegisterPort;
use modem_ring::RegisterMap;
use zzz_modem::{DeviceConfig, DeviceError, ModemDevice, Policy, TxOutcome};

use crate::Result;

/// Test string the bring-up sequence slices its messages from.
pub const ORIG: &str = "0123456789abcdef";

/// Non-blocking host session used by the CLI commands.
pub struct Harness<P: RegisterPort> {
    port: Arc<P>,
    map: RegisterMap,
    device: ModemDevice<P>,
    rx_buf: Vec<u8>,
}

impl<P: RegisterPort> Harness<P> {
    /// Opens the device; the harness never blocks, whatever `config` asks for.
    pub fn open(port: Arc<P>, config: &DeviceConfig) -> Result<Self> {
        if config.policy == Policy::Blocking {
            warn!("ring-client: no interrupt source on this transport, using non-blocking policy");
        }
        let cfg = DeviceConfig { policy: Policy::NonBlocking, ..*config };
        let device = ModemDevice::open(Arc::clone(&port), &cfg)?;
        let map = cfg.register_map();
        let rx_max = map.rx_ring().map_err(DeviceError::from)?.max_payload();
        Ok(Self { port, map, device, rx_buf: vec![0u8; rx_max as usize] })
    }

    /// Prints the first `words` registers of the RX buffer.
    pub fn dump_rx(&self, out: &mut dyn Write, words: u32) -> Result<()> {
        for i in 0..words {
            let addr = self.map.rx_base + i * 4;
            writeln!(out, "{:08x}: {:08x}", addr, self.port.read(addr)?)?;
        }
        Ok(())
    }

    /// Enqueues `text`; returns `false` when the TX ring had no room.
    pub fn put_msg(&mut self, out: &mut dyn Write, text: &str) -> Result<bool> {
        writeln!(out, "put_msg: '{text}'")?;
        let sent = self.device.send(text.as_bytes())? == TxOutcome::Sent;
        if !sent {
            warn!("ring-client: TX ring full, dropped {} bytes", text.len());
        }
        Ok(sent)
    }

    /// Dequeues and prints one message; returns `false` when RX was empty.
    pub fn get_msg(&mut self, out: &mut dyn Write) -> Result<bool> {
        match self.device.read(&mut self.rx_buf)? {
            Some(len) => {
                let text = String::from_utf8_lossy(&self.rx_buf[..len]);
                writeln!(out, "get_msg: len={len:3} '{text}'")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The reference bring-up run: dump RX, put lengths 4..=16, get 16 times.
    ///
    /// `settle` runs between the puts and the gets, giving the peer a chance to echo.
    /// Returns how many messages came back.
    pub fn selftest(&mut self, out: &mut dyn Write, settle: impl FnOnce()) -> Result<usize> {
        self.dump_rx(out, 32)?;
        for len in 4..=ORIG.len() {
            self.put_msg(out, &ORIG[..len])?;
        }
        settle();
        let mut received = 0;
        for _ in 1..=16 {
            if self.get_msg(out)? {
                received += 1;
            }
        }
        Ok(received)
    }

    /// Ends the session.
    pub fn close(self) {
        self.device.close();
    }
}
