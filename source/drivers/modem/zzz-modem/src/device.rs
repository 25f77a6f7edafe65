// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message device: one write enqueues one message, one read returns one message.

use std::sync::Arc;

use log::{debug, info};
use modem_hal::RegisterPort;
use modem_ring::{Consumer, Pointers, Producer, RxOutcome, TxOutcome};
use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;
use crate::notify::{Condition, Notifier};
use crate::{IrqLine, Result};

/// What a call does when its ring cannot make progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Park until an interrupt makes progress possible. No timeout.
    #[default]
    Blocking,
    /// Report `Dropped` / `Empty` immediately.
    NonBlocking,
}

/// Open session on one modem: the register port plus both ring roles of the host.
///
/// Dropping the device (or calling [`ModemDevice::close`]) detaches both rings. Ring
/// pointers are left as they are; the peer side owns their initial values.
pub struct ModemDevice<P: RegisterPort> {
    writer: ModemWriter<P>,
    reader: ModemReader<P>,
    irq: IrqLine,
}

impl<P: RegisterPort> ModemDevice<P> {
    /// Attaches to the rings described by `config` through `port`.
    ///
    /// # Panics
    ///
    /// Panics if a pointer register already holds an offset outside its ring.
    pub fn open(port: Arc<P>, config: &DeviceConfig) -> Result<Self> {
        let (tx, rx) = config.register_map().validate()?;
        let tx_ptrs = Pointers::read(&*port, &tx)?;
        let rx_ptrs = Pointers::read(&*port, &rx)?;
        info!(
            "zzz-modem: open tx={:#x}+{:#x} (rp={:#x} wp={:#x}) rx={:#x}+{:#x} (rp={:#x} wp={:#x}) policy={:?}",
            tx.base(),
            tx.capacity(),
            tx_ptrs.rp,
            tx_ptrs.wp,
            rx.base(),
            rx.capacity(),
            rx_ptrs.rp,
            rx_ptrs.wp,
            config.policy
        );
        let notifier = Notifier::new();
        Ok(Self {
            writer: ModemWriter {
                port: Arc::clone(&port),
                notifier: Arc::clone(&notifier),
                tx: Producer::new(tx),
                policy: config.policy,
            },
            reader: ModemReader {
                port,
                notifier: Arc::clone(&notifier),
                rx: Consumer::new(rx),
                policy: config.policy,
            },
            irq: IrqLine::new(notifier),
        })
    }

    /// Handle for the interrupt source.
    pub fn irq_line(&self) -> IrqLine {
        self.irq.clone()
    }

    /// Enqueues one message; see [`ModemWriter::write`].
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        self.writer.write(payload)
    }

    /// Dequeues one message into `buf`; see [`ModemReader::read`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.reader.read(buf)
    }

    /// Enqueues one message and reports whether it was sent or dropped.
    pub fn send(&mut self, payload: &[u8]) -> Result<TxOutcome> {
        self.writer.send(payload)
    }

    /// Dequeues the next message as an owned buffer.
    pub fn recv(&mut self) -> Result<RxOutcome> {
        self.reader.recv()
    }

    /// Changes the policy of both halves.
    pub fn set_policy(&mut self, policy: Policy) {
        self.writer.policy = policy;
        self.reader.policy = policy;
    }

    /// Splits into independently owned halves, e.g. for a writer thread and a reader thread.
    pub fn split(self) -> (ModemWriter<P>, ModemReader<P>) {
        (self.writer, self.reader)
    }

    /// Detaches from both rings.
    pub fn close(self) {
        info!("zzz-modem: close after {} interrupts", self.irq.count());
    }
}

/// Host TX role: enqueues messages for the peer.
pub struct ModemWriter<P: RegisterPort> {
    port: Arc<P>,
    notifier: Arc<Notifier>,
    tx: Producer,
    policy: Policy,
}

impl<P: RegisterPort> ModemWriter<P> {
    /// Current back-pressure policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Changes the back-pressure policy.
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Largest payload one message may carry.
    pub fn max_payload(&self) -> usize {
        self.tx.ring().max_payload() as usize
    }

    /// Enqueues `payload` as one message.
    ///
    /// Returns `payload.len()` once sent, or `0` when the non-blocking policy dropped it.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        match self.send(payload)? {
            TxOutcome::Sent => Ok(payload.len()),
            TxOutcome::Dropped => Ok(0),
        }
    }

    /// Enqueues `payload`, honouring the policy when the TX ring is short of space.
    ///
    /// Blocking: re-reads the TX pointers after every interrupt until the message fits.
    /// Never returns `Dropped` in that mode.
    pub fn send(&mut self, payload: &[u8]) -> Result<TxOutcome> {
        self.tx.check_len(payload.len())?;
        loop {
            let seen = self.notifier.epoch();
            match self.tx.try_enqueue(&*self.port, payload)? {
                TxOutcome::Sent => return Ok(TxOutcome::Sent),
                TxOutcome::Dropped if self.policy == Policy::NonBlocking => {
                    return Ok(TxOutcome::Dropped)
                }
                TxOutcome::Dropped => {
                    debug!("zzz-modem: writer waiting for {} bytes of space", payload.len() + 4);
                    self.notifier.sleep(Condition::Space, seen);
                }
            }
        }
    }
}

/// Host RX role: dequeues messages from the peer.
pub struct ModemReader<P: RegisterPort> {
    port: Arc<P>,
    notifier: Arc<Notifier>,
    rx: Consumer,
    policy: Policy,
}

impl<P: RegisterPort> ModemReader<P> {
    /// Current back-pressure policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Changes the back-pressure policy.
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Copies the next message into `buf` and returns its length.
    ///
    /// `Ok(None)` means the ring was empty under the non-blocking policy. A message longer
    /// than `buf` is left in the ring and reported as `RingError::BufferTooSmall`.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        loop {
            let seen = self.notifier.epoch();
            match self.rx.try_read(&*self.port, buf)? {
                Some(len) => return Ok(Some(len)),
                None if self.policy == Policy::NonBlocking => return Ok(None),
                None => self.wait_data(seen),
            }
        }
    }

    /// Dequeues the next message as an owned buffer.
    pub fn recv(&mut self) -> Result<RxOutcome> {
        loop {
            let seen = self.notifier.epoch();
            match self.rx.try_dequeue(&*self.port)? {
                RxOutcome::Empty if self.policy == Policy::Blocking => self.wait_data(seen),
                outcome => return Ok(outcome),
            }
        }
    }

    fn wait_data(&self, seen: u64) {
        debug!("zzz-modem: reader waiting for data");
        self.notifier.sleep(Condition::Data, seen);
    }
}
