// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hardware-side stand-in for host builds.
//!
//! The peer owns the roles the modem core plays: consumer of the TX ring and producer of
//! the RX ring. `service` echoes every pending TX message into RX, which is what the
//! bring-up bitstream's loopback mode does.

use alloc::vec::Vec;

use modem_hal::RegisterPort;

use crate::engine::{Consumer, Producer, RxOutcome, TxOutcome};
use crate::layout::RegisterMap;
use crate::{LayoutError, Result};

/// Peer side of both rings.
#[derive(Debug)]
pub struct LoopbackPeer {
    from_host: Consumer,
    to_host: Producer,
    stalled: Option<Vec<u8>>,
}

impl LoopbackPeer {
    /// Attaches the peer roles described by `map`.
    pub fn new(map: &RegisterMap) -> core::result::Result<Self, LayoutError> {
        let (tx, rx) = map.validate()?;
        Ok(Self { from_host: Consumer::new(tx), to_host: Producer::new(rx), stalled: None })
    }

    /// Moves pending TX messages into the RX ring until TX is empty or RX is full.
    ///
    /// A message that does not fit in RX is held and retried first on the next call, so
    /// FIFO order survives back-pressure. Returns how many messages were forwarded.
    pub fn service<P>(&mut self, port: &P) -> Result<usize>
    where
        P: RegisterPort + ?Sized,
    {
        let mut forwarded = 0;
        loop {
            let msg = match self.stalled.take() {
                Some(msg) => msg,
                None => match self.from_host.try_dequeue(port)? {
                    RxOutcome::Message(msg) => msg,
                    RxOutcome::Empty => return Ok(forwarded),
                },
            };
            if self.to_host.try_enqueue(port, &msg)? == TxOutcome::Dropped {
                self.stalled = Some(msg);
                return Ok(forwarded);
            }
            forwarded += 1;
        }
    }

    /// Consumes every pending TX message without echoing it.
    pub fn drain<P>(&mut self, port: &P) -> Result<Vec<Vec<u8>>>
    where
        P: RegisterPort + ?Sized,
    {
        let mut out = Vec::new();
        while let RxOutcome::Message(msg) = self.from_host.try_dequeue(port)? {
            out.push(msg);
        }
        Ok(out)
    }

    /// Produces one peer-originated message into the RX ring.
    pub fn send<P>(&mut self, port: &P, payload: &[u8]) -> Result<TxOutcome>
    where
        P: RegisterPort + ?Sized,
    {
        self.to_host.try_enqueue(port, payload)
    }
}
