// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-attempt TX/RX engines.
//!
//! Each engine owns one role of one ring: a [`Producer`] is the only writer of the
//! ring's write pointer, a [`Consumer`] the only writer of its read pointer. Neither is
//! `Clone`, and both mutate through `&mut self`, so one ring cannot grow a second
//! producer or consumer by accident. Waiting is layered on top by the driver.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace};
use modem_hal::{PortError, RegisterPort};

use crate::codec;
use crate::flow;
use crate::layout::{RingBuffer, WORD};
use crate::{Result, RingError};

/// Snapshot of a ring's pointer registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pointers {
    /// Read pointer (byte offset).
    pub rp: u32,
    /// Write pointer (byte offset).
    pub wp: u32,
}

impl Pointers {
    /// Reads both pointer registers of `ring`.
    ///
    /// # Panics
    ///
    /// Panics if either register holds an offset outside the ring.
    pub fn read<P>(port: &P, ring: &RingBuffer) -> core::result::Result<Self, PortError>
    where
        P: RegisterPort + ?Sized,
    {
        let rp = port.read(ring.rp_addr())?;
        let wp = port.read(ring.wp_addr())?;
        ring.check_pointer(rp);
        ring.check_pointer(wp);
        Ok(Self { rp, wp })
    }

    /// `true` when no message is pending.
    pub const fn is_empty(&self) -> bool {
        self.rp == self.wp
    }

    /// Bytes the producer may still write.
    pub fn free(&self, ring: &RingBuffer) -> u32 {
        flow::free_space(self.rp, self.wp, ring.capacity())
    }

    /// Bytes occupied by pending frames.
    pub fn used(&self, ring: &RingBuffer) -> u32 {
        flow::used_space(self.rp, self.wp, ring.capacity())
    }

    /// `true` when a `len`-byte message fits: payload plus its header.
    pub fn fits(&self, ring: &RingBuffer, len: usize) -> bool {
        (self.free(ring) as usize) >= len + WORD as usize
    }
}

/// Result of one enqueue attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// The message was written and the write pointer committed.
    Sent,
    /// Not enough free space; nothing was written.
    Dropped,
}

/// Result of one dequeue attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RxOutcome {
    /// One complete message.
    Message(Vec<u8>),
    /// Ring was empty; nothing was read.
    Empty,
}

/// Writing role of one ring.
#[derive(Debug)]
pub struct Producer {
    ring: RingBuffer,
}

impl Producer {
    /// Attaches the producer role to `ring`.
    pub fn new(ring: RingBuffer) -> Self {
        Self { ring }
    }

    /// Ring geometry.
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Rejects payloads that could never fit even in an empty ring.
    pub fn check_len(&self, len: usize) -> Result<()> {
        let max = self.ring.max_payload() as usize;
        if len > max {
            return Err(RingError::MessageTooLarge { len, max });
        }
        Ok(())
    }

    /// Re-reads the pointers and reports whether `len` bytes would fit now.
    pub fn has_room<P>(&self, port: &P, len: usize) -> Result<bool>
    where
        P: RegisterPort + ?Sized,
    {
        Ok(Pointers::read(port, &self.ring)?.fits(&self.ring, len))
    }

    /// One enqueue attempt: writes the frame if it fits, otherwise touches nothing.
    pub fn try_enqueue<P>(&mut self, port: &P, payload: &[u8]) -> Result<TxOutcome>
    where
        P: RegisterPort + ?Sized,
    {
        self.check_len(payload.len())?;
        let ptrs = Pointers::read(port, &self.ring)?;
        if !ptrs.fits(&self.ring, payload.len()) {
            debug!(
                "ring {:#x}: drop len={} free={} rp={:#x} wp={:#x}",
                self.ring.base(),
                payload.len(),
                ptrs.free(&self.ring),
                ptrs.rp,
                ptrs.wp
            );
            return Ok(TxOutcome::Dropped);
        }
        let next = codec::encode(port, &self.ring, ptrs.wp, payload)?;
        trace!("ring {:#x}: sent len={} wp={:#x}->{:#x}", self.ring.base(), payload.len(), ptrs.wp, next);
        Ok(TxOutcome::Sent)
    }
}

/// Reading role of one ring.
#[derive(Debug)]
pub struct Consumer {
    ring: RingBuffer,
}

impl Consumer {
    /// Attaches the consumer role to `ring`.
    pub fn new(ring: RingBuffer) -> Self {
        Self { ring }
    }

    /// Ring geometry.
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Re-reads the pointers and reports whether a message is pending.
    pub fn has_data<P>(&self, port: &P) -> Result<bool>
    where
        P: RegisterPort + ?Sized,
    {
        Ok(!Pointers::read(port, &self.ring)?.is_empty())
    }

    /// Length of the pending message, if any, without consuming it.
    pub fn peek_len<P>(&self, port: &P) -> Result<Option<usize>>
    where
        P: RegisterPort + ?Sized,
    {
        let ptrs = Pointers::read(port, &self.ring)?;
        if ptrs.is_empty() {
            return Ok(None);
        }
        Ok(Some(codec::read_header(port, &self.ring, ptrs.rp)? as usize))
    }

    /// One dequeue attempt.
    pub fn try_dequeue<P>(&mut self, port: &P) -> Result<RxOutcome>
    where
        P: RegisterPort + ?Sized,
    {
        let ptrs = Pointers::read(port, &self.ring)?;
        if ptrs.is_empty() {
            return Ok(RxOutcome::Empty);
        }
        let len = codec::read_header(port, &self.ring, ptrs.rp)?;
        let mut payload = vec![0u8; len as usize];
        let next = codec::decode_into(port, &self.ring, ptrs.rp, len, &mut payload)?;
        trace!("ring {:#x}: recv len={} rp={:#x}->{:#x}", self.ring.base(), len, ptrs.rp, next);
        Ok(RxOutcome::Message(payload))
    }

    /// One dequeue attempt into a caller buffer; returns the message length.
    ///
    /// A pending message longer than `buf` stays in the ring and yields
    /// [`RingError::BufferTooSmall`].
    pub fn try_read<P>(&mut self, port: &P, buf: &mut [u8]) -> Result<Option<usize>>
    where
        P: RegisterPort + ?Sized,
    {
        let ptrs = Pointers::read(port, &self.ring)?;
        if ptrs.is_empty() {
            return Ok(None);
        }
        let len = codec::read_header(port, &self.ring, ptrs.rp)?;
        if len as usize > buf.len() {
            return Err(RingError::BufferTooSmall { needed: len as usize, available: buf.len() });
        }
        let next = codec::decode_into(port, &self.ring, ptrs.rp, len, buf)?;
        trace!("ring {:#x}: read len={} rp={:#x}->{:#x}", self.ring.base(), len, ptrs.rp, next);
        Ok(Some(len as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RegisterMap;
    use modem_hal::RegisterFile;

    fn tx_pair() -> (RegisterFile, Producer, Consumer) {
        let regs = RegisterFile::new(0x810);
        let ring = RegisterMap::REFERENCE.tx_ring().unwrap();
        (regs, Producer::new(ring), Consumer::new(ring))
    }

    #[test]
    fn empty_ring_dequeues_nothing() {
        let (regs, _tx, mut rx) = tx_pair();
        regs.write(0x800, 0x20).unwrap();
        regs.write(0x804, 0x20).unwrap();
        assert_eq!(rx.try_dequeue(&regs).unwrap(), RxOutcome::Empty);
        assert_eq!(regs.read(0x800), Ok(0x20));
        assert_eq!(regs.read(0x804), Ok(0x20));
    }

    #[test]
    fn oversized_payload_rejected_up_front() {
        let (regs, mut tx, _rx) = tx_pair();
        let payload = vec![0u8; 0x400 - 7];
        assert_eq!(
            tx.try_enqueue(&regs, &payload),
            Err(RingError::MessageTooLarge { len: 0x400 - 7, max: 0x400 - 8 })
        );
    }

    #[test]
    fn largest_payload_fills_empty_ring() {
        let (regs, mut tx, mut rx) = tx_pair();
        let payload: Vec<u8> = (0..0x3f8u32).map(|i| i as u8).collect();
        assert_eq!(tx.try_enqueue(&regs, &payload).unwrap(), TxOutcome::Sent);
        let ptrs = Pointers::read(&regs, tx.ring()).unwrap();
        assert_eq!(ptrs.free(tx.ring()), 0);
        assert_eq!(tx.try_enqueue(&regs, b"").unwrap(), TxOutcome::Dropped);
        assert_eq!(rx.try_dequeue(&regs).unwrap(), RxOutcome::Message(payload));
    }

    #[test]
    fn zero_length_message_roundtrips() {
        let (regs, mut tx, mut rx) = tx_pair();
        assert_eq!(tx.try_enqueue(&regs, b"").unwrap(), TxOutcome::Sent);
        assert_eq!(rx.peek_len(&regs).unwrap(), Some(0));
        assert_eq!(rx.try_dequeue(&regs).unwrap(), RxOutcome::Message(Vec::new()));
        assert!(!rx.has_data(&regs).unwrap());
    }

    #[test]
    fn short_buffer_leaves_message_pending() {
        let (regs, mut tx, mut rx) = tx_pair();
        tx.try_enqueue(&regs, b"0123456789").unwrap();
        let mut small = [0u8; 4];
        assert_eq!(
            rx.try_read(&regs, &mut small),
            Err(RingError::BufferTooSmall { needed: 10, available: 4 })
        );
        let mut buf = [0u8; 16];
        assert_eq!(rx.try_read(&regs, &mut buf).unwrap(), Some(10));
        assert_eq!(&buf[..10], b"0123456789");
    }

    #[test]
    #[should_panic(expected = "ring pointer")]
    fn corrupt_pointer_register_panics() {
        let (regs, mut tx, _rx) = tx_pair();
        regs.write(0x800, 0x1000).unwrap();
        let _ = tx.try_enqueue(&regs, b"x");
    }
}
