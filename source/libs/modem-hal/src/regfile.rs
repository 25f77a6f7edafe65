// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory register window shared between a host-side driver and a simulated peer.

use alloc::vec::Vec;
use core::sync::atomic::{fence, AtomicU32, Ordering};

use crate::{check_aligned, PortError, RegisterPort, REGISTER_BYTES};

/// Word-addressed register window backed by atomics.
///
/// Several parties may hold the same `RegisterFile` (typically through an `Arc`), each
/// acting as one role of the ring protocol. Stores use `Release` and loads `Acquire`,
/// so a reader that observes a pointer update also observes the words written before it.
pub struct RegisterFile {
    words: Vec<AtomicU32>,
}

impl RegisterFile {
    /// Creates a zeroed window of `len` bytes (rounded up to whole registers).
    pub fn new(len: u32) -> Self {
        let count = len.div_ceil(REGISTER_BYTES) as usize;
        Self { words: (0..count).map(|_| AtomicU32::new(0)).collect() }
    }

    /// Window size in bytes.
    pub fn len(&self) -> u32 {
        self.words.len() as u32 * REGISTER_BYTES
    }

    /// Returns `true` for a zero-sized window.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Copies the window out, one entry per register.
    pub fn snapshot(&self) -> Vec<u32> {
        self.words.iter().map(|w| w.load(Ordering::Acquire)).collect()
    }

    fn cell(&self, addr: u32) -> Result<&AtomicU32, PortError> {
        check_aligned(addr)?;
        self.words
            .get((addr / REGISTER_BYTES) as usize)
            .ok_or(PortError::OutOfRange { addr })
    }
}

impl core::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterFile").field("len", &self.len()).finish()
    }
}

impl RegisterPort for RegisterFile {
    fn read(&self, addr: u32) -> Result<u32, PortError> {
        Ok(self.cell(addr)?.load(Ordering::Acquire))
    }

    fn write(&self, addr: u32, value: u32) -> Result<(), PortError> {
        self.cell(addr)?.store(value, Ordering::Release);
        Ok(())
    }

    fn barrier(&self) {
        fence(Ordering::SeqCst);
    }
}
