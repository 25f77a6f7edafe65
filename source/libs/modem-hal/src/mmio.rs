// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Direct load/store port over an already mapped register window.

#![allow(unsafe_code)]

use core::sync::atomic::{fence, Ordering};

use crate::{check_aligned, PortError, RegisterPort, REGISTER_BYTES};

/// Volatile access to a memory-mapped register window.
///
/// Loads and stores are issued in program order; [`RegisterPort::barrier`] adds a full
/// fence so that buffer words land before a pointer register update.
#[derive(Debug)]
pub struct MmioPort {
    base: usize,
    len: u32,
}

impl MmioPort {
    /// Wraps the mapped window starting at `base` spanning `len` bytes.
    ///
    /// # Safety
    ///
    /// `base..base + len` must stay mapped to device (or otherwise valid, 4-byte aligned)
    /// memory for the whole lifetime of the port, and no other code may hold Rust
    /// references into it.
    pub unsafe fn new(base: usize, len: u32) -> Self {
        Self { base, len }
    }

    /// Window size in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` for a zero-sized window.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, addr: u32) -> Result<*mut u32, PortError> {
        check_aligned(addr)?;
        if addr.checked_add(REGISTER_BYTES).map_or(true, |end| end > self.len) {
            return Err(PortError::OutOfRange { addr });
        }
        Ok((self.base + addr as usize) as *mut u32)
    }
}

impl RegisterPort for MmioPort {
    fn read(&self, addr: u32) -> Result<u32, PortError> {
        let ptr = self.slot(addr)?;
        // SAFETY: `slot` bounds-checked the offset against the window promised by `new`.
        Ok(unsafe { core::ptr::read_volatile(ptr) })
    }

    fn write(&self, addr: u32, value: u32) -> Result<(), PortError> {
        let ptr = self.slot(addr)?;
        // SAFETY: as in `read`.
        unsafe { core::ptr::write_volatile(ptr, value) };
        Ok(())
    }

    fn barrier(&self) {
        fence(Ordering::SeqCst);
    }
}
