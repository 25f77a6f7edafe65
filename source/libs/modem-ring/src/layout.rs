// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Register layout and ring geometry.

use core::fmt;

/// Width of one ring slot (and of every register) in bytes.
pub const WORD: u32 = 4;

/// Smallest ring that can carry a header plus one payload word past the guard.
pub const MIN_CAPACITY: u32 = 16;

/// Rejected ring geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Capacity is not a power of two, so offsets cannot be wrapped by masking.
    CapacityNotPowerOfTwo {
        /// Configured capacity in bytes.
        capacity: u32,
    },
    /// Capacity is below [`MIN_CAPACITY`].
    CapacityTooSmall {
        /// Configured capacity in bytes.
        capacity: u32,
    },
    /// Buffer base or a pointer register is not word aligned.
    Unaligned {
        /// Offending byte offset.
        addr: u32,
    },
    /// Two regions of the register map share addresses.
    Overlap {
        /// Start of the first region.
        first: u32,
        /// Start of the second region.
        second: u32,
    },
    /// Buffer region runs past the 32-bit register space.
    Overflow {
        /// Buffer base offset.
        base: u32,
        /// Configured capacity in bytes.
        capacity: u32,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityNotPowerOfTwo { capacity } => {
                write!(f, "ring capacity {capacity:#x} is not a power of two")
            }
            Self::CapacityTooSmall { capacity } => {
                write!(f, "ring capacity {capacity:#x} below minimum {MIN_CAPACITY:#x}")
            }
            Self::Unaligned { addr } => write!(f, "offset {addr:#x} is not word aligned"),
            Self::Overlap { first, second } => {
                write!(f, "regions at {first:#x} and {second:#x} overlap")
            }
            Self::Overflow { base, capacity } => {
                write!(f, "ring {base:#x}+{capacity:#x} overflows the register space")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayoutError {}

/// One direction's circular buffer inside the register window.
///
/// The pointer registers hold byte offsets relative to `base`, already in the buffer's
/// own coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingBuffer {
    base: u32,
    capacity: u32,
    rp_addr: u32,
    wp_addr: u32,
}

impl RingBuffer {
    /// Validates and builds a ring description.
    pub fn new(base: u32, capacity: u32, rp_addr: u32, wp_addr: u32) -> Result<Self, LayoutError> {
        if !capacity.is_power_of_two() {
            return Err(LayoutError::CapacityNotPowerOfTwo { capacity });
        }
        if capacity < MIN_CAPACITY {
            return Err(LayoutError::CapacityTooSmall { capacity });
        }
        for addr in [base, rp_addr, wp_addr] {
            if addr % WORD != 0 {
                return Err(LayoutError::Unaligned { addr });
            }
        }
        if base.checked_add(capacity).is_none() {
            return Err(LayoutError::Overflow { base, capacity });
        }
        Ok(Self { base, capacity, rp_addr, wp_addr })
    }

    /// Register-window offset of the first slot.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Buffer size in bytes.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Address of the read-pointer register.
    pub const fn rp_addr(&self) -> u32 {
        self.rp_addr
    }

    /// Address of the write-pointer register.
    pub const fn wp_addr(&self) -> u32 {
        self.wp_addr
    }

    /// Largest payload one message may carry: capacity minus header and guard.
    pub const fn max_payload(&self) -> u32 {
        self.capacity - 2 * WORD
    }

    /// Reduces an offset modulo the capacity.
    pub const fn wrap(&self, offset: u32) -> u32 {
        offset & (self.capacity - 1)
    }

    /// Offset `bytes` past `offset`, wrapped.
    pub const fn advance(&self, offset: u32, bytes: u32) -> u32 {
        self.wrap(offset.wrapping_add(bytes))
    }

    /// Register-window address of the slot at ring offset `offset`.
    pub const fn slot_addr(&self, offset: u32) -> u32 {
        self.base + self.wrap(offset)
    }

    /// Panics unless `ptr` is a word-aligned offset inside the ring.
    ///
    /// A pointer register holding anything else means the shared window is corrupt.
    pub fn check_pointer(&self, ptr: u32) {
        assert!(
            ptr < self.capacity && ptr % WORD == 0,
            "ring pointer {ptr:#x} invalid for capacity {:#x}",
            self.capacity
        );
    }
}

/// The eight fixed addresses describing both rings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    /// TX buffer base offset.
    pub tx_base: u32,
    /// TX buffer size in bytes.
    pub tx_size: u32,
    /// RX buffer base offset.
    pub rx_base: u32,
    /// RX buffer size in bytes.
    pub rx_size: u32,
    /// TX read pointer (peer owned).
    pub tx_rp: u32,
    /// TX write pointer (host owned).
    pub tx_wp: u32,
    /// RX read pointer (host owned).
    pub rx_rp: u32,
    /// RX write pointer (peer owned).
    pub rx_wp: u32,
}

impl RegisterMap {
    /// Layout of the reference modem core.
    pub const REFERENCE: Self = Self {
        tx_base: 0x000,
        tx_size: 0x400,
        rx_base: 0x400,
        rx_size: 0x400,
        tx_rp: 0x800,
        tx_wp: 0x804,
        rx_rp: 0x808,
        rx_wp: 0x80c,
    };

    /// Host-to-peer ring.
    pub fn tx_ring(&self) -> Result<RingBuffer, LayoutError> {
        RingBuffer::new(self.tx_base, self.tx_size, self.tx_rp, self.tx_wp)
    }

    /// Peer-to-host ring.
    pub fn rx_ring(&self) -> Result<RingBuffer, LayoutError> {
        RingBuffer::new(self.rx_base, self.rx_size, self.rx_rp, self.rx_wp)
    }

    /// Builds both rings and rejects maps whose buffers or pointer registers collide.
    pub fn validate(&self) -> Result<(RingBuffer, RingBuffer), LayoutError> {
        let tx = self.tx_ring()?;
        let rx = self.rx_ring()?;
        let mut regions = [
            (self.tx_base, self.tx_size),
            (self.rx_base, self.rx_size),
            (self.tx_rp, WORD),
            (self.tx_wp, WORD),
            (self.rx_rp, WORD),
            (self.rx_wp, WORD),
        ];
        regions.sort_unstable_by_key(|&(start, _)| start);
        for pair in regions.windows(2) {
            let (start, len) = pair[0];
            let (next, _) = pair[1];
            if u64::from(start) + u64::from(len) > u64::from(next) {
                return Err(LayoutError::Overlap { first: start, second: next });
            }
        }
        Ok((tx, rx))
    }

    /// Bytes of register window needed to cover every buffer and pointer register.
    pub fn window_len(&self) -> u32 {
        let buffers = self
            .tx_base
            .saturating_add(self.tx_size)
            .max(self.rx_base.saturating_add(self.rx_size));
        let registers = [self.tx_rp, self.tx_wp, self.rx_rp, self.rx_wp]
            .into_iter()
            .map(|addr| addr.saturating_add(WORD))
            .max()
            .unwrap_or(0);
        buffers.max(registers)
    }
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::REFERENCE
    }
}
