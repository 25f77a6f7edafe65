// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Flow-control arithmetic.
//!
//! `rp == wp` is the empty ring. The producer may never advance `wp` onto `rp`, so one
//! word of capacity ([`GUARD`]) is unusable and "full" never aliases "empty".

use crate::layout::WORD;

/// Bytes permanently reserved so a full ring is distinguishable from an empty one.
pub const GUARD: u32 = WORD;

/// Bytes the producer may still write.
///
/// # Panics
///
/// Panics if either pointer lies outside `0..capacity` or is not word aligned; such a
/// pointer pair can only come from a corrupt register window.
pub fn free_space(rp: u32, wp: u32, capacity: u32) -> u32 {
    assert!(
        rp < capacity && wp < capacity,
        "pointer pair rp={rp:#x} wp={wp:#x} outside capacity {capacity:#x}"
    );
    assert!(
        rp % WORD == 0 && wp % WORD == 0,
        "pointer pair rp={rp:#x} wp={wp:#x} not word aligned"
    );
    let free = if rp <= wp { capacity - (wp - rp) - GUARD } else { (rp - wp) - GUARD };
    debug_assert!(free <= capacity - GUARD);
    free
}

/// Bytes currently holding messages (headers and padding included).
pub fn used_space(rp: u32, wp: u32, capacity: u32) -> u32 {
    capacity - GUARD - free_space(rp, wp, capacity)
}
