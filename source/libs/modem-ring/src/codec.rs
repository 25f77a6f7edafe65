// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message framing inside a ring.
//!
//! Frame shape: `[len:u32][word 0]..[word ceil(len/4)-1]`, each slot at the previous
//! offset plus 4, wrapped modulo capacity. Payload bytes are packed little-endian and
//! the unused tail of the last word is zero.

use alloc::vec;
use alloc::vec::Vec;

use modem_hal::{PortError, RegisterPort};

use crate::layout::{RingBuffer, WORD};

/// Number of payload words a `len`-byte message occupies.
pub const fn word_len(len: u32) -> u32 {
    len.div_ceil(WORD)
}

/// Ring bytes a `len`-byte message occupies, header included.
pub const fn frame_bytes(len: u32) -> u32 {
    (word_len(len) + 1) * WORD
}

/// Packs a payload into words, zero-filling the tail of the last one.
pub fn pack_words(payload: &[u8]) -> Vec<u32> {
    payload
        .chunks(WORD as usize)
        .map(|chunk| {
            let mut bytes = [0u8; WORD as usize];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect()
}

/// Inverse of [`pack_words`]: keeps the first `len` bytes.
pub fn unpack_words(words: &[u32], len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    out.truncate(len);
    out
}

/// Writes one frame at `wp` and commits the advanced write pointer.
///
/// The caller has already checked free space. Returns the committed pointer.
pub fn encode<P>(port: &P, ring: &RingBuffer, wp: u32, payload: &[u8]) -> Result<u32, PortError>
where
    P: RegisterPort + ?Sized,
{
    debug_assert!(payload.len() <= ring.max_payload() as usize);
    let len = payload.len() as u32;
    port.write(ring.slot_addr(wp), len)?;
    for (i, word) in pack_words(payload).into_iter().enumerate() {
        let offset = ring.advance(wp, (i as u32 + 1) * WORD);
        port.write(ring.slot_addr(offset), word)?;
    }
    let next = ring.advance(wp, frame_bytes(len));
    // Frame words must be visible before the peer can observe the new write pointer.
    port.barrier();
    port.write(ring.wp_addr(), next)?;
    Ok(next)
}

/// Reads the length header of the frame at `rp` without consuming it.
///
/// # Panics
///
/// Panics if the header claims more than the ring can hold.
pub fn read_header<P>(port: &P, ring: &RingBuffer, rp: u32) -> Result<u32, PortError>
where
    P: RegisterPort + ?Sized,
{
    let len = port.read(ring.slot_addr(rp))?;
    assert!(
        len <= ring.max_payload(),
        "frame header {len:#x} at {rp:#x} exceeds ring maximum {:#x}",
        ring.max_payload()
    );
    Ok(len)
}

/// Copies the `len`-byte payload of the frame at `rp` into `out` and commits the
/// advanced read pointer. Returns the committed pointer.
///
/// # Panics
///
/// Panics if `out` is shorter than `len`; nothing has been read at that point.
pub fn decode_into<P>(
    port: &P,
    ring: &RingBuffer,
    rp: u32,
    len: u32,
    out: &mut [u8],
) -> Result<u32, PortError>
where
    P: RegisterPort + ?Sized,
{
    assert!(
        out.len() >= len as usize,
        "decode buffer holds {} bytes, frame at {rp:#x} needs {len}",
        out.len()
    );
    for (i, chunk) in out[..len as usize].chunks_mut(WORD as usize).enumerate() {
        let offset = ring.advance(rp, (i as u32 + 1) * WORD);
        let word = port.read(ring.slot_addr(offset))?;
        chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
    }
    let next = ring.advance(rp, frame_bytes(len));
    // Slots are released only after every payload read completed.
    port.barrier();
    port.write(ring.rp_addr(), next)?;
    Ok(next)
}

/// Reads the whole frame at `rp`, commits the read pointer, and returns
/// `(payload, committed_rp)`.
pub fn decode<P>(port: &P, ring: &RingBuffer, rp: u32) -> Result<(Vec<u8>, u32), PortError>
where
    P: RegisterPort + ?Sized,
{
    let len = read_header(port, ring, rp)?;
    let mut payload = vec![0u8; len as usize];
    let next = decode_into(port, ring, rp, len, &mut payload)?;
    Ok((payload, next))
}
