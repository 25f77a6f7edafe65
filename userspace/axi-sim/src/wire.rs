// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size register record.
//!
//! Layout: `[code:u32le, address:u32le, data:u32le]`. Commands travel host to simulator,
//! acks travel back; a read ack carries the register value, a write ack echoes the data.

use std::io::{self, Read, Write};

use crate::Result;

/// Encoded record size in bytes.
pub const RECORD_LEN: usize = 12;

/// Record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Opcode {
    /// Read one register.
    ReadCmd = 0,
    /// Write one register.
    WriteCmd = 1,
    /// Answer to `ReadCmd`.
    ReadAck = 2,
    /// Answer to `WriteCmd`.
    WriteAck = 3,
}

impl Opcode {
    /// Numeric code on the wire.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decodes a wire code.
    pub fn from_code(code: u32) -> core::result::Result<Self, WireError> {
        match code {
            0 => Ok(Self::ReadCmd),
            1 => Ok(Self::WriteCmd),
            2 => Ok(Self::ReadAck),
            3 => Ok(Self::WriteAck),
            other => Err(WireError::BadOpcode(other)),
        }
    }

    /// Ack that answers this command, `None` for acks.
    pub const fn ack(self) -> Option<Self> {
        match self {
            Self::ReadCmd => Some(Self::ReadAck),
            Self::WriteCmd => Some(Self::WriteAck),
            Self::ReadAck | Self::WriteAck => None,
        }
    }
}

/// Errors when decoding a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Stream ended inside a record.
    #[error("truncated record ({len} of 12 bytes)")]
    Truncated {
        /// Bytes received before the stream ended.
        len: usize,
    },
    /// Unknown record code.
    #[error("unknown record code {0}")]
    BadOpcode(u32),
}

/// One request or response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// Record kind.
    pub opcode: Opcode,
    /// Register byte offset.
    pub address: u32,
    /// Register value (zero in a read command).
    pub data: u32,
}

impl Record {
    /// Read command for `address`.
    pub const fn read_cmd(address: u32) -> Self {
        Self { opcode: Opcode::ReadCmd, address, data: 0 }
    }

    /// Write command storing `data` at `address`.
    pub const fn write_cmd(address: u32, data: u32) -> Self {
        Self { opcode: Opcode::WriteCmd, address, data }
    }

    /// Serializes to the 12-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0..4].copy_from_slice(&self.opcode.code().to_le_bytes());
        out[4..8].copy_from_slice(&self.address.to_le_bytes());
        out[8..12].copy_from_slice(&self.data.to_le_bytes());
        out
    }

    /// Parses the first 12 bytes of `buf`.
    pub fn decode(buf: &[u8]) -> core::result::Result<Self, WireError> {
        if buf.len() < RECORD_LEN {
            return Err(WireError::Truncated { len: buf.len() });
        }
        let word = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        Ok(Self { opcode: Opcode::from_code(word(0))?, address: word(4), data: word(8) })
    }
}

/// Reads one record; `Ok(None)` when the stream ends cleanly on a record boundary.
pub fn read_record<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Record>> {
    let mut buf = [0u8; RECORD_LEN];
    let mut filled = 0;
    while filled < RECORD_LEN {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(WireError::Truncated { len: filled }.into()),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(Some(Record::decode(&buf)?))
}

/// Writes one record.
pub fn write_record<W: Write + ?Sized>(writer: &mut W, record: &Record) -> Result<()> {
    writer.write_all(&record.encode())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimError;
    use proptest::prelude::*;

    #[test]
    fn layout_is_three_le_words() {
        let rec = Record::write_cmd(0x804, 0x0000_0123);
        assert_eq!(rec.encode(), [1, 0, 0, 0, 0x04, 0x08, 0, 0, 0x23, 0x01, 0, 0]);
    }

    #[test]
    fn unknown_code_rejected() {
        let mut raw = Record::read_cmd(0).encode();
        raw[0] = 9;
        assert_eq!(Record::decode(&raw), Err(WireError::BadOpcode(9)));
    }

    #[test]
    fn acks_answer_commands() {
        assert_eq!(Opcode::ReadCmd.ack(), Some(Opcode::ReadAck));
        assert_eq!(Opcode::WriteCmd.ack(), Some(Opcode::WriteAck));
        assert_eq!(Opcode::ReadAck.ack(), None);
    }

    #[test]
    fn stream_end_between_records_is_clean() {
        let mut stream: &[u8] = &[];
        assert!(read_record(&mut stream).unwrap().is_none());
    }

    #[test]
    fn stream_end_inside_record_is_truncation() {
        let raw = Record::read_cmd(0x808).encode();
        let mut stream: &[u8] = &raw[..5];
        assert!(matches!(
            read_record(&mut stream),
            Err(SimError::Wire(WireError::Truncated { len: 5 }))
        ));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(code in 0u32..4, address in any::<u32>(), data in any::<u32>()) {
            let rec = Record { opcode: Opcode::from_code(code).unwrap(), address, data };
            let mut sink = Vec::new();
            write_record(&mut sink, &rec).unwrap();
            let mut stream: &[u8] = &sink;
            prop_assert_eq!(read_record(&mut stream).unwrap(), Some(rec));
        }
    }
}
