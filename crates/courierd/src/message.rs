//! Message unit layout shared by every component on the bus.
//!
//! A unit is a fixed-size datagram whose first eight bytes carry the header
//! below. The dispatcher only interprets the destination byte; everything else
//! is opaque payload forwarded verbatim.
//!
//! ```text
//! 0        2        3        4        5        6                8
//! +--------+--------+--------+--------+--------+----------------+---------
//! | msg_id | type   | dest   | source | opcode | msg_len        | payload
//! +--------+--------+--------+--------+--------+----------------+---------
//! ```

use std::fmt;

/// Size of every unit exchanged on the bus, in bytes.
pub const MESSAGE_UNIT_SIZE: usize = 4096;

/// Size of the fixed header at the start of each unit.
pub const HEADER_SIZE: usize = 8;

/// Offset of the destination identifier within a unit.
pub const DEST_INDEX: usize = 3;

/// Control payload that asks the dispatcher to shut down.
pub const SHUTDOWN_SENTINEL: &[u8] = b"DOWN";

/// Reads the destination identifier, or `None` if the unit is too short to
/// carry one.
#[must_use]
pub fn destination_id(unit: &[u8]) -> Option<u8> {
    unit.get(DEST_INDEX).copied()
}

/// Returns `true` when the unit is the shutdown control message.
///
/// The unit is read as NUL-terminated text across its full width: anything
/// after the first NUL is ignored. `DOWNLINK` does not count.
#[must_use]
pub fn is_shutdown_sentinel(unit: &[u8]) -> bool {
    let text = unit.split(|byte| *byte == 0).next().unwrap_or_default();
    text == SHUTDOWN_SENTINEL
}

/// Decoded unit header, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub msg_id: u16,
    pub msg_type: u8,
    pub dest_id: u8,
    pub source_id: u8,
    pub opcode: u8,
    pub msg_len: u16,
}

impl MessageHeader {
    /// Decodes the header, or `None` if fewer than [`HEADER_SIZE`] bytes are
    /// available.
    #[must_use]
    pub fn parse(unit: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_SIZE] = unit.get(..HEADER_SIZE)?.try_into().ok()?;
        let [id_lo, id_hi, msg_type, dest_id, source_id, opcode, len_lo, len_hi] = *header;
        Some(Self {
            msg_id: u16::from_le_bytes([id_lo, id_hi]),
            msg_type,
            dest_id,
            source_id,
            opcode,
            msg_len: u16::from_le_bytes([len_lo, len_hi]),
        })
    }

    /// Encodes the header into its wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [id_lo, id_hi] = self.msg_id.to_le_bytes();
        let [len_lo, len_hi] = self.msg_len.to_le_bytes();
        [
            id_lo,
            id_hi,
            self.msg_type,
            self.dest_id,
            self.source_id,
            self.opcode,
            len_lo,
            len_hi,
        ]
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "id={} type={} dest={} source={} opcode={} len={}",
            self.msg_id, self.msg_type, self.dest_id, self.source_id, self.opcode, self.msg_len
        )
    }
}

/// Single scratch buffer reused for every read.
///
/// The buffer must be cleared after each unit is handled so a short read
/// never exposes bytes left over from a longer predecessor.
pub(crate) struct ScratchBuffer {
    bytes: Box<[u8]>,
}

impl ScratchBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: vec![0_u8; MESSAGE_UNIT_SIZE].into_boxed_slice(),
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The first `len` bytes, clamped to the buffer size.
    pub(crate) fn filled(&self, len: usize) -> &[u8] {
        let end = len.min(self.bytes.len());
        self.bytes.get(..end).unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.fill(0);
    }

    #[cfg(test)]
    pub(crate) fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|byte| *byte == 0)
    }
}
