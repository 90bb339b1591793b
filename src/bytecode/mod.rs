//! Compiled plot storage.
//!
//! Layout (little-endian): a `u32` holding the total byte length of the buffer (header
//! included), followed by records. Each record starts with a one-byte opcode tag, except
//! payload-only continuations which extend the previous record.

mod record;

pub use record::{Record, Records};

use crate::error::{PlotError, PlotResult};

pub const HEADER_LEN: usize = 4;

/// Growth quantum for the backing allocation
const GROWTH_QUANTUM: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Continuation of the previous record, no tag is written
    PayloadOnly = 0,
    Move = 1,
    RelativeMove = 2,
    PenUp = 3,
    PenDown = 4,
    SelectPen = 5,
    LineType = 6,
    TextSize = 7,
    Label = 8,
    OutputPoints = 9,
    InputPoints = 10,
    Scaling = 12,
    Rotation = 13,
    UserCharacter = 14,
}

impl Opcode {
    /// Opcode starting a record; 0 is a continuation marker, never a record start
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Move),
            2 => Some(Self::RelativeMove),
            3 => Some(Self::PenUp),
            4 => Some(Self::PenDown),
            5 => Some(Self::SelectPen),
            6 => Some(Self::LineType),
            7 => Some(Self::TextSize),
            8 => Some(Self::Label),
            9 => Some(Self::OutputPoints),
            10 => Some(Self::InputPoints),
            12 => Some(Self::Scaling),
            13 => Some(Self::Rotation),
            14 => Some(Self::UserCharacter),
            _ => None,
        }
    }
}

/// Append-only compiled plot
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    buf: Vec<u8>,
}

impl Default for Bytecode {
    fn default() -> Self {
        Self::new()
    }
}

impl Bytecode {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(GROWTH_QUANTUM);
        buf.extend_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        Self { buf }
    }

    /// Total length in bytes, header included
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no record has been appended
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= HEADER_LEN
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.truncate(HEADER_LEN);
        self.write_header();
    }

    /// Append one tagged payload (or a bare continuation for `Opcode::PayloadOnly`)
    pub fn append(&mut self, opcode: Opcode, payload: &[u8]) -> PlotResult<()> {
        let tag_len = usize::from(opcode != Opcode::PayloadOnly);
        let needed = self.buf.len() + tag_len + payload.len();
        if needed > u32::MAX as usize {
            return Err(PlotError::Allocation { requested: needed });
        }
        if needed > self.buf.capacity() {
            let quantized = needed.div_ceil(GROWTH_QUANTUM) * GROWTH_QUANTUM;
            self.buf
                .try_reserve_exact(quantized - self.buf.len())
                .map_err(|_| PlotError::Allocation { requested: quantized })?;
        }
        if tag_len == 1 {
            self.buf.push(opcode as u8);
        }
        self.buf.extend_from_slice(payload);
        self.write_header();
        Ok(())
    }

    /// Encode a whole record
    pub fn push(&mut self, record: &Record) -> PlotResult<()> {
        record.encode(self)
    }

    /// Walk every record up to the recorded length
    pub fn records(&self) -> Records<'_> {
        Records::new(&self.buf, None)
    }

    fn write_header(&mut self) {
        let len = self.buf.len() as u32;
        self.buf[..HEADER_LEN].copy_from_slice(&len.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpgl::types::Coord;

    #[test]
    fn new_buffer_holds_only_header() {
        let code = Bytecode::new();
        assert!(code.is_empty());
        assert_eq!(code.as_bytes(), &[4, 0, 0, 0]);
    }

    #[test]
    fn header_tracks_running_length() {
        let mut code = Bytecode::new();
        code.append(Opcode::PenUp, &[]).unwrap();
        code.append(Opcode::Move, &[1, 0, 0, 0, 2, 0, 0, 0]).unwrap();
        assert_eq!(code.len(), 4 + 1 + 9);
        assert_eq!(&code.as_bytes()[..4], &(14u32).to_le_bytes());
    }

    #[test]
    fn payload_only_writes_no_tag() {
        let mut code = Bytecode::new();
        code.append(Opcode::PayloadOnly, &[7, 7]).unwrap();
        assert_eq!(&code.as_bytes()[4..], &[7, 7]);
    }

    #[test]
    fn growth_is_quantized() {
        let mut code = Bytecode::new();
        code.append(Opcode::PenDown, &[]).unwrap();
        assert!(code.buf.capacity() >= 1000);
        assert_eq!(code.buf.capacity() % 1000, 0);
    }

    #[test]
    fn clear_keeps_header_consistent() {
        let mut code = Bytecode::new();
        code.push(&Record::Move(Coord::new(3, 4))).unwrap();
        code.clear();
        assert!(code.is_empty());
        assert_eq!(code, Bytecode::new());
    }
}
