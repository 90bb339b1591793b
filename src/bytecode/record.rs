use super::{Bytecode, HEADER_LEN, Opcode};
use crate::error::PlotResult;
use crate::hpgl::types::{Coord, CoordFloat, ScalingMode};

/// One decoded bytecode record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    PenUp,
    PenDown,
    Move(Coord),
    RelativeMove(Coord),
    SelectPen(u8),
    LineType(u8),
    /// Substituted label text, without its NUL terminator
    Label(String),
    /// Character width and height in percent of P2 - P1
    TextSize { width: f32, height: f32 },
    OutputPoints { p1: Coord, p2: Coord },
    InputPoints { p1: Coord, p2: Coord },
    /// `offset` is only stored for `ScalingMode::IsotropicWithOffset`
    Scaling { mode: ScalingMode, p1: Coord, p2: Coord, offset: Coord },
    Rotation(i32),
    /// Stroke deltas; pen-down points carry `UC_PEN_DOWN_OFFSET` on x
    UserCharacter(Vec<CoordFloat>),
}

fn coord_bytes(c: Coord) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&c.x.to_le_bytes());
    out[4..].copy_from_slice(&c.y.to_le_bytes());
    out
}

impl Record {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::PenUp => Opcode::PenUp,
            Self::PenDown => Opcode::PenDown,
            Self::Move(_) => Opcode::Move,
            Self::RelativeMove(_) => Opcode::RelativeMove,
            Self::SelectPen(_) => Opcode::SelectPen,
            Self::LineType(_) => Opcode::LineType,
            Self::Label(_) => Opcode::Label,
            Self::TextSize { .. } => Opcode::TextSize,
            Self::OutputPoints { .. } => Opcode::OutputPoints,
            Self::InputPoints { .. } => Opcode::InputPoints,
            Self::Scaling { .. } => Opcode::Scaling,
            Self::Rotation(_) => Opcode::Rotation,
            Self::UserCharacter(_) => Opcode::UserCharacter,
        }
    }

    pub(super) fn encode(&self, code: &mut Bytecode) -> PlotResult<()> {
        let op = self.opcode();
        match self {
            Self::PenUp | Self::PenDown => code.append(op, &[]),
            Self::Move(c) | Self::RelativeMove(c) => code.append(op, &coord_bytes(*c)),
            Self::SelectPen(v) | Self::LineType(v) => code.append(op, &[*v]),
            Self::Label(text) => {
                let len = text.len().min(u16::MAX as usize) as u16;
                code.append(op, &len.to_le_bytes())?;
                code.append(Opcode::PayloadOnly, &text.as_bytes()[..usize::from(len)])?;
                code.append(Opcode::PayloadOnly, &[0])
            }
            Self::TextSize { width, height } => {
                let mut payload = [0u8; 8];
                payload[..4].copy_from_slice(&width.to_le_bytes());
                payload[4..].copy_from_slice(&height.to_le_bytes());
                code.append(op, &payload)
            }
            Self::OutputPoints { p1, p2 } | Self::InputPoints { p1, p2 } => {
                code.append(op, &coord_bytes(*p1))?;
                code.append(Opcode::PayloadOnly, &coord_bytes(*p2))
            }
            Self::Scaling { mode, p1, p2, offset } => {
                code.append(op, &[*mode as u8])?;
                for c in [p1, p2, offset].into_iter().take(mode.pair_count()) {
                    code.append(Opcode::PayloadOnly, &coord_bytes(*c))?;
                }
                Ok(())
            }
            Self::Rotation(deg) => code.append(op, &deg.to_le_bytes()),
            Self::UserCharacter(points) => {
                let count = points.len().min(u16::MAX as usize) as u16;
                code.append(op, &count.to_le_bytes())?;
                for p in &points[..usize::from(count)] {
                    let mut pair = [0u8; 8];
                    pair[..4].copy_from_slice(&p.x.to_le_bytes());
                    pair[4..].copy_from_slice(&p.y.to_le_bytes());
                    code.append(Opcode::PayloadOnly, &pair)?;
                }
                Ok(())
            }
        }
    }
}

/// Sequential record reader bounded by the buffer's declared length.
///
/// A record that would run past the bound ends the walk. Unknown tags are skipped one byte
/// at a time.
pub struct Records<'a> {
    bytes: &'a [u8],
    cursor: usize,
    end: usize,
}

impl<'a> Records<'a> {
    /// `limit` caps the walk at a previously captured length
    pub fn new(bytes: &'a [u8], limit: Option<usize>) -> Self {
        let declared = bytes
            .get(..HEADER_LEN)
            .and_then(|h| <[u8; 4]>::try_from(h).ok())
            .map(|h| u32::from_le_bytes(h) as usize)
            .unwrap_or(0);
        let mut end = declared.min(bytes.len());
        if let Some(limit) = limit {
            end = end.min(limit);
        }
        Self { bytes, cursor: HEADER_LEN, end }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let stop = self.cursor.checked_add(n)?;
        if stop > self.end {
            return None;
        }
        let slice = &self.bytes[self.cursor..stop];
        self.cursor = stop;
        Some(slice)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take(2)?.try_into().ok().map(u16::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take(4)?.try_into().ok().map(i32::from_le_bytes)
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.take(4)?.try_into().ok().map(f32::from_le_bytes)
    }

    fn read_coord(&mut self) -> Option<Coord> {
        Some(Coord::new(self.read_i32()?, self.read_i32()?))
    }

    fn decode(&mut self, opcode: Opcode) -> Option<Record> {
        let record = match opcode {
            Opcode::PayloadOnly => return None,
            Opcode::PenUp => Record::PenUp,
            Opcode::PenDown => Record::PenDown,
            Opcode::Move => Record::Move(self.read_coord()?),
            Opcode::RelativeMove => Record::RelativeMove(self.read_coord()?),
            Opcode::SelectPen => Record::SelectPen(self.read_u8()?),
            Opcode::LineType => Record::LineType(self.read_u8()?),
            Opcode::Label => {
                let len = usize::from(self.read_u16()?);
                let text = self.take(len + 1)?;
                Record::Label(String::from_utf8_lossy(&text[..len]).into_owned())
            }
            Opcode::TextSize => Record::TextSize {
                width: self.read_f32()?,
                height: self.read_f32()?,
            },
            Opcode::OutputPoints => Record::OutputPoints {
                p1: self.read_coord()?,
                p2: self.read_coord()?,
            },
            Opcode::InputPoints => Record::InputPoints {
                p1: self.read_coord()?,
                p2: self.read_coord()?,
            },
            Opcode::Scaling => {
                let tag = self.read_u8()?;
                let mode = ScalingMode::from_tag(tag).unwrap_or_default();
                let mut pairs = [Coord::default(); 3];
                for slot in pairs.iter_mut().take(mode.pair_count()) {
                    *slot = self.read_coord()?;
                }
                Record::Scaling { mode, p1: pairs[0], p2: pairs[1], offset: pairs[2] }
            }
            Opcode::Rotation => Record::Rotation(self.read_i32()?),
            Opcode::UserCharacter => {
                let count = usize::from(self.read_u16()?);
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    points.push(CoordFloat::new(self.read_f32()?, self.read_f32()?));
                }
                Record::UserCharacter(points)
            }
        };
        Some(record)
    }
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let tag = self.read_u8()?;
            match Opcode::from_tag(tag) {
                Some(opcode) => return self.decode(opcode),
                None => log::debug!("Skipping unknown bytecode tag {tag} at {}", self.cursor - 1),
            }
        }
    }
}
