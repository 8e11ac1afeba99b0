use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Av1Error, Result};

pub mod frame;
pub mod seq;
pub mod tile_group;
pub mod utils;

const FORBIDDEN_BIT: u8 = 0x80;
const EXTENSION_FLAG: u8 = 0x04;
const HAS_SIZE_FIELD: u8 = 0x02;

/// OBU header without `obu_extension_header()`.
/// AV1-Spec-2 - 5.3.2
///
/// The first byte is `0 | obu_type(4) | extension(1) | has_size(1) | 0`.
/// Streams built here are single-layer still pictures, so the extension
/// flag is always clear and is rejected when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct ObuHeader {
    /// `obu_type`
    pub obu_type: ObuType,
    /// `obu_size`, present when `obu_has_size_field` is 1.
    pub size: Option<u64>,
}

impl ObuHeader {
    /// First header byte for an OBU of `obu_type` with
    /// `obu_has_size_field=1` and every other flag clear.
    pub fn sized_header_byte(obu_type: ObuType) -> u8 {
        (obu_type.bits() << 3) | HAS_SIZE_FIELD
    }

    fn header_byte(&self) -> u8 {
        let size_flag = if self.size.is_some() { HAS_SIZE_FIELD } else { 0 };
        (self.obu_type.bits() << 3) | size_flag
    }

    /// Parses the header byte and, if present, the `leb128()` size.
    pub fn parse<R: io::Read>(reader: &mut R) -> Result<Self> {
        let byte = reader.read_u8()?;
        if byte & FORBIDDEN_BIT != 0 {
            return Err(Av1Error::InvalidObu("obu_forbidden_bit is not 0".into()));
        }
        if byte & EXTENSION_FLAG != 0 {
            return Err(Av1Error::InvalidObu("obu_extension_flag is not supported".into()));
        }

        let size = if byte & HAS_SIZE_FIELD != 0 {
            Some(utils::read_leb128(reader)?)
        } else {
            None
        };

        Ok(Self {
            obu_type: ObuType::from((byte >> 3) & 0x0f),
            size,
        })
    }

    /// Writes the header and returns the number of bytes written.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> io::Result<usize> {
        writer.write_u8(self.header_byte())?;
        match self.size {
            Some(size) => Ok(1 + utils::write_leb128(writer, size)?),
            None => Ok(1),
        }
    }

    /// Encoded size of this header in bytes.
    pub fn header_size(&self) -> usize {
        1 + self.size.map_or(0, utils::leb128_size)
    }
}

/// `obu_type`
/// AV1-Spec-2 - 6.2.2
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ObuType {
    /// `OBU_SEQUENCE_HEADER`
    SequenceHeader,
    /// `OBU_TEMPORAL_DELIMITER`
    TemporalDelimiter,
    /// `OBU_FRAME_HEADER`
    FrameHeader,
    /// `OBU_TILE_GROUP`
    TileGroup,
    /// `OBU_METADATA`
    Metadata,
    /// `OBU_FRAME`
    Frame,
    /// `OBU_REDUNDANT_FRAME_HEADER`
    RedundantFrameHeader,
    /// `OBU_TILE_LIST`
    TileList,
    /// `OBU_PADDING`
    Padding,
    /// Any reserved value.
    Reserved(u8),
}

impl ObuType {
    /// The 4-bit `obu_type` value.
    pub const fn bits(self) -> u8 {
        let value = match self {
            Self::SequenceHeader => 1,
            Self::TemporalDelimiter => 2,
            Self::FrameHeader => 3,
            Self::TileGroup => 4,
            Self::Metadata => 5,
            Self::Frame => 6,
            Self::RedundantFrameHeader => 7,
            Self::TileList => 8,
            Self::Padding => 15,
            Self::Reserved(value) => value,
        };
        value & 0x0f
    }
}

impl From<u8> for ObuType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::SequenceHeader,
            2 => Self::TemporalDelimiter,
            3 => Self::FrameHeader,
            4 => Self::TileGroup,
            5 => Self::Metadata,
            6 => Self::Frame,
            7 => Self::RedundantFrameHeader,
            8 => Self::TileList,
            15 => Self::Padding,
            _ => Self::Reserved(value),
        }
    }
}

impl From<ObuType> for u8 {
    fn from(value: ObuType) -> Self {
        value.bits()
    }
}
