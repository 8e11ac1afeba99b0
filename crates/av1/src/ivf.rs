//! IVF container writing.
//!
//! IVF is a 32-byte file header followed by frames, each prefixed with a
//! 12-byte header. Some reference decoders only accept AV1 streams inside
//! a container, so generated vectors can be wrapped as a single-frame IVF.
//!
//! All multi-byte integers are little-endian.

use std::io;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Av1Error, Result};

const IVF_SIGNATURE: [u8; 4] = *b"DKIF";

const AV1_FOURCC: [u8; 4] = *b"AV01";

/// IVF time base, `numerator / denominator` seconds per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebase {
    /// Stored at byte offset 20 of the file header.
    pub numerator: u32,
    /// Stored at byte offset 16 of the file header.
    pub denominator: u32,
}

impl Default for Timebase {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

/// IVF file header.
///
/// ```text
/// Offset  Size  Field
/// 0       4     signature: "DKIF"
/// 4       2     version: 0
/// 6       2     header_size: 32
/// 8       4     codec_fourcc: "AV01"
/// 12      2     width
/// 14      2     height
/// 16      4     timebase_denominator
/// 20      4     timebase_numerator
/// 24      4     frame_count
/// 28      4     reserved
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvfHeader {
    /// Video width in pixels.
    pub width: u16,
    /// Video height in pixels.
    pub height: u16,
    /// Time base of the frame timestamps.
    pub timebase: Timebase,
    /// Total number of frames.
    pub frame_count: u32,
}

impl IvfHeader {
    /// Size of the IVF file header in bytes.
    pub const SIZE: usize = 32;

    /// Muxes this IVF file header to the given writer.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&IVF_SIGNATURE)?;
        writer.write_u16::<LittleEndian>(0)?; // version
        writer.write_u16::<LittleEndian>(Self::SIZE as u16)?;
        writer.write_all(&AV1_FOURCC)?;
        writer.write_u16::<LittleEndian>(self.width)?;
        writer.write_u16::<LittleEndian>(self.height)?;
        writer.write_u32::<LittleEndian>(self.timebase.denominator)?;
        writer.write_u32::<LittleEndian>(self.timebase.numerator)?;
        writer.write_u32::<LittleEndian>(self.frame_count)?;
        writer.write_u32::<LittleEndian>(0)?; // reserved
        Ok(())
    }
}

/// IVF frame header: payload size then a 64-bit timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct IvfFrameHeader {
    /// Size of the frame data in bytes.
    pub frame_size: u32,
    /// Presentation timestamp in timebase units.
    pub pts: u64,
}

impl IvfFrameHeader {
    /// Size of each IVF frame header in bytes.
    pub const SIZE: usize = 12;

    /// Muxes this IVF frame header to the given writer.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.frame_size)?;
        writer.write_u64::<LittleEndian>(self.pts)?;
        Ok(())
    }
}

fn checked_frame_size(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Av1Error::IvfFrameTooLarge(len))
}

/// Writes an IVF file header followed by frames.
pub struct IvfWriter<W: io::Write> {
    writer: W,
    frame_count: u32,
}

impl<W: io::Write> IvfWriter<W> {
    /// Creates a new IVF writer and writes the file header.
    pub fn new(mut writer: W, header: &IvfHeader) -> Result<Self> {
        header.mux(&mut writer)?;
        Ok(IvfWriter {
            writer,
            frame_count: 0,
        })
    }

    /// Writes a single frame with the given presentation timestamp and data.
    pub fn write_frame(&mut self, pts: u64, data: &[u8]) -> Result<()> {
        let frame_size = checked_frame_size(data.len())?;
        IvfFrameHeader { frame_size, pts }.mux(&mut self.writer)?;
        self.writer.write_all(data)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Returns the number of frames written so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Consumes the writer and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Wraps a whole OBU stream as the only frame of an IVF file, with pts 0.
///
/// Fails if a dimension does not fit the 16-bit IVF fields.
pub fn wrap_single_frame(payload: &[u8], width: u32, height: u32, timebase: Timebase) -> Result<Vec<u8>> {
    let (Ok(ivf_width), Ok(ivf_height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(Av1Error::InvalidDimensions { width, height });
    };

    let header = IvfHeader {
        width: ivf_width,
        height: ivf_height,
        timebase,
        frame_count: 1,
    };

    let buf = Vec::with_capacity(IvfHeader::SIZE + IvfFrameHeader::SIZE + payload.len());
    let mut writer = IvfWriter::new(buf, &header)?;
    writer.write_frame(0, payload)?;
    Ok(writer.into_inner())
}
