//! Minimal key-frame header with `tile_info()`.
//! AV1-Spec-2 - 5.9.2, 5.9.15

use std::io;

use bytes_util::{BitReader, BitWriter};

use super::seq::SequenceHeader;
use super::utils::tile_log2;
use crate::error::{Av1Error, Result};

const MAX_TILE_WIDTH: u32 = 4096;
const MAX_TILE_AREA: u32 = 4096 * 2304;
const MAX_TILE_COLS: u32 = 64;
const MAX_TILE_ROWS: u32 = 64;

/// Superblock grid and tile log2 bounds implied by a sequence header's
/// maximum frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLimits {
    /// `sbCols`
    pub sb_cols: u32,
    /// `sbRows`
    pub sb_rows: u32,
    /// `maxTileWidthSb`
    pub max_tile_width_sb: u32,
    /// `minLog2TileCols`
    pub min_log2_tile_cols: u8,
    /// `maxLog2TileCols`
    pub max_log2_tile_cols: u8,
    /// `maxLog2TileRows`
    pub max_log2_tile_rows: u8,
    /// `minLog2Tiles`
    pub min_log2_tiles: u8,
}

impl TileLimits {
    /// Computes the limits for a frame coded at the sequence's maximum size.
    pub fn new(seq: &SequenceHeader) -> Self {
        let mi_cols = 2 * ((seq.max_frame_width + 7) >> 3);
        let mi_rows = 2 * ((seq.max_frame_height + 7) >> 3);

        let (sb_cols, sb_rows, sb_shift) = if seq.use_128x128_superblock {
            ((mi_cols + 31) >> 5, (mi_rows + 31) >> 5, 5)
        } else {
            ((mi_cols + 15) >> 4, (mi_rows + 15) >> 4, 4)
        };
        let sb_size = sb_shift + 2;
        let max_tile_width_sb = MAX_TILE_WIDTH >> sb_size;
        let max_tile_area_sb = MAX_TILE_AREA >> (2 * sb_size);

        let min_log2_tile_cols = tile_log2(max_tile_width_sb, sb_cols);

        Self {
            sb_cols,
            sb_rows,
            max_tile_width_sb,
            min_log2_tile_cols,
            max_log2_tile_cols: tile_log2(1, sb_cols.min(MAX_TILE_COLS)),
            max_log2_tile_rows: tile_log2(1, sb_rows.min(MAX_TILE_ROWS)),
            min_log2_tiles: min_log2_tile_cols.max(tile_log2(max_tile_area_sb, sb_rows * sb_cols)),
        }
    }

    /// `minLog2TileRows` once `TileColsLog2` is known.
    pub fn min_log2_tile_rows(&self, tile_cols_log2: u8) -> u8 {
        self.min_log2_tiles.saturating_sub(tile_cols_log2)
    }
}

/// Number of uniformly spaced tiles covering `sb_count` superblocks.
fn uniform_tile_count(sb_count: u32, log2: u8) -> u32 {
    let tile_size_sb = (sb_count + (1 << log2) - 1) >> log2;
    sb_count.div_ceil(tile_size_sb.max(1))
}

/// The tile grid of a frame, as coded by `tile_info()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    /// `TileColsLog2`
    pub tile_cols_log2: u8,
    /// `TileRowsLog2`
    pub tile_rows_log2: u8,
    /// `TileCols`
    pub tile_cols: u32,
    /// `TileRows`
    pub tile_rows: u32,
    /// `context_update_tile_id`
    pub context_update_tile_id: u32,
    /// `TileSizeBytes`, or 0 when the frame has a single tile and the field
    /// is not coded.
    pub tile_size_bytes: u8,
}

impl TileInfo {
    /// Builds the uniform tile grid that `FrameHeader` codes for `seq`.
    pub fn uniform(seq: &SequenceHeader, tile_cols_log2: u8, tile_rows_log2: u8) -> Self {
        let limits = TileLimits::new(seq);
        let multi = tile_cols_log2 > 0 || tile_rows_log2 > 0;
        Self {
            tile_cols_log2,
            tile_rows_log2,
            tile_cols: uniform_tile_count(limits.sb_cols, tile_cols_log2),
            tile_rows: uniform_tile_count(limits.sb_rows, tile_rows_log2),
            context_update_tile_id: 0,
            tile_size_bytes: if multi { 1 } else { 0 },
        }
    }

    /// `NumTiles`
    pub fn num_tiles(&self) -> u32 {
        self.tile_cols * self.tile_rows
    }

    /// Width of `tg_start`, `tg_end` and `context_update_tile_id`.
    pub fn tile_bits(&self) -> u8 {
        self.tile_cols_log2 + self.tile_rows_log2
    }
}

/// Uncompressed header of a reduced still-picture key frame, written up to
/// and including `tile_info()`.
///
/// CDF updates are disabled, screen content tools are off, the render size
/// equals the frame size, and tiles are uniformly spaced.
///
/// The `increment_tile_{cols,rows}_log2` loops are written as bare runs of
/// one bits. A decoder only stops reading them without a terminating zero
/// when the maximum log2 for the frame size is reached, so the requested
/// values must be those maxima. [`FrameHeader::mux_for`] enforces this;
/// [`FrameHeader::mux`] writes exactly what it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// `TileColsLog2`
    pub tile_cols_log2: u8,
    /// `TileRowsLog2`
    pub tile_rows_log2: u8,
}

impl FrameHeader {
    /// The header with the largest uniform tile grid allowed for `seq`.
    pub fn maximal(seq: &SequenceHeader) -> Self {
        let limits = TileLimits::new(seq);
        Self {
            tile_cols_log2: limits.max_log2_tile_cols,
            tile_rows_log2: limits.max_log2_tile_rows,
        }
    }

    /// Writes the frame header payload (without OBU header), zero-padded to a
    /// byte boundary.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let mut bit_writer = BitWriter::new(writer);

        bit_writer.write_bit(true)?; // disable_cdf_update
        bit_writer.write_bit(false)?; // allow_screen_content_tools
        bit_writer.write_bit(false)?; // render_and_frame_size_different

        // tile_info()
        bit_writer.write_bit(true)?; // uniform_tile_spacing_flag
        for _ in 0..self.tile_cols_log2 {
            bit_writer.write_bit(true)?; // increment_tile_cols_log2
        }
        for _ in 0..self.tile_rows_log2 {
            bit_writer.write_bit(true)?; // increment_tile_rows_log2
        }

        let tile_bits = self.tile_cols_log2 + self.tile_rows_log2;
        if tile_bits > 0 {
            bit_writer.write_bits(0, tile_bits)?; // context_update_tile_id
            bit_writer.write_bits(0, 2)?; // tile_size_bytes_minus_1
        }

        bit_writer.finish()?;
        Ok(())
    }

    /// Writes the frame header after checking that a decoder reading it
    /// against `seq` recovers the requested tile grid.
    pub fn mux_for<W: io::Write>(&self, seq: &SequenceHeader, writer: &mut W) -> Result<()> {
        let limits = TileLimits::new(seq);
        if limits.min_log2_tile_cols != 0 || limits.min_log2_tile_rows(self.tile_cols_log2) != 0 {
            return Err(Av1Error::UnsupportedTileLayout(
                "frame size requires a non-zero minimum tile log2",
            ));
        }
        if self.tile_cols_log2 != limits.max_log2_tile_cols {
            return Err(Av1Error::NonMaximalTileLog2 {
                axis: "cols",
                requested: self.tile_cols_log2,
                max: limits.max_log2_tile_cols,
            });
        }
        if self.tile_rows_log2 != limits.max_log2_tile_rows {
            return Err(Av1Error::NonMaximalTileLog2 {
                axis: "rows",
                requested: self.tile_rows_log2,
                max: limits.max_log2_tile_rows,
            });
        }

        self.mux(writer)
    }

    /// Parses a reduced still-picture frame header up to the end of
    /// `tile_info()` and returns the tile grid.
    pub fn demux<R: io::Read>(reader: &mut R, seq: &SequenceHeader) -> Result<TileInfo> {
        let mut bit_reader = BitReader::new(reader);

        let _disable_cdf_update = bit_reader.read_bit()?;
        // seq_force_screen_content_tools is SELECT_SCREEN_CONTENT_TOOLS
        let allow_screen_content_tools = bit_reader.read_bit()?;
        if allow_screen_content_tools {
            bit_reader.read_bit()?; // force_integer_mv
        }
        if bit_reader.read_bit()? {
            // render_width_minus_1, render_height_minus_1
            bit_reader.read_bits(32)?;
        }
        // UpscaledWidth == FrameWidth since superres is disabled.
        if allow_screen_content_tools {
            bit_reader.read_bit()?; // allow_intrabc
        }

        read_tile_info(&mut bit_reader, &TileLimits::new(seq))
    }
}

/// `tile_info()`
/// AV1-Spec-2 - 5.9.15
fn read_tile_info<R: io::Read>(bit_reader: &mut BitReader<R>, limits: &TileLimits) -> Result<TileInfo> {
    let (tile_cols_log2, tile_cols, tile_rows_log2, tile_rows) = if bit_reader.read_bit()? {
        let mut tile_cols_log2 = limits.min_log2_tile_cols;
        while tile_cols_log2 < limits.max_log2_tile_cols && bit_reader.read_bit()? {
            tile_cols_log2 += 1;
        }

        let mut tile_rows_log2 = limits.min_log2_tile_rows(tile_cols_log2);
        while tile_rows_log2 < limits.max_log2_tile_rows && bit_reader.read_bit()? {
            tile_rows_log2 += 1;
        }

        (
            tile_cols_log2,
            uniform_tile_count(limits.sb_cols, tile_cols_log2),
            tile_rows_log2,
            uniform_tile_count(limits.sb_rows, tile_rows_log2),
        )
    } else {
        let mut widest_tile_sb = 0;
        let mut tile_cols = 0;
        let mut start_sb = 0;
        while start_sb < limits.sb_cols {
            let max_width = (limits.sb_cols - start_sb).min(limits.max_tile_width_sb);
            let size_sb = read_ns(bit_reader, max_width)? + 1;
            widest_tile_sb = widest_tile_sb.max(size_sb);
            start_sb += size_sb;
            tile_cols += 1;
        }

        let sb_area = limits.sb_rows * limits.sb_cols;
        let max_tile_area_sb = if limits.min_log2_tiles > 0 {
            sb_area >> (limits.min_log2_tiles + 1)
        } else {
            sb_area
        };
        let max_tile_height_sb = (max_tile_area_sb / widest_tile_sb).max(1);

        let mut tile_rows = 0;
        let mut start_sb = 0;
        while start_sb < limits.sb_rows {
            let max_height = (limits.sb_rows - start_sb).min(max_tile_height_sb);
            start_sb += read_ns(bit_reader, max_height)? + 1;
            tile_rows += 1;
        }

        (tile_log2(1, tile_cols), tile_cols, tile_log2(1, tile_rows), tile_rows)
    };

    if tile_cols > MAX_TILE_COLS || tile_rows > MAX_TILE_ROWS {
        return Err(Av1Error::UnsupportedTileLayout("tile grid exceeds 64x64"));
    }

    let tile_bits = tile_cols_log2 + tile_rows_log2;
    let (context_update_tile_id, tile_size_bytes) = if tile_bits > 0 {
        let context_update_tile_id = bit_reader.read_bits(tile_bits)? as u32;
        let tile_size_bytes = bit_reader.read_bits(2)? as u8 + 1;
        (context_update_tile_id, tile_size_bytes)
    } else {
        (0, 0)
    };

    Ok(TileInfo {
        tile_cols_log2,
        tile_rows_log2,
        tile_cols,
        tile_rows,
        context_update_tile_id,
        tile_size_bytes,
    })
}

/// `ns(n)`: a non-symmetric unsigned value in `0..n`.
/// AV1-Spec-2 - 4.10.7
fn read_ns<R: io::Read>(bit_reader: &mut BitReader<R>, n: u32) -> io::Result<u32> {
    let w = (u32::BITS - n.leading_zeros()) as u8;
    let m = (1u32 << w) - n;
    let v = bit_reader.read_bits(w - 1)? as u32;
    if v < m {
        return Ok(v);
    }
    let extra_bit = bit_reader.read_bit()? as u32;
    Ok((v << 1) - m + extra_bit)
}
