//! `OBU_TILE_GROUP` payloads.
//! AV1-Spec-2 - 5.11.1

use std::io::{self, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use bytes_util::{BitReader, BitWriter};

use super::frame::TileInfo;
use crate::error::{Av1Error, Result};

/// Description of one tile group to synthesize.
///
/// `payload` holds the bytes of every tile in the group back to back. Every
/// tile but the last is sized explicitly by `non_last_sizes`; the last tile
/// takes whatever remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGroupSpec {
    /// `tile_start_and_end_present_flag`. Ignored for single-tile frames.
    pub present_flag: bool,
    /// `tg_start`, only used when `present_flag` is set.
    pub tg_start: u32,
    /// `tg_end`, only used when `present_flag` is set.
    pub tg_end: u32,
    /// Width of each `tile_size_minus_1` field, in `1..=4`. Ignored when the
    /// group holds a single tile.
    pub tile_size_bytes: u8,
    /// Byte length of each tile except the last one in the group.
    pub non_last_sizes: Vec<usize>,
    /// Concatenated tile data.
    pub payload: Bytes,
}

/// Position of one tile's data inside a tile group OBU payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    /// Tile number within the frame.
    pub index: u32,
    /// Offset of the tile data from the start of the OBU payload.
    pub offset: usize,
    /// Tile data length in bytes.
    pub size: usize,
}

/// The tile boundaries of a tile group OBU payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGroup {
    /// `tg_start`
    pub tg_start: u32,
    /// `tg_end`
    pub tg_end: u32,
    /// Bytes taken by the range header, including `byte_alignment()`.
    pub header_len: usize,
    /// One entry per tile from `tg_start` to `tg_end`.
    pub tiles: Vec<TileSpan>,
}

impl TileGroupSpec {
    /// The tile range this spec selects in a frame of `num_tiles` tiles.
    ///
    /// The range is not checked against `num_tiles`; a frame without tiles
    /// is an error.
    pub fn range(&self, num_tiles: u32) -> Result<(u32, u32)> {
        match num_tiles {
            0 => Err(Av1Error::InvalidTileCount(num_tiles)),
            1 => Ok((0, 0)),
            _ if !self.present_flag => Ok((0, num_tiles - 1)),
            _ => Ok((self.tg_start, self.tg_end)),
        }
    }

    fn validate(&self, tile_info: &TileInfo) -> Result<(u32, u32)> {
        let num_tiles = tile_info.num_tiles();
        let (start, end) = self.range(num_tiles)?;
        if start > end {
            return Err(Av1Error::InvalidTileGroupRange { start, end });
        }
        if end >= num_tiles {
            return Err(Av1Error::TileIndexOutOfRange {
                index: end,
                num_tiles,
            });
        }

        let tiles_in_group = (end - start + 1) as usize;
        if tiles_in_group == 1 {
            return Ok((start, end));
        }

        if !(1..=4).contains(&self.tile_size_bytes) {
            return Err(Av1Error::InvalidTileSizeBytes(self.tile_size_bytes));
        }
        if self.non_last_sizes.len() != tiles_in_group - 1 {
            return Err(Av1Error::TileSizeCountMismatch {
                expected: tiles_in_group - 1,
                actual: self.non_last_sizes.len(),
            });
        }

        let max_size = 1u64 << (8 * self.tile_size_bytes as u32);
        for (index, &size) in self.non_last_sizes.iter().enumerate() {
            if size == 0 || size as u64 > max_size {
                return Err(Av1Error::InvalidTileSize {
                    index,
                    size,
                    tile_size_bytes: self.tile_size_bytes,
                });
            }
        }

        let total: usize = self.non_last_sizes.iter().sum();
        if total > self.payload.len() {
            return Err(Av1Error::TileSizesExceedPayload {
                total,
                payload: self.payload.len(),
            });
        }

        Ok((start, end))
    }

    /// Writes the tile group OBU payload for a frame with `tile_info`'s grid
    /// and returns where each tile landed.
    ///
    /// All checks run before the first byte is written.
    pub fn mux<W: io::Write>(&self, tile_info: &TileInfo, writer: &mut W) -> Result<TileGroup> {
        let (tg_start, tg_end) = self.validate(tile_info)?;
        let num_tiles = tile_info.num_tiles();

        let mut bit_writer = BitWriter::new(Vec::new());
        if num_tiles > 1 {
            bit_writer.write_bit(self.present_flag)?; // tile_start_and_end_present_flag
            if self.present_flag {
                bit_writer.write_bits(tg_start as u64, tile_info.tile_bits())?;
                bit_writer.write_bits(tg_end as u64, tile_info.tile_bits())?;
            }
        }
        let header = bit_writer.finish()?; // byte_alignment()
        writer.write_all(&header)?;

        let mut tiles = Vec::with_capacity((tg_end - tg_start + 1) as usize);
        let mut position = header.len();
        let mut consumed = 0;

        for (index, &size) in self.non_last_sizes.iter().enumerate().take_while(|_| tg_start != tg_end) {
            writer.write_uint::<LittleEndian>((size - 1) as u64, self.tile_size_bytes as usize)?;
            position += self.tile_size_bytes as usize;

            writer.write_all(&self.payload[consumed..consumed + size])?;
            tiles.push(TileSpan {
                index: tg_start + index as u32,
                offset: position,
                size,
            });
            position += size;
            consumed += size;
        }

        let last = &self.payload[consumed..];
        writer.write_all(last)?;
        tiles.push(TileSpan {
            index: tg_end,
            offset: position,
            size: last.len(),
        });

        Ok(TileGroup {
            tg_start,
            tg_end,
            header_len: header.len(),
            tiles,
        })
    }

    /// Builds the tile group OBU payload in memory.
    pub fn to_bytes(&self, tile_info: &TileInfo) -> Result<(Bytes, TileGroup)> {
        let mut buf = Vec::new();
        let group = self.mux(tile_info, &mut buf)?;
        Ok((Bytes::from(buf), group))
    }
}

impl TileGroup {
    /// Parses the tile boundaries of a tile group OBU payload.
    pub fn demux(payload: &[u8], tile_info: &TileInfo) -> Result<Self> {
        let num_tiles = tile_info.num_tiles();
        if num_tiles == 0 {
            return Err(Av1Error::InvalidTileCount(num_tiles));
        }

        let mut cursor = io::Cursor::new(payload);
        let mut bit_reader = BitReader::new(&mut cursor);

        let present_flag = num_tiles > 1 && bit_reader.read_bit()?;
        let (tg_start, tg_end) = if present_flag {
            let tile_bits = tile_info.tile_bits();
            (
                bit_reader.read_bits(tile_bits)? as u32,
                bit_reader.read_bits(tile_bits)? as u32,
            )
        } else {
            (0, num_tiles - 1)
        };
        bit_reader.align()?; // byte_alignment()

        if tg_start > tg_end {
            return Err(Av1Error::InvalidTileGroupRange {
                start: tg_start,
                end: tg_end,
            });
        }
        if tg_end >= num_tiles {
            return Err(Av1Error::TileIndexOutOfRange {
                index: tg_end,
                num_tiles,
            });
        }

        let header_len = cursor.position() as usize;
        let mut tiles = Vec::with_capacity((tg_end - tg_start + 1) as usize);

        for index in tg_start..=tg_end {
            let size = if index == tg_end {
                payload.len() - cursor.position() as usize
            } else {
                if !(1..=4).contains(&tile_info.tile_size_bytes) {
                    return Err(Av1Error::InvalidTileSizeBytes(tile_info.tile_size_bytes));
                }
                let tile_size_bytes = tile_info.tile_size_bytes as usize;
                let remaining = payload.len() - cursor.position() as usize;
                let tile_size_minus_1 = cursor
                    .read_uint::<LittleEndian>(tile_size_bytes)
                    .map_err(|_| Av1Error::UnexpectedEof {
                        expected: tile_size_bytes,
                        actual: remaining,
                    })?;
                tile_size_minus_1 as usize + 1
            };

            let offset = cursor.position() as usize;
            let remaining = payload.len() - offset;
            if size > remaining {
                return Err(Av1Error::UnexpectedEof {
                    expected: size,
                    actual: remaining,
                });
            }

            tiles.push(TileSpan { index, offset, size });
            cursor.set_position((offset + size) as u64);
        }

        Ok(Self {
            tg_start,
            tg_end,
            header_len,
            tiles,
        })
    }

    /// Returns `(tile_index, size)` for every tile in the group.
    pub fn tile_sizes(&self) -> Vec<(u32, usize)> {
        self.tiles.iter().map(|tile| (tile.index, tile.size)).collect()
    }
}
