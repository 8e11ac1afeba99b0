//! Reduced still-picture sequence header.
//! AV1-Spec-2 - 5.5.1

use std::io;

use bytes_util::{BitReader, BitWriter};

use super::utils::bits_for_max_minus_1;
use crate::error::{Av1Error, Result};

/// `seq_profile` emitted by [`SequenceHeader::mux`]. Profile 0 fixes 4:2:0
/// subsampling, which decides the `color_config()` layout below.
const SEQ_PROFILE: u8 = 0;

/// `seq_level_idx[0]`
const SEQ_LEVEL_IDX_0: u8 = 0;

/// Widest `frame_{width,height}_bits_minus_1 + 1` this encoder emits.
const MAX_DIMENSION_BITS: u8 = 16;

const CP_BT_709: u64 = 1;
const TC_SRGB: u64 = 13;
const MC_IDENTITY: u64 = 0;

/// Sequence header OBU payload with `still_picture=1` and
/// `reduced_still_picture_header=1`.
///
/// Only the fields that vary between test streams are stored. Everything
/// else is written as a fixed value: profile 0, level 0, every coding tool
/// disabled, 8-bit 4:2:0 with no color description and no film grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    /// `max_frame_width_minus_1 + 1`, in `1..=65536`.
    pub max_frame_width: u32,
    /// `max_frame_height_minus_1 + 1`, in `1..=65536`.
    pub max_frame_height: u32,
    /// `use_128x128_superblock`
    pub use_128x128_superblock: bool,
}

impl SequenceHeader {
    /// Creates a reduced still-picture header for the given maximum frame size.
    pub fn reduced_still(max_frame_width: u32, max_frame_height: u32) -> Self {
        Self {
            max_frame_width,
            max_frame_height,
            use_128x128_superblock: false,
        }
    }

    /// Returns the bit widths of `max_frame_width_minus_1` and
    /// `max_frame_height_minus_1`.
    ///
    /// Fails if either dimension is zero or needs more than 16 bits.
    pub fn dimension_bits(&self) -> Result<(u8, u8)> {
        if self.max_frame_width == 0 || self.max_frame_height == 0 {
            return Err(Av1Error::InvalidDimensions {
                width: self.max_frame_width,
                height: self.max_frame_height,
            });
        }

        let check = |value: u32| {
            let bits = bits_for_max_minus_1(value - 1);
            if bits > MAX_DIMENSION_BITS {
                Err(Av1Error::DimensionTooLarge { value, bits })
            } else {
                Ok(bits)
            }
        };

        Ok((check(self.max_frame_width)?, check(self.max_frame_height)?))
    }

    /// Writes the sequence header payload (without OBU header), zero-padded
    /// to a byte boundary.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let (width_bits, height_bits) = self.dimension_bits()?;
        let mut bit_writer = BitWriter::new(writer);

        bit_writer.write_bits(SEQ_PROFILE as u64, 3)?;
        bit_writer.write_bit(true)?; // still_picture
        bit_writer.write_bit(true)?; // reduced_still_picture_header
        bit_writer.write_bits(SEQ_LEVEL_IDX_0 as u64, 5)?;

        bit_writer.write_bits((width_bits - 1) as u64, 4)?;
        bit_writer.write_bits((height_bits - 1) as u64, 4)?;
        bit_writer.write_bits((self.max_frame_width - 1) as u64, width_bits)?;
        bit_writer.write_bits((self.max_frame_height - 1) as u64, height_bits)?;

        // frame_id_numbers_present_flag is implied 0 for reduced headers.
        bit_writer.write_bit(self.use_128x128_superblock)?;
        bit_writer.write_bit(false)?; // enable_filter_intra
        bit_writer.write_bit(false)?; // enable_intra_edge_filter
        // Inter tools and order hints are implied off for reduced headers.
        bit_writer.write_bit(false)?; // enable_superres
        bit_writer.write_bit(false)?; // enable_cdef
        bit_writer.write_bit(false)?; // enable_restoration

        // color_config()
        bit_writer.write_bit(false)?; // high_bitdepth
        bit_writer.write_bit(false)?; // mono_chrome
        bit_writer.write_bit(false)?; // color_description_present_flag
        bit_writer.write_bit(false)?; // color_range
        bit_writer.write_bits(0, 2)?; // chroma_sample_position
        bit_writer.write_bit(false)?; // separate_uv_delta_q

        bit_writer.write_bit(false)?; // film_grain_params_present

        bit_writer.finish()?;
        Ok(())
    }

    /// Parses a reduced still-picture sequence header payload.
    ///
    /// Headers that are not reduced still pictures, or that use a profile
    /// other than 0, are rejected.
    pub fn demux<R: io::Read>(reader: &mut R) -> Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let seq_profile = bit_reader.read_bits(3)? as u8;
        if seq_profile != SEQ_PROFILE {
            return Err(Av1Error::UnsupportedSequenceHeader("seq_profile is not 0"));
        }
        let _still_picture = bit_reader.read_bit()?;
        if !bit_reader.read_bit()? {
            return Err(Av1Error::UnsupportedSequenceHeader(
                "reduced_still_picture_header is 0",
            ));
        }
        let _seq_level_idx_0 = bit_reader.read_bits(5)?;

        let width_bits = bit_reader.read_bits(4)? as u8 + 1;
        let height_bits = bit_reader.read_bits(4)? as u8 + 1;
        let max_frame_width = bit_reader.read_bits(width_bits)? as u32 + 1;
        let max_frame_height = bit_reader.read_bits(height_bits)? as u32 + 1;

        let use_128x128_superblock = bit_reader.read_bit()?;
        bit_reader.read_bits(2)?; // enable_filter_intra, enable_intra_edge_filter
        bit_reader.read_bits(3)?; // enable_superres, enable_cdef, enable_restoration

        // color_config() for profile 0
        let high_bitdepth = bit_reader.read_bit()?;
        if high_bitdepth {
            return Err(Av1Error::UnsupportedSequenceHeader("high_bitdepth is 1"));
        }
        let mono_chrome = bit_reader.read_bit()?;
        let (color_primaries, transfer_characteristics, matrix_coefficients) =
            if bit_reader.read_bit()? {
                (
                    bit_reader.read_bits(8)?,
                    bit_reader.read_bits(8)?,
                    bit_reader.read_bits(8)?,
                )
            } else {
                (2, 2, 2)
            };

        if mono_chrome {
            bit_reader.read_bit()?; // color_range
        } else if color_primaries == CP_BT_709
            && transfer_characteristics == TC_SRGB
            && matrix_coefficients == MC_IDENTITY
        {
            bit_reader.read_bit()?; // separate_uv_delta_q
        } else {
            bit_reader.read_bit()?; // color_range
            bit_reader.read_bits(2)?; // chroma_sample_position
            bit_reader.read_bit()?; // separate_uv_delta_q
        }

        bit_reader.read_bit()?; // film_grain_params_present

        Ok(Self {
            max_frame_width,
            max_frame_height,
            use_128x128_superblock,
        })
    }
}
