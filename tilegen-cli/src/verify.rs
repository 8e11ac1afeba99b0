//! Parses generated streams back and checks them against their summaries.

use std::io;

use av1::obu_stream::split_obus;
use av1::{FrameHeader, ObuType, SequenceHeader, TileGroup};
use bytes::Bytes;

use crate::assemble::VectorSummary;
use crate::error::{AppError, Result};

const EXPECTED_LAYOUT: [ObuType; 3] = [ObuType::SequenceHeader, ObuType::FrameHeader, ObuType::TileGroup];

/// Recovers the tile layout of a sequence header, frame header, tile group
/// stream.
pub fn parse_stream(name: &str, stream: Bytes) -> Result<VectorSummary> {
    let obus = split_obus(stream)?;
    let layout: Vec<ObuType> = obus.iter().map(|obu| obu.header.obu_type).collect();
    if layout != EXPECTED_LAYOUT {
        return Err(AppError::VerificationFailed {
            name: name.to_string(),
            detail: format!("unexpected OBU layout {layout:?}"),
        });
    }

    let seq = SequenceHeader::demux(&mut io::Cursor::new(&obus[0].data))?;
    let tile_info = FrameHeader::demux(&mut io::Cursor::new(&obus[1].data), &seq)?;
    let group = TileGroup::demux(&obus[2].data, &tile_info)?;

    Ok(VectorSummary::new(&tile_info, &group))
}

/// Fails if `stream` does not decode to `expected`.
pub fn verify_stream(name: &str, stream: Bytes, expected: &VectorSummary) -> Result<()> {
    let actual = parse_stream(name, stream)?;
    if &actual != expected {
        return Err(AppError::VerificationFailed {
            name: name.to_string(),
            detail: format!("expected {expected:?}, parsed {actual:?}"),
        });
    }
    Ok(())
}
