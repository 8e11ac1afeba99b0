//! Searches for tile payloads the symbol decoder consumes exactly.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::{Av1Error, Result};
use crate::symbol::SymbolDecoder;

/// Whether `data` decodes `bools` booleans and then exits cleanly.
pub fn exits_after(data: &[u8], bools: u32) -> bool {
    let mut decoder = SymbolDecoder::new(data);
    for _ in 0..bools {
        if decoder.read_bool().is_none() {
            return false;
        }
    }
    decoder.exit_ok()
}

/// Finds the smallest 2-byte payload, read as a big-endian integer, that
/// decodes exactly `bools` booleans and then passes the exit check.
///
/// Fails for `bools == 0` and once the 16-bit space holds no match, which
/// is the case for 16 or more booleans.
pub fn find_payload_exiting_after(bools: u32) -> Result<[u8; 2]> {
    if bools == 0 {
        return Err(Av1Error::InvalidSearchTarget("bool count must be at least 1"));
    }

    for candidate in 0..=u16::MAX {
        let data = candidate.to_be_bytes();
        if exits_after(&data, bools) {
            debug!(bools, payload = %hex::encode(data), "found exit payload");
            return Ok(data);
        }
    }

    debug!(bools, "no 2-byte exit payload");
    Err(Av1Error::SearchExhausted { bools })
}

/// A tile payload made only of trailing bits: `0x80` followed by
/// `size - 1` zero bytes.
pub fn trailing_only_payload(size: usize) -> Result<Bytes> {
    if size == 0 {
        return Err(Av1Error::InvalidSearchTarget("trailing-only payload needs at least 1 byte"));
    }

    let mut buf = BytesMut::with_capacity(size);
    buf.put_u8(0x80);
    buf.put_bytes(0, size - 1);
    Ok(buf.freeze())
}

/// Memoizes [`find_payload_exiting_after`] for repeated requests.
#[derive(Debug, Default)]
pub struct PayloadSearch {
    found: BTreeMap<u32, [u8; 2]>,
}

impl PayloadSearch {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload for `bools`, running the search on first use.
    pub fn exit_after(&mut self, bools: u32) -> Result<[u8; 2]> {
        if let Some(payload) = self.found.get(&bools) {
            trace!(bools, "exit payload cache hit");
            return Ok(*payload);
        }

        let payload = find_payload_exiting_after(bools)?;
        self.found.insert(bools, payload);
        Ok(payload)
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.found.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}
