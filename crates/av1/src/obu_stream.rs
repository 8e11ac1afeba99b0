//! Low-overhead OBU bitstreams.
//!
//! Every OBU is written with `obu_has_size_field=1` and no extension
//! header, so a stream is a plain concatenation of
//! `header byte | leb128(size) | payload` records (AV1-Spec-2 - 5.2).

use std::io;

use bytes::Bytes;
use bytes_util::BytesCursorExt;

use crate::error::{Av1Error, Result};
use crate::obu::utils::leb128_size;
use crate::obu::{ObuHeader, ObuType};

/// One framed OBU from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obu {
    /// Header as parsed from the stream.
    pub header: ObuHeader,
    /// Bytes following the size field.
    pub data: Bytes,
}

/// Walks a stream OBU by OBU. Every OBU must carry a size field.
#[derive(Debug, Clone)]
pub struct ObuIterator {
    cursor: io::Cursor<Bytes>,
}

impl ObuIterator {
    /// Starts at the first byte of `stream`.
    pub fn new(stream: Bytes) -> Self {
        Self {
            cursor: io::Cursor::new(stream),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.cursor.position() as usize)
    }

    fn read_obu(&mut self) -> Result<Obu> {
        let header = ObuHeader::parse(&mut self.cursor)?;
        let Some(size) = header.size else {
            return Err(Av1Error::InvalidObu("OBU without obu_size in a sized stream".into()));
        };

        let size = size as usize;
        let available = self.remaining();
        let data = self
            .cursor
            .extract_bytes(size)
            .map_err(|_| Av1Error::UnexpectedEof {
                expected: size,
                actual: available,
            })?;

        Ok(Obu { header, data })
    }
}

impl Iterator for ObuIterator {
    type Item = Result<Obu>;

    fn next(&mut self) -> Option<Self::Item> {
        (self.remaining() > 0).then(|| self.read_obu())
    }
}

/// Splits a whole stream into its OBUs.
pub fn split_obus(stream: Bytes) -> Result<Vec<Obu>> {
    ObuIterator::new(stream).collect()
}

/// Writes `payload` as one OBU of `obu_type` and returns the number of
/// bytes written.
pub fn write_obu<W: io::Write>(writer: &mut W, obu_type: ObuType, payload: &[u8]) -> Result<usize> {
    let header = ObuHeader {
        obu_type,
        size: Some(payload.len() as u64),
    };

    let header_bytes = header.mux(writer)?;
    writer.write_all(payload)?;

    Ok(header_bytes + payload.len())
}

/// Encoded size of an OBU carrying `payload_len` bytes.
pub fn obu_encoded_size(payload_len: usize) -> usize {
    1 + leb128_size(payload_len as u64) + payload_len
}
