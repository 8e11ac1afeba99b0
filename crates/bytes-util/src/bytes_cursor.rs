use std::io;

use bytes::Bytes;

/// Zero-copy extraction helpers for `io::Cursor<Bytes>`.
pub trait BytesCursorExt {
    /// Returns the next `size` bytes, advancing the cursor past them.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if fewer than `size`
    /// bytes remain; the cursor is left untouched in that case.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;
}

impl BytesCursorExt for io::Cursor<Bytes> {
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        let len = self.get_ref().len();
        let position = (self.position() as usize).min(len);
        if len - position < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "not enough bytes remaining in cursor",
            ));
        }

        self.set_position((position + size) as u64);
        Ok(self.get_ref().slice(position..position + size))
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bytes() {
        let mut cursor = io::Cursor::new(Bytes::from_static(b"\x01\x02\x03\x04"));
        assert_eq!(cursor.extract_bytes(3).unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(cursor.position(), 3);

        let err = cursor.extract_bytes(2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(cursor.position(), 3);

        assert_eq!(cursor.extract_bytes(1).unwrap().as_ref(), &[4]);
        assert!(cursor.extract_bytes(0).unwrap().is_empty());
    }
}
