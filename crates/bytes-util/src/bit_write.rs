use std::io;

/// A writer that packs individual bits, most significant bit first.
///
/// Bits are accumulated into a single pending byte which is flushed to the
/// inner writer once eight bits have been written. [`BitWriter::finish`]
/// pads the pending byte with zero bits and returns the inner writer.
#[derive(Debug)]
#[must_use]
pub struct BitWriter<W> {
    bit_pos: u8,
    current_byte: u8,
    writer: W,
}

impl<W> BitWriter<W> {
    /// Creates a new bit writer wrapping `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            bit_pos: 0,
            current_byte: 0,
            writer,
        }
    }

    /// Number of bits buffered in the pending byte, always in `0..8`.
    pub const fn pending_bits(&self) -> u8 {
        self.bit_pos
    }

    /// Returns true when no partial byte is pending.
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Returns a reference to the inner writer.
    ///
    /// A pending partial byte is not visible through this reference.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: io::Write> BitWriter<W> {
    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.current_byte = (self.current_byte << 1) | u8::from(bit);
        self.bit_pos += 1;

        if self.bit_pos == 8 {
            self.writer.write_all(&[self.current_byte])?;
            self.current_byte = 0;
            self.bit_pos = 0;
        }

        Ok(())
    }

    /// Writes the `count` low-order bits of `bits`, most significant first.
    pub fn write_bits(&mut self, bits: u64, count: u8) -> io::Result<()> {
        if count > 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot write more than 64 bits at once",
            ));
        }

        for i in (0..count).rev() {
            self.write_bit((bits >> i) & 1 == 1)?;
        }

        Ok(())
    }

    /// Pads the pending byte with zero bits up to the next byte boundary.
    ///
    /// Does nothing when the writer is already aligned.
    pub fn align(&mut self) -> io::Result<()> {
        while !self.is_aligned() {
            self.write_bit(false)?;
        }
        Ok(())
    }

    /// Zero-pads the final partial byte and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.align()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_msb_first() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        writer.write_bits(0b0101, 4).unwrap();
        writer.write_bits(0b111, 3).unwrap();
        assert!(writer.is_aligned());
        assert_eq!(writer.finish().unwrap(), [0b1010_1111]);
    }

    #[test]
    fn test_finish_pads_with_zero() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b101, 3).unwrap();
        assert_eq!(writer.pending_bits(), 3);
        assert_eq!(writer.finish().unwrap(), [0b1010_0000]);
    }

    #[test]
    fn test_write_bits_uses_low_order_bits() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0xFF_F0, 8).unwrap();
        writer.write_bits(0x1_0001, 16).unwrap();
        assert_eq!(writer.finish().unwrap(), [0xF0, 0x00, 0x01]);
    }

    #[test]
    fn test_zero_count_writes_nothing() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(u64::MAX, 0).unwrap();
        assert!(writer.is_aligned());
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_write_bits_rejects_oversized_count() {
        let mut writer = BitWriter::new(Vec::new());
        let err = writer.write_bits(0, 65).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_write_full_u64() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0x0102_0304_0506_0708, 64).unwrap();
        assert_eq!(
            writer.finish().unwrap(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }
}
