use std::io;

/// A reader that yields individual bits, most significant bit first.
#[derive(Debug)]
#[must_use]
pub struct BitReader<R> {
    data: R,
    bit_pos: u8,
    current_byte: u8,
}

impl<R> BitReader<R> {
    /// Creates a new bit reader wrapping `data`.
    pub const fn new(data: R) -> Self {
        Self {
            data,
            bit_pos: 0,
            current_byte: 0,
        }
    }

    /// Bit offset inside the current byte, in `0..8`.
    pub const fn bit_pos(&self) -> u8 {
        self.bit_pos
    }

    /// Returns true when the reader sits on a byte boundary.
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Returns a reference to the inner reader.
    pub const fn get_ref(&self) -> &R {
        &self.data
    }

    /// Consumes the bit reader and returns the inner reader.
    ///
    /// Unread bits of a partially consumed byte are dropped.
    pub fn into_inner(self) -> R {
        self.data
    }
}

impl<R: io::Read> BitReader<R> {
    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.is_aligned() {
            let mut byte = [0u8; 1];
            self.data.read_exact(&mut byte)?;
            self.current_byte = byte[0];
        }

        let bit = (self.current_byte >> (7 - self.bit_pos)) & 1;
        self.bit_pos = (self.bit_pos + 1) % 8;

        Ok(bit == 1)
    }

    /// Reads `count` bits into the low-order bits of the result.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u64> {
        if count > 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot read more than 64 bits at once",
            ));
        }

        let mut bits = 0u64;
        for _ in 0..count {
            bits = (bits << 1) | u64::from(self.read_bit()?);
        }

        Ok(bits)
    }

    /// Skips the remaining bits of the current byte.
    pub fn align(&mut self) -> io::Result<()> {
        while !self.is_aligned() {
            self.read_bit()?;
        }
        Ok(())
    }
}
