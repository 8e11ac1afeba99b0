//! Boolean model of the AV1 symbol decoder.
//! AV1-Spec-2 - 8.2
//!
//! Only the two-symbol case used by `read_bool()` is modelled. That is
//! enough to tell whether a tile payload is consumed cleanly by a given
//! number of boolean reads.

const PROB_TOP: u32 = 1 << 15;
const EC_PROB_SHIFT: u32 = 6;
const EC_MIN_PROB: u32 = 4;
/// `cdf[0]` of the flat boolean CDF `{1 << 14, 1 << 15, 0}`.
const BOOL_CDF0: u32 = 1 << 14;
/// Bits the decoder window holds.
const WINDOW_BITS: u32 = 15;

/// Symbol decoder state over a borrowed tile payload.
#[derive(Debug, Clone)]
pub struct SymbolDecoder<'a> {
    data: &'a [u8],
    bit_pos: usize,
    value: u32,
    range: u32,
    max_bits: i64,
}

impl<'a> SymbolDecoder<'a> {
    /// `init_symbol(sz)` over the whole of `data`.
    ///
    /// Short or empty buffers are accepted; the missing window bits are
    /// treated as zeros and [`exit_ok`](Self::exit_ok) reports the result.
    pub fn new(data: &'a [u8]) -> Self {
        let total_bits = data.len() as i64 * 8;
        let num_bits = total_bits.min(WINDOW_BITS as i64) as u32;

        let mut decoder = Self {
            data,
            bit_pos: 0,
            value: 0,
            range: PROB_TOP,
            max_bits: total_bits - WINDOW_BITS as i64,
        };

        let padded = decoder.take_bits(num_bits) << (WINDOW_BITS - num_bits);
        decoder.value = (PROB_TOP - 1) ^ padded;
        decoder
    }

    fn bit_at(&self, pos: usize) -> u8 {
        bit_at(self.data, pos)
    }

    fn take_bits(&mut self, count: u32) -> u32 {
        let mut bits = 0;
        for _ in 0..count {
            bits = (bits << 1) | self.bit_at(self.bit_pos) as u32;
            self.bit_pos += 1;
        }
        bits
    }

    /// `read_bool()`: decodes one symbol with the flat boolean CDF.
    ///
    /// Returns `None` if the decoder state collapses to an empty range.
    pub fn read_bool(&mut self) -> Option<bool> {
        let split = (((self.range >> 8) * ((PROB_TOP - BOOL_CDF0) >> EC_PROB_SHIFT))
            >> (7 - EC_PROB_SHIFT))
            + EC_MIN_PROB;

        let bit = self.value < split;
        if bit {
            self.range = split;
        } else {
            self.range -= split;
            self.value -= split;
        }

        if self.range == 0 {
            return None;
        }
        self.renormalize();
        Some(bit)
    }

    fn renormalize(&mut self) {
        let bits = WINDOW_BITS - self.range.ilog2();
        self.range <<= bits;

        let num_bits = (bits as i64).min(self.max_bits.max(0)) as u32;
        let padded = self.take_bits(num_bits) << (bits - num_bits);
        self.value = padded ^ (((self.value + 1) << bits) - 1);
        self.max_bits -= bits as i64;
    }

    /// `L(n)` coded with booleans: `n` successive bools, most significant
    /// first. `n` is at most 32.
    pub fn read_literal(&mut self, n: u8) -> Option<u32> {
        if n > 32 {
            return None;
        }

        let mut literal = 0u32;
        for _ in 0..n {
            literal = (literal << 1) | self.read_bool()? as u32;
        }
        Some(literal)
    }

    /// `exit_symbol()`: whether the bits after the last decoded symbol are
    /// valid trailing bits that end on a byte boundary inside the buffer.
    pub fn exit_ok(self) -> bool {
        if self.max_bits < -14 {
            return false;
        }

        let lookback = (self.max_bits + WINDOW_BITS as i64).clamp(0, WINDOW_BITS as i64) as usize;
        let Some(trailing_pos) = self.bit_pos.checked_sub(lookback) else {
            return false;
        };

        let padding_end = self.bit_pos + self.max_bits.max(0) as usize;
        if padding_end % 8 != 0 || padding_end > self.data.len() * 8 {
            return false;
        }

        self.bit_at(trailing_pos) == 1 && (trailing_pos + 1..padding_end).all(|pos| self.bit_at(pos) == 0)
    }

    /// `SymbolValue`
    pub fn value(&self) -> u32 {
        self.value
    }

    /// `SymbolRange`
    pub fn range(&self) -> u32 {
        self.range
    }

    /// `SymbolMaxBits`; negative once the decoder runs past the data.
    pub fn max_bits(&self) -> i64 {
        self.max_bits
    }

    /// Bits consumed from the buffer so far.
    pub fn bit_pos(&self) -> usize {
        self.bit_pos
    }
}

/// MSB-first bit `pos` of `data`; zero past the end.
fn bit_at(data: &[u8], pos: usize) -> u8 {
    data.get(pos >> 3).map_or(0, |byte| (byte >> (7 - (pos & 7))) & 1)
}

/// Whether the last 15 bits of `data` hold a trailing `1` bit.
///
/// The last set bit in that window is the trailing bit and everything after
/// it is zero padding. An empty buffer, or one whose last 15 bits are all
/// zero, has no trailing bit. This looks only at the tail of the buffer; use
/// [`search::exits_after`](crate::search::exits_after) with zero booleans to
/// ask whether a fresh decoder exits cleanly.
pub fn check_trailing_bits(data: &[u8]) -> bool {
    let total_bits = data.len() * 8;
    let window = total_bits.saturating_sub(WINDOW_BITS as usize)..total_bits;
    window.rev().any(|pos| bit_at(data, pos) == 1)
}
