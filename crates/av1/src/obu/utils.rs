use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};

/// `leb128()`
/// AV1-Spec-2 - 4.10.5
///
/// Reads at most 8 bytes and rejects values above `u32::MAX`, which no
/// conforming stream carries.
pub fn read_leb128<R: io::Read>(reader: &mut R) -> io::Result<u64> {
    let mut value = 0u64;
    for i in 0..8 {
        let byte = reader.read_u8()?;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            break;
        }
    }

    u32::try_from(value)
        .map(u64::from)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "leb128 value exceeds u32::MAX"))
}

/// Writes `value` as `leb128()` and returns the number of bytes written.
pub fn write_leb128<W: io::Write>(writer: &mut W, value: u64) -> io::Result<usize> {
    let size = leb128_size(value);
    for i in 0..size {
        let group = ((value >> (7 * i)) & 0x7f) as u8;
        let more = if i + 1 < size { 0x80 } else { 0 };
        writer.write_u8(group | more)?;
    }
    Ok(size)
}

/// Returns the number of bytes needed to encode `value` as LEB128.
pub fn leb128_size(mut value: u64) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

/// Number of bits needed to code a `*_minus_1` field holding `max_minus_1`.
///
/// This is the smallest `n` with `max_minus_1 < 2^n`, but never less than one:
/// a zero value still occupies a single bit.
pub fn bits_for_max_minus_1(max_minus_1: u32) -> u8 {
    (u32::BITS - max_minus_1.leading_zeros()).max(1) as u8
}

/// Smallest `k` such that `blk_size << k >= target`.
/// AV1-Spec-2 - 7.3 (`tile_log2`)
///
/// A zero `blk_size` never reaches a non-zero target; it yields 0.
pub(crate) fn tile_log2(blk_size: u32, target: u32) -> u8 {
    if blk_size == 0 {
        return 0;
    }

    let (blk_size, target) = (u64::from(blk_size), u64::from(target));
    let mut k = 0;
    while (blk_size << k) < target {
        k += 1;
    }
    k
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_read_leb128() {
        let mut cursor = io::Cursor::new([0b1101_0101u8, 0b0010_1010, 0xff]);
        assert_eq!(read_leb128(&mut cursor).unwrap(), 0b1010101010101);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_read_leb128_limits() {
        // 2^32
        let err = read_leb128(&mut io::Cursor::new([0x80u8, 0x80, 0x80, 0x80, 0x10])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // Padded encodings are accepted.
        assert_eq!(read_leb128(&mut io::Cursor::new([0x85u8, 0x80, 0x00])).unwrap(), 5);

        let err = read_leb128(&mut io::Cursor::new([0x80u8])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_write_leb128() {
        let cases: [(u64, &[u8]); 6] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (16383, &[0xff, 0x7f]),
            (16384, &[0x80, 0x80, 0x01]),
        ];

        for (value, expected) in cases {
            let mut buf = Vec::new();
            assert_eq!(write_leb128(&mut buf, value).unwrap(), expected.len());
            assert_eq!(buf, expected, "encoding of {value}");
            assert_eq!(leb128_size(value), expected.len());
        }
    }

    #[test]
    fn test_leb128_u32_max() {
        let mut buf = Vec::new();
        assert_eq!(write_leb128(&mut buf, u32::MAX as u64).unwrap(), 5);
        assert_eq!(buf, [0xff, 0xff, 0xff, 0xff, 0x0f]);

        assert_eq!(read_leb128(&mut io::Cursor::new(buf)).unwrap(), u32::MAX as u64);
    }

    #[test]
    fn test_bits_for_max_minus_1() {
        assert_eq!(bits_for_max_minus_1(0), 1);
        assert_eq!(bits_for_max_minus_1(1), 1);
        assert_eq!(bits_for_max_minus_1(2), 2);
        assert_eq!(bits_for_max_minus_1(3), 2);
        assert_eq!(bits_for_max_minus_1(4), 3);
        assert_eq!(bits_for_max_minus_1(63), 6);
        assert_eq!(bits_for_max_minus_1(64), 7);
        assert_eq!(bits_for_max_minus_1(127), 7);
        assert_eq!(bits_for_max_minus_1(65535), 16);
        assert_eq!(bits_for_max_minus_1(65536), 17);
        assert_eq!(bits_for_max_minus_1(u32::MAX), 32);
    }

    #[test]
    fn test_bits_for_max_minus_1_is_tight() {
        for m in 1..=70_000u32 {
            let w = bits_for_max_minus_1(m) as u32;
            assert!((m as u64) < (1u64 << w), "{m} does not fit in {w} bits");
            assert!((m as u64) >= (1u64 << (w - 1)), "{m} fits in {} bits", w - 1);
        }
    }

    #[test]
    fn test_tile_log2() {
        assert_eq!(tile_log2(1, 1), 0);
        assert_eq!(tile_log2(1, 2), 1);
        assert_eq!(tile_log2(1, 3), 2);
        assert_eq!(tile_log2(64, 2), 0);
        assert_eq!(tile_log2(1, 64), 6);
        assert_eq!(tile_log2(0, 5), 0);
        assert_eq!(tile_log2(1, u32::MAX), 32);
    }
}
