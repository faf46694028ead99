//! Unit tests for the little/big-endian helpers.
use super::*;

#[test]
/// Values that fit the requested width survive both byte orders.
fn test_round_trip_all_widths() {
    let samples: [u64; 6] = [0, 1, 0x7F, 0xA5, 0x1234_5678_9ABC_DEF0, u64::MAX];

    for width in [1usize, 2, 3, 4, 8] {
        let mask = if width == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * width)) - 1
        };
        for value in samples.iter().map(|v| v & mask) {
            let mut le = [0u8; 8];
            let mut be = [0u8; 8];
            to_le(value, &mut le[..width]);
            to_be(value, &mut be[..width]);

            assert_eq!(from_le(&le[..width]), value, "LE width {width}");
            assert_eq!(from_be(&be[..width]), value, "BE width {width}");
        }
    }
}

#[test]
/// Byte order matches the wire examples used by TP headers.
fn test_byte_order() {
    assert_eq!(to_le_array::<3>(0x00E700), [0x00, 0xE7, 0x00]);
    assert_eq!(to_be_array::<3>(0x00E700), [0x00, 0xE7, 0x00]);
    assert_eq!(to_le_array::<2>(1785), [0xF9, 0x06]);
    assert_eq!(to_be_array::<2>(1785), [0x06, 0xF9]);
    assert_eq!(to_le_array::<4>(0x0100_0203), [0x03, 0x02, 0x00, 0x01]);
}

#[test]
/// Values wider than the destination are truncated, never rejected.
fn test_truncation() {
    let mut out = [0u8; 2];
    to_le(0x0012_3456, &mut out);
    assert_eq!(out, [0x56, 0x34]);
    assert_eq!(from_le(&out), 0x3456);
}

#[test]
/// Widths beyond 64 bits write zero padding and ignore the excess on read.
fn test_oversized_buffers() {
    let mut out = [0xAAu8; 10];
    to_le(u64::MAX, &mut out);
    assert_eq!(&out[8..], &[0, 0]);
    assert_eq!(from_le(&out), u64::MAX);
}

#[test]
/// Offset helpers read fields in place.
fn test_offset_readers() {
    let data = [0xAD, 0x34, 0x12, 0x00, 0x15, 0x02, 0x01, 0x00];
    assert_eq!(le_u16(&data, 1), 0x1234);
    assert_eq!(le_u24(&data, 4), 0x01_0215);
}
