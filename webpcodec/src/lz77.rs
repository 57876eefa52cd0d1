//! LZ77 length and distance coding shared by the decoder and the encoder.
//!
//! Lengths and distances are coded as a prefix symbol followed by a number of raw extra bits. Distances are further
//! mapped through a table of short two-dimensional offsets, so that nearby pixels in the rows above have small codes.

/// The number of distance codes mapped to two-dimensional offsets.
pub const NUM_PLANE_CODES: u32 = 120;

/// The number of LZ77 length prefix symbols, coded in the green alphabet after the 256 literals.
pub const NUM_LENGTH_CODES: u16 = 24;

/// The number of LZ77 distance prefix symbols.
pub const NUM_DISTANCE_CODES: u16 = 40;

/// The longest backward reference the encoder emits. Length prefix codes can express one more.
pub const MAX_LENGTH: u32 = 4095;

/// `(dx, dy)` offsets of the short distance codes `1..=120`, where the distance is `dx + dy * width`.
#[rustfmt::skip]
pub const DISTANCE_MAP: [(i8, u8); NUM_PLANE_CODES as usize] = [
    (0, 1),  (1, 0),  (1, 1),  (-1, 1), (0, 2),  (2, 0),  (1, 2),
    (-1, 2), (2, 1),  (-2, 1), (2, 2),  (-2, 2), (0, 3),  (3, 0),
    (1, 3),  (-1, 3), (3, 1),  (-3, 1), (2, 3),  (-2, 3), (3, 2),
    (-3, 2), (0, 4),  (4, 0),  (1, 4),  (-1, 4), (4, 1),  (-4, 1),
    (3, 3),  (-3, 3), (2, 4),  (-2, 4), (4, 2),  (-4, 2), (0, 5),
    (3, 4),  (-3, 4), (4, 3),  (-4, 3), (5, 0),  (1, 5),  (-1, 5),
    (5, 1),  (-5, 1), (2, 5),  (-2, 5), (5, 2),  (-5, 2), (4, 4),
    (-4, 4), (3, 5),  (-3, 5), (5, 3),  (-5, 3), (0, 6),  (6, 0),
    (1, 6),  (-1, 6), (6, 1),  (-6, 1), (2, 6),  (-2, 6), (6, 2),
    (-6, 2), (4, 5),  (-4, 5), (5, 4),  (-5, 4), (3, 6),  (-3, 6),
    (6, 3),  (-6, 3), (0, 7),  (7, 0),  (1, 7),  (-1, 7), (5, 5),
    (-5, 5), (7, 1),  (-7, 1), (4, 6),  (-4, 6), (6, 4),  (-6, 4),
    (2, 7),  (-2, 7), (7, 2),  (-7, 2), (3, 7),  (-3, 7), (7, 3),
    (-7, 3), (5, 6),  (-5, 6), (6, 5),  (-6, 5), (8, 0),  (4, 7),
    (-4, 7), (7, 4),  (-7, 4), (8, 1),  (8, 2),  (6, 6),  (-6, 6),
    (8, 3),  (5, 7),  (-5, 7), (7, 5),  (-7, 5), (8, 4),  (6, 7),
    (-6, 7), (7, 6),  (-7, 6), (8, 5),  (7, 7),  (-7, 7), (8, 6),
    (8, 7)
];

/// The prefix coding of an LZ77 length or distance value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixCoded {
    /// The prefix symbol.
    pub code: u16,
    /// The number of extra bits following the prefix symbol.
    pub extra_bits: u32,
    /// The value of the extra bits.
    pub extra_value: u32,
}

/// Convert a distance code, as read from the bitstream, to a linear pixel distance in an image of width `width`.
pub fn plane_code_to_distance(width: u32, code: u32) -> u32 {
    match code {
        0 => 1,
        1..=NUM_PLANE_CODES => {
            let (dx, dy) = DISTANCE_MAP[code as usize - 1];
            let dist = i64::from(dy) * i64::from(width) + i64::from(dx);
            dist.max(1) as u32
        }
        _ => code - NUM_PLANE_CODES,
    }
}

/// Split a length or distance code value (at least 1) into its prefix coding.
pub fn prefix_encode(value: u32) -> PrefixCoded {
    debug_assert!(value >= 1);
    let value = value - 1;
    if value < 4 {
        return PrefixCoded { code: value as u16, extra_bits: 0, extra_value: 0 };
    }
    let highest_bit = 31 - value.leading_zeros();
    let second_highest_bit = (value >> (highest_bit - 1)) & 1;
    let extra_bits = highest_bit - 1;
    PrefixCoded {
        code: (2 * highest_bit + second_highest_bit) as u16,
        extra_bits,
        extra_value: value & ((1 << extra_bits) - 1),
    }
}
