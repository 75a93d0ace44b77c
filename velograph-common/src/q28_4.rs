//! Q28.4 fixed-point values: 28 integer bits and 4 fractional bits, stored
//! as `real * 16` in an `i32`.

/// Number of fractional bits.
pub const FRACTIONAL_BITS: i32 = 4;

/// Q28.4 encoding of the integer `i`.
#[inline]
pub const fn of_int(i: i32) -> i32 {
    i << FRACTIONAL_BITS
}

#[inline]
pub fn as_f64(q28_4: i32) -> f64 {
    f64::from(q28_4) / 16.0
}

#[inline]
pub fn as_f32(q28_4: i32) -> f32 {
    // Exact for every |q| < 2^24, which covers all 16-bit stored forms.
    q28_4 as f32 / 16.0
}

/// Decode an unsigned 16-bit stored form (`0..=65535`).
#[inline]
pub fn unsigned_16_as_f64(stored: u16) -> f64 {
    as_f64(i32::from(stored))
}
