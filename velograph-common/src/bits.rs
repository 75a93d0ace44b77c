//! Bit-range extraction from 32-bit words
//!
//! Record layouts use [`BitField`] constants, which are validated at compile
//! time and extract infallibly. [`extract_unsigned`] and [`extract_signed`]
//! are the checked entry points for ranges only known at run time.

use crate::error::{check_argument, Result};

/// A contiguous range of `length` bits starting at bit `start` (bit 0 is the
/// least significant bit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    start: u32,
    length: u32,
}

impl BitField {
    /// Build a field; panics (at compile time when used in a `const`) if the
    /// range does not fit in a 32-bit word or spans the whole word.
    pub const fn new(start: u32, length: u32) -> Self {
        assert!(
            length > 0 && length < 32 && start <= 31 && length <= 32 - start,
            "invalid bit range"
        );
        Self { start, length }
    }

    pub const fn start(self) -> u32 {
        self.start
    }

    pub const fn length(self) -> u32 {
        self.length
    }

    /// Interpret the field as an unsigned value in `[0, 2^length)`.
    #[inline]
    pub const fn unsigned(self, value: i32) -> u32 {
        ((value as u32) << (32 - (self.start + self.length))) >> (32 - self.length)
    }

    /// Interpret the field as a two's-complement value in
    /// `[-2^(length-1), 2^(length-1))`.
    #[inline]
    pub const fn signed(self, value: i32) -> i32 {
        (value << (32 - (self.start + self.length))) >> (32 - self.length)
    }
}

/// Extract `length` bits starting at `start` and interpret them as unsigned.
///
/// Fails with `InvalidArgument` unless `0 < length < 32` and
/// `start + length <= 32`.
pub fn extract_unsigned(value: i32, start: u32, length: u32) -> Result<u32> {
    check_argument(
        length > 0 && length != 32 && start <= 31 && length <= 32 - start,
        || format!("invalid unsigned bit range: start={start}, length={length}"),
    )?;
    Ok(BitField { start, length }.unsigned(value))
}

/// Extract `length` bits starting at `start` and interpret them as a
/// two's-complement signed value. A full 32-bit range is allowed.
pub fn extract_signed(value: i32, start: u32, length: u32) -> Result<i32> {
    check_argument(
        length > 0 && start <= 31 && length <= 32 - start,
        || format!("invalid signed bit range: start={start}, length={length}"),
    )?;
    // Shifts by 32 - length stay below 32 because length > 0.
    let shift_left = 32 - (start + length);
    let shift_right = 32 - length;
    Ok((value << shift_left) >> shift_right)
}
