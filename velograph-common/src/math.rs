//! Small numeric helpers shared by the decoders, routes and projections

use crate::error::{check_argument, Result};

/// `ceil(x / y)` for `x >= 0`, `y > 0`.
pub fn ceil_div(x: i32, y: i32) -> Result<i32> {
    check_argument(x >= 0 && y > 0, || format!("ceil_div({x}, {y}) out of domain"))?;
    Ok((x + y - 1) / y)
}

/// Linear interpolation through `(0, y0)` and `(1, y1)` evaluated at `x`.
#[inline]
pub fn interpolate(y0: f64, y1: f64, x: f64) -> f64 {
    (y1 - y0).mul_add(x, y0)
}

/// Clamp `v` into `[min, max]`; fails if the interval is empty.
pub fn clamp<T: PartialOrd>(min: T, v: T, max: T) -> Result<T> {
    check_argument(min <= max, || "clamp called with min > max")?;
    Ok(clamp_unchecked(min, v, max))
}

/// Clamp for callers that already guarantee `min <= max`.
#[inline]
pub fn clamp_unchecked<T: PartialOrd>(min: T, v: T, max: T) -> T {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

#[inline]
pub fn dot_product(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    ux * vx + uy * vy
}

#[inline]
pub fn squared_norm(ux: f64, uy: f64) -> f64 {
    ux * ux + uy * uy
}

#[inline]
pub fn norm(ux: f64, uy: f64) -> f64 {
    squared_norm(ux, uy).sqrt()
}

/// Signed length of the projection of `p` onto the line through `a` and `b`,
/// measured from `a` in the direction of `b`.
pub fn projection_length(ax: f64, ay: f64, bx: f64, by: f64, px: f64, py: f64) -> f64 {
    dot_product(px - ax, py - ay, bx - ax, by - ay) / norm(bx - ax, by - ay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(0, 32).unwrap(), 0);
        assert_eq!(ceil_div(1, 32).unwrap(), 1);
        assert_eq!(ceil_div(32, 32).unwrap(), 1);
        assert_eq!(ceil_div(33, 32).unwrap(), 2);
        assert!(matches!(ceil_div(-1, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(ceil_div(1, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(10.0, 20.0, 0.0), 10.0);
        assert_eq!(interpolate(10.0, 20.0, 1.0), 20.0);
        assert_eq!(interpolate(10.0, 20.0, 0.5), 15.0);
        assert_eq!(interpolate(10.0, 20.0, 2.0), 30.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.0, -1.0, 5.0).unwrap(), 0.0);
        assert_eq!(clamp(0.0, 6.0, 5.0).unwrap(), 5.0);
        assert_eq!(clamp(0, 3, 5).unwrap(), 3);
        assert!(clamp(5, 3, 0).is_err());
    }

    #[test]
    fn test_projection_length() {
        assert_eq!(projection_length(0.0, 0.0, 10.0, 0.0, 3.0, 4.0), 3.0);
        assert_eq!(projection_length(0.0, 0.0, 10.0, 0.0, -2.0, 1.0), -2.0);
        assert_eq!(norm(3.0, 4.0), 5.0);
    }
}
