//! Local (CH1903+ / LV95) coordinates and conversions from WGS84
//!
//! Graph coordinates are metres east/north in the Swiss local frame. Angles
//! are radians everywhere in this module; callers parsing degrees convert at
//! the boundary.

use velograph_common::error::{check_argument, Result};
use velograph_common::math;

/// Rectangle of valid local coordinates.
pub struct SwissBounds;

impl SwissBounds {
    pub const MIN_E: f64 = 2_485_000.0;
    pub const MAX_E: f64 = 2_834_000.0;
    pub const MIN_N: f64 = 1_075_000.0;
    pub const MAX_N: f64 = 1_296_000.0;
    pub const WIDTH: f64 = Self::MAX_E - Self::MIN_E;
    pub const HEIGHT: f64 = Self::MAX_N - Self::MIN_N;

    pub fn contains_en(e: f64, n: f64) -> bool {
        (Self::MIN_E..=Self::MAX_E).contains(&e) && (Self::MIN_N..=Self::MAX_N).contains(&n)
    }
}

/// A point of the local frame, guaranteed to lie within [`SwissBounds`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCh {
    e: f64,
    n: f64,
}

impl PointCh {
    pub fn new(e: f64, n: f64) -> Result<Self> {
        check_argument(SwissBounds::contains_en(e, n), || {
            format!("point ({e}, {n}) lies outside the valid area")
        })?;
        Ok(Self { e, n })
    }

    /// For coordinates already checked against [`SwissBounds`].
    pub(crate) fn new_unchecked(e: f64, n: f64) -> Self {
        debug_assert!(SwissBounds::contains_en(e, n));
        Self { e, n }
    }

    pub fn e(&self) -> f64 {
        self.e
    }

    pub fn n(&self) -> f64 {
        self.n
    }

    pub fn squared_distance_to(&self, that: &PointCh) -> f64 {
        math::squared_norm(that.e - self.e, that.n - self.n)
    }

    pub fn distance_to(&self, that: &PointCh) -> f64 {
        math::norm(that.e - self.e, that.n - self.n)
    }

    /// WGS84 longitude in radians.
    pub fn lon(&self) -> f64 {
        ch1903::lon(self.e, self.n)
    }

    /// WGS84 latitude in radians.
    pub fn lat(&self) -> f64 {
        ch1903::lat(self.e, self.n)
    }
}

/// Approximate CH1903+ ⇄ WGS84 formulas (swisstopo), accurate to about a
/// metre over the valid area.
pub mod ch1903 {
    fn lon1(lon: f64) -> f64 {
        1e-4 * (3600.0 * lon.to_degrees() - 26_782.5)
    }

    fn lat1(lat: f64) -> f64 {
        1e-4 * (3600.0 * lat.to_degrees() - 169_028.66)
    }

    pub fn e(lon: f64, lat: f64) -> f64 {
        let (l1, p1) = (lon1(lon), lat1(lat));
        2_600_072.37 + 211_455.93 * l1
            - 10_938.51 * l1 * p1
            - 0.36 * l1 * p1 * p1
            - 44.54 * l1 * l1 * l1
    }

    pub fn n(lon: f64, lat: f64) -> f64 {
        let (l1, p1) = (lon1(lon), lat1(lat));
        1_200_147.07 + 308_807.95 * p1 + 3_745.25 * l1 * l1 + 76.63 * p1 * p1
            - 194.56 * l1 * l1 * p1
            + 119.79 * p1 * p1 * p1
    }

    pub fn lon(e: f64, n: f64) -> f64 {
        let x = 1e-6 * (e - 2_600_000.0);
        let y = 1e-6 * (n - 1_200_000.0);
        let lon0 = 2.677_909_4 + 4.728_982 * x + 0.791_484 * x * y + 0.1306 * x * y * y
            - 0.0436 * x * x * x;
        (lon0 * 100.0 / 36.0).to_radians()
    }

    pub fn lat(e: f64, n: f64) -> f64 {
        let x = 1e-6 * (e - 2_600_000.0);
        let y = 1e-6 * (n - 1_200_000.0);
        let lat0 = 16.902_389_2 + 3.238_272 * y
            - 0.270_978 * x * x
            - 0.002_528 * y * y
            - 0.0447 * y * x * x
            - 0.0140 * y * y * y;
        (lat0 * 100.0 / 36.0).to_radians()
    }
}

/// Project a WGS84 position (radians) into the local frame, or `None` if it
/// falls outside the valid area.
pub fn to_local(lon: f64, lat: f64) -> Option<PointCh> {
    PointCh::new(ch1903::e(lon, lat), ch1903::n(lon, lat)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 7°26'22.50" E, 46°57'08.66" N: the origin of the projection polynomial.
    const REF_LON_DEG: f64 = 26_782.5 / 3600.0;
    const REF_LAT_DEG: f64 = 169_028.66 / 3600.0;

    #[test]
    fn test_point_ch_bounds() {
        assert!(PointCh::new(2_600_000.0, 1_200_000.0).is_ok());
        assert!(PointCh::new(SwissBounds::MIN_E, SwissBounds::MAX_N).is_ok());
        assert!(PointCh::new(2_484_999.0, 1_200_000.0).is_err());
        assert!(PointCh::new(2_600_000.0, 1_296_001.0).is_err());
    }

    #[test]
    fn test_distances() {
        let a = PointCh::new(2_600_000.0, 1_200_000.0).unwrap();
        let b = PointCh::new(2_600_003.0, 1_200_004.0).unwrap();
        assert_eq!(a.squared_distance_to(&b), 25.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_ch1903_reference_point() {
        let lon = REF_LON_DEG.to_radians();
        let lat = REF_LAT_DEG.to_radians();
        assert!((ch1903::e(lon, lat) - 2_600_072.37).abs() < 1e-6);
        assert!((ch1903::n(lon, lat) - 1_200_147.07).abs() < 1e-6);
    }

    #[test]
    fn test_ch1903_round_trip_within_a_metre() {
        for (e, n) in [(2_600_000.0, 1_200_000.0), (2_533_132.0, 1_152_206.0), (2_700_000.0, 1_250_000.0)] {
            let p = PointCh::new(e, n).unwrap();
            let back = to_local(p.lon(), p.lat()).unwrap();
            assert!(p.distance_to(&back) < 1.0, "({e}, {n}) drifted to {back:?}");
        }
    }

    #[test]
    fn test_to_local_rejects_far_points() {
        // Paris
        assert!(to_local(2.35_f64.to_radians(), 48.85_f64.to_radians()).is_none());
    }
}
