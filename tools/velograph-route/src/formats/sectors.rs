//! sectors.bin - 128 x 128 grid of contiguous node ranges
//!
//! Cell `x + 128 * y` covers `SwissBounds::WIDTH / 128` by
//! `SwissBounds::HEIGHT / 128` metres. Each 6-byte record holds the first
//! node id (i32) and the node count (u16) of its cell.

use velograph_common::error::Error;
use velograph_common::{math, Result};

use super::buffer::{read_i32, read_u16};
use crate::geo::{PointCh, SwissBounds};
use crate::NodeId;

pub const FILE_NAME: &str = "sectors.bin";
pub const SECTORS_PER_SIDE: usize = 128;
pub const SECTOR_COUNT: usize = SECTORS_PER_SIDE * SECTORS_PER_SIDE;
pub const SECTOR_BYTES: usize = 6;

const SECTOR_WIDTH: f64 = SwissBounds::WIDTH / SECTORS_PER_SIDE as f64;
const SECTOR_HEIGHT: f64 = SwissBounds::HEIGHT / SECTORS_PER_SIDE as f64;

/// Half-open range `[start_node_id, end_node_id)` of the nodes in one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sector {
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
}

impl Sector {
    pub fn node_ids(&self) -> std::ops::Range<NodeId> {
        self.start_node_id..self.end_node_id
    }
}

#[derive(Debug)]
pub struct GraphSectors<B> {
    buffer: B,
}

impl<B: AsRef<[u8]>> GraphSectors<B> {
    pub fn new(buffer: B) -> Result<Self> {
        let len = buffer.as_ref().len();
        let expected = SECTOR_COUNT * SECTOR_BYTES;
        if len != expected {
            return Err(Error::malformed(
                FILE_NAME,
                format!("size {len}, expected {expected}"),
            ));
        }
        Ok(Self { buffer })
    }

    /// Sector of cell `index`. Call only on validated data: the record's end
    /// must fit a node id (see [`GraphSectors::check_ranges`]).
    pub fn sector(&self, index: usize) -> Sector {
        let (start, count) = self.record(index);
        Sector {
            start_node_id: start,
            end_node_id: start.wrapping_add(count),
        }
    }

    /// Fail unless every sector ends at or before node `node_count`.
    pub fn check_ranges(&self, node_count: usize) -> Result<()> {
        for index in 0..SECTOR_COUNT {
            let (start, count) = self.record(index);
            let end = start.checked_add(count).ok_or_else(|| {
                Error::malformed(
                    FILE_NAME,
                    format!("sector {index} overflows: start {start}, count {count}"),
                )
            })?;
            if end as usize > node_count {
                return Err(Error::malformed(
                    FILE_NAME,
                    format!("sector {index} ends at node {end}"),
                ));
            }
        }
        Ok(())
    }

    fn record(&self, index: usize) -> (NodeId, u32) {
        let offset = index * SECTOR_BYTES;
        let bytes = self.buffer.as_ref();
        let start = read_i32(bytes, offset) as u32;
        (start, u32::from(read_u16(bytes, offset + 4)))
    }

    /// Sectors of every cell overlapping the square of half-side `distance`
    /// centred on `center`, in ascending cell index. Empty for a negative
    /// `distance`.
    pub fn sectors_in_area(&self, center: &PointCh, distance: f64) -> Vec<Sector> {
        let (x_min, x_max) = cell_span(center.e(), distance, SwissBounds::MIN_E, SECTOR_WIDTH);
        let (y_min, y_max) = cell_span(center.n(), distance, SwissBounds::MIN_N, SECTOR_HEIGHT);

        let columns = (x_max + 1).saturating_sub(x_min);
        let rows = (y_max + 1).saturating_sub(y_min);
        let mut sectors = Vec::with_capacity(columns * rows);
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                sectors.push(self.sector(x + SECTORS_PER_SIDE * y));
            }
        }
        sectors
    }
}

fn cell_span(coordinate: f64, distance: f64, origin: f64, cell_size: f64) -> (usize, usize) {
    let last = (SECTORS_PER_SIDE - 1) as f64;
    let cell = |c: f64| math::clamp_unchecked(0.0, ((c - origin) / cell_size).floor(), last) as usize;
    (cell(coordinate - distance), cell(coordinate + distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sector `i` holds nodes `[4 * i, 4 * i + 4)`.
    fn regular_sectors() -> GraphSectors<Vec<u8>> {
        let mut bytes = Vec::with_capacity(SECTOR_COUNT * SECTOR_BYTES);
        for i in 0..SECTOR_COUNT as i32 {
            bytes.extend_from_slice(&(4 * i).to_be_bytes());
            bytes.extend_from_slice(&4u16.to_be_bytes());
        }
        GraphSectors::new(bytes).unwrap()
    }

    #[test]
    fn test_sector_record() {
        let sectors = regular_sectors();
        assert_eq!(
            sectors.sector(129),
            Sector {
                start_node_id: 516,
                end_node_id: 520
            }
        );
    }

    #[test]
    fn test_whole_area_in_ascending_order() {
        let sectors = regular_sectors();
        let center = PointCh::new(2_600_000.0, 1_200_000.0).unwrap();
        let all = sectors.sectors_in_area(&center, 1e6);
        assert_eq!(all.len(), SECTOR_COUNT);
        assert!(all.windows(2).all(|w| w[0].start_node_id < w[1].start_node_id));
    }

    #[test]
    fn test_corner_cells_clamp() {
        let sectors = regular_sectors();
        let corner = PointCh::new(SwissBounds::MIN_E, SwissBounds::MIN_N).unwrap();
        assert_eq!(sectors.sectors_in_area(&corner, 0.0), vec![sectors.sector(0)]);

        let far = PointCh::new(SwissBounds::MAX_E, SwissBounds::MAX_N).unwrap();
        assert_eq!(
            sectors.sectors_in_area(&far, 0.0),
            vec![sectors.sector(SECTOR_COUNT - 1)]
        );
    }

    #[test]
    fn test_area_straddling_cells() {
        let sectors = regular_sectors();
        // Centre on the corner shared by cells (1, 1), (2, 1), (1, 2), (2, 2).
        let center = PointCh::new(
            SwissBounds::MIN_E + 2.0 * SECTOR_WIDTH,
            SwissBounds::MIN_N + 2.0 * SECTOR_HEIGHT,
        )
        .unwrap();
        let found: Vec<u32> = sectors
            .sectors_in_area(&center, 10.0)
            .iter()
            .map(|s| s.start_node_id / 4)
            .collect();
        assert_eq!(found, vec![129, 130, 257, 258]);
    }

    #[test]
    fn test_negative_distance_yields_no_sector() {
        let sectors = regular_sectors();
        let center = PointCh::new(SwissBounds::MIN_E + 40.0 * SECTOR_WIDTH + 1.0, 1_200_000.0).unwrap();
        assert!(sectors.sectors_in_area(&center, -5.0).is_empty());
    }

    #[test]
    fn test_check_ranges() {
        let sectors = regular_sectors();
        assert!(sectors.check_ranges(4 * SECTOR_COUNT).is_ok());
        let err = sectors.check_ranges(4 * SECTOR_COUNT - 1).unwrap_err();
        assert!(matches!(err, Error::MalformedData { ref file, .. } if file == FILE_NAME));
    }

    #[test]
    fn test_check_ranges_rejects_overflowing_record() {
        let mut bytes = vec![0u8; SECTOR_COUNT * SECTOR_BYTES];
        bytes[..4].copy_from_slice(&(-1i32).to_be_bytes());
        bytes[4..6].copy_from_slice(&1u16.to_be_bytes());
        let sectors = GraphSectors::new(bytes).unwrap();
        let err = sectors.check_ranges(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::MalformedData { ref file, .. } if file == FILE_NAME));
    }

    #[test]
    fn test_rejects_wrong_size() {
        assert!(GraphSectors::new(vec![0u8; 6]).is_err());
    }
}
