//! Test infrastructure and synthetic dataset generation for velograph
//!
//! [`DatasetBuilder`] collects nodes and edges in memory and encodes them into
//! the six big-endian record files that make up a graph directory
//! (`nodes.bin`, `sectors.bin`, `edges.bin`, `profile_ids.bin`,
//! `elevations.bin`, `attributes.bin`). [`grid`] generates seeded random grid
//! networks for property-style tests.
//!
//! The routing library itself never writes datasets; this crate exists so that
//! tests can exercise the decoders against byte-exact inputs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use velograph_common::error::check_argument;
use velograph_common::{math, Result};

/// Valid coordinate rectangle covered by the sector grid (local E/N metres).
pub const GRID_MIN_E: f64 = 2_485_000.0;
pub const GRID_MAX_E: f64 = 2_834_000.0;
pub const GRID_MIN_N: f64 = 1_075_000.0;
pub const GRID_MAX_N: f64 = 1_296_000.0;
pub const SECTORS_PER_SIDE: usize = 128;

const SECTOR_WIDTH: f64 = (GRID_MAX_E - GRID_MIN_E) / SECTORS_PER_SIDE as f64;
const SECTOR_HEIGHT: f64 = (GRID_MAX_N - GRID_MIN_N) / SECTORS_PER_SIDE as f64;

const KIND_NONE: u32 = 0;
const KIND_RAW: u32 = 1;
const KIND_DELTA_8: u32 = 2;
const KIND_DELTA_4: u32 = 3;

/// Elevation samples of an edge, in stored (way) order, with the encoding
/// used to pack them.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileSpec {
    None,
    Raw(Vec<f64>),
    Delta8(Vec<f64>),
    Delta4(Vec<f64>),
}

impl ProfileSpec {
    /// Pick the most compact encoding able to represent `samples` exactly
    /// after Q28.4 quantization.
    pub fn compact(samples: Vec<f64>) -> Self {
        let quantized: Vec<i32> = samples.iter().map(|s| quantize(*s)).collect();
        let max_step = quantized
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .max()
            .unwrap_or(0);
        let fits_delta_4 = quantized.windows(2).all(|w| (-8..=7).contains(&(w[1] - w[0])));
        if fits_delta_4 {
            ProfileSpec::Delta4(samples)
        } else if max_step <= 127 {
            ProfileSpec::Delta8(samples)
        } else {
            ProfileSpec::Raw(samples)
        }
    }
}

/// One directed edge as it will be written to `edges.bin`.
#[derive(Clone, Debug)]
pub struct EdgeSpec {
    pub from: u32,
    pub to: u32,
    pub length: f64,
    pub elevation_gain: f64,
    pub inverted: bool,
    pub attributes: u64,
    pub profile: ProfileSpec,
}

impl EdgeSpec {
    pub fn new(from: u32, to: u32, length: f64) -> Self {
        Self {
            from,
            to,
            length,
            elevation_gain: 0.0,
            inverted: false,
            attributes: 0,
            profile: ProfileSpec::None,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn with_attributes(mut self, bits: u64) -> Self {
        self.attributes = bits;
        self
    }

    pub fn with_profile(mut self, profile: ProfileSpec) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_elevation_gain(mut self, gain: f64) -> Self {
        self.elevation_gain = gain;
        self
    }
}

/// Number of elevation samples stored for an edge of the given length.
pub fn sample_count(length: f64) -> usize {
    let length_q = quantize(length).max(0);
    // 32 is the Q28.4 encoding of 2 metres.
    1 + ((length_q + 31) / 32) as usize
}

/// Encoded dataset: one byte vector per record file.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub nodes: Vec<u8>,
    pub sectors: Vec<u8>,
    pub edges: Vec<u8>,
    pub profile_ids: Vec<u8>,
    pub elevations: Vec<u8>,
    pub attributes: Vec<u8>,
}

impl Dataset {
    /// Write the six record files into `dir` (which must exist).
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        fs::write(dir.join("nodes.bin"), &self.nodes)?;
        fs::write(dir.join("sectors.bin"), &self.sectors)?;
        fs::write(dir.join("edges.bin"), &self.edges)?;
        fs::write(dir.join("profile_ids.bin"), &self.profile_ids)?;
        fs::write(dir.join("elevations.bin"), &self.elevations)?;
        fs::write(dir.join("attributes.bin"), &self.attributes)?;
        Ok(())
    }

    /// Write the dataset into a fresh temporary directory.
    pub fn write_temp(&self) -> io::Result<TempDir> {
        let dir = tempfile::tempdir()?;
        self.write_to(dir.path())?;
        Ok(dir)
    }
}

/// Builds a dataset from nodes and directed edges.
///
/// Edge identities are assigned at build time by a stable sort on the source
/// node, so out-edges of a node keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct DatasetBuilder {
    nodes: Vec<(f64, f64)>,
    edges: Vec<EdgeSpec>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at local coordinates `(e, n)` and return its identity.
    pub fn add_node(&mut self, e: f64, n: f64) -> u32 {
        self.nodes.push((e, n));
        (self.nodes.len() - 1) as u32
    }

    pub fn add_edge(&mut self, edge: EdgeSpec) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Add a two-way road: `a -> b` in way direction and `b -> a` inverted,
    /// both sharing the same stored profile and attributes.
    pub fn add_road(
        &mut self,
        a: u32,
        b: u32,
        length: f64,
        attributes: u64,
        profile: ProfileSpec,
    ) -> &mut Self {
        self.edges.push(
            EdgeSpec::new(a, b, length)
                .with_attributes(attributes)
                .with_profile(profile.clone()),
        );
        self.edges.push(
            EdgeSpec::new(b, a, length)
                .inverted()
                .with_attributes(attributes)
                .with_profile(profile),
        );
        self
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn build(&self) -> Result<Dataset> {
        let node_count = self.nodes.len();

        let mut order: Vec<usize> = (0..self.edges.len()).collect();
        order.sort_by_key(|&i| self.edges[i].from);

        let mut first_edge = vec![0u32; node_count];
        let mut degree = vec![0u32; node_count];
        for (edge_id, &i) in order.iter().enumerate() {
            let edge = &self.edges[i];
            check_argument((edge.from as usize) < node_count, || {
                format!("edge source {} is not a node", edge.from)
            })?;
            check_argument((edge.to as usize) < node_count, || {
                format!("edge target {} is not a node", edge.to)
            })?;
            let from = edge.from as usize;
            if degree[from] == 0 {
                first_edge[from] = edge_id as u32;
            }
            degree[from] += 1;
        }

        let mut dataset = Dataset::default();

        for (id, &(e, n)) in self.nodes.iter().enumerate() {
            check_argument(degree[id] <= 15, || {
                format!("node {id} has {} out-edges, at most 15 fit", degree[id])
            })?;
            check_argument(first_edge[id] < (1 << 28), || {
                format!("first edge of node {id} does not fit in 28 bits")
            })?;
            let out_edges = (degree[id] << 28) | first_edge[id];
            dataset.nodes.extend_from_slice(&quantize(e).to_be_bytes());
            dataset.nodes.extend_from_slice(&quantize(n).to_be_bytes());
            dataset.nodes.extend_from_slice(&out_edges.to_be_bytes());
        }

        let mut attribute_index: HashMap<u64, u16> = HashMap::new();
        let mut attribute_sets: Vec<u64> = Vec::new();
        let mut elevations: Vec<u16> = Vec::new();

        for &i in &order {
            let edge = &self.edges[i];
            let target = if edge.inverted {
                !(edge.to as i32)
            } else {
                edge.to as i32
            };
            let length_q = quantize_u16(edge.length, "edge length")?;
            let gain_q = quantize_u16(edge.elevation_gain, "elevation gain")?;

            let next_index = attribute_sets.len();
            let attributes = match attribute_index.get(&edge.attributes) {
                Some(&index) => index,
                None => {
                    check_argument(edge.attributes >> 62 == 0, || {
                        format!("attribute set {:#x} uses bits above 61", edge.attributes)
                    })?;
                    check_argument(next_index <= usize::from(u16::MAX), || {
                        "too many distinct attribute sets"
                    })?;
                    attribute_sets.push(edge.attributes);
                    attribute_index.insert(edge.attributes, next_index as u16);
                    next_index as u16
                }
            };

            dataset.edges.extend_from_slice(&target.to_be_bytes());
            dataset.edges.extend_from_slice(&length_q.to_be_bytes());
            dataset.edges.extend_from_slice(&gain_q.to_be_bytes());
            dataset.edges.extend_from_slice(&attributes.to_be_bytes());

            let descriptor = encode_profile(&edge.profile, length_q, &mut elevations)?;
            dataset.profile_ids.extend_from_slice(&descriptor.to_be_bytes());
        }

        for word in elevations {
            dataset.elevations.extend_from_slice(&word.to_be_bytes());
        }
        for bits in attribute_sets {
            dataset.attributes.extend_from_slice(&bits.to_be_bytes());
        }

        dataset.sectors = self.encode_sectors()?;
        Ok(dataset)
    }

    fn encode_sectors(&self) -> Result<Vec<u8>> {
        let sector_total = SECTORS_PER_SIDE * SECTORS_PER_SIDE;
        // (min id, max id, count) per sector
        let mut ranges: Vec<Option<(u32, u32, u32)>> = vec![None; sector_total];

        for (id, &(e, n)) in self.nodes.iter().enumerate() {
            let id = id as u32;
            let sector = sector_index(e, n);
            ranges[sector] = Some(match ranges[sector] {
                None => (id, id, 1),
                Some((min, max, count)) => (min.min(id), max.max(id), count + 1),
            });
        }

        let mut bytes = Vec::with_capacity(sector_total * 6);
        for (sector, range) in ranges.iter().enumerate() {
            let (start, count) = match *range {
                None => (0u32, 0u32),
                Some((min, max, count)) => {
                    check_argument(max - min + 1 == count, || {
                        format!("nodes of sector {sector} are not contiguous")
                    })?;
                    check_argument(count <= u32::from(u16::MAX), || {
                        format!("sector {sector} holds too many nodes")
                    })?;
                    (min, count)
                }
            };
            bytes.extend_from_slice(&start.to_be_bytes());
            bytes.extend_from_slice(&(count as u16).to_be_bytes());
        }
        Ok(bytes)
    }
}

/// Sector grid cell `x + 128 * y` containing the point.
pub fn sector_index(e: f64, n: f64) -> usize {
    let max = (SECTORS_PER_SIDE - 1) as f64;
    let x = ((e - GRID_MIN_E) / SECTOR_WIDTH).floor().clamp(0.0, max) as usize;
    let y = ((n - GRID_MIN_N) / SECTOR_HEIGHT).floor().clamp(0.0, max) as usize;
    x + SECTORS_PER_SIDE * y
}

fn quantize(value: f64) -> i32 {
    (value * 16.0).round() as i32
}

fn quantize_u16(value: f64, what: &str) -> Result<u16> {
    let q = quantize(value);
    check_argument((0..=i32::from(u16::MAX)).contains(&q), || {
        format!("{what} {value} does not fit an unsigned 16-bit Q28.4")
    })?;
    Ok(q as u16)
}

fn encode_profile(profile: &ProfileSpec, length_q: u16, elevations: &mut Vec<u16>) -> Result<u32> {
    let (kind, samples) = match profile {
        ProfileSpec::None => return Ok(KIND_NONE << 30),
        ProfileSpec::Raw(samples) => (KIND_RAW, samples),
        ProfileSpec::Delta8(samples) => (KIND_DELTA_8, samples),
        ProfileSpec::Delta4(samples) => (KIND_DELTA_4, samples),
    };

    let expected = 1 + math::ceil_div(i32::from(length_q), 32)? as usize;
    check_argument(samples.len() == expected, || {
        format!("profile has {} samples, edge length needs {expected}", samples.len())
    })?;
    let start = elevations.len();
    check_argument(start < (1 << 30), || "elevation array overflows 30 bits")?;

    let quantized: Vec<i32> = samples.iter().map(|s| quantize(*s)).collect();
    let absolute = |q: i32| -> Result<u16> {
        check_argument((0..=i32::from(u16::MAX)).contains(&q), || {
            format!("elevation {} out of range", f64::from(q) / 16.0)
        })?;
        Ok(q as u16)
    };

    match kind {
        KIND_RAW => {
            for &q in &quantized {
                elevations.push(absolute(q)?);
            }
        }
        KIND_DELTA_8 => {
            elevations.push(absolute(quantized[0])?);
            for i in 1..quantized.len() {
                let delta = quantized[i] - quantized[i - 1];
                check_argument((-128..=127).contains(&delta), || {
                    format!("delta {delta} does not fit 8 bits")
                })?;
                let byte = u16::from(delta as i8 as u8);
                if i % 2 == 1 {
                    elevations.push(byte << 8);
                } else if let Some(last) = elevations.last_mut() {
                    *last |= byte;
                }
            }
        }
        _ => {
            elevations.push(absolute(quantized[0])?);
            for i in 1..quantized.len() {
                let delta = quantized[i] - quantized[i - 1];
                check_argument((-8..=7).contains(&delta), || {
                    format!("delta {delta} does not fit 4 bits")
                })?;
                let nibble = (delta as u16) & 0xF;
                let shift = match i % 4 {
                    1 => 12,
                    2 => 8,
                    3 => 4,
                    _ => 0,
                };
                if i % 4 == 1 {
                    elevations.push(nibble << shift);
                } else if let Some(last) = elevations.last_mut() {
                    *last |= nibble << shift;
                }
            }
        }
    }

    Ok((kind << 30) | start as u32)
}

/// A generated grid network together with the mapping from grid cells to
/// node identities.
#[derive(Clone, Debug)]
pub struct Grid {
    pub builder: DatasetBuilder,
    pub columns: u32,
    pub rows: u32,
    pub spacing: f64,
    node_ids: Vec<u32>,
}

impl Grid {
    /// Node identity at column `col`, row `row`.
    pub fn node_at(&self, col: u32, row: u32) -> u32 {
        self.node_ids[(row * self.columns + col) as usize]
    }
}

/// Generate a `columns x rows` grid of two-way roads spaced `spacing` metres
/// apart, with a smooth random terrain. Roughly one edge in eight has no
/// elevation profile; the others use the most compact encoding that fits.
///
/// Node identities are grouped by sector so the grid may span sector
/// boundaries.
pub fn grid(columns: u32, rows: u32, spacing: f64, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let origin_e = 2_532_000.0;
    let origin_n = 1_152_000.0;

    let base: f64 = rng.gen_range(300.0..900.0);
    let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

    // (sector, row, col, e, n, elevation)
    let mut cells = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for col in 0..columns {
            let e = origin_e + f64::from(col) * spacing;
            let n = origin_n + f64::from(row) * spacing;
            let relief = 12.0 * ((e - origin_e) / 180.0 + phase).sin()
                + 8.0 * ((n - origin_n) / 140.0).cos();
            let elevation = base + relief + rng.gen_range(0.0..3.0);
            cells.push((sector_index(e, n), row, col, e, n, elevation));
        }
    }
    cells.sort_by_key(|&(sector, row, col, ..)| (sector, row, col));

    let mut builder = DatasetBuilder::new();
    let mut node_ids = vec![0u32; (columns * rows) as usize];
    let mut elevation_of = vec![0.0f64; (columns * rows) as usize];
    for &(_, row, col, e, n, elevation) in &cells {
        let id = builder.add_node(e, n);
        node_ids[(row * columns + col) as usize] = id;
        elevation_of[id as usize] = elevation;
    }

    let mut roads = Vec::new();
    for row in 0..rows {
        for col in 0..columns {
            let here = node_ids[(row * columns + col) as usize];
            if col + 1 < columns {
                roads.push((here, node_ids[(row * columns + col + 1) as usize]));
            }
            if row + 1 < rows {
                roads.push((here, node_ids[((row + 1) * columns + col) as usize]));
            }
        }
    }

    for (a, b) in roads {
        let count = sample_count(spacing);
        let (ya, yb) = (elevation_of[a as usize], elevation_of[b as usize]);
        let profile = if rng.gen_ratio(1, 8) {
            ProfileSpec::None
        } else {
            let samples = (0..count)
                .map(|i| math::interpolate(ya, yb, i as f64 / (count - 1) as f64))
                .collect();
            ProfileSpec::compact(samples)
        };
        builder.add_road(a, b, spacing, 0, profile);
    }

    Grid {
        builder,
        columns,
        rows,
        spacing,
        node_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(0.0), 1);
        assert_eq!(sample_count(2.0), 2);
        assert_eq!(sample_count(2.0625), 3);
        assert_eq!(sample_count(10.0), 6);
    }

    #[test]
    fn test_build_record_sizes() {
        let mut builder = DatasetBuilder::new();
        let a = builder.add_node(2_600_000.0, 1_200_000.0);
        let b = builder.add_node(2_600_010.0, 1_200_000.0);
        builder.add_road(a, b, 10.0, 0b101, ProfileSpec::Raw(vec![500.0; 6]));

        let dataset = builder.build().unwrap();
        assert_eq!(dataset.nodes.len(), 2 * 12);
        assert_eq!(dataset.edges.len(), 2 * 10);
        assert_eq!(dataset.profile_ids.len(), 2 * 4);
        assert_eq!(dataset.elevations.len(), 2 * 6 * 2);
        assert_eq!(dataset.attributes.len(), 8);
        assert_eq!(dataset.sectors.len(), 128 * 128 * 6);

        // Node b: degree 1, first edge 1.
        assert_eq!(read_u32(&dataset.nodes, 12 + 8), (1 << 28) | 1);
        // Second edge is inverted and points back to a.
        assert_eq!(read_u32(&dataset.edges, 10) as i32, !0);
    }

    #[test]
    fn test_delta_packing_layout() {
        let mut elevations = Vec::new();
        let samples = vec![100.0, 100.0625, 100.0, 100.125, 100.0625, 100.5];
        let length_q = 5 * 32;
        let descriptor =
            encode_profile(&ProfileSpec::Delta4(samples), length_q, &mut elevations).unwrap();
        assert_eq!(descriptor >> 30, KIND_DELTA_4);
        // deltas +1, -1, +2, -1 at nibble offsets 12, 8, 4, 0, then +7 opens
        // a second word
        assert_eq!(elevations, vec![1600, 0x1F2F, 0x7000]);

        let mut elevations = Vec::new();
        let samples = vec![100.0, 101.0, 99.0];
        encode_profile(&ProfileSpec::Delta8(samples), 2 * 32, &mut elevations).unwrap();
        // +16 in the high byte, -32 in the low byte
        assert_eq!(elevations, vec![1600, 0x10E0]);
    }

    #[test]
    fn test_rejects_non_contiguous_sectors() {
        let mut builder = DatasetBuilder::new();
        builder.add_node(2_600_000.0, 1_200_000.0);
        builder.add_node(2_700_000.0, 1_200_000.0);
        builder.add_node(2_600_001.0, 1_200_000.0);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_rejects_wrong_sample_count() {
        let mut builder = DatasetBuilder::new();
        let a = builder.add_node(2_600_000.0, 1_200_000.0);
        let b = builder.add_node(2_600_010.0, 1_200_000.0);
        builder.add_edge(EdgeSpec::new(a, b, 10.0).with_profile(ProfileSpec::Raw(vec![1.0; 3])));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_grid_builds_across_sectors() {
        let grid = grid(12, 8, 400.0, 7);
        let dataset = grid.builder.build().unwrap();
        assert_eq!(dataset.nodes.len(), 12 * 8 * 12);
        let dir = dataset.write_temp().unwrap();
        assert!(dir.path().join("sectors.bin").exists());
    }
}
