//! edges.bin, profile_ids.bin and elevations.bin - edge records and their
//! compressed elevation profiles
//!
//! ```text
//! edges.bin (10 bytes)
//! 0  i32  target node id, bitwise complemented when the edge is inverted
//! 4  u16  length, Q28.4
//! 6  u16  elevation gain, Q28.4
//! 8  u16  attribute set index
//!
//! profile_ids.bin (4 bytes)
//! bits 31..30  kind: 0 none, 1 raw, 2 delta-8, 3 delta-4
//! bits 29..0   index of the first word in elevations.bin
//! ```
//!
//! A profile holds `1 + ceil(length / 2 m)` samples. Raw profiles store one
//! Q28.4 sample per 16-bit word; delta profiles store the first sample
//! verbatim followed by signed differences packed high bits first.

use velograph_common::bits::BitField;
use velograph_common::error::Error;
use velograph_common::{q28_4, Result};

use super::buffer::{read_i32, read_u16};
use crate::EdgeId;

pub const EDGES_FILE: &str = "edges.bin";
pub const PROFILE_IDS_FILE: &str = "profile_ids.bin";
pub const ELEVATIONS_FILE: &str = "elevations.bin";

pub const EDGE_BYTES: usize = 10;
pub const PROFILE_ID_BYTES: usize = 4;
pub const ELEVATION_BYTES: usize = 2;

const OFFSET_TARGET: usize = 0;
const OFFSET_LENGTH: usize = 4;
const OFFSET_ELEVATION_GAIN: usize = 6;
const OFFSET_ATTRIBUTES: usize = 8;

const PROFILE_KIND: BitField = BitField::new(30, 2);
const PROFILE_START: BitField = BitField::new(0, 30);

/// Indexed by `i % 2` for sample `i`.
const DELTA_8: [BitField; 2] = [BitField::new(0, 8), BitField::new(8, 8)];
/// Indexed by `i % 4` for sample `i`.
const DELTA_4: [BitField; 4] = [
    BitField::new(0, 4),
    BitField::new(12, 4),
    BitField::new(8, 4),
    BitField::new(4, 4),
];

/// Encoding of an edge's elevation samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    None,
    Raw,
    Delta8,
    Delta4,
}

impl ProfileKind {
    fn from_tag(tag: u32) -> Self {
        match tag {
            0 => ProfileKind::None,
            1 => ProfileKind::Raw,
            2 => ProfileKind::Delta8,
            _ => ProfileKind::Delta4,
        }
    }

    /// Number of 16-bit words holding `count` samples.
    fn word_count(self, count: usize) -> usize {
        match self {
            ProfileKind::None => 0,
            ProfileKind::Raw => count,
            ProfileKind::Delta8 => 1 + (count - 1).div_ceil(2),
            ProfileKind::Delta4 => 1 + (count - 1).div_ceil(4),
        }
    }
}

#[derive(Debug)]
pub struct GraphEdges<B> {
    edges: B,
    profile_ids: B,
    elevations: B,
}

impl<B: AsRef<[u8]>> GraphEdges<B> {
    /// Wrap the three edge buffers after checking that their sizes agree.
    /// Profile ranges are checked separately by [`GraphEdges::validate_profiles`].
    pub fn new(edges: B, profile_ids: B, elevations: B) -> Result<Self> {
        check_multiple(EDGES_FILE, edges.as_ref().len(), EDGE_BYTES)?;
        check_multiple(PROFILE_IDS_FILE, profile_ids.as_ref().len(), PROFILE_ID_BYTES)?;
        check_multiple(ELEVATIONS_FILE, elevations.as_ref().len(), ELEVATION_BYTES)?;

        let edge_count = edges.as_ref().len() / EDGE_BYTES;
        let profile_count = profile_ids.as_ref().len() / PROFILE_ID_BYTES;
        if edge_count != profile_count {
            return Err(Error::malformed(
                PROFILE_IDS_FILE,
                format!("{profile_count} profile ids for {edge_count} edges"),
            ));
        }
        Ok(Self {
            edges,
            profile_ids,
            elevations,
        })
    }

    pub fn count(&self) -> usize {
        self.edges.as_ref().len() / EDGE_BYTES
    }

    pub fn is_inverted(&self, edge_id: EdgeId) -> bool {
        self.raw_target(edge_id) < 0
    }

    pub fn target_node_id(&self, edge_id: EdgeId) -> u32 {
        let target = self.raw_target(edge_id);
        (if target < 0 { !target } else { target }) as u32
    }

    pub fn length(&self, edge_id: EdgeId) -> f64 {
        q28_4::unsigned_16_as_f64(self.length_q(edge_id))
    }

    pub fn elevation_gain(&self, edge_id: EdgeId) -> f64 {
        q28_4::unsigned_16_as_f64(read_u16(self.edges.as_ref(), self.offset(edge_id) + OFFSET_ELEVATION_GAIN))
    }

    pub fn attributes_index(&self, edge_id: EdgeId) -> u16 {
        read_u16(self.edges.as_ref(), self.offset(edge_id) + OFFSET_ATTRIBUTES)
    }

    pub fn profile_kind(&self, edge_id: EdgeId) -> ProfileKind {
        ProfileKind::from_tag(PROFILE_KIND.unsigned(self.profile_id(edge_id)))
    }

    pub fn has_profile(&self, edge_id: EdgeId) -> bool {
        self.profile_kind(edge_id) != ProfileKind::None
    }

    /// Elevation samples along the edge in travel direction, or an empty
    /// vector if the edge has no profile.
    pub fn profile_samples(&self, edge_id: EdgeId) -> Vec<f32> {
        let kind = self.profile_kind(edge_id);
        if kind == ProfileKind::None {
            return Vec::new();
        }
        let count = self.sample_count(edge_id);
        let start = PROFILE_START.unsigned(self.profile_id(edge_id)) as usize;
        let word = |i: usize| i32::from(read_u16(self.elevations.as_ref(), (start + i) * ELEVATION_BYTES));

        let mut samples = Vec::with_capacity(count);
        match kind {
            ProfileKind::Raw => samples.extend((0..count).map(|i| q28_4::as_f32(word(i)))),
            ProfileKind::Delta8 | ProfileKind::Delta4 => {
                let mut current = word(0);
                samples.push(q28_4::as_f32(current));
                for i in 1..count {
                    current += if kind == ProfileKind::Delta8 {
                        DELTA_8[i % 2].signed(word(i.div_ceil(2)))
                    } else {
                        DELTA_4[i % 4].signed(word(i.div_ceil(4)))
                    };
                    samples.push(q28_4::as_f32(current));
                }
            }
            ProfileKind::None => {}
        }

        if self.is_inverted(edge_id) {
            samples.reverse();
        }
        samples
    }

    /// Check that every profile lies within `elevations.bin`.
    pub fn validate_profiles(&self) -> Result<()> {
        let words = self.elevations.as_ref().len() / ELEVATION_BYTES;
        for edge_id in 0..self.count() as EdgeId {
            let kind = self.profile_kind(edge_id);
            let start = PROFILE_START.unsigned(self.profile_id(edge_id)) as usize;
            let end = start + kind.word_count(self.sample_count(edge_id));
            if kind != ProfileKind::None && end > words {
                return Err(Error::malformed(
                    PROFILE_IDS_FILE,
                    format!("profile of edge {edge_id} ends at word {end}, past {words}"),
                ));
            }
        }
        Ok(())
    }

    fn sample_count(&self, edge_id: EdgeId) -> usize {
        // 32 is the Q28.4 encoding of the 2 m sample spacing.
        1 + usize::from(self.length_q(edge_id)).div_ceil(32)
    }

    fn length_q(&self, edge_id: EdgeId) -> u16 {
        read_u16(self.edges.as_ref(), self.offset(edge_id) + OFFSET_LENGTH)
    }

    fn raw_target(&self, edge_id: EdgeId) -> i32 {
        read_i32(self.edges.as_ref(), self.offset(edge_id) + OFFSET_TARGET)
    }

    fn profile_id(&self, edge_id: EdgeId) -> i32 {
        read_i32(self.profile_ids.as_ref(), edge_id as usize * PROFILE_ID_BYTES)
    }

    #[inline]
    fn offset(&self, edge_id: EdgeId) -> usize {
        edge_id as usize * EDGE_BYTES
    }
}

fn check_multiple(file: &str, len: usize, record: usize) -> Result<()> {
    if len % record == 0 {
        Ok(())
    } else {
        Err(Error::malformed(
            file,
            format!("size {len} is not a multiple of {record}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn edge(target: i32, length_q: u16, gain_q: u16, attributes: u16) -> Vec<u8> {
        let mut bytes = target.to_be_bytes().to_vec();
        bytes.extend_from_slice(&length_q.to_be_bytes());
        bytes.extend_from_slice(&gain_q.to_be_bytes());
        bytes.extend_from_slice(&attributes.to_be_bytes());
        bytes
    }

    fn single_edge(target: i32, length_q: u16, profile_id: u32, elevations: &[u16]) -> GraphEdges<Vec<u8>> {
        GraphEdges::new(
            edge(target, length_q, 0x10b, 2022),
            profile_id.to_be_bytes().to_vec(),
            words(elevations),
        )
        .unwrap()
    }

    #[test]
    fn test_edge_fields() {
        let edges = single_edge(!12, 0x10b, 0, &[]);
        assert!(edges.is_inverted(0));
        assert_eq!(edges.target_node_id(0), 12);
        assert_eq!(edges.length(0), 16.6875);
        assert_eq!(edges.elevation_gain(0), 16.6875);
        assert_eq!(edges.attributes_index(0), 2022);
        assert!(!edges.has_profile(0));
        assert!(edges.profile_samples(0).is_empty());
    }

    #[test]
    fn test_raw_profile() {
        // 0x40 = 4 m, so 3 samples.
        let edges = single_edge(5, 0x40, (1 << 30) | 1, &[0, 0x1800, 0x1810, 0x1820]);
        assert_eq!(edges.profile_kind(0), ProfileKind::Raw);
        assert_eq!(edges.profile_samples(0), vec![384.0, 385.0, 386.0]);
    }

    #[test]
    fn test_delta_8_profile() {
        // length 0x10b: 1 + ceil(267 / 32) = 10 samples.
        let elevations = [0x180C, 0xFEFF, 0xFFFE, 0x0000, 0xFFFF, 0x0002];
        let edges = single_edge(7, 0x10b, 2 << 30, &elevations);
        let expected: Vec<f32> = vec![
            384.75, 384.625, 384.5625, 384.5, 384.375, 384.375, 384.375, 384.3125, 384.25, 384.25,
        ];
        assert_eq!(edges.profile_samples(0), expected);
    }

    #[test]
    fn test_delta_4_profile_inverted() {
        // 0x50 = 5 m: 4 samples, deltas +1, -2, +7, then reversed
        let elevations = [0x1000, 0x1E70];
        let edges = single_edge(!3, 0x50, 3 << 30, &elevations);
        assert_eq!(
            edges.profile_samples(0),
            vec![256.375, 255.9375, 256.0625, 256.0]
        );
    }

    #[test]
    fn test_delta_8_profile_inverted() {
        // 0x40 = 4 m: 3 samples, deltas +18 (high byte) and -5 (low byte)
        let edges = single_edge(!2, 0x40, 2 << 30, &[0x1000, 0x12FB]);
        assert_eq!(edges.profile_samples(0), vec![256.8125, 257.125, 256.0]);
    }

    #[test]
    fn test_delta_4_profile_spans_two_words() {
        // 0x100 = 16 m: 9 samples. Deltas +3, -1, +5, -8 fill the first
        // packed word from bit 12 down to bit 0, -2, +7, -5, +1 the second.
        let elevations = [0x1000, 0x3F58, 0xE7B1];
        let edges = single_edge(4, 0x100, 3 << 30, &elevations);
        let expected: Vec<f32> = vec![
            256.0, 256.1875, 256.125, 256.4375, 255.9375, 255.8125, 256.25, 255.9375, 256.0,
        ];
        assert_eq!(edges.profile_samples(0), expected);
    }

    #[test]
    fn test_validate_profiles() {
        let ok = single_edge(7, 0x10b, 2 << 30, &[0; 6]);
        assert!(ok.validate_profiles().is_ok());
        let short = single_edge(7, 0x10b, 2 << 30, &[0; 5]);
        assert!(matches!(
            short.validate_profiles(),
            Err(Error::MalformedData { ref file, .. }) if file == PROFILE_IDS_FILE
        ));
    }

    #[test]
    fn test_rejects_mismatched_sizes() {
        assert!(GraphEdges::new(vec![0u8; 10], vec![0u8; 8], Vec::new()).is_err());
        assert!(GraphEdges::new(vec![0u8; 11], vec![0u8; 4], Vec::new()).is_err());
        assert!(GraphEdges::new(vec![0u8; 10], vec![0u8; 4], vec![0u8; 3]).is_err());
    }
}
