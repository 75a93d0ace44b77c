//! Read-only road graph backed by the six dataset files
//!
//! `Graph` validates its buffers once at construction; afterwards every
//! accessor is infallible for identities below `node_count()` /
//! `edge_count()` and panics for anything else.

use std::path::Path;
use std::time::Instant;

use velograph_common::error::Error;
use velograph_common::functions::Sampled;
use velograph_common::Result;

use crate::formats::{attributes, edges, nodes, sectors};
use crate::formats::{AttributeSet, Buffer, GraphEdges, GraphNodes, GraphSectors};
use crate::geo::{PointCh, SwissBounds};
use crate::{EdgeId, NodeId};

/// Raw contents of a dataset directory.
#[derive(Debug)]
pub struct GraphBuffers {
    pub nodes: Buffer,
    pub sectors: Buffer,
    pub edges: Buffer,
    pub profile_ids: Buffer,
    pub elevations: Buffer,
    pub attributes: Buffer,
}

impl GraphBuffers {
    /// Memory-map every file of the dataset directory `dir`.
    pub fn map(dir: &Path) -> Result<Self> {
        let map = |name: &str| Buffer::map(&dir.join(name));
        Ok(Self {
            nodes: map(nodes::FILE_NAME)?,
            sectors: map(sectors::FILE_NAME)?,
            edges: map(edges::EDGES_FILE)?,
            profile_ids: map(edges::PROFILE_IDS_FILE)?,
            elevations: map(edges::ELEVATIONS_FILE)?,
            attributes: map(attributes::FILE_NAME)?,
        })
    }
}

#[derive(Debug)]
pub struct Graph {
    nodes: GraphNodes<Buffer>,
    sectors: GraphSectors<Buffer>,
    edges: GraphEdges<Buffer>,
    attribute_sets: Vec<AttributeSet>,
}

impl Graph {
    /// Load the dataset stored in directory `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let started = Instant::now();
        let graph = Self::from_buffers(GraphBuffers::map(dir)?)?;
        tracing::debug!(
            dir = %dir.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            attribute_sets = graph.attribute_set_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "graph loaded"
        );
        Ok(graph)
    }

    pub fn from_buffers(buffers: GraphBuffers) -> Result<Self> {
        let graph = Self {
            nodes: GraphNodes::new(buffers.nodes)?,
            sectors: GraphSectors::new(buffers.sectors)?,
            edges: GraphEdges::new(buffers.edges, buffers.profile_ids, buffers.elevations)?,
            attribute_sets: attributes::decode_attribute_sets(&buffers.attributes)?,
        };
        graph.validate()?;
        Ok(graph)
    }

    fn validate(&self) -> Result<()> {
        let node_count = self.node_count();
        let edge_count = self.edge_count();

        for node_id in 0..node_count as NodeId {
            let (e, n) = (self.nodes.node_e(node_id), self.nodes.node_n(node_id));
            if !SwissBounds::contains_en(e, n) {
                return Err(Error::malformed(
                    nodes::FILE_NAME,
                    format!("node {node_id} at ({e}, {n}) lies outside the valid area"),
                ));
            }
            let degree = self.nodes.out_degree(node_id);
            if degree > 0 && self.nodes.edge_id(node_id, degree - 1) as usize >= edge_count {
                return Err(Error::malformed(
                    nodes::FILE_NAME,
                    format!("out-edges of node {node_id} exceed the {edge_count} edges"),
                ));
            }
        }

        self.sectors.check_ranges(node_count)?;

        for edge_id in 0..edge_count as EdgeId {
            if self.edges.target_node_id(edge_id) as usize >= node_count {
                return Err(Error::malformed(
                    edges::EDGES_FILE,
                    format!("edge {edge_id} targets a missing node"),
                ));
            }
            if usize::from(self.edges.attributes_index(edge_id)) >= self.attribute_sets.len() {
                return Err(Error::malformed(
                    edges::EDGES_FILE,
                    format!("edge {edge_id} uses a missing attribute set"),
                ));
            }
        }

        self.edges.validate_profiles()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.count()
    }

    pub fn attribute_set_count(&self) -> usize {
        self.attribute_sets.len()
    }

    pub fn node_point(&self, node_id: NodeId) -> PointCh {
        PointCh::new_unchecked(self.nodes.node_e(node_id), self.nodes.node_n(node_id))
    }

    pub fn node_out_degree(&self, node_id: NodeId) -> u32 {
        self.nodes.out_degree(node_id)
    }

    pub fn node_out_edge_id(&self, node_id: NodeId, edge_index: u32) -> EdgeId {
        self.nodes.edge_id(node_id, edge_index)
    }

    /// Out-edge identities of `node_id`, in stored order.
    pub fn node_out_edges(&self, node_id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.node_out_degree(node_id)).map(move |k| self.nodes.edge_id(node_id, k))
    }

    pub fn edge_target_node_id(&self, edge_id: EdgeId) -> NodeId {
        self.edges.target_node_id(edge_id)
    }

    pub fn edge_is_inverted(&self, edge_id: EdgeId) -> bool {
        self.edges.is_inverted(edge_id)
    }

    pub fn edge_attributes(&self, edge_id: EdgeId) -> AttributeSet {
        self.attribute_sets[usize::from(self.edges.attributes_index(edge_id))]
    }

    pub fn edge_length(&self, edge_id: EdgeId) -> f64 {
        self.edges.length(edge_id)
    }

    pub fn edge_elevation_gain(&self, edge_id: EdgeId) -> f64 {
        self.edges.elevation_gain(edge_id)
    }

    /// Elevation along the edge as a function of the distance from its
    /// start, or `None` if the edge carries no profile.
    pub fn edge_profile(&self, edge_id: EdgeId) -> Option<Sampled> {
        if !self.edges.has_profile(edge_id) {
            return None;
        }
        Some(Sampled::new_unchecked(
            self.edges.profile_samples(edge_id),
            self.edge_length(edge_id),
        ))
    }

    pub(crate) fn sectors(&self) -> &GraphSectors<Buffer> {
        &self.sectors
    }
}

#[cfg(test)]
mod tests {
    use velograph_test::{DatasetBuilder, EdgeSpec, ProfileSpec};

    use super::*;
    use crate::formats::Attribute;

    fn buffers(nodes: Vec<u8>, edges: Vec<u8>, profile_ids: Vec<u8>, attributes: Vec<u8>) -> GraphBuffers {
        GraphBuffers {
            nodes: nodes.into(),
            sectors: vec![0u8; sectors::SECTOR_COUNT * sectors::SECTOR_BYTES].into(),
            edges: edges.into(),
            profile_ids: profile_ids.into(),
            elevations: Vec::<u8>::new().into(),
            attributes: attributes.into(),
        }
    }

    fn node(e: i32, n: i32, out_edges: u32) -> Vec<u8> {
        [e.to_be_bytes(), n.to_be_bytes(), out_edges.to_be_bytes()].concat()
    }

    fn edge(target: i32, length_q: u16, attributes: u16) -> Vec<u8> {
        let mut bytes = target.to_be_bytes().to_vec();
        bytes.extend_from_slice(&length_q.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&attributes.to_be_bytes());
        bytes
    }

    fn two_node_graph() -> GraphBuffers {
        let nodes = [
            node(2_600_000 << 4, 1_200_000 << 4, 1 << 28),
            node(2_600_010 << 4, 1_200_000 << 4, (1 << 28) | 1),
        ]
        .concat();
        let edges = [edge(1, 160, 0), edge(!0, 160, 1)].concat();
        let attributes = [
            AttributeSet::of(&[Attribute::HighwayResidential]).bits().to_be_bytes(),
            AttributeSet::of(&[Attribute::OnewayYes]).bits().to_be_bytes(),
        ]
        .concat();
        buffers(nodes, edges, vec![0u8; 8], attributes)
    }

    #[test]
    fn test_accessors() {
        let graph = Graph::from_buffers(two_node_graph()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.attribute_set_count(), 2);
        assert_eq!(graph.node_point(1).e(), 2_600_010.0);
        assert_eq!(graph.node_out_edges(1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.edge_target_node_id(1), 0);
        assert!(graph.edge_is_inverted(1));
        assert_eq!(graph.edge_length(0), 10.0);
        assert!(graph.edge_attributes(1).contains(Attribute::OnewayYes));
        assert!(graph.edge_profile(0).is_none());
    }

    #[test]
    fn test_rejects_dangling_edge_target() {
        let mut buffers = two_node_graph();
        buffers.edges = [edge(1, 160, 0), edge(!7, 160, 1)].concat().into();
        let err = Graph::from_buffers(buffers).unwrap_err();
        assert!(matches!(err, Error::MalformedData { ref file, .. } if file == edges::EDGES_FILE));
    }

    #[test]
    fn test_rejects_missing_attribute_set() {
        let mut buffers = two_node_graph();
        buffers.attributes = AttributeSet::EMPTY.bits().to_be_bytes().to_vec().into();
        assert!(Graph::from_buffers(buffers).is_err());
    }

    #[test]
    fn test_rejects_node_outside_bounds() {
        let mut buffers = two_node_graph();
        buffers.nodes = [node(0, 0, 1 << 28), node(2_600_010 << 4, 1_200_000 << 4, (1 << 28) | 1)]
            .concat()
            .into();
        assert!(Graph::from_buffers(buffers).is_err());
    }

    fn edge_between(graph: &Graph, from: NodeId, to: NodeId) -> EdgeId {
        graph
            .node_out_edges(from)
            .find(|&e| graph.edge_target_node_id(e) == to)
            .unwrap()
    }

    fn as_f32(samples: &[f64]) -> Vec<f32> {
        samples.iter().map(|&s| s as f32).collect()
    }

    #[test]
    fn test_edge_profiles_decode_built_samples() {
        let delta_8 = vec![500.0, 503.5, 498.25, 499.0, 505.0, 504.9375];
        let delta_4 = vec![
            300.0, 300.1875, 300.125, 300.4375, 299.9375, 299.8125, 300.25, 299.9375, 300.0,
        ];
        // 1200.53 is stored as 1200.5.
        let raw = vec![1200.53, 1201.0, 1199.75];

        let mut builder = DatasetBuilder::new();
        let a = builder.add_node(2_600_000.0, 1_200_000.0);
        let b = builder.add_node(2_600_010.0, 1_200_000.0);
        let c = builder.add_node(2_600_026.0, 1_200_000.0);
        let d = builder.add_node(2_600_029.0, 1_200_000.0);
        builder
            .add_road(a, b, 10.0, 0, ProfileSpec::Delta8(delta_8.clone()))
            .add_road(b, c, 16.0, 0, ProfileSpec::Delta4(delta_4.clone()))
            .add_road(c, d, 3.0, 0, ProfileSpec::Raw(raw))
            .add_edge(EdgeSpec::new(a, d, 29.0));
        let dataset = builder.build().unwrap();
        let graph = Graph::from_buffers(GraphBuffers {
            nodes: dataset.nodes.into(),
            sectors: dataset.sectors.into(),
            edges: dataset.edges.into(),
            profile_ids: dataset.profile_ids.into(),
            elevations: dataset.elevations.into(),
            attributes: dataset.attributes.into(),
        })
        .unwrap();

        let profile = |from, to| graph.edge_profile(edge_between(&graph, from, to)).unwrap();
        let reversed = |samples: &[f64]| {
            let mut samples = as_f32(samples);
            samples.reverse();
            samples
        };

        assert_eq!(profile(a, b).samples(), as_f32(&delta_8).as_slice());
        assert_eq!(profile(b, a).samples(), reversed(&delta_8).as_slice());
        assert_eq!(profile(b, c).samples(), as_f32(&delta_4).as_slice());
        assert_eq!(profile(c, b).samples(), reversed(&delta_4).as_slice());
        assert_eq!(profile(c, d).samples(), &[1200.5f32, 1201.0, 1199.75]);
        assert_eq!(profile(d, c).samples(), &[1199.75f32, 1201.0, 1200.5]);

        assert_eq!(profile(b, c).x_max(), 16.0);
        assert_eq!(profile(a, b).apply(1.0), 501.75);
        assert!(graph.edge_profile(edge_between(&graph, a, d)).is_none());
    }

    #[test]
    fn test_rejects_overflowing_sector() {
        let mut buffers = two_node_graph();
        let mut sector_bytes = vec![0u8; sectors::SECTOR_COUNT * sectors::SECTOR_BYTES];
        sector_bytes[..4].copy_from_slice(&(-1i32).to_be_bytes());
        sector_bytes[4..6].copy_from_slice(&1u16.to_be_bytes());
        buffers.sectors = sector_bytes.into();
        let err = Graph::from_buffers(buffers).unwrap_err();
        assert!(matches!(err, Error::MalformedData { ref file, .. } if file == sectors::FILE_NAME));
    }

    #[test]
    fn test_load_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Graph::load_from(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
