//! nodes.bin - 12-byte node records
//!
//! ```text
//! offset  size  field
//! 0       4     E coordinate, Q28.4
//! 4       4     N coordinate, Q28.4
//! 8       4     out edges: bits 31..28 degree, bits 27..0 first edge id
//! ```

use velograph_common::bits::BitField;
use velograph_common::error::Error;
use velograph_common::{q28_4, Result};

use super::buffer::read_i32;
use crate::{EdgeId, NodeId};

pub const FILE_NAME: &str = "nodes.bin";
pub const NODE_BYTES: usize = 12;

const OFFSET_E: usize = 0;
const OFFSET_N: usize = 4;
const OFFSET_OUT_EDGES: usize = 8;

const OUT_DEGREE: BitField = BitField::new(28, 4);
const FIRST_EDGE: BitField = BitField::new(0, 28);

/// Decoder over the node records of a dataset.
#[derive(Debug)]
pub struct GraphNodes<B> {
    buffer: B,
}

impl<B: AsRef<[u8]>> GraphNodes<B> {
    pub fn new(buffer: B) -> Result<Self> {
        let len = buffer.as_ref().len();
        if len % NODE_BYTES != 0 {
            return Err(Error::malformed(
                FILE_NAME,
                format!("size {len} is not a multiple of {NODE_BYTES}"),
            ));
        }
        Ok(Self { buffer })
    }

    pub fn count(&self) -> usize {
        self.buffer.as_ref().len() / NODE_BYTES
    }

    pub fn node_e(&self, node_id: NodeId) -> f64 {
        q28_4::as_f64(self.field(node_id, OFFSET_E))
    }

    pub fn node_n(&self, node_id: NodeId) -> f64 {
        q28_4::as_f64(self.field(node_id, OFFSET_N))
    }

    pub fn out_degree(&self, node_id: NodeId) -> u32 {
        OUT_DEGREE.unsigned(self.field(node_id, OFFSET_OUT_EDGES))
    }

    /// Identity of the `edge_index`-th out-edge of `node_id`.
    pub fn edge_id(&self, node_id: NodeId, edge_index: u32) -> EdgeId {
        debug_assert!(edge_index < self.out_degree(node_id));
        FIRST_EDGE.unsigned(self.field(node_id, OFFSET_OUT_EDGES)) + edge_index
    }

    #[inline]
    fn field(&self, node_id: NodeId, offset: usize) -> i32 {
        read_i32(self.buffer.as_ref(), node_id as usize * NODE_BYTES + offset)
    }
}
