use super::CostFunction;
use crate::{EdgeId, NodeId};

/// Every edge costs its length: routes are shortest paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uniform;

impl CostFunction for Uniform {
    fn cost_factor(&self, _node_id: NodeId, _edge_id: EdgeId) -> f64 {
        1.0
    }
}
