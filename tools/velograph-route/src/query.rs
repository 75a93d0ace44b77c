//! Best-route search between two nodes
//!
//! Dijkstra over cost-weighted edge lengths, with the queue keyed by the
//! settled cost plus the straight-line distance to the destination (A*).
//! The straight-line key never overestimates as long as every finite cost
//! factor is at least 1, which built-in profiles guarantee.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use velograph_common::error::{check_argument, Error};
use velograph_common::Result;

use crate::graph::Graph;
use crate::profiles::CostFunction;
use crate::route::{Edge, SingleRoute};
use crate::NodeId;

/// Settled nodes between two polls of the cancellation flag.
const CANCEL_POLL_INTERVAL: usize = 1024;

const NO_PREDECESSOR: NodeId = NodeId::MAX;

/// Queue entry for the search; ordered so that `BinaryHeap` pops the lowest
/// key first and, among equal keys, the lowest node id.
#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    key: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: reverse ordering
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Computes cost-minimal routes over a graph for one cost function.
///
/// Holds shared references only; concurrent searches on the same computer
/// are independent.
#[derive(Clone, Copy)]
pub struct RouteComputer<'g> {
    graph: &'g Graph,
    cost_function: &'g (dyn CostFunction + 'g),
    precheck: bool,
}

impl<'g> RouteComputer<'g> {
    pub fn new(graph: &'g Graph, cost_function: &'g (dyn CostFunction + 'g)) -> Self {
        Self {
            graph,
            cost_function,
            precheck: true,
        }
    }

    /// Disable the start-node rejection performed before searching. Results
    /// are the same either way.
    pub fn without_precheck(mut self) -> Self {
        self.precheck = false;
        self
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Best route from `start` to `end`, or `None` if `end` is unreachable.
    /// Fails if the two nodes are equal or unknown.
    pub fn best_route_between(&self, start: NodeId, end: NodeId) -> Result<Option<SingleRoute>> {
        self.search(start, end, None)
    }

    /// As [`RouteComputer::best_route_between`], but gives up with
    /// [`Error::Cancelled`] once `cancel` is observed set.
    pub fn best_route_between_cancellable(
        &self,
        start: NodeId,
        end: NodeId,
        cancel: &AtomicBool,
    ) -> Result<Option<SingleRoute>> {
        self.search(start, end, Some(cancel))
    }

    fn search(&self, start: NodeId, end: NodeId, cancel: Option<&AtomicBool>) -> Result<Option<SingleRoute>> {
        let graph = self.graph;
        let node_count = graph.node_count();
        check_argument(start != end, || format!("start and end are both node {start}"))?;
        check_argument((start as usize) < node_count && (end as usize) < node_count, || {
            format!("nodes {start} and {end} must be below {node_count}")
        })?;

        if self.precheck && !self.has_usable_out_edge(start) {
            tracing::debug!(start, end, "start node has no usable out-edge");
            return Ok(None);
        }

        let end_point = graph.node_point(end);
        let mut distance = vec![f64::INFINITY; node_count];
        let mut predecessor = vec![NO_PREDECESSOR; node_count];
        let mut closed = vec![false; node_count];
        let mut queue = BinaryHeap::new();

        distance[start as usize] = 0.0;
        queue.push(QueueEntry {
            key: graph.node_point(start).distance_to(&end_point),
            node: start,
        });

        let mut settled = 0usize;
        while let Some(QueueEntry { node, .. }) = queue.pop() {
            if closed[node as usize] {
                continue;
            }
            if node == end {
                tracing::debug!(start, end, settled, cost = distance[end as usize], "route found");
                return self.reconstruct(start, end, &predecessor).map(Some);
            }
            closed[node as usize] = true;
            settled += 1;

            if let Some(flag) = cancel {
                if settled % CANCEL_POLL_INTERVAL == 0 && flag.load(AtomicOrdering::Relaxed) {
                    tracing::info!(start, end, settled, "route search cancelled");
                    return Err(Error::Cancelled);
                }
            }

            let node_distance = distance[node as usize];
            for edge_id in graph.node_out_edges(node) {
                let target = graph.edge_target_node_id(edge_id);
                if closed[target as usize] {
                    continue;
                }
                let candidate = node_distance
                    + self.cost_function.cost_factor(node, edge_id) * graph.edge_length(edge_id);
                if candidate < distance[target as usize] {
                    distance[target as usize] = candidate;
                    predecessor[target as usize] = node;
                    queue.push(QueueEntry {
                        key: candidate + graph.node_point(target).distance_to(&end_point),
                        node: target,
                    });
                }
            }
        }

        tracing::debug!(start, end, settled, "no route");
        Ok(None)
    }

    fn has_usable_out_edge(&self, node: NodeId) -> bool {
        self.graph
            .node_out_edges(node)
            .any(|edge_id| self.cost_function.cost_factor(node, edge_id).is_finite())
    }

    /// Walk the predecessor chain back from `end`, taking for each step the
    /// first out-edge of the predecessor that reaches the current node.
    fn reconstruct(&self, start: NodeId, end: NodeId, predecessor: &[NodeId]) -> Result<SingleRoute> {
        let graph = self.graph;
        let mut edges = Vec::new();
        let mut node = end;
        while node != start {
            let from = predecessor[node as usize];
            let edge_id = graph
                .node_out_edges(from)
                .find(|&e| graph.edge_target_node_id(e) == node)
                .ok_or_else(|| Error::invalid_argument(format!("no edge from {from} to {node}")))?;
            edges.push(Edge::of(graph, edge_id, from, node));
            node = from;
        }
        edges.reverse();
        SingleRoute::new(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_pops_lowest_key_then_lowest_node() {
        let mut queue = BinaryHeap::new();
        for (key, node) in [(3.0, 1), (1.0, 9), (1.0, 4), (2.0, 0)] {
            queue.push(QueueEntry { key, node });
        }
        let order: Vec<NodeId> = std::iter::from_fn(|| queue.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![4, 9, 0, 1]);
    }
}
