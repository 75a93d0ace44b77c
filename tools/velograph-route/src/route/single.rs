use velograph_common::error::check_argument;
use velograph_common::{math, Result};

use super::{clamp_position, Edge, RoutePoint};
use crate::geo::PointCh;
use crate::NodeId;

/// A route made of contiguous edges, with the positions at which each edge
/// starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleRoute {
    edges: Vec<Edge>,
    /// `positions[i]` is the start of edge `i`; the last entry is the length.
    positions: Vec<f64>,
}

impl SingleRoute {
    pub fn new(edges: Vec<Edge>) -> Result<Self> {
        check_argument(!edges.is_empty(), || "a route needs at least one edge")?;
        let mut positions = Vec::with_capacity(edges.len() + 1);
        positions.push(0.0);
        let mut total = 0.0;
        for edge in &edges {
            total += edge.length();
            positions.push(total);
        }
        Ok(Self { edges, positions })
    }

    pub fn length(&self) -> f64 {
        self.positions[self.edges.len()]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn points(&self) -> Vec<PointCh> {
        let mut points: Vec<PointCh> = self.edges.iter().map(Edge::from_point).collect();
        points.extend(self.edges.last().map(Edge::to_point));
        points
    }

    pub fn point_at(&self, position: f64) -> PointCh {
        let (index, offset) = self.edge_at(position);
        self.edges[index].point_at(offset)
    }

    pub fn elevation_at(&self, position: f64) -> Option<f64> {
        let (index, offset) = self.edge_at(position);
        self.edges[index].elevation_at(offset)
    }

    /// Endpoint of the edge at `position` closest along the route; the start
    /// node wins when both are equally far.
    pub fn node_closest_to(&self, position: f64) -> NodeId {
        let (index, offset) = self.edge_at(position);
        let edge = &self.edges[index];
        if offset <= edge.length() - offset {
            edge.from_node_id()
        } else {
            edge.to_node_id()
        }
    }

    /// Closest point of the route to `point`; the first one found along the
    /// route wins ties.
    pub fn point_closest_to(&self, point: &PointCh) -> RoutePoint {
        let mut best = RoutePoint::NONE;
        for (edge, start) in self.edges.iter().zip(&self.positions) {
            let position = math::clamp_unchecked(0.0, edge.position_closest_to(point), edge.length());
            let closest = edge.point_at(position);
            best = best.min_with(closest, start + position, closest.distance_to(point));
        }
        best
    }

    /// Index of the edge containing `position` (clamped to the route) and
    /// the offset into it. A position on the boundary between two edges
    /// belongs to the second one, except at the very end of the route.
    fn edge_at(&self, position: f64) -> (usize, f64) {
        let position = clamp_position(position, self.length());
        let index = (self.positions.partition_point(|&p| p <= position) - 1).min(self.edges.len() - 1);
        (index, position - self.positions[index])
    }
}
