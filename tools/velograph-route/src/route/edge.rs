use velograph_common::functions::Sampled;
use velograph_common::math;

use crate::geo::PointCh;
use crate::graph::Graph;
use crate::{EdgeId, NodeId};

/// A graph edge resolved into the values a route needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    from_node_id: NodeId,
    to_node_id: NodeId,
    from_point: PointCh,
    to_point: PointCh,
    length: f64,
    profile: Option<Sampled>,
}

impl Edge {
    pub fn new(
        from_node_id: NodeId,
        to_node_id: NodeId,
        from_point: PointCh,
        to_point: PointCh,
        length: f64,
        profile: Option<Sampled>,
    ) -> Self {
        Self {
            from_node_id,
            to_node_id,
            from_point,
            to_point,
            length,
            profile,
        }
    }

    pub fn of(graph: &Graph, edge_id: EdgeId, from_node_id: NodeId, to_node_id: NodeId) -> Self {
        Self::new(
            from_node_id,
            to_node_id,
            graph.node_point(from_node_id),
            graph.node_point(to_node_id),
            graph.edge_length(edge_id),
            graph.edge_profile(edge_id),
        )
    }

    pub fn from_node_id(&self) -> NodeId {
        self.from_node_id
    }

    pub fn to_node_id(&self) -> NodeId {
        self.to_node_id
    }

    pub fn from_point(&self) -> PointCh {
        self.from_point
    }

    pub fn to_point(&self) -> PointCh {
        self.to_point
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn profile(&self) -> Option<&Sampled> {
        self.profile.as_ref()
    }

    /// Signed position along the edge line of the projection of `point`.
    /// Not clamped; 0 for an edge whose endpoints coincide.
    pub fn position_closest_to(&self, point: &PointCh) -> f64 {
        let (from, to) = (&self.from_point, &self.to_point);
        if from == to {
            return 0.0;
        }
        math::projection_length(from.e(), from.n(), to.e(), to.n(), point.e(), point.n())
    }

    /// Point at `position` metres from the start, clamped to the edge.
    pub fn point_at(&self, position: f64) -> PointCh {
        if self.length == 0.0 {
            return self.from_point;
        }
        let t = math::clamp_unchecked(0.0, position / self.length, 1.0);
        PointCh::new_unchecked(
            math::interpolate(self.from_point.e(), self.to_point.e(), t),
            math::interpolate(self.from_point.n(), self.to_point.n(), t),
        )
    }

    /// Elevation at `position`, or `None` if the edge has no profile.
    pub fn elevation_at(&self, position: f64) -> Option<f64> {
        self.profile.as_ref().map(|profile| profile.apply(position))
    }
}
