//! Multi-waypoint itineraries
//!
//! Waypoints are snapped to graph nodes, consecutive pairs become legs, and
//! the legs are searched independently in parallel before being chained into
//! one [`MultiRoute`].

use rayon::prelude::*;

use velograph_common::error::check_argument;
use velograph_common::Result;

use crate::elevation::{compute_profile, ElevationProfile};
use crate::geo::PointCh;
use crate::graph::Graph;
use crate::query::RouteComputer;
use crate::route::{MultiRoute, Route, SingleRoute};
use crate::NodeId;

/// A requested point together with the graph node it snapped to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub point: PointCh,
    pub node_id: NodeId,
}

impl Waypoint {
    /// Snap `point` to the closest node within `search_distance` metres.
    pub fn snap(graph: &Graph, point: PointCh, search_distance: f64) -> Option<Self> {
        graph
            .node_closest_to(&point, search_distance)
            .map(|node_id| Self { point, node_id })
    }
}

/// A planned route through a list of waypoints.
#[derive(Clone, Debug)]
pub struct Itinerary {
    waypoints: Vec<Waypoint>,
    /// Always a multi-route with one child per non-empty leg.
    route: Route,
    profile: ElevationProfile,
}

impl Itinerary {
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn profile(&self) -> &ElevationProfile {
        &self.profile
    }

    /// Index of the waypoint leg containing `position`. Legs between two
    /// waypoints on the same node have no route segment and are skipped
    /// over when counting.
    pub fn index_of_non_empty_segment_at(&self, position: f64) -> usize {
        let mut index = self.route.index_of_segment_at(position);
        let mut leg = 0;
        while leg <= index && leg + 1 < self.waypoints.len() {
            if self.waypoints[leg].node_id == self.waypoints[leg + 1].node_id {
                index += 1;
            }
            leg += 1;
        }
        index
    }
}

/// Plan a route visiting `waypoints` in order.
///
/// Returns `None` if any leg has no route, or if every leg joins two
/// waypoints on the same node.
pub fn plan_itinerary(
    computer: &RouteComputer<'_>,
    waypoints: &[Waypoint],
    max_step_length: f64,
) -> Result<Option<Itinerary>> {
    check_argument(waypoints.len() >= 2, || {
        format!("an itinerary needs at least 2 waypoints, got {}", waypoints.len())
    })?;

    let legs: Vec<(NodeId, NodeId)> = waypoints
        .windows(2)
        .map(|pair| (pair[0].node_id, pair[1].node_id))
        .filter(|(from, to)| from != to)
        .collect();
    if legs.is_empty() {
        tracing::debug!(waypoints = waypoints.len(), "all waypoints on one node");
        return Ok(None);
    }

    let routes: Vec<Option<SingleRoute>> = legs
        .par_iter()
        .map(|&(from, to)| computer.best_route_between(from, to))
        .collect::<Result<_>>()?;
    let Some(routes) = routes.into_iter().collect::<Option<Vec<_>>>() else {
        tracing::debug!(legs = legs.len(), "itinerary has an unreachable leg");
        return Ok(None);
    };

    let route = Route::Multi(MultiRoute::new(routes.into_iter().map(Route::Single).collect())?);
    let profile = compute_profile(&route, max_step_length)?;
    tracing::debug!(legs = legs.len(), length = route.length(), "itinerary planned");

    Ok(Some(Itinerary {
        waypoints: waypoints.to_vec(),
        route,
        profile,
    }))
}

#[cfg(test)]
mod tests {
    use velograph_test::{DatasetBuilder, EdgeSpec, ProfileSpec};

    use super::*;
    use crate::graph::GraphBuffers;
    use crate::profiles::Uniform;

    /// Chain 0 - 1 - 2 - 3 of two-way roads, 100 m apart eastwards.
    fn chain() -> Graph {
        let mut builder = DatasetBuilder::new();
        let nodes: Vec<NodeId> = (0..4)
            .map(|i| builder.add_node(2_600_000.0 + 100.0 * f64::from(i), 1_200_000.0))
            .collect();
        for pair in nodes.windows(2) {
            builder.add_road(pair[0], pair[1], 100.0, 0, ProfileSpec::Raw(vec![500.0; 51]));
        }
        // A one-way spur out of node 3 to an isolated node.
        let spur = builder.add_node(2_600_300.0, 1_200_100.0);
        builder.add_edge(EdgeSpec::new(spur, nodes[3], 100.0));
        let dataset = builder.build().unwrap();
        Graph::from_buffers(GraphBuffers {
            nodes: dataset.nodes.into(),
            sectors: dataset.sectors.into(),
            edges: dataset.edges.into(),
            profile_ids: dataset.profile_ids.into(),
            elevations: dataset.elevations.into(),
            attributes: dataset.attributes.into(),
        })
        .unwrap()
    }

    fn waypoint(graph: &Graph, node_id: NodeId) -> Waypoint {
        Waypoint {
            point: graph.node_point(node_id),
            node_id,
        }
    }

    #[test]
    fn test_snap() {
        let graph = chain();
        let near_two = PointCh::new(2_600_210.0, 1_200_005.0).unwrap();
        assert_eq!(Waypoint::snap(&graph, near_two, 50.0).map(|w| w.node_id), Some(2));
        assert_eq!(Waypoint::snap(&graph, near_two, 5.0), None);
    }

    #[test]
    fn test_plan_skips_same_node_legs() {
        let graph = chain();
        let computer = RouteComputer::new(&graph, &Uniform);
        let waypoints = [0, 1, 1, 3].map(|n| waypoint(&graph, n));
        let itinerary = plan_itinerary(&computer, &waypoints, 5.0).unwrap().unwrap();

        assert_eq!(itinerary.route().length(), 300.0);
        assert_eq!(itinerary.route().segment_count(), 2);
        assert_eq!(itinerary.profile().samples().len(), 61);
        assert_eq!(itinerary.profile().max_elevation(), 500.0);
        assert_eq!(itinerary.index_of_non_empty_segment_at(50.0), 0);
        // The second route segment is the third waypoint leg.
        assert_eq!(itinerary.index_of_non_empty_segment_at(250.0), 2);
    }

    #[test]
    fn test_plan_without_route() {
        let graph = chain();
        let computer = RouteComputer::new(&graph, &Uniform);
        let same = [2, 2].map(|n| waypoint(&graph, n));
        assert!(plan_itinerary(&computer, &same, 5.0).unwrap().is_none());

        // Node 4 is only reachable from itself outwards.
        let unreachable = [0, 4].map(|n| waypoint(&graph, n));
        assert!(plan_itinerary(&computer, &unreachable, 5.0).unwrap().is_none());

        assert!(plan_itinerary(&computer, &same[..1], 5.0).is_err());
    }
}
