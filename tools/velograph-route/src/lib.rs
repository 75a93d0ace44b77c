//! Bike routing over a compact, memory-mapped road graph
//!
//! The graph is decoded lazily from flat big-endian buffers ([`formats`]),
//! searched with an A* [`RouteComputer`] weighted by a [`CostFunction`], and
//! the resulting routes are queried as continuous functions of the distance
//! travelled ([`Route`], [`ElevationProfile`]).

pub mod cli;
pub mod elevation;
pub mod formats;
pub mod geo;
pub mod graph;
pub mod planner;
pub mod profiles;
pub mod query;
pub mod route;
pub mod spatial;

/// Index of a node in the graph.
pub type NodeId = u32;
/// Index of a directed edge in the graph.
pub type EdgeId = u32;

pub use elevation::{compute_profile, ElevationProfile};
pub use geo::PointCh;
pub use graph::{Graph, GraphBuffers};
pub use planner::{plan_itinerary, Itinerary, Waypoint};
pub use profiles::{CostFunction, Profile};
pub use query::RouteComputer;
pub use route::{Edge, MultiRoute, Route, RoutePoint, SingleRoute};
