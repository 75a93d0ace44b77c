//! Cost functions weighting edges during route search
//!
//! A cost function returns a factor multiplied by the edge length. Factors
//! must be at least 1 for the search heuristic to stay admissible, and
//! `f64::INFINITY` forbids the edge entirely.

pub mod bike;
pub mod uniform;

use std::fmt;
use std::str::FromStr;

use velograph_common::error::{suggest_correction, Error};
use velograph_common::Result;

use crate::graph::Graph;
use crate::{EdgeId, NodeId};

pub use bike::CityBike;
pub use uniform::Uniform;

/// Cost factor of traversing `edge_id`, an out-edge of `node_id`.
pub trait CostFunction: Send + Sync {
    fn cost_factor(&self, node_id: NodeId, edge_id: EdgeId) -> f64;
}

impl<F> CostFunction for F
where
    F: Fn(NodeId, EdgeId) -> f64 + Send + Sync,
{
    fn cost_factor(&self, node_id: NodeId, edge_id: EdgeId) -> f64 {
        self(node_id, edge_id)
    }
}

/// Built-in profiles selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Uniform,
    CityBike,
}

impl Profile {
    pub const NAMES: [&'static str; 2] = ["uniform", "city-bike"];

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "uniform" => Ok(Profile::Uniform),
            "city-bike" => Ok(Profile::CityBike),
            _ => {
                let hint = suggest_correction(name, &Self::NAMES)
                    .map(|s| format!("; did you mean '{s}'?"))
                    .unwrap_or_default();
                Err(Error::invalid_argument(format!(
                    "unknown profile '{name}'{hint} (available: {})",
                    Self::NAMES.join(", ")
                )))
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Uniform => "uniform",
            Profile::CityBike => "city-bike",
        }
    }

    pub fn cost_function<'g>(self, graph: &'g Graph) -> Box<dyn CostFunction + 'g> {
        match self {
            Profile::Uniform => Box::new(Uniform),
            Profile::CityBike => Box::new(CityBike::new(graph)),
        }
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
