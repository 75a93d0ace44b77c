//! CLI commands for velograph-route

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::formats::sectors::SECTOR_COUNT;
use crate::geo::{self, PointCh};
use crate::graph::Graph;
use crate::planner::{plan_itinerary, Itinerary, Waypoint};
use crate::profiles::Profile;
use crate::query::RouteComputer;

#[derive(Parser)]
#[command(name = "velograph-route")]
#[command(about = "Bike routing over a compact road graph", long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a route through two or more points
    Route {
        /// Dataset directory
        #[arg(long)]
        data: PathBuf,

        /// Start point (lat,lon in degrees)
        #[arg(long, value_parser = parse_lat_lon)]
        from: LatLon,

        /// End point (lat,lon in degrees)
        #[arg(long, value_parser = parse_lat_lon)]
        to: LatLon,

        /// Intermediate points, visited in order
        #[arg(long, value_parser = parse_lat_lon)]
        via: Vec<LatLon>,

        /// Cost profile (uniform, city-bike)
        #[arg(long, default_value = "city-bike")]
        profile: Profile,

        /// Radius around each point to look for a graph node (metres)
        #[arg(long, default_value = "500")]
        search_radius: f64,

        /// Maximum spacing of elevation samples (metres)
        #[arg(long, default_value = "5")]
        max_step: f64,

        /// Print the route summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the graph node closest to a point
    Nearest {
        /// Dataset directory
        #[arg(long)]
        data: PathBuf,

        /// Query point (lat,lon in degrees)
        #[arg(long, value_parser = parse_lat_lon)]
        at: LatLon,

        /// Search radius (metres)
        #[arg(long, default_value = "500")]
        search_radius: f64,
    },

    /// Print dataset statistics
    Inspect {
        /// Dataset directory
        #[arg(long)]
        data: PathBuf,
    },
}

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn to_local(self) -> Option<PointCh> {
        geo::to_local(self.lon.to_radians(), self.lat.to_radians())
    }
}

pub fn parse_lat_lon(s: &str) -> std::result::Result<LatLon, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lon', got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    Ok(LatLon {
        lat: parse(lat)?,
        lon: parse(lon)?,
    })
}

/// Summary of a planned itinerary, printed by `route`.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub profile: &'static str,
    pub length_m: f64,
    pub legs: usize,
    pub edges: usize,
    pub total_ascent_m: f64,
    pub total_descent_m: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    /// Route points as `[lat, lon]` in degrees.
    pub points: Vec<[f64; 2]>,
    pub elevations: Vec<f32>,
}

impl RouteSummary {
    pub fn of(profile: Profile, itinerary: &Itinerary) -> Self {
        let route = itinerary.route();
        let elevation = itinerary.profile();
        Self {
            profile: profile.name(),
            length_m: route.length(),
            legs: route.segment_count(),
            edges: route.edges().len(),
            total_ascent_m: elevation.total_ascent(),
            total_descent_m: elevation.total_descent(),
            min_elevation_m: elevation.min_elevation(),
            max_elevation_m: elevation.max_elevation(),
            points: route
                .points()
                .iter()
                .map(|p| [p.lat().to_degrees(), p.lon().to_degrees()])
                .collect(),
            elevations: elevation.samples().to_vec(),
        }
    }
}

fn load_graph(data: &Path) -> Result<Graph> {
    let start = Instant::now();
    let graph = Graph::load_from(data)
        .with_context(|| format!("failed to load dataset from {}", data.display()))?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dataset ready"
    );
    Ok(graph)
}

fn snap(graph: &Graph, at: LatLon, search_radius: f64) -> Result<Waypoint> {
    let point = at
        .to_local()
        .ok_or_else(|| anyhow!("{},{} lies outside the covered area", at.lat, at.lon))?;
    Waypoint::snap(graph, point, search_radius)
        .ok_or_else(|| anyhow!("no road within {search_radius} m of {},{}", at.lat, at.lon))
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Route {
                data,
                from,
                to,
                via,
                profile,
                search_radius,
                max_step,
                json,
            } => {
                let graph = load_graph(&data)?;
                let points: Vec<LatLon> = std::iter::once(from).chain(via).chain(std::iter::once(to)).collect();
                let waypoints = points
                    .iter()
                    .map(|&p| snap(&graph, p, search_radius))
                    .collect::<Result<Vec<_>>>()?;

                let cost_function = profile.cost_function(&graph);
                let computer = RouteComputer::new(&graph, cost_function.as_ref());
                let start = Instant::now();
                let itinerary = plan_itinerary(&computer, &waypoints, max_step)
                    .context("route planning failed")?
                    .ok_or_else(|| anyhow!("no route found"))?;
                tracing::info!(
                    profile = profile.name(),
                    waypoints = waypoints.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "route planned"
                );

                let summary = RouteSummary::of(profile, &itinerary);
                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!("Profile: {}", summary.profile);
                    println!("Length: {:.0} m ({:.2} km)", summary.length_m, summary.length_m / 1000.0);
                    println!("Legs: {}, edges: {}", summary.legs, summary.edges);
                    println!(
                        "Ascent: {:.0} m, descent: {:.0} m",
                        summary.total_ascent_m, summary.total_descent_m
                    );
                    println!(
                        "Elevation: {:.0} m to {:.0} m",
                        summary.min_elevation_m, summary.max_elevation_m
                    );
                }
            }

            Commands::Nearest {
                data,
                at,
                search_radius,
            } => {
                let graph = load_graph(&data)?;
                let waypoint = snap(&graph, at, search_radius)?;
                let node = graph.node_point(waypoint.node_id);
                println!(
                    "Node {} at E {:.1} N {:.1}, {:.1} m away",
                    waypoint.node_id,
                    node.e(),
                    node.n(),
                    node.distance_to(&waypoint.point)
                );
            }

            Commands::Inspect { data } => {
                let graph = load_graph(&data)?;
                let sectors = graph.sectors();
                let occupied = (0..SECTOR_COUNT)
                    .filter(|&i| !sectors.sector(i).node_ids().is_empty())
                    .count();
                let inverted = (0..graph.edge_count() as u32)
                    .filter(|&e| graph.edge_is_inverted(e))
                    .count();
                let profiled = (0..graph.edge_count() as u32)
                    .filter(|&e| graph.edge_profile(e).is_some())
                    .count();
                println!("Nodes: {}", graph.node_count());
                println!("Edges: {} ({} inverted, {} with profile)", graph.edge_count(), inverted, profiled);
                println!("Attribute sets: {}", graph.attribute_set_count());
                println!("Occupied sectors: {} of {}", occupied, SECTOR_COUNT);
            }
        }

        Ok(())
    }
}
