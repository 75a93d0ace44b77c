//! Routes as continuous functions of the distance travelled
//!
//! A [`Route`] is either a [`SingleRoute`] of contiguous edges or a
//! [`MultiRoute`] chaining child routes. Every positional query clamps its
//! argument into `[0, length]` and walks nested routes iteratively.

mod edge;
mod multi;
mod point;
mod single;

pub use edge::Edge;
pub use multi::MultiRoute;
pub use point::RoutePoint;
pub use single::SingleRoute;

use velograph_common::math;

use crate::geo::PointCh;
use crate::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Single(SingleRoute),
    Multi(MultiRoute),
}

impl Route {
    pub fn length(&self) -> f64 {
        match self {
            Route::Single(single) => single.length(),
            Route::Multi(multi) => multi.length(),
        }
    }

    pub fn edges(&self) -> &[Edge] {
        match self {
            Route::Single(single) => single.edges(),
            Route::Multi(multi) => multi.edges(),
        }
    }

    /// Start point of every edge followed by the end point of the last one.
    pub fn points(&self) -> Vec<PointCh> {
        let edges = self.edges();
        let mut points: Vec<PointCh> = edges.iter().map(Edge::from_point).collect();
        points.extend(edges.last().map(Edge::to_point));
        points
    }

    /// Number of single routes this route is made of.
    pub fn segment_count(&self) -> usize {
        match self {
            Route::Single(_) => 1,
            Route::Multi(multi) => multi.segment_count(),
        }
    }

    /// Index of the nested single route containing `position`. A position on
    /// the boundary between two children belongs to the first of them.
    ///
    /// Each child before the one containing `position` contributes one more
    /// than its own index at its end, so a child ending with zero-length
    /// sub-routes contributes less than its segment count.
    pub fn index_of_segment_at(&self, position: f64) -> usize {
        let mut position = clamp_position(position, self.length());
        let mut route = self;
        let mut index = 0;
        loop {
            match route {
                Route::Single(_) => return index,
                Route::Multi(multi) => {
                    let children = multi.segments();
                    let (last, leading) = match children.split_last() {
                        Some(split) => split,
                        None => return index,
                    };
                    let mut next = last;
                    for (child, span) in leading.iter().zip(multi.index_spans()) {
                        if position > child.length() {
                            index += *span;
                            position -= child.length();
                        } else {
                            next = child;
                            break;
                        }
                    }
                    route = next;
                }
            }
        }
    }

    pub fn point_at(&self, position: f64) -> PointCh {
        let (single, position) = self.locate(position);
        single.point_at(position)
    }

    /// Elevation at `position`, or `None` if the edge there has no profile.
    pub fn elevation_at(&self, position: f64) -> Option<f64> {
        let (single, position) = self.locate(position);
        single.elevation_at(position)
    }

    pub fn node_closest_to(&self, position: f64) -> NodeId {
        let (single, position) = self.locate(position);
        single.node_closest_to(position)
    }

    /// Closest point of the route to `point`. On equal distances the point
    /// found first along the route wins.
    pub fn point_closest_to(&self, point: &PointCh) -> RoutePoint {
        let mut best = RoutePoint::NONE;
        let mut pending = vec![(0.0, self)];
        while let Some((offset, route)) = pending.pop() {
            match route {
                Route::Single(single) => {
                    best = best.min(single.point_closest_to(point).with_position_shifted_by(offset));
                }
                Route::Multi(multi) => {
                    for (child, start) in multi.segments().iter().zip(multi.starts()).rev() {
                        pending.push((offset + start, child));
                    }
                }
            }
        }
        best
    }

    /// Single route containing `position` and the position within it.
    fn locate(&self, position: f64) -> (&SingleRoute, f64) {
        let mut route = self;
        let mut position = position;
        loop {
            position = clamp_position(position, route.length());
            match route {
                Route::Single(single) => return (single, position),
                Route::Multi(multi) => {
                    let (child, relative) = multi.child_at(position);
                    route = child;
                    position = relative;
                }
            }
        }
    }
}

impl From<SingleRoute> for Route {
    fn from(route: SingleRoute) -> Self {
        Route::Single(route)
    }
}

impl From<MultiRoute> for Route {
    fn from(route: MultiRoute) -> Self {
        Route::Multi(route)
    }
}

/// Clamp into `[0, length]`, mapping NaN to the start.
pub(crate) fn clamp_position(position: f64, length: f64) -> f64 {
    if position.is_nan() {
        0.0
    } else {
        math::clamp_unchecked(0.0, position, length)
    }
}
