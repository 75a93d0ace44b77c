use velograph_common::error::check_argument;
use velograph_common::Result;

use super::{Edge, Route};

/// A route made of consecutive child routes, each of which may itself be
/// composite.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiRoute {
    segments: Vec<Route>,
    /// `starts[i]` is the position at which child `i` begins; the last entry
    /// is the total length.
    starts: Vec<f64>,
    edges: Vec<Edge>,
    segment_count: usize,
    /// `index_spans[i]` is how far child `i` advances the segment index of
    /// the positions after it: one past its index at its own end.
    index_spans: Vec<usize>,
}

impl MultiRoute {
    pub fn new(segments: Vec<Route>) -> Result<Self> {
        check_argument(!segments.is_empty(), || "a multi-route needs at least one segment")?;

        let mut starts = Vec::with_capacity(segments.len() + 1);
        starts.push(0.0);
        let mut total = 0.0;
        for segment in &segments {
            total += segment.length();
            starts.push(total);
        }
        let edges = segments.iter().flat_map(|s| s.edges().iter().cloned()).collect();
        let segment_count = segments.iter().map(Route::segment_count).sum();
        let index_spans = segments
            .iter()
            .map(|s| s.index_of_segment_at(s.length()) + 1)
            .collect();

        Ok(Self {
            segments,
            starts,
            edges,
            segment_count,
            index_spans,
        })
    }

    pub fn length(&self) -> f64 {
        self.starts[self.segments.len()]
    }

    pub fn segments(&self) -> &[Route] {
        &self.segments
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(super) fn starts(&self) -> &[f64] {
        &self.starts
    }

    pub(super) fn index_spans(&self) -> &[usize] {
        &self.index_spans
    }

    /// Number of single routes this route is ultimately made of.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Child containing `position` (already clamped to the route) and the
    /// position relative to that child. A boundary position belongs to the
    /// child starting there, except at the very end.
    pub(super) fn child_at(&self, position: f64) -> (&Route, f64) {
        let index = if position >= self.length() {
            self.segments.len() - 1
        } else {
            (self.starts.partition_point(|&s| s <= position) - 1).min(self.segments.len() - 1)
        };
        (&self.segments[index], position - self.starts[index])
    }
}
