//! Nearest-node lookup over the sector grid

use crate::geo::PointCh;
use crate::graph::Graph;
use crate::NodeId;

impl Graph {
    /// Node closest to `point` among those at most `search_distance` metres
    /// away, or `None` if there is none.
    ///
    /// Candidate sectors are scanned in ascending cell index and their nodes
    /// in ascending identity; on equal distances the last node scanned wins.
    /// A negative or NaN `search_distance` finds nothing.
    pub fn node_closest_to(&self, point: &PointCh, search_distance: f64) -> Option<NodeId> {
        if !(search_distance >= 0.0) {
            return None;
        }
        let max_squared = search_distance * search_distance;
        let mut best: Option<(NodeId, f64)> = None;

        for sector in self.sectors().sectors_in_area(point, search_distance) {
            for node_id in sector.node_ids() {
                let squared = self.node_point(node_id).squared_distance_to(point);
                if squared > max_squared {
                    continue;
                }
                if best.map_or(true, |(_, best_squared)| squared <= best_squared) {
                    best = Some((node_id, squared));
                }
            }
        }
        best.map(|(node_id, _)| node_id)
    }
}
