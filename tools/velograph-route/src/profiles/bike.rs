//! City bike profile - attribute semantics for everyday cycling
//!
//! Motor roads and closed ways are forbidden, one-way restrictions apply
//! unless bicycles are exempt, and the remaining ways are weighted by class
//! and surface. Every finite factor is at least 1.

use super::CostFunction;
use crate::formats::{Attribute, AttributeSet};
use crate::graph::Graph;
use crate::{EdgeId, NodeId};

use Attribute::*;

const MOTOR_ROADS: [Attribute; 4] = [HighwayMotorway, HighwayMotorwayLink, HighwayTrunk, HighwayTrunkLink];
const CLOSED: [Attribute; 4] = [AccessNo, AccessPrivate, VehicleNo, VehiclePrivate];
const BICYCLE_ALLOWED: [Attribute; 3] = [BicycleYes, BicycleDesignated, BicyclePermissive];
const BICYCLE_FORBIDDEN: [Attribute; 2] = [BicycleNo, BicyclePrivate];
const CONTRAFLOW: [Attribute; 4] = [
    OnewayBicycleNo,
    CyclewayOpposite,
    CyclewayOppositeLane,
    CyclewayOppositeTrack,
];
const ROUGH_SURFACES: [Attribute; 8] = [
    SurfaceUnpaved,
    SurfaceGravel,
    SurfaceGround,
    SurfaceDirt,
    SurfaceGrass,
    SurfaceSand,
    SurfaceCobblestone,
    SurfaceUnhewnCobblestone,
];

const ROUGH_SURFACE_PENALTY: f64 = 0.5;

pub struct CityBike<'g> {
    graph: &'g Graph,
}

impl<'g> CityBike<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Factor for an edge with `attributes`, traversed against its way
    /// direction when `inverted`.
    pub fn factor(attributes: AttributeSet, inverted: bool) -> f64 {
        let any = |list: &[Attribute]| attributes.intersects(AttributeSet::of(list));

        if any(&MOTOR_ROADS) || any(&BICYCLE_FORBIDDEN) {
            return f64::INFINITY;
        }
        if any(&CLOSED) && !any(&BICYCLE_ALLOWED) {
            return f64::INFINITY;
        }

        let against_oneway = (inverted
            && (attributes.contains(OnewayYes) || attributes.contains(OnewayBicycleYes)))
            || (!inverted && attributes.contains(OnewayM1));
        if against_oneway && !any(&CONTRAFLOW) {
            return f64::INFINITY;
        }

        let mut factor = if attributes.contains(BicycleDesignated) {
            1.0
        } else {
            class_factor(attributes)
        };
        if attributes.contains(BicycleDismount) {
            factor = factor.max(3.0);
        }
        if any(&ROUGH_SURFACES) {
            factor += ROUGH_SURFACE_PENALTY;
        }
        factor
    }
}

fn class_factor(attributes: AttributeSet) -> f64 {
    let highway = Attribute::ALL
        .iter()
        .copied()
        .find(|a| a.key() == "highway" && attributes.contains(*a));

    match highway {
        Some(HighwayCycleway) => 1.0,
        Some(HighwayResidential | HighwayLivingStreet) => 1.1,
        Some(HighwayUnclassified) => 1.2,
        Some(HighwayService) => 1.3,
        Some(HighwayPath) => 1.4,
        Some(HighwayPedestrian | HighwayRoad) => 1.5,
        Some(HighwayTertiary | HighwayTertiaryLink) => 1.6,
        Some(HighwayTrack) => track_factor(attributes),
        Some(HighwaySecondary | HighwaySecondaryLink | HighwayFootway | HighwayBridleway) => 2.0,
        Some(HighwayPrimary | HighwayPrimaryLink) => 2.5,
        Some(HighwaySteps) => 4.0,
        _ => 1.5,
    }
}

fn track_factor(attributes: AttributeSet) -> f64 {
    if attributes.contains(TracktypeGrade1) {
        1.2
    } else if attributes.contains(TracktypeGrade2) {
        1.4
    } else if attributes.contains(TracktypeGrade3) {
        1.8
    } else if attributes.contains(TracktypeGrade4) {
        2.2
    } else if attributes.contains(TracktypeGrade5) {
        2.8
    } else {
        1.6
    }
}

impl CostFunction for CityBike<'_> {
    fn cost_factor(&self, _node_id: NodeId, edge_id: EdgeId) -> f64 {
        Self::factor(
            self.graph.edge_attributes(edge_id),
            self.graph.edge_is_inverted(edge_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(attributes: &[Attribute], inverted: bool) -> f64 {
        CityBike::factor(AttributeSet::of(attributes), inverted)
    }

    #[test]
    fn test_motor_roads_forbidden() {
        assert!(factor(&[HighwayMotorway], false).is_infinite());
        assert!(factor(&[HighwayTrunkLink, BicycleYes], false).is_infinite());
    }

    #[test]
    fn test_access_restrictions() {
        assert!(factor(&[HighwayService, AccessPrivate], false).is_infinite());
        assert!(factor(&[HighwayService, VehicleNo], false).is_infinite());
        assert_eq!(factor(&[HighwayService, AccessNo, BicycleYes], false), 1.3);
        assert!(factor(&[HighwayCycleway, BicycleNo], false).is_infinite());
    }

    #[test]
    fn test_oneway_direction() {
        assert_eq!(factor(&[HighwayResidential, OnewayYes], false), 1.1);
        assert!(factor(&[HighwayResidential, OnewayYes], true).is_infinite());
        assert!(factor(&[HighwayResidential, OnewayM1], false).is_infinite());
        assert_eq!(factor(&[HighwayResidential, OnewayM1], true), 1.1);
        assert_eq!(factor(&[HighwayResidential, OnewayYes, OnewayBicycleNo], true), 1.1);
        assert_eq!(factor(&[HighwayResidential, OnewayYes, CyclewayOppositeLane], true), 1.1);
        assert!(factor(&[HighwayCycleway, OnewayBicycleYes], true).is_infinite());
    }

    #[test]
    fn test_class_and_surface_factors() {
        assert_eq!(factor(&[HighwayCycleway], false), 1.0);
        assert_eq!(factor(&[HighwayPrimary, BicycleDesignated], false), 1.0);
        assert_eq!(factor(&[HighwayTrack, TracktypeGrade3], false), 1.8);
        assert!((factor(&[HighwayTrack, SurfaceGravel], false) - 2.1).abs() < 1e-12);
        assert_eq!(factor(&[HighwaySteps], false), 4.0);
        assert_eq!(factor(&[HighwayPedestrian, BicycleDismount], false), 3.0);
        assert_eq!(factor(&[], false), 1.5);
    }

    #[test]
    fn test_finite_factors_never_below_one() {
        for attribute in Attribute::ALL {
            for inverted in [false, true] {
                let f = factor(&[*attribute], inverted);
                assert!(f >= 1.0, "{attribute} gave {f}");
            }
        }
    }
}
