use crate::geo::PointCh;

/// A point of a route closest to some reference point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutePoint {
    point: Option<PointCh>,
    position: f64,
    distance_to_reference: f64,
}

impl RoutePoint {
    /// No point at all, infinitely far from any reference.
    pub const NONE: RoutePoint = RoutePoint {
        point: None,
        position: f64::NAN,
        distance_to_reference: f64::INFINITY,
    };

    pub fn new(point: PointCh, position: f64, distance_to_reference: f64) -> Self {
        Self {
            point: Some(point),
            position,
            distance_to_reference,
        }
    }

    pub fn point(&self) -> Option<PointCh> {
        self.point
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn distance_to_reference(&self) -> f64 {
        self.distance_to_reference
    }

    pub fn is_none(&self) -> bool {
        self.point.is_none()
    }

    pub fn with_position_shifted_by(self, difference: f64) -> Self {
        Self {
            position: self.position + difference,
            ..self
        }
    }

    /// The closer of the two points; `self` on a tie.
    pub fn min(self, that: RoutePoint) -> Self {
        if self.distance_to_reference <= that.distance_to_reference {
            self
        } else {
            that
        }
    }

    pub fn min_with(self, point: PointCh, position: f64, distance_to_reference: f64) -> Self {
        if self.distance_to_reference <= distance_to_reference {
            self
        } else {
            Self::new(point, position, distance_to_reference)
        }
    }
}
