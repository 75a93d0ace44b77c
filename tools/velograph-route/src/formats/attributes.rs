//! attributes.bin - 62-bit OSM attribute sets, one big-endian u64 each
//!
//! Bit `i` of a set stands for the `i`-th [`Attribute`].

use std::fmt;

use velograph_common::error::{check_argument, Error};
use velograph_common::Result;

use super::buffer::read_u64;

pub const FILE_NAME: &str = "attributes.bin";
pub const ATTRIBUTE_SET_BYTES: usize = 8;

macro_rules! attributes {
    ($($variant:ident => ($key:literal, $value:literal),)*) => {
        /// OSM key/value pairs relevant to bike routing, in bit order.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Attribute {
            $($variant,)*
        }

        impl Attribute {
            pub const ALL: &'static [Attribute] = &[$(Attribute::$variant,)*];

            pub fn key(self) -> &'static str {
                match self {
                    $(Attribute::$variant => $key,)*
                }
            }

            pub fn value(self) -> &'static str {
                match self {
                    $(Attribute::$variant => $value,)*
                }
            }
        }
    };
}

attributes! {
    HighwayService => ("highway", "service"),
    HighwayTrack => ("highway", "track"),
    HighwayResidential => ("highway", "residential"),
    HighwayFootway => ("highway", "footway"),
    HighwayPath => ("highway", "path"),
    HighwayUnclassified => ("highway", "unclassified"),
    HighwayTertiary => ("highway", "tertiary"),
    HighwaySecondary => ("highway", "secondary"),
    HighwayPrimary => ("highway", "primary"),
    HighwayCycleway => ("highway", "cycleway"),
    HighwayTrunk => ("highway", "trunk"),
    HighwayPedestrian => ("highway", "pedestrian"),
    HighwayLivingStreet => ("highway", "living_street"),
    HighwaySteps => ("highway", "steps"),
    HighwayMotorway => ("highway", "motorway"),
    HighwayBridleway => ("highway", "bridleway"),
    HighwayRoad => ("highway", "road"),
    HighwayPrimaryLink => ("highway", "primary_link"),
    HighwaySecondaryLink => ("highway", "secondary_link"),
    HighwayTertiaryLink => ("highway", "tertiary_link"),
    HighwayTrunkLink => ("highway", "trunk_link"),
    HighwayMotorwayLink => ("highway", "motorway_link"),

    TracktypeGrade1 => ("tracktype", "grade1"),
    TracktypeGrade2 => ("tracktype", "grade2"),
    TracktypeGrade3 => ("tracktype", "grade3"),
    TracktypeGrade4 => ("tracktype", "grade4"),
    TracktypeGrade5 => ("tracktype", "grade5"),

    SurfaceAsphalt => ("surface", "asphalt"),
    SurfaceUnpaved => ("surface", "unpaved"),
    SurfaceGravel => ("surface", "gravel"),
    SurfacePaved => ("surface", "paved"),
    SurfaceGround => ("surface", "ground"),
    SurfaceConcrete => ("surface", "concrete"),
    SurfaceCompacted => ("surface", "compacted"),
    SurfaceDirt => ("surface", "dirt"),
    SurfaceFineGravel => ("surface", "fine_gravel"),
    SurfaceGrass => ("surface", "grass"),
    SurfacePavingStones => ("surface", "paving_stones"),
    SurfaceSett => ("surface", "sett"),
    SurfaceWood => ("surface", "wood"),
    SurfaceCobblestone => ("surface", "cobblestone"),
    SurfaceSand => ("surface", "sand"),
    SurfaceUnhewnCobblestone => ("surface", "unhewn_cobblestone"),
    SurfaceConcretePlates => ("surface", "concrete:plates"),

    OnewayYes => ("oneway", "yes"),
    OnewayM1 => ("oneway", "-1"),
    OnewayBicycleYes => ("oneway:bicycle", "yes"),
    OnewayBicycleNo => ("oneway:bicycle", "no"),

    VehicleNo => ("vehicle", "no"),
    VehiclePrivate => ("vehicle", "private"),

    AccessNo => ("access", "no"),
    AccessPrivate => ("access", "private"),

    BicycleYes => ("bicycle", "yes"),
    BicycleNo => ("bicycle", "no"),
    BicycleDesignated => ("bicycle", "designated"),
    BicycleDismount => ("bicycle", "dismount"),
    BicycleUseSidepath => ("bicycle", "use_sidepath"),
    BicyclePermissive => ("bicycle", "permissive"),
    BicyclePrivate => ("bicycle", "private"),

    CyclewayOpposite => ("cycleway", "opposite"),
    CyclewayOppositeLane => ("cycleway", "opposite_lane"),
    CyclewayOppositeTrack => ("cycleway", "opposite_track"),
}

impl Attribute {
    #[inline]
    pub fn mask(self) -> u64 {
        1 << self as u32
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

/// Set of [`Attribute`]s stored as a bit mask; bits 62 and 63 are always
/// clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet(u64);

impl AttributeSet {
    pub const EMPTY: AttributeSet = AttributeSet(0);

    pub fn new(bits: u64) -> Result<Self> {
        check_argument(bits >> Attribute::ALL.len() == 0, || {
            format!("attribute bits {bits:#x} name no known attribute")
        })?;
        Ok(Self(bits))
    }

    pub fn of(attributes: &[Attribute]) -> Self {
        Self(attributes.iter().fold(0, |bits, a| bits | a.mask()))
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, attribute: Attribute) -> bool {
        self.0 & attribute.mask() != 0
    }

    pub fn intersects(self, that: AttributeSet) -> bool {
        self.0 & that.0 != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Attribute> {
        Attribute::ALL.iter().copied().filter(move |a| self.contains(*a))
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, attribute) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{attribute}")?;
        }
        f.write_str("}")
    }
}

/// Decode every attribute set of `attributes.bin`.
pub fn decode_attribute_sets(bytes: &[u8]) -> Result<Vec<AttributeSet>> {
    if bytes.len() % ATTRIBUTE_SET_BYTES != 0 {
        return Err(Error::malformed(
            FILE_NAME,
            format!("size {} is not a multiple of {ATTRIBUTE_SET_BYTES}", bytes.len()),
        ));
    }
    (0..bytes.len() / ATTRIBUTE_SET_BYTES)
        .map(|i| {
            AttributeSet::new(read_u64(bytes, i * ATTRIBUTE_SET_BYTES))
                .map_err(|_| Error::malformed(FILE_NAME, format!("attribute set {i} uses unknown bits")))
        })
        .collect()
}
