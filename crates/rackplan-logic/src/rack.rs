//! Rack and mounted-asset descriptors.
//!
//! Units are numbered `1..=size` in internal coordinates regardless of the
//! rack's numbering direction. Direction only decides which way a
//! multi-unit span grows from its anchor and the order rows are drawn in.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlacementError;
use crate::face::{DepthClass, Face, FaceSet};
use crate::location::LocationId;

/// Asset identifier.
pub type AssetId = u64;

/// Unit-numbering convention of a rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Unit 1 at the top; spans grow toward lower unit numbers.
    #[default]
    #[serde(rename = "downwards")]
    Downward,
    /// Unit 1 at the bottom; spans grow toward higher unit numbers.
    #[serde(rename = "upwards")]
    Upward,
}

impl Direction {
    /// Unit delta from one spanned unit to the next.
    pub fn step(self) -> i64 {
        match self {
            Direction::Downward => -1,
            Direction::Upward => 1,
        }
    }
}

/// Opaque placement identifier handed back to the caller's selection
/// mechanism. Never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementToken(pub String);

impl fmt::Display for PlacementToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlacementToken {
    fn from(s: &str) -> Self {
        PlacementToken(s.to_string())
    }
}

/// An asset as mounted in a rack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    #[serde(default)]
    pub label: Option<String>,
    /// First unit of the footprint; `<= 0` means not placed.
    #[serde(default)]
    pub position: i32,
    pub vsize: u32,
    /// Raw depth class as stored on the record, see [`Asset::depth_class`].
    pub hsize: u8,
    /// Occupied faces. Authoritative when present.
    #[serde(default, alias = "fib")]
    pub faces: Option<FaceSet>,
    #[serde(default, alias = "location_id")]
    pub owning_location_id: Option<LocationId>,
}

impl Asset {
    pub fn is_placed(&self) -> bool {
        self.position > 0
    }

    pub fn depth_class(&self) -> Result<DepthClass, PlacementError> {
        DepthClass::try_from(self.hsize)
    }

    /// Faces this asset fills at every unit it spans. Falls back to the
    /// depth class default when the record stores no face set, and to every
    /// face when the depth class is unknown too.
    pub fn occupied_faces(&self) -> FaceSet {
        match self.faces {
            Some(faces) => faces,
            None => self
                .depth_class()
                .map(DepthClass::default_faces)
                .unwrap_or(FaceSet::FULL),
        }
    }

    /// No stored faces and no valid depth class to derive them from.
    pub fn has_unknown_shape(&self) -> bool {
        self.faces.is_none() && self.depth_class().is_err()
    }

    pub fn span(&self, direction: Direction) -> Span {
        Span::new(self.position, self.vsize, direction)
    }
}

/// A run of contiguous units starting at an anchor and growing in the
/// rack's direction. A zero-length request still covers its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub anchor: i32,
    pub vsize: u32,
    pub direction: Direction,
}

impl Span {
    pub fn new(anchor: i32, vsize: u32, direction: Direction) -> Self {
        Self {
            anchor,
            vsize,
            direction,
        }
    }

    fn len(&self) -> i64 {
        i64::from(self.vsize.max(1))
    }

    fn far_end(&self) -> i64 {
        i64::from(self.anchor) + self.direction.step() * (self.len() - 1)
    }

    /// Lowest unit number covered.
    pub fn low(&self) -> i64 {
        i64::from(self.anchor).min(self.far_end())
    }

    /// Highest unit number covered.
    pub fn high(&self) -> i64 {
        i64::from(self.anchor).max(self.far_end())
    }

    /// Whether every covered unit lies in `1..=size`.
    pub fn fits(&self, size: u32) -> bool {
        self.low() >= 1 && self.high() <= i64::from(size)
    }

    /// Covered units inside `1..=size`, walked from the anchor outward.
    pub fn units_within(&self, size: u32) -> impl Iterator<Item = i32> {
        let lo = self.low().max(1);
        let hi = self.high().min(i64::from(size));
        let count = (hi - lo + 1).max(0);
        let anchor = i64::from(self.anchor).clamp(lo, hi.max(lo));
        let step = self.direction.step();
        (0..count).map(move |k| (anchor + step * k) as i32)
    }

    /// Number of covered units outside `1..=size`.
    pub fn units_outside(&self, size: u32) -> u64 {
        let lo = self.low().max(1);
        let hi = self.high().min(i64::from(size));
        let inside = (hi - lo + 1).max(0);
        (self.len() - inside) as u64
    }
}

/// A rack-capable location as seen by the occupancy and placement core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub size: u32,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub front_positions: BTreeMap<i32, PlacementToken>,
    #[serde(default)]
    pub back_positions: BTreeMap<i32, PlacementToken>,
    #[serde(default)]
    pub position_labels: HashMap<PlacementToken, String>,
}

impl Rack {
    /// An empty rack. Fails for a zero-unit rack.
    pub fn new(size: u32, direction: Direction) -> Result<Self, PlacementError> {
        let rack = Self {
            size,
            direction,
            assets: Vec::new(),
            front_positions: BTreeMap::new(),
            back_positions: BTreeMap::new(),
            position_labels: HashMap::new(),
        };
        rack.validate()?;
        Ok(rack)
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }

    /// Unit numbers are `i32`, so the size must fit in one.
    pub fn validate(&self) -> Result<(), PlacementError> {
        self.top_unit().map(|_| ())
    }

    /// Highest unit number, or the size error for an unusable rack.
    pub fn top_unit(&self) -> Result<i32, PlacementError> {
        match i32::try_from(self.size) {
            Ok(top) if top >= 1 => Ok(top),
            _ => Err(PlacementError::InvalidRackSize(self.size)),
        }
    }

    pub fn contains_unit(&self, unit: i32) -> bool {
        unit >= 1 && i64::from(unit) <= i64::from(self.size)
    }

    pub fn span(&self, anchor: i32, vsize: u32) -> Span {
        Span::new(anchor, vsize, self.direction)
    }

    pub fn front_anchor_id(&self, unit: i32) -> Option<&PlacementToken> {
        self.front_positions.get(&unit)
    }

    pub fn back_anchor_id(&self, unit: i32) -> Option<&PlacementToken> {
        self.back_positions.get(&unit)
    }

    /// Placement token for anchoring at `face` of `unit`. Interior has none.
    pub fn anchor_id(&self, unit: i32, face: Face) -> Option<&PlacementToken> {
        match face {
            Face::Front => self.front_anchor_id(unit),
            Face::Back => self.back_anchor_id(unit),
            Face::Interior => None,
        }
    }

    pub fn position_label(&self, token: &PlacementToken) -> Option<&str> {
        self.position_labels.get(token).map(String::as_str)
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Units in the order rows are drawn, top of the rack first. An invalid
    /// rack draws no rows.
    pub fn display_units(&self) -> impl Iterator<Item = i32> {
        let size = self.top_unit().unwrap_or(0);
        let downward = self.direction == Direction::Downward;
        (1..=size).map(move |i| if downward { i } else { size - i + 1 })
    }
}
