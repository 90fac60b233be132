//! Legal anchor positions for a new or relocated asset.
//!
//! A footprint is a vertical span plus a depth class. For every unit and
//! every anchor face the depth class allows, the footprint is legal when
//! its whole span stays inside the rack and none of the faces it needs is
//! blocked on any spanned unit. Cells owned by the asset being relocated
//! (highlighted cells) never block.
//!
//! ```
//! use rackplan_logic::face::Face;
//! use rackplan_logic::occupancy;
//! use rackplan_logic::placement::{legal_anchors, Footprint};
//! use rackplan_logic::rack::{Direction, Rack};
//!
//! let rack = Rack::new(4, Direction::Downward).unwrap();
//! let map = occupancy::build(&rack, None);
//! let anchors = legal_anchors(&map, &rack, Footprint::new(2, 3).unwrap()).unwrap();
//! assert!(anchors.contains(4, Face::Front));
//! assert!(!anchors.contains(1, Face::Front)); // would reach unit 0
//! assert!(!anchors.contains(4, Face::Back)); // full depth anchors at the front only
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlacementError;
use crate::face::{AnchorGroup, DepthClass, Face, FaceSet};
use crate::location::LocationId;
use crate::occupancy::OccupancyMap;
use crate::rack::{PlacementToken, Rack, Span};

/// Shape of an asset to be placed. Only constructible through [`Footprint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFootprint")]
pub struct Footprint {
    vsize: u32,
    depth: DepthClass,
}

impl Footprint {
    /// Validate a raw (vsize, hsize) pair.
    pub fn new(vsize: u32, hsize: u8) -> Result<Self, PlacementError> {
        if vsize < 1 {
            return Err(PlacementError::InvalidVsize(vsize));
        }
        Ok(Self {
            vsize,
            depth: DepthClass::try_from(hsize)?,
        })
    }

    pub fn vsize(&self) -> u32 {
        self.vsize
    }

    pub fn depth(&self) -> DepthClass {
        self.depth
    }
}

#[derive(Deserialize)]
struct RawFootprint {
    vsize: u32,
    #[serde(alias = "hsize")]
    depth: u8,
}

impl TryFrom<RawFootprint> for Footprint {
    type Error = PlacementError;

    fn try_from(raw: RawFootprint) -> Result<Self, Self::Error> {
        Footprint::new(raw.vsize, raw.depth)
    }
}

/// A caller's request to choose a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    #[serde(alias = "new_vsize")]
    pub vsize: u32,
    #[serde(alias = "new_hsize")]
    pub hsize: u8,
    /// Location whose asset is being relocated, if any.
    #[serde(default)]
    pub highlight_location_id: Option<LocationId>,
}

impl PlacementRequest {
    pub fn footprint(&self) -> Result<Footprint, PlacementError> {
        Footprint::new(self.vsize, self.hsize)
    }
}

/// A legal starting position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegalAnchor {
    pub unit: i32,
    pub face: Face,
    /// Placement token for the caller, if the rack supplies one for this cell.
    pub token: Option<PlacementToken>,
}

/// Legal anchors, ordered by unit then face.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnchorSet {
    anchors: Vec<LegalAnchor>,
}

impl AnchorSet {
    pub fn contains(&self, unit: i32, face: Face) -> bool {
        self.anchors
            .binary_search_by(|a| (a.unit, a.face).cmp(&(unit, face)))
            .is_ok()
    }

    pub fn get(&self, unit: i32, face: Face) -> Option<&LegalAnchor> {
        self.anchors
            .binary_search_by(|a| (a.unit, a.face).cmp(&(unit, face)))
            .ok()
            .map(|i| &self.anchors[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LegalAnchor> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn into_vec(self) -> Vec<LegalAnchor> {
        self.anchors
    }
}

impl<'a> IntoIterator for &'a AnchorSet {
    type Item = &'a LegalAnchor;
    type IntoIter = std::slice::Iter<'a, LegalAnchor>;

    fn into_iter(self) -> Self::IntoIter {
        self.anchors.iter()
    }
}

/// Every legal anchor for `footprint` given a prebuilt occupancy snapshot.
pub fn legal_anchors(
    occupancy: &OccupancyMap,
    rack: &Rack,
    footprint: Footprint,
) -> Result<AnchorSet, PlacementError> {
    let size = rack.top_unit()?;
    if footprint.vsize == 0 {
        return Err(PlacementError::InvalidVsize(footprint.vsize));
    }

    if footprint.vsize > rack.size {
        debug!(
            "Footprint vsize {} exceeds rack size {}, no anchors",
            footprint.vsize, rack.size
        );
        return Ok(AnchorSet::default());
    }

    let groups = footprint.depth.anchor_groups();
    let mut anchors = Vec::new();
    // Units ascend and groups are front before back, so the result is sorted.
    for unit in 1..=size {
        let span = rack.span(unit, footprint.vsize);
        for group in groups {
            if group_is_free(occupancy, rack, span, group.required) {
                anchors.push(LegalAnchor {
                    unit,
                    face: group.anchor,
                    token: rack.anchor_id(unit, group.anchor).cloned(),
                });
            }
        }
    }

    debug!(
        "{} legal anchor(s) for vsize {} depth {}",
        anchors.len(),
        footprint.vsize,
        footprint.depth.hsize()
    );
    Ok(AnchorSet { anchors })
}

/// Re-check a single candidate, e.g. a position the caller submitted.
pub fn is_legal_anchor(
    occupancy: &OccupancyMap,
    rack: &Rack,
    footprint: Footprint,
    unit: i32,
    face: Face,
) -> bool {
    if rack.validate().is_err() || !rack.contains_unit(unit) {
        return false;
    }
    let Some(group) = anchor_group(footprint.depth, face) else {
        return false;
    };
    group_is_free(occupancy, rack, rack.span(unit, footprint.vsize), group.required)
}

/// Build occupancy for the request's highlight and list every legal anchor.
pub fn plan(
    rack: &Rack,
    request: &PlacementRequest,
) -> Result<(OccupancyMap, AnchorSet), PlacementError> {
    let footprint = request.footprint()?;
    rack.validate()?;
    let occupancy = OccupancyMap::build(rack, request.highlight_location_id);
    let anchors = legal_anchors(&occupancy, rack, footprint)?;
    Ok((occupancy, anchors))
}

fn anchor_group(depth: DepthClass, face: Face) -> Option<&'static AnchorGroup> {
    depth.anchor_groups().iter().find(|g| g.anchor == face)
}

fn group_is_free(occupancy: &OccupancyMap, rack: &Rack, span: Span, required: FaceSet) -> bool {
    if !span.fits(rack.size) {
        return false;
    }
    span.units_within(rack.size)
        .all(|unit| required.iter().all(|face| !occupancy.is_blocking(unit, face)))
}
