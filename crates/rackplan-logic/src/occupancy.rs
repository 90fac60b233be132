//! Per-unit, per-face occupancy of a rack.
//!
//! The map repeats an asset's owner cell on every unit it spans, so a
//! collision or highlight check is a single lookup per (unit, face). Drawing
//! code that wants one cell per asset uses [`OccupancyMap::span_heads`].
//!
//! Input is not assumed to be clean. Portions of a span that fall outside
//! the rack are left out of the map and listed in [`OccupancyMap::clipped`];
//! cells claimed by two assets are listed in [`OccupancyMap::overlaps`].
//! An asset with no stored faces and an unknown depth class blocks every
//! face and is listed in [`OccupancyMap::unknown_shapes`].

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::face::Face;
use crate::location::LocationId;
use crate::rack::{Asset, AssetId, Rack};

/// An occupied (unit, face) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupancyCell {
    pub owner_id: AssetId,
    pub vsize: u32,
    pub hsize: u8,
    /// Owner is the asset currently being relocated; does not block.
    pub highlighted: bool,
}

/// Cells of one unit, indexed by [`Face::index`].
pub type UnitRow = [Option<OccupancyCell>; 3];

/// Two assets claiming the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub unit: i32,
    pub face: Face,
    /// Asset left in the cell.
    pub kept: AssetId,
    /// Asset whose claim was not stored.
    pub displaced: AssetId,
}

/// A placed asset whose span leaves the rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClippedSpan {
    pub asset_id: AssetId,
    pub position: i32,
    pub vsize: u32,
    pub units_outside: u64,
}

/// First cell of an asset in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanHead {
    pub unit: i32,
    pub face: Face,
    pub cell: OccupancyCell,
}

/// Occupancy of every addressable cell of a rack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyMap {
    rows: BTreeMap<i32, UnitRow>,
    overlaps: Vec<Overlap>,
    clipped: Vec<ClippedSpan>,
    unknown_shapes: Vec<AssetId>,
}

/// Build the occupancy map of `rack`, highlighting assets owned by
/// `highlight`. A zero or absent highlight marks nothing.
pub fn build(rack: &Rack, highlight: Option<LocationId>) -> OccupancyMap {
    OccupancyMap::build(rack, highlight)
}

impl OccupancyMap {
    pub fn build(rack: &Rack, highlight: Option<LocationId>) -> Self {
        let highlight = highlight.filter(|&id| id != 0);
        let mut map = Self::default();

        for asset in rack.assets.iter().filter(|a| a.is_placed()) {
            if asset.has_unknown_shape() {
                warn!(
                    "Asset #{} has hsize {} and no stored faces, treating as full depth",
                    asset.id, asset.hsize
                );
                map.unknown_shapes.push(asset.id);
            }
            let faces = asset.occupied_faces();
            if faces.is_empty() {
                continue;
            }
            let cell = OccupancyCell {
                owner_id: asset.id,
                vsize: asset.vsize,
                hsize: asset.hsize,
                highlighted: highlight.is_some() && asset.owning_location_id == highlight,
            };

            let span = asset.span(rack.direction);
            let outside = span.units_outside(rack.size);
            if outside > 0 {
                warn!(
                    "Asset #{} at unit {} (vsize {}) has {} unit(s) outside rack of size {}",
                    asset.id, asset.position, asset.vsize, outside, rack.size
                );
                map.clipped.push(clipped_span(asset, outside));
            }

            for unit in span.units_within(rack.size) {
                for face in faces.iter() {
                    map.mark(unit, face, cell);
                }
            }
        }

        if !map.overlaps.is_empty() {
            warn!("{} overlapping cell claim(s) in rack", map.overlaps.len());
        }
        debug!(
            "Built occupancy: {} cells over {} units from {} assets",
            map.len(),
            map.rows.len(),
            rack.assets.len()
        );
        map
    }

    fn mark(&mut self, unit: i32, face: Face, cell: OccupancyCell) {
        let slot = &mut self.rows.entry(unit).or_default()[face.index()];
        let Some(existing) = *slot else {
            *slot = Some(cell);
            return;
        };
        if existing.owner_id == cell.owner_id {
            return;
        }
        // A blocking claim always wins over a highlighted one.
        let (kept, displaced) = if existing.highlighted && !cell.highlighted {
            *slot = Some(cell);
            (cell.owner_id, existing.owner_id)
        } else {
            (existing.owner_id, cell.owner_id)
        };
        self.overlaps.push(Overlap {
            unit,
            face,
            kept,
            displaced,
        });
    }

    pub fn cell(&self, unit: i32, face: Face) -> Option<&OccupancyCell> {
        self.rows.get(&unit)?[face.index()].as_ref()
    }

    pub fn row(&self, unit: i32) -> Option<&UnitRow> {
        self.rows.get(&unit)
    }

    /// Occupied by something other than the asset being relocated.
    pub fn is_blocking(&self, unit: i32, face: Face) -> bool {
        self.cell(unit, face).is_some_and(|c| !c.highlighted)
    }

    /// Every occupied cell, by ascending unit then front to back.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, Face, &OccupancyCell)> {
        self.rows.iter().flat_map(|(&unit, row)| {
            Face::ALL
                .into_iter()
                .filter_map(move |face| row[face.index()].as_ref().map(|c| (unit, face, c)))
        })
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.occupied_cells().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self) -> &[Overlap] {
        &self.overlaps
    }

    pub fn clipped(&self) -> &[ClippedSpan] {
        &self.clipped
    }

    /// Assets whose faces had to be assumed.
    pub fn unknown_shapes(&self) -> &[AssetId] {
        &self.unknown_shapes
    }

    /// Unit → face → cell view, for callers that want a keyed map.
    pub fn by_face(&self) -> BTreeMap<i32, BTreeMap<Face, OccupancyCell>> {
        let mut out: BTreeMap<i32, BTreeMap<Face, OccupancyCell>> = BTreeMap::new();
        for (unit, face, cell) in self.occupied_cells() {
            out.entry(unit).or_default().insert(face, *cell);
        }
        out
    }

    /// One cell per asset: the first one met walking `rack` in display order,
    /// front to back within a row.
    pub fn span_heads(&self, rack: &Rack) -> Vec<SpanHead> {
        let mut seen: HashSet<AssetId> = HashSet::new();
        let mut heads = Vec::new();
        for unit in rack.display_units() {
            let Some(row) = self.rows.get(&unit) else {
                continue;
            };
            for face in Face::ALL {
                if let Some(cell) = row[face.index()] {
                    if seen.insert(cell.owner_id) {
                        heads.push(SpanHead { unit, face, cell });
                    }
                }
            }
        }
        heads
    }
}

fn clipped_span(asset: &Asset, units_outside: u64) -> ClippedSpan {
    ClippedSpan {
        asset_id: asset.id,
        position: asset.position,
        vsize: asset.vsize,
        units_outside,
    }
}
