//! Integration tests for the occupancy → placement pipeline.
//!
//! Exercises: LocationRecord → Rack → OccupancyMap → AnchorSet, plus seeded
//! random sweeps that compare the validator against a brute-force check
//! computed straight from the asset list.

use std::collections::HashSet;

use rackplan_logic::constants::face_bits;
use rackplan_logic::face::{Face, FaceSet};
use rackplan_logic::location::{LocationRecord, RackDefaults};
use rackplan_logic::occupancy::{self, OccupancyMap};
use rackplan_logic::placement::{is_legal_anchor, legal_anchors, plan, Footprint, PlacementRequest};
use rackplan_logic::rack::{Asset, Direction, Rack};
use rackplan_logic::validation::validate_all;
use rackplan_logic::PlacementError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ────────────────────────────────────────────────────────────

fn asset(id: u64, position: i32, vsize: u32, hsize: u8, fib: u8) -> Asset {
    Asset {
        id,
        label: Some(format!("asset-{}", id)),
        position,
        vsize,
        hsize,
        faces: Some(FaceSet::from_bits(fib)),
        owning_location_id: Some(100 + id),
    }
}

fn rack(size: u32, direction: Direction, assets: Vec<Asset>) -> Rack {
    Rack::new(size, direction).unwrap().with_assets(assets)
}

fn request(vsize: u32, hsize: u8, highlight: Option<u64>) -> PlacementRequest {
    PlacementRequest {
        vsize,
        hsize,
        highlight_location_id: highlight,
    }
}

/// Units a span covers, straight from the numbering convention.
fn span_units(direction: Direction, anchor: i32, vsize: u32) -> Vec<i32> {
    (0..vsize as i32)
        .map(|k| match direction {
            Direction::Downward => anchor - k,
            Direction::Upward => anchor + k,
        })
        .collect()
}

fn required_faces(hsize: u8, anchor: Face) -> Option<Vec<Face>> {
    match (hsize, anchor) {
        (1, Face::Front) => Some(vec![Face::Front]),
        (1, Face::Back) => Some(vec![Face::Back]),
        (2, Face::Front) => Some(vec![Face::Front, Face::Interior]),
        (2, Face::Back) => Some(vec![Face::Back, Face::Interior]),
        (3, Face::Front) => Some(vec![Face::Front, Face::Interior, Face::Back]),
        _ => None,
    }
}

/// Brute-force legality computed from the asset list, no occupancy map.
fn naive_is_legal(
    rack: &Rack,
    highlight: Option<u64>,
    vsize: u32,
    hsize: u8,
    unit: i32,
    anchor: Face,
) -> bool {
    let Some(faces) = required_faces(hsize, anchor) else {
        return false;
    };
    for u in span_units(rack.direction, unit, vsize) {
        if u < 1 || u > rack.size as i32 {
            return false;
        }
        for &face in &faces {
            let blocked = rack.assets.iter().any(|a| {
                a.is_placed()
                    && a.occupied_faces().contains(face)
                    && span_units(rack.direction, a.position, a.vsize).contains(&u)
                    && !(highlight.is_some() && a.owning_location_id == highlight)
            });
            if blocked {
                return false;
            }
        }
    }
    true
}

fn random_faces(rng: &mut StdRng, hsize: u8) -> u8 {
    let front = rng.gen_bool(0.5);
    match (hsize, front) {
        (1, true) => face_bits::FRONT,
        (1, false) => face_bits::BACK,
        (2, true) => face_bits::FRONT | face_bits::INTERIOR,
        (2, false) => face_bits::BACK | face_bits::INTERIOR,
        _ => face_bits::ALL,
    }
}

/// A random rack with in-bounds, non-overlapping assets.
fn random_rack(rng: &mut StdRng) -> Rack {
    let size = rng.gen_range(1..=20u32);
    let direction = if rng.gen_bool(0.5) {
        Direction::Downward
    } else {
        Direction::Upward
    };
    let mut taken: HashSet<(i32, Face)> = HashSet::new();
    let mut assets = Vec::new();
    for id in 1..=rng.gen_range(0..=10u64) {
        let vsize = rng.gen_range(1..=4u32);
        let hsize = rng.gen_range(1..=3u8);
        let fib = random_faces(rng, hsize);
        let position = rng.gen_range(1..=size as i32);
        let units = span_units(direction, position, vsize);
        if units.iter().any(|&u| u < 1 || u > size as i32) {
            continue;
        }
        let faces = FaceSet::from_bits(fib);
        let cells: Vec<(i32, Face)> = units
            .iter()
            .flat_map(|&u| faces.iter().map(move |f| (u, f)))
            .collect();
        if cells.iter().any(|c| taken.contains(c)) {
            continue;
        }
        taken.extend(cells);
        assets.push(asset(id, position, vsize, hsize, fib));
    }
    rack(size, direction, assets)
}

fn anchor_face(a: &Asset) -> Face {
    let faces = a.occupied_faces();
    if faces.contains(Face::Front) {
        Face::Front
    } else {
        Face::Back
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn empty_rack_two_unit_shallow() {
    let r = rack(10, Direction::Downward, vec![]);
    let (_, anchors) = plan(&r, &request(2, 1, None)).unwrap();
    for unit in 2..=10 {
        assert!(anchors.contains(unit, Face::Front), "unit {} front", unit);
        assert!(anchors.contains(unit, Face::Back), "unit {} back", unit);
    }
    // Unit 1 would span units 1 and 0.
    assert!(!anchors.contains(1, Face::Front));
    assert!(!anchors.contains(1, Face::Back));
    assert!(anchors.iter().all(|a| a.face != Face::Interior));
}

#[test]
fn two_unit_asset_blocks_its_face_only() {
    let r = rack(10, Direction::Downward, vec![asset(1, 5, 2, 1, face_bits::FRONT)]);
    let (_, anchors) = plan(&r, &request(1, 1, None)).unwrap();
    assert!(!anchors.contains(5, Face::Front));
    assert!(!anchors.contains(4, Face::Front));
    assert!(anchors.contains(6, Face::Front));
    assert!(anchors.contains(3, Face::Front));
    assert!(anchors.contains(5, Face::Back));
    assert!(anchors.contains(4, Face::Back));
}

#[test]
fn highlighted_asset_does_not_block_itself() {
    let r = rack(10, Direction::Downward, vec![asset(1, 5, 2, 1, face_bits::FRONT)]);
    let (occupancy, anchors) = plan(&r, &request(1, 1, Some(101))).unwrap();
    assert!(occupancy.cell(5, Face::Front).unwrap().highlighted);
    assert!(anchors.contains(5, Face::Front));

    // Relocating onto exactly the cells it already holds.
    let (_, same_shape) = plan(&r, &request(2, 1, Some(101))).unwrap();
    assert!(same_shape.contains(5, Face::Front));
}

#[test]
fn highlight_of_other_location_still_blocks() {
    let r = rack(10, Direction::Downward, vec![asset(1, 5, 2, 1, face_bits::FRONT)]);
    let (_, anchors) = plan(&r, &request(1, 1, Some(999))).unwrap();
    assert!(!anchors.contains(5, Face::Front));
}

#[test]
fn full_depth_never_anchors_back() {
    let r = rack(
        12,
        Direction::Upward,
        vec![asset(1, 3, 2, 1, face_bits::BACK), asset(2, 9, 1, 2, face_bits::FRONT | face_bits::INTERIOR)],
    );
    let (_, anchors) = plan(&r, &request(2, 3, None)).unwrap();
    assert!(!anchors.is_empty());
    assert!(anchors.iter().all(|a| a.face == Face::Front));
    assert!(!anchors.contains(2, Face::Front)); // spans 2, 3
    assert!(anchors.contains(5, Face::Front));
}

#[test]
fn oversized_footprint_yields_nothing() {
    let r = rack(3, Direction::Downward, vec![]);
    let (_, anchors) = plan(&r, &request(4, 1, None)).unwrap();
    assert!(anchors.is_empty());
}

#[test]
fn malformed_requests_rejected() {
    let r = rack(10, Direction::Downward, vec![]);
    assert_eq!(
        plan(&r, &request(0, 1, None)).unwrap_err(),
        PlacementError::InvalidVsize(0)
    );
    assert_eq!(
        plan(&r, &request(1, 4, None)).unwrap_err(),
        PlacementError::InvalidDepthClass(4)
    );
}

#[test]
fn full_rack_is_not_an_error() {
    let r = rack(2, Direction::Downward, vec![asset(1, 2, 2, 3, face_bits::ALL)]);
    let (_, anchors) = plan(&r, &request(1, 1, None)).unwrap();
    assert!(anchors.is_empty());
}

#[test]
fn overlapping_input_never_looks_free() {
    // Asset 1 is being moved; asset 2 was wrongly recorded on top of it.
    let r = rack(
        10,
        Direction::Downward,
        vec![asset(1, 5, 1, 1, face_bits::FRONT), asset(2, 5, 1, 1, face_bits::FRONT)],
    );
    let (occupancy, anchors) = plan(&r, &request(1, 1, Some(101))).unwrap();
    assert_eq!(occupancy.overlaps().len(), 1);
    assert!(!anchors.contains(5, Face::Front));
    assert!(!validate_all(&r).is_empty());
}

#[test]
fn record_to_anchors_end_to_end() {
    let record: LocationRecord = serde_json::from_str(
        r#"{
            "id": 40,
            "name": "R-07",
            "location_type": { "id": 3, "name": "Rack", "magic": 16 },
            "possible_options": [
                { "id": 1, "name": "size", "defvalue": "42" },
                { "id": 2, "name": "direction", "defvalue": "downwards" }
            ],
            "options": [
                { "option_spec_id": 1, "value": "6" },
                { "option_spec_id": 2, "value": "upwards" }
            ],
            "assets": [
                { "id": 1, "label": "switch", "position": 1, "vsize": 1, "hsize": 1, "fib": 1, "location_id": 41 },
                { "id": 2, "label": "server", "position": 2, "vsize": 2, "hsize": 3, "fib": 7, "location_id": 42 }
            ],
            "front_positions": { "1": "p1f", "2": "p2f", "3": "p3f", "4": "p4f", "5": "p5f", "6": "p6f" },
            "back_positions": { "1": "p1b", "2": "p2b", "3": "p3b", "4": "p4b", "5": "p5b", "6": "p6b" },
            "rack_pos_labels": { "p4f": "U4 front" }
        }"#,
    )
    .unwrap();
    let r = record.to_rack(&RackDefaults::default()).unwrap();
    assert_eq!(r.size, 6);
    assert_eq!(r.direction, Direction::Upward);

    let (occupancy, anchors) = plan(&r, &request(1, 2, None)).unwrap();
    assert_eq!(occupancy.cell(3, Face::Back).map(|c| c.owner_id), Some(2));
    assert!(!anchors.contains(1, Face::Front)); // switch in front
    assert!(anchors.contains(1, Face::Back));
    assert!(!anchors.contains(2, Face::Back));
    assert!(!anchors.contains(3, Face::Front));

    let chosen = anchors.get(4, Face::Front).unwrap();
    let token = chosen.token.as_ref().unwrap();
    assert_eq!(token.0, "p4f");
    assert_eq!(r.position_label(token), Some("U4 front"));
}

// ── Properties (seeded sweeps) ─────────────────────────────────────────

#[test]
fn every_cell_owned_by_its_asset() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let r = random_rack(&mut rng);
        let map = occupancy::build(&r, None);
        for a in &r.assets {
            for u in span_units(r.direction, a.position, a.vsize) {
                for face in a.occupied_faces().iter() {
                    assert_eq!(map.cell(u, face).map(|c| c.owner_id), Some(a.id));
                }
            }
        }
        assert!(map.overlaps().is_empty());
        assert!(map.clipped().is_empty());
    }
}

#[test]
fn building_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let r = random_rack(&mut rng);
        let highlight = r.assets.first().and_then(|a| a.owning_location_id);
        assert_eq!(
            OccupancyMap::build(&r, highlight),
            OccupancyMap::build(&r, highlight)
        );
    }
}

#[test]
fn validator_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let r = random_rack(&mut rng);
        let highlight = if !r.assets.is_empty() && rng.gen_bool(0.5) {
            let i = rng.gen_range(0..r.assets.len());
            r.assets[i].owning_location_id
        } else {
            None
        };
        let vsize = rng.gen_range(1..=5u32);
        let hsize = rng.gen_range(1..=3u8);
        let map = occupancy::build(&r, highlight);
        let fp = Footprint::new(vsize, hsize).unwrap();
        let anchors = legal_anchors(&map, &r, fp).unwrap();

        for unit in 1..=r.size as i32 {
            for face in Face::ALL {
                let expected = naive_is_legal(&r, highlight, vsize, hsize, unit, face);
                assert_eq!(
                    anchors.contains(unit, face),
                    expected,
                    "size {} {:?} unit {} {} fp ({}, {})",
                    r.size,
                    r.direction,
                    unit,
                    face,
                    vsize,
                    hsize
                );
                assert_eq!(is_legal_anchor(&map, &r, fp, unit, face), expected);
            }
        }
    }
}

#[test]
fn anchors_never_cover_blocking_cells() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let r = random_rack(&mut rng);
        let hsize = rng.gen_range(1..=3u8);
        let vsize = rng.gen_range(1..=4u32);
        let (map, anchors) = plan(&r, &request(vsize, hsize, None)).unwrap();
        for a in &anchors {
            let faces = required_faces(hsize, a.face).unwrap();
            for u in span_units(r.direction, a.unit, vsize) {
                assert!(r.contains_unit(u));
                for &f in &faces {
                    assert!(!map.is_blocking(u, f));
                }
            }
        }
        if hsize == 3 {
            assert!(anchors.iter().all(|a| a.face != Face::Back));
        }
        if vsize > r.size {
            assert!(anchors.is_empty());
        }
    }
}

#[test]
fn relocating_onto_own_cells_is_legal() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let r = random_rack(&mut rng);
        for a in &r.assets {
            let (_, anchors) = plan(&r, &request(a.vsize, a.hsize, a.owning_location_id)).unwrap();
            assert!(
                anchors.contains(a.position, anchor_face(a)),
                "asset #{} at {} not re-placeable",
                a.id,
                a.position
            );
        }
    }
}
