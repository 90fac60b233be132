//! Data-quality checks for rack records.
//!
//! None of these conditions stop occupancy building or placement; they are
//! reported so operators can fix the underlying records.

use std::collections::{BTreeSet, HashSet};

use crate::occupancy::OccupancyMap;
use crate::rack::{AssetId, Rack};

/// A data-quality finding.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Per-asset shape ──────────────────────────────────────────────────

/// Check that each placed asset's stored faces match its depth class.
pub fn check_face_depth_agreement(rack: &Rack) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for a in rack.assets.iter().filter(|a| a.is_placed()) {
        let depth = match a.depth_class() {
            Ok(d) => d,
            Err(e) => {
                issues.push(ValidationIssue {
                    category: "asset_shape",
                    severity: Severity::Error,
                    message: format!("Asset #{}: {}", a.id, e),
                });
                continue;
            }
        };
        let Some(faces) = a.faces else {
            continue; // derived from hsize, agrees by construction
        };
        if !faces.is_empty() && !depth.admits(faces) {
            issues.push(ValidationIssue {
                category: "asset_shape",
                severity: Severity::Warning,
                message: format!(
                    "Asset #{} has hsize {} but occupies faces {}",
                    a.id,
                    a.hsize,
                    faces
                ),
            });
        }
    }
    issues
}

/// Check that no placed asset occupies zero faces or zero units.
pub fn check_degenerate_assets(rack: &Rack) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for a in rack.assets.iter().filter(|a| a.is_placed()) {
        if a.occupied_faces().is_empty() {
            issues.push(ValidationIssue {
                category: "asset_shape",
                severity: Severity::Error,
                message: format!("Asset #{} at unit {} occupies no faces", a.id, a.position),
            });
        }
        if a.vsize == 0 {
            issues.push(ValidationIssue {
                category: "asset_shape",
                severity: Severity::Error,
                message: format!("Asset #{} at unit {} has vsize 0", a.id, a.position),
            });
        }
    }
    issues
}

// ── B. Rack bounds ──────────────────────────────────────────────────────

/// Check that every placed asset's span stays within the rack.
pub fn check_spans_within_rack(rack: &Rack) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for a in rack.assets.iter().filter(|a| a.is_placed()) {
        let span = a.span(rack.direction);
        if !span.fits(rack.size) {
            issues.push(ValidationIssue {
                category: "rack_bounds",
                severity: Severity::Warning,
                message: format!(
                    "Asset #{} spans units {}..={} outside rack 1..={}",
                    a.id,
                    span.low(),
                    span.high(),
                    rack.size
                ),
            });
        }
    }
    issues
}

// ── C. Asset-to-asset ───────────────────────────────────────────────────

/// Check that no two assets claim the same (unit, face) cell.
pub fn check_asset_overlaps(rack: &Rack) -> Vec<ValidationIssue> {
    let map = OccupancyMap::build(rack, None);
    let pairs: BTreeSet<(AssetId, AssetId)> = map
        .overlaps()
        .iter()
        .map(|o| (o.kept.min(o.displaced), o.kept.max(o.displaced)))
        .collect();

    pairs
        .into_iter()
        .map(|(a, b)| {
            let cells = map
                .overlaps()
                .iter()
                .filter(|o| (o.kept == a && o.displaced == b) || (o.kept == b && o.displaced == a))
                .count();
            ValidationIssue {
                category: "asset_overlap",
                severity: Severity::Error,
                message: format!("Assets #{} and #{} overlap in {} cell(s)", a, b, cells),
            }
        })
        .collect()
}

/// Check that asset ids are unique within the rack.
pub fn check_duplicate_asset_ids(rack: &Rack) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<AssetId> = HashSet::new();
    let mut reported: HashSet<AssetId> = HashSet::new();
    for a in &rack.assets {
        if !seen.insert(a.id) && reported.insert(a.id) {
            issues.push(ValidationIssue {
                category: "asset_identity",
                severity: Severity::Error,
                message: format!("Asset #{} appears more than once", a.id),
            });
        }
    }
    issues
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all rack checks and return combined results.
pub fn validate_all(rack: &Rack) -> Vec<ValidationIssue> {
    let mut all = Vec::new();
    all.extend(check_face_depth_agreement(rack));
    all.extend(check_degenerate_assets(rack));
    all.extend(check_spans_within_rack(rack));
    all.extend(check_asset_overlaps(rack));
    all.extend(check_duplicate_asset_ids(rack));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::face_bits;
    use crate::face::FaceSet;
    use crate::rack::{Asset, Direction};

    fn make_asset(id: u64, position: i32, vsize: u32, hsize: u8, fib: u8) -> Asset {
        Asset {
            id,
            label: None,
            position,
            vsize,
            hsize,
            faces: Some(FaceSet::from_bits(fib)),
            owning_location_id: None,
        }
    }

    fn make_rack(assets: Vec<Asset>) -> Rack {
        Rack::new(10, Direction::Downward).unwrap().with_assets(assets)
    }

    #[test]
    fn test_clean_rack_no_issues() {
        let rack = make_rack(vec![
            make_asset(1, 5, 2, 1, face_bits::FRONT),
            make_asset(2, 5, 2, 1, face_bits::BACK),
            make_asset(3, 9, 1, 3, face_bits::ALL),
        ]);
        let issues = validate_all(&rack);
        assert!(issues.is_empty(), "Expected no issues, got: {:?}", issues);
    }

    #[test]
    fn test_face_depth_mismatch_flagged() {
        let rack = make_rack(vec![make_asset(1, 5, 1, 3, face_bits::FRONT)]);
        let issues = check_face_depth_agreement(&rack);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.contains("hsize 3"));
    }

    #[test]
    fn test_invalid_hsize_flagged() {
        let rack = make_rack(vec![make_asset(1, 5, 1, 7, face_bits::FRONT)]);
        let issues = check_face_depth_agreement(&rack);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_unplaced_assets_skipped() {
        let rack = make_rack(vec![make_asset(1, 0, 0, 9, 0)]);
        assert!(validate_all(&rack).is_empty());
    }

    #[test]
    fn test_degenerate_assets() {
        let rack = make_rack(vec![
            make_asset(1, 5, 1, 1, 0),
            make_asset(2, 6, 0, 1, face_bits::FRONT),
        ]);
        let issues = check_degenerate_assets(&rack);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("no faces"));
        assert!(issues[1].message.contains("vsize 0"));
    }

    #[test]
    fn test_span_outside_rack() {
        let rack = make_rack(vec![make_asset(1, 2, 3, 1, face_bits::FRONT)]);
        let issues = check_spans_within_rack(&rack);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("0..=2"));
    }

    #[test]
    fn test_overlap_reported_once_per_pair() {
        let rack = make_rack(vec![
            make_asset(1, 5, 2, 2, face_bits::FRONT | face_bits::INTERIOR),
            make_asset(2, 5, 2, 2, face_bits::BACK | face_bits::INTERIOR),
        ]);
        let issues = check_asset_overlaps(&rack);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("#1 and #2"));
        assert!(issues[0].message.contains("2 cell(s)"));
    }

    #[test]
    fn test_duplicate_ids() {
        let rack = make_rack(vec![
            make_asset(4, 1, 1, 1, face_bits::FRONT),
            make_asset(4, 2, 1, 1, face_bits::FRONT),
            make_asset(4, 3, 1, 1, face_bits::FRONT),
        ]);
        let issues = check_duplicate_asset_ids(&rack);
        assert_eq!(issues.len(), 1);
    }
}
