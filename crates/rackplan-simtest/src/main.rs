//! rackplan Headless Harness
//!
//! Validates rack occupancy and placement logic without a UI.
//! Runs entirely in-process: no REST layer, no rendering.
//!
//! Usage:
//!   cargo run -p rackplan-simtest
//!   cargo run -p rackplan-simtest -- --verbose
//!   cargo run -p rackplan-simtest -- --rack rack.json --vsize 2 --hsize 1 [--highlight 42] [--json]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rackplan_logic::face::Face;
use rackplan_logic::location::{LocationRecord, RackDefaults};
use rackplan_logic::occupancy::{OccupancyCell, OccupancyMap};
use rackplan_logic::placement::{plan, AnchorSet, PlacementRequest};
use rackplan_logic::rack::{Direction, Rack};
use rackplan_logic::validation::{self, Severity};
use rackplan_logic::PlacementError;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

// ── Sample rack record (same JSON shape the location service returns) ──
const SAMPLE_RACK_JSON: &str = include_str!("../../../data/sample_rack.json");

// ── Arguments ───────────────────────────────────────────────────────────

/// Headless checks for rackplan, or placement planning for one rack file.
#[derive(Parser)]
#[command(name = "rackplan-simtest", version, about)]
struct Args {
    /// Print per-check detail and debug logs
    #[arg(short, long)]
    verbose: bool,

    /// Location record (JSON) to plan against instead of running the checks
    #[arg(long = "rack", value_name = "PATH")]
    rack_path: Option<PathBuf>,

    /// Height of the footprint to place, in rack units
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    vsize: u32,

    /// Depth class of the footprint (1 shallow, 2 medium, 3 full)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    hsize: u8,

    /// Location whose assets are being relocated
    #[arg(long)]
    highlight: Option<u64>,

    /// Emit the plan as JSON instead of a diagram
    #[arg(long)]
    json: bool,
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_logging(verbose: bool) {
    fmt()
        .with_env_filter(log_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(path) = &args.rack_path {
        if let Err(e) = run_file(path, &args) {
            eprintln!("error: {}", e);
            process::exit(2);
        }
        return;
    }

    println!("=== rackplan Harness ===\n");

    let record: LocationRecord = match serde_json::from_str(SAMPLE_RACK_JSON) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("sample rack JSON parse error: {}", e);
            process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Record ingestion and data quality
    let rack = match validate_ingestion(&record, &mut results) {
        Some(r) => r,
        None => {
            report(&results, args.verbose);
            process::exit(1);
        }
    };

    // 2. Occupancy building
    results.extend(validate_occupancy(&rack, args.verbose));

    // 3. Placement for new assets
    results.extend(validate_placement(&rack, args.verbose));

    // 4. Relocation of an existing asset
    results.extend(validate_relocation(&rack));

    // 5. Boundary and malformed requests
    results.extend(validate_boundaries(&rack));

    if report(&results, args.verbose) > 0 {
        process::exit(1);
    }
}

/// Print the summary; returns the number of failures.
fn report(results: &[TestResult], verbose: bool) -> usize {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed
}

// ── 1. Ingestion ────────────────────────────────────────────────────────

fn validate_ingestion(record: &LocationRecord, results: &mut Vec<TestResult>) -> Option<Rack> {
    println!("--- Ingestion ---");
    let rack = match record.to_rack(&RackDefaults::default()) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "ingest_rack".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "ingest_size_override".into(),
        passed: rack.size == 12,
        detail: format!("size {} (schema default 42, stored 12)", rack.size),
    });
    results.push(TestResult {
        name: "ingest_direction_default".into(),
        passed: rack.direction == Direction::Downward,
        detail: format!("direction {:?}", rack.direction),
    });

    let issues = validation::validate_all(&rack);
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    results.push(TestResult {
        name: "ingest_data_quality".into(),
        passed: issues.is_empty(),
        detail: format!("{} issue(s), {} error(s)", issues.len(), errors),
    });

    Some(rack)
}

// ── 2. Occupancy ────────────────────────────────────────────────────────

fn validate_occupancy(rack: &Rack, verbose: bool) -> Vec<TestResult> {
    println!("--- Occupancy ---");
    let mut results = Vec::new();
    let map = OccupancyMap::build(rack, None);

    results.push(TestResult {
        name: "occupancy_cell_count".into(),
        passed: map.len() == 14,
        detail: format!("{} occupied cells", map.len()),
    });

    let owners_ok = rack.assets.iter().filter(|a| a.is_placed()).all(|a| {
        a.span(rack.direction).units_within(rack.size).all(|u| {
            a.occupied_faces()
                .iter()
                .all(|f| map.cell(u, f).map(|c| c.owner_id) == Some(a.id))
        })
    });
    results.push(TestResult {
        name: "occupancy_owners".into(),
        passed: owners_ok,
        detail: "every spanned cell owned by its asset".into(),
    });

    let unplaced_absent = map.occupied_cells().all(|(_, _, c)| c.owner_id != 5005);
    results.push(TestResult {
        name: "occupancy_unplaced_ignored".into(),
        passed: unplaced_absent,
        detail: "asset at position 0 has no cells".into(),
    });

    results.push(TestResult {
        name: "occupancy_idempotent".into(),
        passed: map == OccupancyMap::build(rack, None),
        detail: "two builds are identical".into(),
    });

    let heads = map.span_heads(rack);
    results.push(TestResult {
        name: "occupancy_span_heads".into(),
        passed: heads.len() == 4,
        detail: format!("{} drawable spans", heads.len()),
    });

    if verbose {
        print_diagram(rack, &map, None);
    }
    results
}

// ── 3. Placement ────────────────────────────────────────────────────────

fn validate_placement(rack: &Rack, verbose: bool) -> Vec<TestResult> {
    println!("--- Placement ---");
    let mut results = Vec::new();

    match plan(rack, &request(1, 1, None)) {
        Ok((_, anchors)) => {
            let blocked = !anchors.contains(1, Face::Front)
                && !anchors.contains(1, Face::Back)
                && !anchors.contains(5, Face::Front)
                && !anchors.contains(10, Face::Back);
            results.push(TestResult {
                name: "placement_1u_blocked_cells".into(),
                passed: blocked,
                detail: "occupied cells never offered".into(),
            });
            let token_label = anchors
                .get(10, Face::Front)
                .and_then(|a| a.token.as_ref())
                .and_then(|t| rack.position_label(t));
            results.push(TestResult {
                name: "placement_1u_token".into(),
                passed: token_label == Some("U10 front"),
                detail: format!("U10 front label {:?}", token_label),
            });
        }
        Err(e) => results.push(failed("placement_1u", &e)),
    }

    match plan(rack, &request(2, 3, None)) {
        Ok((map, anchors)) => {
            let units: Vec<i32> = anchors.iter().map(|a| a.unit).collect();
            results.push(TestResult {
                name: "placement_2u_full_depth".into(),
                passed: units == vec![3, 4, 8, 9],
                detail: format!("anchors at units {:?}", units),
            });
            results.push(TestResult {
                name: "placement_full_depth_front_only".into(),
                passed: anchors.iter().all(|a| a.face == Face::Front),
                detail: "no back anchors for full depth".into(),
            });
            if verbose {
                print_diagram(rack, &map, Some(&anchors));
            }
        }
        Err(e) => results.push(failed("placement_2u_full_depth", &e)),
    }

    results
}

// ── 4. Relocation ───────────────────────────────────────────────────────

fn validate_relocation(rack: &Rack) -> Vec<TestResult> {
    println!("--- Relocation ---");
    let mut results = Vec::new();

    // db-02 (location 322) is 2U full depth at unit 6.
    match plan(rack, &request(2, 3, Some(322))) {
        Ok((map, anchors)) => {
            results.push(TestResult {
                name: "relocation_highlight_marked".into(),
                passed: map.cell(6, Face::Front).is_some_and(|c| c.highlighted),
                detail: "own cells highlighted".into(),
            });
            results.push(TestResult {
                name: "relocation_own_position".into(),
                passed: anchors.contains(6, Face::Front),
                detail: "current position offered".into(),
            });
            results.push(TestResult {
                name: "relocation_shifted_positions".into(),
                passed: anchors.contains(5, Face::Front) && anchors.contains(7, Face::Front),
                detail: format!("{} anchors with own cells freed", anchors.len()),
            });
        }
        Err(e) => results.push(failed("relocation", &e)),
    }

    results
}

// ── 5. Boundaries ───────────────────────────────────────────────────────

fn validate_boundaries(rack: &Rack) -> Vec<TestResult> {
    println!("--- Boundaries ---");
    let mut results = Vec::new();

    let oversized = plan(rack, &request(rack.size + 1, 1, None));
    results.push(TestResult {
        name: "boundary_oversized_empty".into(),
        passed: matches!(&oversized, Ok((_, a)) if a.is_empty()),
        detail: format!("vsize {} on {}U rack", rack.size + 1, rack.size),
    });

    results.push(TestResult {
        name: "boundary_bad_depth_rejected".into(),
        passed: plan(rack, &request(1, 0, None)).err() == Some(PlacementError::InvalidDepthClass(0)),
        detail: "hsize 0 rejected".into(),
    });
    results.push(TestResult {
        name: "boundary_zero_vsize_rejected".into(),
        passed: plan(rack, &request(0, 1, None)).err() == Some(PlacementError::InvalidVsize(0)),
        detail: "vsize 0 rejected".into(),
    });

    let mut upward = rack.clone();
    upward.direction = Direction::Upward;
    let top = upward.display_units().next();
    results.push(TestResult {
        name: "boundary_upward_display_order".into(),
        passed: top == rack.top_unit().ok(),
        detail: format!("upward rack draws unit {:?} first", top),
    });

    results
}

fn request(vsize: u32, hsize: u8, highlight: Option<u64>) -> PlacementRequest {
    PlacementRequest {
        vsize,
        hsize,
        highlight_location_id: highlight,
    }
}

fn failed(name: &str, e: &PlacementError) -> TestResult {
    TestResult {
        name: name.into(),
        passed: false,
        detail: e.to_string(),
    }
}

// ── File mode ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PlanOutput<'a> {
    location_id: u64,
    size: u32,
    direction: Direction,
    occupancy: BTreeMap<i32, BTreeMap<Face, OccupancyCell>>,
    anchors: &'a AnchorSet,
    issues: Vec<String>,
}

fn run_file(path: &Path, args: &Args) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {}", path.display(), e))?;
    let record: LocationRecord =
        serde_json::from_str(&text).map_err(|e| format!("parsing {}: {}", path.display(), e))?;
    let rack = record
        .to_rack(&RackDefaults::default())
        .map_err(|e| e.to_string())?;
    let req = request(args.vsize, args.hsize, args.highlight);
    let (map, anchors) = plan(&rack, &req).map_err(|e| e.to_string())?;
    let issues: Vec<String> = validation::validate_all(&rack)
        .into_iter()
        .map(|i| format!("[{:?}] {}: {}", i.severity, i.category, i.message))
        .collect();

    if args.json {
        let out = PlanOutput {
            location_id: record.id,
            size: rack.size,
            direction: rack.direction,
            occupancy: map.by_face(),
            anchors: &anchors,
            issues,
        };
        let text = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "=== {} (#{}): {}U {:?} ===",
        record.name, record.id, rack.size, rack.direction
    );
    for issue in &issues {
        println!("  ! {}", issue);
    }
    print_diagram(&rack, &map, Some(&anchors));
    println!(
        "\n{} legal anchor(s) for vsize {} hsize {}:",
        anchors.len(),
        args.vsize,
        args.hsize
    );
    for a in &anchors {
        let token = a.token.as_ref();
        let label = token.and_then(|t| rack.position_label(t)).unwrap_or("");
        match token {
            Some(t) => println!("  U{:<3} {:<6} {} {}", a.unit, a.face, t, label),
            None => println!("  U{:<3} {:<6} -", a.unit, a.face),
        }
    }
    Ok(())
}

/// Text rendering of the rack: `#id` occupied, `*id` highlighted,
/// `o` legal anchor, `.` empty.
fn print_diagram(rack: &Rack, map: &OccupancyMap, anchors: Option<&AnchorSet>) {
    println!("  unit | front    | interior | back");
    for unit in rack.display_units() {
        let cells: Vec<String> = Face::ALL
            .iter()
            .map(|&face| match map.cell(unit, face) {
                Some(c) if c.highlighted => format!("*{}", c.owner_id),
                Some(c) => format!("#{}", c.owner_id),
                None if anchors.is_some_and(|a| a.contains(unit, face)) => "o".to_string(),
                None => ".".to_string(),
            })
            .collect();
        println!(
            "  {:>4} | {:<8} | {:<8} | {:<8}",
            unit, cells[0], cells[1], cells[2]
        );
    }
}
