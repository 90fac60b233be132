//! Pure rack occupancy and placement logic for rackplan.
//!
//! This crate contains the part of the location/asset tracker that is
//! independent of any UI, transport or storage. Functions take plain data
//! (a rack descriptor, a footprint) and return values, so they can be unit
//! tested directly and called from any view or service layer.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Face bits, location-type magic flags, rack defaults |
//! | [`error`] | Request and ingestion errors |
//! | [`face`] | Faces, face bitsets, depth classes and anchor groups |
//! | [`location`] | Location records → rack descriptors (option resolution) |
//! | [`occupancy`] | Per-unit, per-face occupancy map with highlight marks |
//! | [`placement`] | Legal anchor enumeration for a new footprint |
//! | [`rack`] | Rack, asset and span descriptors |
//! | [`validation`] | Data-quality checks on rack records |
//!
//! # Typical flow
//!
//! ```
//! use rackplan_logic::face::Face;
//! use rackplan_logic::placement::{plan, PlacementRequest};
//! use rackplan_logic::rack::{Direction, Rack};
//!
//! let rack = Rack::new(10, Direction::Downward).unwrap();
//! let request = PlacementRequest { vsize: 1, hsize: 1, highlight_location_id: None };
//! let (occupancy, anchors) = plan(&rack, &request).unwrap();
//! assert!(occupancy.is_empty());
//! assert!(anchors.contains(1, Face::Back));
//! ```

pub mod constants;
pub mod error;
pub mod face;
pub mod location;
pub mod occupancy;
pub mod placement;
pub mod rack;
pub mod validation;

pub use error::{IngestError, PlacementError};
