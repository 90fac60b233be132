//! Location records and their conversion into rack descriptors.
//!
//! A location record carries its type (with magic flags), the option schema
//! for that type and the option values set on this location. Rack size and
//! numbering direction live in those options: the schema supplies a default,
//! a stored value overrides it, and [`RackDefaults`] covers schemas that do
//! not define the option at all.
//!
//! The schema is passed in with the record rather than looked up from any
//! shared registry.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::{direction_names, location_magic, option_names, DEFAULT_RACK_SIZE};
use crate::error::IngestError;
use crate::rack::{Asset, Direction, PlacementToken, Rack};

/// Location identifier. `0` is the root location.
pub type LocationId = u64;

/// Type of a location, e.g. building, room or rack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationType {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub magic: u32,
}

impl LocationType {
    pub fn is_rack(&self) -> bool {
        self.magic & location_magic::RACK != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.magic & location_magic::HIDDEN != 0
    }
}

/// Schema entry for an option of a location type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub defvalue: Value,
}

/// Option value stored on a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionValue {
    pub option_spec_id: u64,
    pub value: Value,
}

/// Fallbacks for racks whose option schema lacks `size` or `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackDefaults {
    pub size: u32,
    pub direction: Direction,
}

impl Default for RackDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_RACK_SIZE,
            direction: Direction::Downward,
        }
    }
}

/// A location as loaded from the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: LocationId,
    #[serde(default)]
    pub name: String,
    pub location_type: LocationType,
    #[serde(default)]
    pub possible_options: Vec<OptionSpec>,
    #[serde(default)]
    pub options: Vec<OptionValue>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub front_positions: BTreeMap<i32, PlacementToken>,
    #[serde(default)]
    pub back_positions: BTreeMap<i32, PlacementToken>,
    #[serde(default)]
    pub rack_pos_labels: HashMap<PlacementToken, String>,
    /// Racks contained in this location, for non-rack locations.
    #[serde(default)]
    pub racks: Vec<LocationRecord>,
}

impl LocationRecord {
    pub fn is_rack(&self) -> bool {
        self.location_type.is_rack()
    }

    pub fn is_root(&self) -> bool {
        self.id == 0
    }

    /// Resolve the effective value of the named option: stored value if any,
    /// else the schema default. `None` when the schema lacks the option.
    pub fn option_value(&self, name: &str) -> Option<&Value> {
        let spec = self.possible_options.iter().rfind(|s| s.name == name)?;
        let stored = self
            .options
            .iter()
            .rfind(|o| o.option_spec_id == spec.id)
            .map(|o| &o.value);
        match stored {
            Some(v) if !v.is_null() => Some(v),
            _ if spec.defvalue.is_null() => None,
            _ => Some(&spec.defvalue),
        }
    }

    /// Build the rack descriptor for this location.
    pub fn to_rack(&self, defaults: &RackDefaults) -> Result<Rack, IngestError> {
        if !self.is_rack() {
            return Err(IngestError::NotARack(self.id));
        }

        let size = match self.option_value(option_names::SIZE) {
            Some(v) => parse_size(v)?,
            None => {
                debug!(
                    "Location #{} has no size option, using {}",
                    self.id, defaults.size
                );
                defaults.size
            }
        };
        let direction = match self.option_value(option_names::DIRECTION) {
            Some(v) => parse_direction(v)?,
            None => defaults.direction,
        };

        let rack = Rack {
            size,
            direction,
            assets: self.assets.clone(),
            front_positions: self.front_positions.clone(),
            back_positions: self.back_positions.clone(),
            position_labels: self.rack_pos_labels.clone(),
        };
        rack.validate()?;
        Ok(rack)
    }

    /// Rack descriptors for every rack-capable child location.
    pub fn child_racks(&self, defaults: &RackDefaults) -> Result<Vec<Rack>, IngestError> {
        self.racks
            .iter()
            .filter(|r| r.is_rack())
            .map(|r| r.to_rack(defaults))
            .collect()
    }
}

fn parse_size(value: &Value) -> Result<u32, IngestError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| IngestError::InvalidOption {
        name: option_names::SIZE,
        value: value.to_string(),
    })
}

fn parse_direction(value: &Value) -> Result<Direction, IngestError> {
    let name = value.as_str().map(|s| s.trim().to_ascii_lowercase());
    match name.as_deref() {
        Some(direction_names::DOWNWARDS) => Ok(Direction::Downward),
        Some(direction_names::UPWARDS) => Ok(Direction::Upward),
        _ => Err(IngestError::InvalidOption {
            name: option_names::DIRECTION,
            value: value.to_string(),
        }),
    }
}
