use thiserror::Error;

use crate::location::LocationId;

/// A placement request rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("rack size must be between 1 and 2147483647, got {0}")]
    InvalidRackSize(u32),

    #[error("vertical span must be at least 1, got {0}")]
    InvalidVsize(u32),

    #[error("depth class must be 1, 2 or 3, got {0}")]
    InvalidDepthClass(u8),
}

/// A location record that cannot be turned into a rack descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("location #{0} is not rack-capable")]
    NotARack(LocationId),

    #[error("option `{name}` has unusable value {value}")]
    InvalidOption { name: &'static str, value: String },

    #[error(transparent)]
    Placement(#[from] PlacementError),
}
