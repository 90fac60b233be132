//! Wire-level constants: face bits, location type magic flags, rack defaults.
//!
//! These are the raw integer values carried on location and asset records.
//! The typed API in [`crate::face`] and [`crate::location`] wraps them.

pub mod face_bits {
    pub const FRONT: u8 = 0x01;
    pub const INTERIOR: u8 = 0x02;
    pub const BACK: u8 = 0x04;
    pub const ALL: u8 = FRONT | INTERIOR | BACK;
}

pub mod location_magic {
    /// Location type can hold rack-mounted assets.
    pub const RACK: u32 = 0x10;
    /// Location type is hidden from listings.
    pub const HIDDEN: u32 = 0x20;
}

pub mod option_names {
    pub const SIZE: &str = "size";
    pub const DIRECTION: &str = "direction";
}

pub mod direction_names {
    pub const DOWNWARDS: &str = "downwards";
    pub const UPWARDS: &str = "upwards";
}

/// Rack height used when the option schema carries no `size` entry.
pub const DEFAULT_RACK_SIZE: u32 = 42;
