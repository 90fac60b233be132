//! Rack faces, face bitsets and depth classes.
//!
//! A rack cross-section has three depth-wise slots: Front, Interior and
//! Back. An asset's depth class decides how many of them it fills and which
//! faces it may be anchored from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::face_bits;
use crate::error::PlacementError;

/// One of the three depth-wise mounting slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Front,
    Interior,
    Back,
}

impl Face {
    /// All faces in drawing order (front to back).
    pub const ALL: [Face; 3] = [Face::Front, Face::Interior, Face::Back];

    /// Slot index into a per-unit row.
    pub fn index(self) -> usize {
        match self {
            Face::Front => 0,
            Face::Interior => 1,
            Face::Back => 2,
        }
    }

    /// Wire bit for this face.
    pub fn bit(self) -> u8 {
        match self {
            Face::Front => face_bits::FRONT,
            Face::Interior => face_bits::INTERIOR,
            Face::Back => face_bits::BACK,
        }
    }

    /// Interior only exists as a byproduct of deeper footprints.
    pub fn is_anchor_face(self) -> bool {
        self != Face::Interior
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Interior => "interior",
            Face::Back => "back",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitset over [`Face`], carried on asset records as `fib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceSet(u8);

impl FaceSet {
    pub const EMPTY: FaceSet = FaceSet(0);
    pub const FULL: FaceSet = FaceSet(face_bits::ALL);

    /// Build from raw bits; unknown bits are dropped.
    pub fn from_bits(bits: u8) -> Self {
        FaceSet(bits & face_bits::ALL)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, face: Face) -> bool {
        self.0 & face.bit() != 0
    }

    pub fn with(self, face: Face) -> Self {
        FaceSet(self.0 | face.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 & face_bits::ALL == 0
    }

    pub fn len(self) -> usize {
        (self.0 & face_bits::ALL).count_ones() as usize
    }

    /// Faces present in the set, front to back.
    pub fn iter(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Face> for FaceSet {
    fn from_iter<I: IntoIterator<Item = Face>>(iter: I) -> Self {
        iter.into_iter().fold(FaceSet::EMPTY, FaceSet::with)
    }
}

impl fmt::Display for FaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(Face::name).collect();
        f.write_str(&names.join("+"))
    }
}

/// Depth class of a footprint (`hsize` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DepthClass {
    /// One of Front or Back.
    Shallow = 1,
    /// Front+Interior or Back+Interior.
    Medium = 2,
    /// Front+Interior+Back, anchored from the Front only.
    Full = 3,
}

/// An anchor face together with the faces that must be free to anchor there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorGroup {
    pub anchor: Face,
    pub required: FaceSet,
}

const SHALLOW_GROUPS: [AnchorGroup; 2] = [
    AnchorGroup {
        anchor: Face::Front,
        required: FaceSet(face_bits::FRONT),
    },
    AnchorGroup {
        anchor: Face::Back,
        required: FaceSet(face_bits::BACK),
    },
];

const MEDIUM_GROUPS: [AnchorGroup; 2] = [
    AnchorGroup {
        anchor: Face::Front,
        required: FaceSet(face_bits::FRONT | face_bits::INTERIOR),
    },
    AnchorGroup {
        anchor: Face::Back,
        required: FaceSet(face_bits::BACK | face_bits::INTERIOR),
    },
];

const FULL_GROUPS: [AnchorGroup; 1] = [AnchorGroup {
    anchor: Face::Front,
    required: FaceSet(face_bits::ALL),
}];

impl DepthClass {
    pub fn hsize(self) -> u8 {
        self as u8
    }

    /// Candidate anchors for a new footprint of this depth.
    pub fn anchor_groups(self) -> &'static [AnchorGroup] {
        match self {
            DepthClass::Shallow => &SHALLOW_GROUPS,
            DepthClass::Medium => &MEDIUM_GROUPS,
            DepthClass::Full => &FULL_GROUPS,
        }
    }

    /// Face set assumed for a record that stores no `fib`. Shallow and
    /// medium assets default to the front side.
    pub fn default_faces(self) -> FaceSet {
        self.anchor_groups()[0].required
    }

    /// Whether `faces` is a shape this depth class can physically occupy.
    pub fn admits(self, faces: FaceSet) -> bool {
        self.anchor_groups().iter().any(|g| g.required == faces)
    }
}

impl TryFrom<u8> for DepthClass {
    type Error = PlacementError;

    fn try_from(hsize: u8) -> Result<Self, Self::Error> {
        match hsize {
            1 => Ok(DepthClass::Shallow),
            2 => Ok(DepthClass::Medium),
            3 => Ok(DepthClass::Full),
            other => Err(PlacementError::InvalidDepthClass(other)),
        }
    }
}

impl From<DepthClass> for u8 {
    fn from(depth: DepthClass) -> u8 {
        depth.hsize()
    }
}
