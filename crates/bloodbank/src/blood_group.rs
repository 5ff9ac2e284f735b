//! The eight ABO/Rh blood groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A blood group.
///
/// Variants are declared in enumeration order, which is also the order used
/// for display and for breaking ties when picking the most-stocked group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A, Rh positive.
    #[serde(rename = "A+")]
    APos,
    /// A, Rh negative.
    #[serde(rename = "A-")]
    ANeg,
    /// B, Rh positive.
    #[serde(rename = "B+")]
    BPos,
    /// B, Rh negative.
    #[serde(rename = "B-")]
    BNeg,
    /// AB, Rh positive.
    #[serde(rename = "AB+")]
    AbPos,
    /// AB, Rh negative.
    #[serde(rename = "AB-")]
    AbNeg,
    /// O, Rh positive.
    #[serde(rename = "O+")]
    OPos,
    /// O, Rh negative.
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    /// All groups in enumeration order.
    pub const ALL: [Self; 8] = [
        Self::APos,
        Self::ANeg,
        Self::BPos,
        Self::BNeg,
        Self::AbPos,
        Self::AbNeg,
        Self::OPos,
        Self::ONeg,
    ];

    /// The canonical label, e.g. `"AB-"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::APos => "A+",
            Self::ANeg => "A-",
            Self::BPos => "B+",
            Self::BNeg => "B-",
            Self::AbPos => "AB+",
            Self::AbNeg => "AB-",
            Self::OPos => "O+",
            Self::ONeg => "O-",
        }
    }

    /// Position in [`BloodGroup::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a group by its exact label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == label)
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string is not one of the eight labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood group: {0:?}")]
pub struct UnknownBloodGroup(pub String);

impl FromStr for BloodGroup {
    type Err = UnknownBloodGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_label(trimmed).ok_or_else(|| UnknownBloodGroup(trimmed.to_string()))
    }
}
