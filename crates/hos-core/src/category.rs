//! Duty categories, the four legally defined driver states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A driver's duty status.
///
/// The declaration order is the grid row order and the serialized index,
/// so variants must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DutyCategory {
    OffDuty,
    SleeperBerth,
    Driving,
    OnDuty,
}

impl DutyCategory {
    /// All categories in row order.
    pub const ALL: [Self; 4] = [
        Self::OffDuty,
        Self::SleeperBerth,
        Self::Driving,
        Self::OnDuty,
    ];

    /// Integer index used by the serialized log shape (0-3).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::OffDuty => 0,
            Self::SleeperBerth => 1,
            Self::Driving => 2,
            Self::OnDuty => 3,
        }
    }

    /// Inverse of [`DutyCategory::index`].
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::OffDuty),
            1 => Some(Self::SleeperBerth),
            2 => Some(Self::Driving),
            3 => Some(Self::OnDuty),
            _ => None,
        }
    }

    /// Short machine name, accepted back by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffDuty => "off",
            Self::SleeperBerth => "sleeper",
            Self::Driving => "driving",
            Self::OnDuty => "on",
        }
    }

    /// Label printed on a paper log sheet.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OffDuty => "Off Duty",
            Self::SleeperBerth => "Sleeper Berth",
            Self::Driving => "Driving",
            Self::OnDuty => "On Duty",
        }
    }
}

impl fmt::Display for DutyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DutyCategory {
    type Err = UnknownDutyCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "off_duty" | "off-duty" | "0" => Ok(Self::OffDuty),
            "sleeper" | "sleeper_berth" | "sleeper-berth" | "sb" | "1" => Ok(Self::SleeperBerth),
            "driving" | "drive" | "d" | "2" => Ok(Self::Driving),
            "on" | "on_duty" | "on-duty" | "3" => Ok(Self::OnDuty),
            _ => Err(UnknownDutyCategory(s.to_string())),
        }
    }
}

impl Serialize for DutyCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.index())
    }
}

impl<'de> Deserialize<'de> for DutyCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let index = u8::deserialize(deserializer)?;
        Self::from_index(index).ok_or_else(|| {
            serde::de::Error::custom(format!("duty status index out of range: {index}"))
        })
    }
}

/// Error type for unrecognized duty category names.
#[derive(Debug, Clone)]
pub struct UnknownDutyCategory(String);

impl fmt::Display for UnknownDutyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown duty status: {} (expected off, sleeper, driving or on)",
            self.0
        )
    }
}

impl std::error::Error for UnknownDutyCategory {}
