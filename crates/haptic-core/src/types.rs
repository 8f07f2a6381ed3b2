use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

/// Strength of a single actuator pulse.
///
/// The four levels correspond to the wrist device's built-in haptic types:
/// `Light` = click, `Medium` = directionUp, `Strong` = notification,
/// `Success` = success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    Medium,
    Strong,
    Success,
}

impl Intensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Medium => "medium",
            Intensity::Strong => "strong",
            Intensity::Success => "success",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intensity {
    type Err = crate::error::HapticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Intensity::Light),
            "medium" => Ok(Intensity::Medium),
            "strong" => Ok(Intensity::Strong),
            "success" => Ok(Intensity::Success),
            _ => Err(crate::error::HapticError::InvalidIntensity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PulseSpec
// ---------------------------------------------------------------------------

/// One pulse of a pattern, offset from the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseSpec {
    pub intensity: Intensity,
    pub offset_ms: u32,
}

impl PulseSpec {
    pub const fn new(intensity: Intensity, offset_ms: u32) -> Self {
        Self {
            intensity,
            offset_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// HapticStrength
// ---------------------------------------------------------------------------

/// User preference for the haptic test sequence ("기본" / "강하게").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticStrength {
    #[default]
    Basic,
    Strong,
}

impl HapticStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            HapticStrength::Basic => "basic",
            HapticStrength::Strong => "strong",
        }
    }
}

impl fmt::Display for HapticStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HapticStrength {
    type Err = crate::error::HapticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(HapticStrength::Basic),
            "strong" => Ok(HapticStrength::Strong),
            _ => Err(crate::error::HapticError::InvalidStrength(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
