//! STL export settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A signed coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// +X
    #[serde(rename = "X", alias = "+X")]
    X,
    /// +Y
    #[serde(rename = "Y", alias = "+Y")]
    Y,
    /// +Z
    #[serde(rename = "Z", alias = "+Z")]
    Z,
    /// -X
    #[serde(rename = "NEGATIVE_X", alias = "-X")]
    NegX,
    /// -Y
    #[serde(rename = "NEGATIVE_Y", alias = "-Y")]
    NegY,
    /// -Z
    #[serde(rename = "NEGATIVE_Z", alias = "-Z")]
    NegZ,
}

impl Axis {
    /// Unit vector of this axis.
    pub fn unit(self) -> [f64; 3] {
        match self {
            Self::X => [1.0, 0.0, 0.0],
            Self::Y => [0.0, 1.0, 0.0],
            Self::Z => [0.0, 0.0, 1.0],
            Self::NegX => [-1.0, 0.0, 0.0],
            Self::NegY => [0.0, -1.0, 0.0],
            Self::NegZ => [0.0, 0.0, -1.0],
        }
    }

    /// Whether `self` and `other` lie on the same line.
    pub fn is_collinear_with(self, other: Axis) -> bool {
        let a = self.unit();
        let b = other.unit();
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f64>().abs() > 0.5
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::X => "+X",
            Self::Y => "+Y",
            Self::Z => "+Z",
            Self::NegX => "-X",
            Self::NegY => "-Y",
            Self::NegZ => "-Z",
        };
        f.write_str(label)
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" | "+X" => Ok(Self::X),
            "Y" | "+Y" => Ok(Self::Y),
            "Z" | "+Z" => Ok(Self::Z),
            "-X" | "NEGATIVE_X" => Ok(Self::NegX),
            "-Y" | "NEGATIVE_Y" => Ok(Self::NegY),
            "-Z" | "NEGATIVE_Z" => Ok(Self::NegZ),
            other => Err(format!(
                "unknown axis '{other}', expected one of X, Y, Z, -X, -Y, -Z"
            )),
        }
    }
}

/// Settings handed to the mesh exporter.
///
/// Forward and up axes are not checked for collinearity here; the exporter
/// rejects a degenerate pair.
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Global scale factor (1 = unchanged, 1000 turns metres into millimetres).
    #[validate(range(min = 0.001), custom(function = "validate_finite"))]
    pub scale: f64,
    /// Write ASCII STL instead of binary.
    pub ascii: bool,
    /// Apply object modifiers before export.
    pub apply_modifiers: bool,
    /// Apply the scene unit scale.
    pub use_scene_unit: bool,
    /// Forward axis in exported coordinates.
    pub forward_axis: Axis,
    /// Up axis in exported coordinates.
    pub up_axis: Axis,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            ascii: false,
            apply_modifiers: true,
            use_scene_unit: true,
            forward_axis: Axis::Y,
            up_axis: Axis::Z,
        }
    }
}

/// Reject NaN and infinities, which pass a plain range check.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite").with_message("must be a finite number".into()))
    }
}
