use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Storage kind of one tensor dimension
///
/// Convention:
/// - `Dense`  → every coordinate in `[0, size)` gets a slot
/// - `Sparse` → only occurring coordinates, segments delimited by `pos`
/// - `Fixed`  → like `Sparse`, every segment padded to one capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionType {
    Dense,
    Sparse,
    Fixed,
}

impl DimensionType {
    /// One-letter code used by the compact `Format` notation
    pub const fn code(&self) -> char {
        match self {
            DimensionType::Dense => 'd',
            DimensionType::Sparse => 's',
            DimensionType::Fixed => 'f',
        }
    }

    pub(crate) fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(DimensionType::Dense),
            's' => Some(DimensionType::Sparse),
            'f' => Some(DimensionType::Fixed),
            _ => None,
        }
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Accepts the one-letter code or the full name, case-insensitive.
/// `compressed` is an alias for `sparse`.
impl FromStr for DimensionType {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let mut chars = t.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(kind) = DimensionType::from_code(c) {
                return Ok(kind);
            }
        }

        match t.to_ascii_lowercase().as_str() {
            "dense" => Ok(DimensionType::Dense),
            "sparse" | "compressed" => Ok(DimensionType::Sparse),
            "fixed" => Ok(DimensionType::Fixed),
            _ => Err(PackError::UnknownDimensionType(t.to_string())),
        }
    }
}
