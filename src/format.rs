use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dim_type::DimensionType;
use crate::error::PackError;

/// Format = ordered storage kind per dimension (dimension 0 outermost)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    dimension_types: Vec<DimensionType>,
}

impl Format {
    pub fn new(dimension_types: Vec<DimensionType>) -> Self {
        Self { dimension_types }
    }

    /// All dimensions dense
    pub fn dense(order: usize) -> Self {
        Self::new(vec![DimensionType::Dense; order])
    }

    /// All dimensions sparse
    pub fn sparse(order: usize) -> Self {
        Self::new(vec![DimensionType::Sparse; order])
    }

    /// Compressed sparse row: dense rows, sparse columns
    pub fn csr() -> Self {
        Self::new(vec![DimensionType::Dense, DimensionType::Sparse])
    }

    /// Number of dimensions
    pub fn order(&self) -> usize {
        self.dimension_types.len()
    }

    pub fn dimension_types(&self) -> &[DimensionType] {
        &self.dimension_types
    }

    pub fn get(&self, i: usize) -> DimensionType {
        assert!(i < self.order(), "Level out of bounds in Format::get");
        self.dimension_types[i]
    }

    /// Levels declared `Fixed`, outermost first
    pub fn fixed_levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.dimension_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == DimensionType::Fixed)
            .map(|(i, _)| i)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, t) in self.dimension_types.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, ")")
    }
}

/// Parses either the compact form (`"dsf"`) or a comma separated list of
/// codes or names (`"dense,sparse,f"`). Surrounding parentheses are
/// ignored, so `Display` output parses back.
impl FromStr for Format {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let t = t
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(t)
            .trim();

        if t.is_empty() {
            return Ok(Format::new(Vec::new()));
        }

        let dimension_types = if t.contains(',') {
            t.split(',')
                .map(str::parse::<DimensionType>)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            t.chars()
                .map(|c| {
                    DimensionType::from_code(c)
                        .ok_or_else(|| PackError::UnknownDimensionType(c.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Format::new(dimension_types))
    }
}
