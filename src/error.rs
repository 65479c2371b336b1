//! Errors reported by the validating entry points.
//!
//! `pack` itself treats these conditions as contract violations and panics;
//! `validate` and `try_pack` surface them as values for untrusted input.

use thiserror::Error;

/// Result alias for the validating entry points.
pub type PackResult<T> = Result<T, PackError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Number of dimension sizes differs from the format order.
    #[error("{dimensions} dimension sizes given for a format of order {order}")]
    OrderMismatch { dimensions: usize, order: usize },

    /// Number of coordinate sequences differs from the order.
    #[error("expected {expected} coordinate sequences, found {found}")]
    CoordinateCount { expected: usize, found: usize },

    /// A coordinate sequence is not aligned with the values.
    #[error("coordinates of dimension {dimension} have length {found}, expected {expected}")]
    LengthMismatch {
        dimension: usize,
        expected: usize,
        found: usize,
    },

    /// A coordinate lies outside its dimension.
    #[error(
        "coordinate {coordinate} at position {position} exceeds size {size} of dimension {dimension}"
    )]
    OutOfBounds {
        dimension: usize,
        position: usize,
        coordinate: usize,
        size: usize,
    },

    /// Entry `position` sorts before entry `position - 1`.
    #[error("coordinates are not lexicographically sorted at position {position}")]
    Unsorted { position: usize },

    #[error("unknown dimension type: {0:?}")]
    UnknownDimensionType(String),

    /// Number of dimension indices differs from the format order.
    #[error("expected {expected} dimension indices, found {found}")]
    IndexCount { expected: usize, found: usize },

    /// A dimension index is inconsistent with the levels above it.
    #[error("malformed index at level {level}: {reason}")]
    MalformedIndex { level: usize, reason: &'static str },

    /// The value array does not have one entry per leaf slot.
    #[error("expected {expected} values, found {found}")]
    ValueCount { expected: usize, found: usize },

    /// A fixed level holds segments wider than its capacity, so segment
    /// boundaries can no longer be derived from the capacity.
    #[error(
        "fixed level {level} holds {found} entries, more than {expected} for capacity {capacity}"
    )]
    FixedOverflow {
        level: usize,
        capacity: usize,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let e = PackError::OrderMismatch { dimensions: 3, order: 2 };
        assert_eq!(e.to_string(), "3 dimension sizes given for a format of order 2");

        let e = PackError::OutOfBounds {
            dimension: 1,
            position: 4,
            coordinate: 9,
            size: 5,
        };
        assert_eq!(
            e.to_string(),
            "coordinate 9 at position 4 exceeds size 5 of dimension 1"
        );
    }
}
