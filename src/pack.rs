//! Packing of sorted coordinate lists into level-compressed storage.
//!
//! The packer walks the tensor one level per dimension. At each level the
//! active coordinate range is split into segments according to that
//! level's [`DimensionType`], and every segment is packed into the next
//! level. Descending past the last level stores one value.

use tracing::{debug, trace, warn};

use crate::capacity::find_max_fixed_value;
use crate::dim_type::DimensionType;
use crate::error::{PackError, PackResult};
use crate::format::Format;
use crate::segment::{run_end, unique_entries};
use crate::storage::{DimensionIndex, Storage};

/* ========================= Packer ========================= */

/// Borrowed inputs shared by every level of the recursion
struct Packer<'a> {
    dimensions: &'a [usize],
    coordinates: &'a [Vec<usize>],
    values: &'a [f64],
    format: &'a Format,
}

impl Packer<'_> {
    /// Pack `[begin, end)` at level `i` into `indices[i]`, then the levels below.
    fn pack_tensor(
        &self,
        begin: usize,
        end: usize,
        i: usize,
        indices: &mut [DimensionIndex],
        out: &mut Vec<f64>,
    ) {
        let level_coords = &self.coordinates[i];

        match self.format.get(i) {
            DimensionType::Dense => {
                let mut cbegin = begin;
                for j in 0..self.dimensions[i] {
                    let cend = run_end(level_coords, cbegin, end, j);
                    self.descend(cbegin, cend, i, indices, out);
                    cbegin = cend;
                }
            }
            DimensionType::Sparse => {
                let entries = unique_entries(&level_coords[begin..end]);

                match &mut indices[i] {
                    DimensionIndex::Sparse { pos, idx } => {
                        pos.push(idx.len() + entries.len());
                        idx.extend_from_slice(&entries);
                    }
                    _ => unreachable!("sparse level {} without a sparse index", i),
                }
                trace!(level = i, begin, end, segment = entries.len(), "sparse segment");

                let mut cbegin = begin;
                for &j in &entries {
                    let cend = run_end(level_coords, cbegin, end, j);
                    self.descend(cbegin, cend, i, indices, out);
                    cbegin = cend;
                }
            }
            DimensionType::Fixed => {
                let entries = unique_entries(&level_coords[begin..end]);

                let capacity = match &mut indices[i] {
                    DimensionIndex::Fixed { pos, idx } => {
                        let capacity = pos[0];
                        idx.extend_from_slice(&entries);
                        // pad with the last stored value, or 0 for an empty segment
                        let fill = entries.last().copied().unwrap_or(0);
                        idx.extend(std::iter::repeat(fill).take(capacity.saturating_sub(entries.len())));
                        capacity
                    }
                    _ => unreachable!("fixed level {} without a fixed index", i),
                };

                if entries.len() > capacity {
                    warn!(
                        level = i,
                        capacity,
                        segment = entries.len(),
                        "fixed segment exceeds precomputed capacity"
                    );
                }
                trace!(level = i, begin, end, segment = entries.len(), capacity, "fixed segment");

                let mut cbegin = begin;
                for &j in &entries {
                    let cend = run_end(level_coords, cbegin, end, j);
                    self.descend(cbegin, cend, i, indices, out);
                    cbegin = cend;
                }
                for _ in entries.len()..capacity {
                    self.descend(cbegin, cbegin, i, indices, out);
                }
            }
        }
    }

    /// Continue with the child span `[cbegin, cend)` of level `i`
    #[inline]
    fn descend(
        &self,
        cbegin: usize,
        cend: usize,
        i: usize,
        indices: &mut [DimensionIndex],
        out: &mut Vec<f64>,
    ) {
        if i + 1 == self.format.order() {
            out.push(if cbegin < cend { self.values[cbegin] } else { 0.0 });
        } else {
            self.pack_tensor(cbegin, cend, i + 1, indices, out);
        }
    }
}

/* ========================= Public API ========================= */

/// Pack a sorted coordinate list into level-compressed storage.
///
/// `coordinates` holds one sequence per dimension, each aligned with
/// `values`, sorted lexicographically with dimension 0 major. Duplicate
/// coordinates keep the first value.
///
/// # Panics
/// Panics if the number of dimensions differs from the format order, if a
/// coordinate sequence is not aligned with `values`, or if unsorted
/// coordinates are met while extracting a sparse or fixed segment. Use
/// [`try_pack`] for input that has not been checked.
pub fn pack(
    dimensions: &[usize],
    format: &Format,
    coordinates: &[Vec<usize>],
    values: &[f64],
) -> Storage {
    let order = format.order();
    assert_eq!(dimensions.len(), order, "pack: dimension count does not match format order");
    assert_eq!(coordinates.len(), order, "pack: one coordinate sequence per dimension");
    for crds in coordinates {
        assert_eq!(crds.len(), values.len(), "pack: coordinates not aligned with values");
    }

    let mut indices: Vec<DimensionIndex> = format
        .dimension_types()
        .iter()
        .enumerate()
        .map(|(i, kind)| match kind {
            DimensionType::Dense => DimensionIndex::Dense {
                size: dimensions[i],
            },
            DimensionType::Sparse => DimensionIndex::Sparse {
                pos: vec![0],
                idx: Vec::new(),
            },
            DimensionType::Fixed => {
                let capacity = find_max_fixed_value(coordinates, i);
                debug!(level = i, capacity, "fixed level capacity");
                DimensionIndex::Fixed {
                    pos: vec![capacity],
                    idx: Vec::new(),
                }
            }
        })
        .collect();

    let mut vals = Vec::new();
    if order == 0 {
        vals.push(values.first().copied().unwrap_or(0.0));
    } else {
        let packer = Packer {
            dimensions,
            coordinates,
            values,
            format,
        };
        packer.pack_tensor(0, values.len(), 0, &mut indices, &mut vals);
    }

    debug!(
        fmt = %format,
        nnz = values.len(),
        stored = vals.len(),
        "packed tensor"
    );

    Storage::new(format.clone(), dimensions.to_vec(), indices, vals)
}

/// Check the contract `pack` relies on.
///
/// Checks, in order: dimension count against the format, number of
/// coordinate sequences, alignment with `values`, bounds of every
/// coordinate, and lexicographic order.
pub fn validate(
    dimensions: &[usize],
    format: &Format,
    coordinates: &[Vec<usize>],
    values: &[f64],
) -> PackResult<()> {
    let order = format.order();
    if dimensions.len() != order {
        return Err(PackError::OrderMismatch {
            dimensions: dimensions.len(),
            order,
        });
    }
    if coordinates.len() != order {
        return Err(PackError::CoordinateCount {
            expected: order,
            found: coordinates.len(),
        });
    }

    let nnz = values.len();
    for (dimension, crds) in coordinates.iter().enumerate() {
        if crds.len() != nnz {
            return Err(PackError::LengthMismatch {
                dimension,
                expected: nnz,
                found: crds.len(),
            });
        }
    }

    for (dimension, (crds, &size)) in coordinates.iter().zip(dimensions).enumerate() {
        if let Some(position) = crds.iter().position(|&c| c >= size) {
            return Err(PackError::OutOfBounds {
                dimension,
                position,
                coordinate: crds[position],
                size,
            });
        }
    }

    for position in 1..nnz {
        let ord = coordinates
            .iter()
            .map(|crds| crds[position].cmp(&crds[position - 1]))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal);
        if ord.is_lt() {
            return Err(PackError::Unsorted { position });
        }
    }

    Ok(())
}

/// [`validate`], then [`pack`].
pub fn try_pack(
    dimensions: &[usize],
    format: &Format,
    coordinates: &[Vec<usize>],
    values: &[f64],
) -> PackResult<Storage> {
    validate(dimensions, format, coordinates, values)?;
    Ok(pack(dimensions, format, coordinates, values))
}

/* ========================= Tests ========================= */

#[cfg(test)]
mod tests {
    use super::*;
    use DimensionType::*;

    fn fmt(types: &[DimensionType]) -> Format {
        Format::new(types.to_vec())
    }

    #[test]
    fn dense_dense_2x2() {
        let s = pack(
            &[2, 2],
            &Format::dense(2),
            &[vec![0, 1], vec![0, 1]],
            &[5.0, 7.0],
        );
        assert_eq!(s.values(), &[5.0, 0.0, 0.0, 7.0]);
        assert_eq!(s.index(0), &DimensionIndex::Dense { size: 2 });
        assert_eq!(s.index(1), &DimensionIndex::Dense { size: 2 });
    }

    #[test]
    fn sparse_vector() {
        let s = pack(&[3], &Format::sparse(1), &[vec![0, 2]], &[4.0, 9.0]);
        assert_eq!(
            s.index(0),
            &DimensionIndex::Sparse {
                pos: vec![0, 2],
                idx: vec![0, 2],
            }
        );
        assert_eq!(s.values(), &[4.0, 9.0]);
    }

    #[test]
    fn csr_matrix() {
        // [1 0 2 0]
        // [0 0 0 3]
        // [4 5 0 0]
        let s = pack(
            &[3, 4],
            &Format::csr(),
            &[vec![0, 0, 1, 2, 2], vec![0, 2, 3, 0, 1]],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        );
        assert_eq!(s.index(1).pos(), Some(&[0, 2, 3, 5][..]));
        assert_eq!(s.index(1).idx(), Some(&[0, 2, 3, 0, 1][..]));
        assert_eq!(s.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn dense_fixed_pads_short_row() {
        let s = pack(
            &[2, 3],
            &fmt(&[Dense, Fixed]),
            &[vec![0, 0, 0, 1], vec![0, 1, 2, 1]],
            &[1.0, 2.0, 3.0, 4.0],
        );
        assert_eq!(s.index(1).capacity(), Some(3));
        assert_eq!(s.index(1).idx(), Some(&[0, 1, 2, 1, 1, 1][..]));
        assert_eq!(s.values(), &[1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn fixed_pads_empty_segment_with_zero() {
        // row 1 is empty
        let s = pack(
            &[3, 4],
            &fmt(&[Dense, Fixed]),
            &[vec![0, 0, 2], vec![1, 3, 2]],
            &[1.0, 2.0, 3.0],
        );
        assert_eq!(s.index(1).capacity(), Some(2));
        assert_eq!(s.index(1).idx(), Some(&[1, 3, 0, 0, 2, 2][..]));
        assert_eq!(s.values(), &[1.0, 2.0, 0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn nested_fixed_levels() {
        let s = pack(
            &[2, 3, 3],
            &fmt(&[Dense, Fixed, Fixed]),
            &[vec![0, 0, 0, 1], vec![0, 0, 2, 1], vec![0, 1, 2, 1]],
            &[1.0, 2.0, 3.0, 4.0],
        );
        assert_eq!(s.index(1).capacity(), Some(2));
        assert_eq!(s.index(2).capacity(), Some(2));
        assert_eq!(s.index(1).idx(), Some(&[0, 2, 1, 1][..]));
        assert_eq!(s.index(2).idx(), Some(&[0, 1, 2, 2, 1, 1, 0, 0][..]));
        assert_eq!(s.values(), &[1.0, 2.0, 3.0, 0.0, 4.0, 0.0, 0.0, 0.0]);
        assert_eq!(s.get(&[1, 1, 1]), 4.0);
        assert_eq!(s.get(&[0, 2, 2]), 3.0);
    }

    #[test]
    fn sparse_below_dense_records_empty_segments() {
        let s = pack(
            &[3, 5],
            &Format::csr(),
            &[vec![2], vec![4]],
            &[8.0],
        );
        assert_eq!(s.index(1).pos(), Some(&[0, 0, 0, 1][..]));
        assert_eq!(s.index(1).idx(), Some(&[4][..]));
        assert_eq!(s.values(), &[8.0]);
    }

    #[test]
    fn duplicate_coordinates_keep_first_value() {
        let s = pack(&[4], &Format::sparse(1), &[vec![1, 1, 3]], &[2.0, 5.0, 6.0]);
        assert_eq!(s.index(0).idx(), Some(&[1, 3][..]));
        assert_eq!(s.values(), &[2.0, 6.0]);
    }

    #[test]
    fn empty_coordinates() {
        let none: [Vec<usize>; 2] = [vec![], vec![]];

        let s = pack(&[2, 2], &Format::dense(2), &none, &[]);
        assert_eq!(s.values(), &[0.0; 4]);

        let s = pack(&[2, 3], &Format::csr(), &none, &[]);
        assert_eq!(s.index(1).pos(), Some(&[0, 0, 0][..]));
        assert!(s.values().is_empty());

        let s = pack(&[2, 3], &Format::sparse(2), &none, &[]);
        assert_eq!(s.index(0).pos(), Some(&[0, 0][..]));
        assert_eq!(s.index(1).pos(), Some(&[0][..]));
        assert!(s.values().is_empty());

        let s = pack(&[2, 3], &fmt(&[Dense, Fixed]), &none, &[]);
        assert_eq!(s.index(1).capacity(), Some(0));
        assert!(s.values().is_empty());
    }

    #[test]
    fn zero_sized_dense_dimension() {
        let s = pack(&[0, 3], &Format::csr(), &[vec![], vec![]], &[]);
        assert_eq!(s.index(1).pos(), Some(&[0][..]));
        assert!(s.values().is_empty());
    }

    #[test]
    fn scalar() {
        let s = pack(&[], &Format::new(vec![]), &[], &[3.5]);
        assert_eq!(s.values(), &[3.5]);
        let s = pack(&[], &Format::new(vec![]), &[], &[]);
        assert_eq!(s.values(), &[0.0]);
    }

    #[test]
    fn capacity_heuristic_overflow_keeps_entries() {
        // row (0,0) holds three distinct k, but the pre-pass follows i=1
        let s = pack(
            &[2, 2, 3],
            &fmt(&[Dense, Dense, Fixed]),
            &[
                vec![0, 0, 0, 1, 1, 1, 1],
                vec![0, 0, 0, 0, 0, 1, 1],
                vec![0, 1, 2, 0, 1, 0, 1],
            ],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        );
        assert_eq!(s.index(2).capacity(), Some(2));
        assert_eq!(s.index(2).idx().map(<[usize]>::len), Some(9));
        assert_eq!(s.values().iter().sum::<f64>(), 28.0);
        assert!(matches!(
            s.readable(),
            Err(PackError::FixedOverflow { level: 2, capacity: 2, .. })
        ));
    }

    #[test]
    fn inputs_untouched_and_idempotent() {
        let crds = vec![vec![0, 1, 1], vec![2, 0, 2]];
        let vals = vec![1.0, 2.0, 3.0];
        let f = fmt(&[Sparse, Fixed]);

        let a = pack(&[2, 3], &f, &crds, &vals);
        let b = pack(&[2, 3], &f, &crds, &vals);
        assert_eq!(a, b);
        assert_eq!(crds, vec![vec![0, 1, 1], vec![2, 0, 2]]);
        assert_eq!(vals, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic]
    fn pack_order_mismatch() {
        let _ = pack(&[2, 2], &Format::dense(1), &[vec![0]], &[1.0]);
    }

    #[test]
    #[should_panic]
    fn pack_unsorted_sparse() {
        let _ = pack(&[3], &Format::sparse(1), &[vec![2, 1]], &[1.0, 2.0]);
    }

    #[test]
    fn validate_errors() {
        let f = Format::csr();
        assert_eq!(
            validate(&[2], &f, &[vec![0], vec![0]], &[1.0]),
            Err(PackError::OrderMismatch { dimensions: 1, order: 2 })
        );
        assert_eq!(
            validate(&[2, 2], &f, &[vec![0]], &[1.0]),
            Err(PackError::CoordinateCount { expected: 2, found: 1 })
        );
        assert_eq!(
            validate(&[2, 2], &f, &[vec![0], vec![0, 1]], &[1.0]),
            Err(PackError::LengthMismatch {
                dimension: 1,
                expected: 1,
                found: 2,
            })
        );
        assert_eq!(
            validate(&[2, 2], &f, &[vec![0, 1], vec![0, 2]], &[1.0, 2.0]),
            Err(PackError::OutOfBounds {
                dimension: 1,
                position: 1,
                coordinate: 2,
                size: 2,
            })
        );
        assert_eq!(
            validate(&[2, 2], &f, &[vec![0, 1, 1], vec![0, 1, 0]], &[1.0, 2.0, 3.0]),
            Err(PackError::Unsorted { position: 2 })
        );
        assert_eq!(
            validate(&[2, 2], &f, &[vec![0, 0, 1], vec![1, 1, 0]], &[1.0, 2.0, 3.0]),
            Ok(())
        );
    }

    #[test]
    fn try_pack_reports_instead_of_panicking() {
        let err = try_pack(&[3], &Format::sparse(1), &[vec![2, 1]], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, PackError::Unsorted { position: 1 });

        let s = try_pack(&[3], &Format::sparse(1), &[vec![0, 2]], &[4.0, 9.0]).unwrap();
        assert_eq!(s.values(), &[4.0, 9.0]);
    }
}
