use serde::{Deserialize, Serialize};

use crate::coord_iter::CoordIterator;
use crate::dim_type::DimensionType;
use crate::error::{PackError, PackResult};
use crate::format::Format;

/* ========================= DimensionIndex ========================= */

/// Packed index of one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionIndex {
    /// Only the dimension size is stored
    Dense { size: usize },

    /// `pos[0] == 0`, then the cumulative end of each parent segment in `idx`
    Sparse { pos: Vec<usize>, idx: Vec<usize> },

    /// `pos == [capacity]`; `idx` holds `capacity` entries per parent segment
    Fixed { pos: Vec<usize>, idx: Vec<usize> },
}

impl DimensionIndex {
    pub fn kind(&self) -> DimensionType {
        match self {
            DimensionIndex::Dense { .. } => DimensionType::Dense,
            DimensionIndex::Sparse { .. } => DimensionType::Sparse,
            DimensionIndex::Fixed { .. } => DimensionType::Fixed,
        }
    }

    pub fn pos(&self) -> Option<&[usize]> {
        match self {
            DimensionIndex::Dense { .. } => None,
            DimensionIndex::Sparse { pos, .. } | DimensionIndex::Fixed { pos, .. } => Some(pos),
        }
    }

    pub fn idx(&self) -> Option<&[usize]> {
        match self {
            DimensionIndex::Dense { .. } => None,
            DimensionIndex::Sparse { idx, .. } | DimensionIndex::Fixed { idx, .. } => Some(idx),
        }
    }

    /// Per-segment capacity of a `Fixed` dimension
    pub fn capacity(&self) -> Option<usize> {
        match self {
            DimensionIndex::Fixed { pos, .. } => pos.first().copied(),
            _ => None,
        }
    }

    /// Child slots of parent slot `p`, as a range into the next level
    fn children(&self, p: usize) -> std::ops::Range<usize> {
        match self {
            DimensionIndex::Dense { size } => p * size..(p + 1) * size,
            DimensionIndex::Sparse { pos, .. } => pos[p]..pos[p + 1],
            DimensionIndex::Fixed { pos, .. } => p * pos[0]..(p + 1) * pos[0],
        }
    }
}

/* ========================= Storage ========================= */

/// Level-compressed tensor: one index per dimension plus the values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StorageParts")]
pub struct Storage {
    format: Format,
    dimensions: Vec<usize>,
    indices: Vec<DimensionIndex>,
    values: Vec<f64>,
    /// First fixed level whose segments outgrew the capacity
    #[serde(skip)]
    overflow: Option<PackError>,
}

/// Unchecked serialized form of `Storage`
#[derive(Deserialize)]
struct StorageParts {
    format: Format,
    dimensions: Vec<usize>,
    indices: Vec<DimensionIndex>,
    values: Vec<f64>,
}

impl TryFrom<StorageParts> for Storage {
    type Error = PackError;

    fn try_from(parts: StorageParts) -> PackResult<Self> {
        let overflow = check_layout(&parts.format, &parts.dimensions, &parts.indices, &parts.values)?;
        Ok(Self {
            format: parts.format,
            dimensions: parts.dimensions,
            indices: parts.indices,
            values: parts.values,
            overflow,
        })
    }
}

/// Check that every index fits the slots of the level above it and that
/// there is one value per leaf slot. A fixed level with more entries than
/// `parent slots * capacity` is reported as `Ok(Some(FixedOverflow))`: the
/// packer produces it when the capacity pre-pass under-estimates.
fn check_layout(
    format: &Format,
    dimensions: &[usize],
    indices: &[DimensionIndex],
    values: &[f64],
) -> PackResult<Option<PackError>> {
    let order = format.order();
    if dimensions.len() != order {
        return Err(PackError::OrderMismatch {
            dimensions: dimensions.len(),
            order,
        });
    }
    if indices.len() != order {
        return Err(PackError::IndexCount {
            expected: order,
            found: indices.len(),
        });
    }

    let malformed = |level, reason| PackError::MalformedIndex { level, reason };
    let mut overflow = None;
    let mut parents = 1usize;

    for (level, index) in indices.iter().enumerate() {
        if index.kind() != format.get(level) {
            return Err(malformed(level, "kind differs from the format"));
        }

        parents = match index {
            DimensionIndex::Dense { size } => {
                if *size != dimensions[level] {
                    return Err(malformed(level, "dense size differs from the dimension"));
                }
                parents
                    .checked_mul(*size)
                    .ok_or(malformed(level, "slot count overflows"))?
            }
            DimensionIndex::Sparse { pos, idx } => {
                if pos.len() != parents + 1 {
                    return Err(malformed(level, "pos needs one entry per parent slot plus one"));
                }
                if pos[0] != 0 || pos[parents] != idx.len() {
                    return Err(malformed(level, "pos must run from 0 to the idx length"));
                }
                if pos.windows(2).any(|w| w[0] > w[1]) {
                    return Err(malformed(level, "pos decreases"));
                }
                for w in pos.windows(2) {
                    if idx[w[0]..w[1]].windows(2).any(|p| p[0] >= p[1]) {
                        return Err(malformed(level, "idx not increasing within a segment"));
                    }
                }
                idx.len()
            }
            DimensionIndex::Fixed { pos, idx } => {
                let &[capacity] = pos.as_slice() else {
                    return Err(malformed(level, "pos must hold only the capacity"));
                };
                let expected = parents
                    .checked_mul(capacity)
                    .ok_or(malformed(level, "slot count overflows"))?;
                if idx.len() < expected {
                    return Err(malformed(level, "idx shorter than parent slots times capacity"));
                }
                if idx.len() > expected && overflow.is_none() {
                    overflow = Some(PackError::FixedOverflow {
                        level,
                        capacity,
                        expected,
                        found: idx.len(),
                    });
                }
                idx.len()
            }
        };
    }

    if values.len() != parents {
        return Err(PackError::ValueCount {
            expected: parents,
            found: values.len(),
        });
    }
    Ok(overflow)
}

impl Storage {
    pub(crate) fn new(
        format: Format,
        dimensions: Vec<usize>,
        indices: Vec<DimensionIndex>,
        values: Vec<f64>,
    ) -> Self {
        let overflow = check_layout(&format, &dimensions, &indices, &values)
            .unwrap_or_else(|e| panic!("Storage::new: {}", e));
        Self {
            format,
            dimensions,
            indices,
            values,
            overflow,
        }
    }

    /// `Err(FixedOverflow)` if a fixed level outgrew its capacity.
    /// Such storage keeps every entry but cannot be read back by
    /// coordinate.
    pub fn readable(&self) -> PackResult<()> {
        match &self.overflow {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn assert_readable(&self) {
        if let Some(e) = &self.overflow {
            panic!("Storage is not readable: {}", e);
        }
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn order(&self) -> usize {
        self.format.order()
    }

    pub fn index(&self, i: usize) -> &DimensionIndex {
        &self.indices[i]
    }

    pub fn indices(&self) -> &[DimensionIndex] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /* ---------- read-back ---------- */

    /// Value stored at `crd`, or `0.0` if it is not represented.
    ///
    /// # Panics
    /// Panics if `crd` does not have one entry per dimension, or if the
    /// storage is not [`readable`](Storage::readable).
    pub fn get(&self, crd: &[usize]) -> f64 {
        assert_eq!(crd.len(), self.order(), "Storage::get: coordinate arity mismatch");
        self.assert_readable();

        let mut p = 0;
        for (index, &c) in self.indices.iter().zip(crd) {
            let slot = match index {
                DimensionIndex::Dense { size } => (c < *size).then(|| p * size + c),
                DimensionIndex::Sparse { idx, .. } => {
                    let seg = index.children(p);
                    idx[seg.clone()].binary_search(&c).ok().map(|k| seg.start + k)
                }
                DimensionIndex::Fixed { idx, .. } => {
                    // padding repeats the last value; the first match is the stored one
                    let seg = index.children(p);
                    idx[seg.clone()].iter().position(|&x| x == c).map(|k| seg.start + k)
                }
            };
            match slot {
                Some(s) => p = s,
                None => return 0.0,
            }
        }

        self.values[p]
    }

    /// Every stored leaf slot, in packing order, with its coordinate.
    /// Explicit zeros of dense gaps and fixed padding are included.
    ///
    /// # Panics
    /// Panics if the storage is not [`readable`](Storage::readable).
    pub fn iter(&self) -> std::vec::IntoIter<(Vec<usize>, f64)> {
        self.assert_readable();
        let mut out = Vec::with_capacity(self.values.len());
        self.collect_slots(0, 0, &mut Vec::with_capacity(self.order()), &mut out);
        out.into_iter()
    }

    fn collect_slots(
        &self,
        level: usize,
        p: usize,
        prefix: &mut Vec<usize>,
        out: &mut Vec<(Vec<usize>, f64)>,
    ) {
        if level == self.order() {
            out.push((prefix.clone(), self.values[p]));
            return;
        }

        let index = &self.indices[level];
        for q in index.children(p) {
            let c = match index {
                DimensionIndex::Dense { size } => q % size,
                DimensionIndex::Sparse { idx, .. } | DimensionIndex::Fixed { idx, .. } => idx[q],
            };
            prefix.push(c);
            self.collect_slots(level + 1, q, prefix, out);
            prefix.pop();
        }
    }

    /// Row-major dense expansion over `dimensions()`
    ///
    /// # Panics
    /// Panics if the storage is not [`readable`](Storage::readable).
    pub fn to_dense(&self) -> Vec<f64> {
        self.assert_readable();
        let it = CoordIterator::new(self.dimensions.clone());
        let mut out = Vec::with_capacity(it.volume());
        for crd in it {
            out.push(self.get(&crd));
        }
        out
    }
}

/* ========================= Tests ========================= */
