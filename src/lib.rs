//! Level-compressed packing of sparse tensors.
//!
//! A sorted coordinate list (one coordinate sequence per dimension plus the
//! values) is packed into one index per dimension, shaped by that
//! dimension's [`DimensionType`], and a flat value array.
//!
//! ```
//! use levelpack::{pack, Format};
//!
//! let s = pack(&[3], &"s".parse::<Format>().unwrap(), &[vec![0, 2]], &[4.0, 9.0]);
//! assert_eq!(s.index(0).pos(), Some(&[0, 2][..]));
//! assert_eq!(s.values(), &[4.0, 9.0]);
//! ```

pub mod dim_type;
pub mod format;
pub mod error;
pub mod segment;
pub mod capacity;
pub mod pack;
pub mod storage;
pub mod coord_iter;

pub use capacity::find_max_fixed_value;
pub use coord_iter::CoordIterator;
pub use dim_type::DimensionType;
pub use error::{PackError, PackResult};
pub use format::Format;
pub use pack::{pack, try_pack, validate};
pub use segment::unique_entries;
pub use storage::{DimensionIndex, Storage};
