//! Collections keyed by index newtypes or by approximate coordinates.

#[macro_use]
pub mod generic_vec;
pub mod approx_hashmap;
pub mod fuzzy_point_table;

pub use approx_hashmap::{ApproxHashMap, ApproxHashMapKey};
pub use fuzzy_point_table::{FuzzyError, FuzzyPointTable, FuzzyTolerance};
pub use generic_vec::{GenericVec, IndexNewtype, IndexOutOfRange, IndexOverflow};
