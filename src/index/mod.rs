//! Box index over temporal bounding volumes.
//!
//! The tree only ever sees boxes. Matches flagged `recheck` need the caller
//! to test the values behind the boxes.

mod octree;
mod predicate;

pub use octree::{BoxOctree, IndexStats, MAX_BOUNDS, Match, SplitPlan};
pub use predicate::{Predicate, Relation};
