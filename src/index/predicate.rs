//! Box relations and their pruning rules.
//!
//! A relation is evaluated exactly on leaf boxes with [`Relation::holds`] and
//! conservatively on subtrees with [`Predicate::may_hold`], which only sees
//! the range every bound of the subtree can take.

use super::octree::Bounds;
use mobility_types::bbox::{Axis, AxisSet, BoundingBox};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation between a stored box and a query box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Overlaps,
    Contains,
    ContainedBy,
    Same,
    Left,
    LeftOrTouching,
    Right,
    RightOrTouching,
    Below,
    BelowOrTouching,
    Above,
    AboveOrTouching,
    Front,
    FrontOrTouching,
    Back,
    BackOrTouching,
    Before,
    BeforeOrTouching,
    After,
    AfterOrTouching,
}

/// Side of the query a directional relation puts the stored box on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

impl Relation {
    pub const ALL: [Relation; 20] = [
        Relation::Overlaps,
        Relation::Contains,
        Relation::ContainedBy,
        Relation::Same,
        Relation::Left,
        Relation::LeftOrTouching,
        Relation::Right,
        Relation::RightOrTouching,
        Relation::Below,
        Relation::BelowOrTouching,
        Relation::Above,
        Relation::AboveOrTouching,
        Relation::Front,
        Relation::FrontOrTouching,
        Relation::Back,
        Relation::BackOrTouching,
        Relation::Before,
        Relation::BeforeOrTouching,
        Relation::After,
        Relation::AfterOrTouching,
    ];

    fn directional(self) -> Option<(Axis, Side, bool)> {
        use Relation::*;
        Some(match self {
            Left => (Axis::X, Side::Lower, false),
            LeftOrTouching => (Axis::X, Side::Lower, true),
            Right => (Axis::X, Side::Upper, false),
            RightOrTouching => (Axis::X, Side::Upper, true),
            Below => (Axis::Y, Side::Lower, false),
            BelowOrTouching => (Axis::Y, Side::Lower, true),
            Above => (Axis::Y, Side::Upper, false),
            AboveOrTouching => (Axis::Y, Side::Upper, true),
            Front => (Axis::Z, Side::Lower, false),
            FrontOrTouching => (Axis::Z, Side::Lower, true),
            Back => (Axis::Z, Side::Upper, false),
            BackOrTouching => (Axis::Z, Side::Upper, true),
            Before => (Axis::T, Side::Lower, false),
            BeforeOrTouching => (Axis::T, Side::Lower, true),
            After => (Axis::T, Side::Upper, false),
            AfterOrTouching => (Axis::T, Side::Upper, true),
            Overlaps | Contains | ContainedBy | Same => return None,
        })
    }

    /// Exact test of `stored` against `query` on the axes both carry.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobility::index::Relation;
    /// use mobility_types::bbox::BoundingBox;
    ///
    /// let stored = BoundingBox::new().with_x(0.0, 10.0);
    /// let query = BoundingBox::new().with_x(10.0, 20.0);
    /// assert!(!Relation::Left.holds(&stored, &query));
    /// assert!(Relation::LeftOrTouching.holds(&stored, &query));
    /// ```
    pub fn holds(self, stored: &BoundingBox, query: &BoundingBox) -> bool {
        match self {
            Relation::Overlaps => stored.overlaps(query),
            Relation::Contains => stored.contains(query),
            Relation::ContainedBy => stored.contained_by(query),
            Relation::Same => stored.same(query),
            _ => match self.directional() {
                Some((axis, Side::Lower, false)) => stored.strictly_below_on(query, axis),
                Some((axis, Side::Lower, true)) => stored.below_or_touching_on(query, axis),
                Some((axis, Side::Upper, false)) => query.strictly_below_on(stored, axis),
                Some((axis, Side::Upper, true)) => query.below_or_touching_on(stored, axis),
                None => false,
            },
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Range each bound of a subtree can take.
///
/// Both ends are treated as inclusive, which keeps pruning conservative.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cube {
    pub lo: Bounds,
    pub hi: Bounds,
}

impl Cube {
    pub fn unbounded() -> Self {
        Self {
            lo: [f64::NEG_INFINITY; super::octree::MAX_BOUNDS],
            hi: [f64::INFINITY; super::octree::MAX_BOUNDS],
        }
    }

    /// Cube of child slot `slot` under a node split at `centroid`.
    pub fn child(&self, centroid: &Bounds, dims: usize, slot: usize) -> Self {
        let mut out = *self;
        for j in 0..dims {
            if slot & (1 << j) != 0 {
                out.lo[j] = out.lo[j].max(centroid[j]);
            } else {
                out.hi[j] = out.hi[j].min(centroid[j]);
            }
        }
        out
    }
}

/// One relation against one query box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub relation: Relation,
    pub query: BoundingBox,
}

impl Predicate {
    pub fn new(relation: Relation, query: BoundingBox) -> Self {
        Self { relation, query }
    }

    /// True when a box match only approximates the relation between the
    /// values behind the boxes.
    pub fn needs_recheck(&self) -> bool {
        self.relation == Relation::Overlaps
    }

    pub fn holds(&self, stored: &BoundingBox) -> bool {
        self.relation.holds(stored, &self.query)
    }

    /// False only when no box inside `cube` can satisfy the relation.
    pub(crate) fn may_hold(&self, cube: &Cube, axes: AxisSet) -> bool {
        let shared = axes.intersection(self.query.axes);
        let Some(bounds) = self.query_bounds(shared, axes) else {
            return false;
        };

        if let Some((axis, side, touching)) = self.relation.directional() {
            let Some(&(_, slot, qmin, qmax)) = bounds.iter().find(|(a, ..)| *a == axis) else {
                return false;
            };
            let (min, max) = (2 * slot, 2 * slot + 1);
            return match (side, touching) {
                (Side::Lower, false) => cube.lo[max] < qmin,
                (Side::Lower, true) => cube.lo[max] <= qmin,
                (Side::Upper, false) => cube.hi[min] > qmax,
                (Side::Upper, true) => cube.hi[min] >= qmax,
            };
        }

        bounds.iter().all(|&(_, slot, qmin, qmax)| {
            let (min, max) = (2 * slot, 2 * slot + 1);
            match self.relation {
                Relation::Overlaps => cube.lo[min] <= qmax && cube.hi[max] >= qmin,
                Relation::Contains => cube.lo[min] <= qmin && cube.hi[max] >= qmax,
                Relation::ContainedBy => cube.hi[min] >= qmin && cube.lo[max] <= qmax,
                Relation::Same => {
                    cube.lo[min] <= qmin
                        && qmin <= cube.hi[min]
                        && cube.lo[max] <= qmax
                        && qmax <= cube.hi[max]
                }
                _ => true,
            }
        })
    }

    /// Query range per shared axis with the axis' slot in the tree layout.
    /// `None` when the two share no axis, so nothing can match.
    fn query_bounds(&self, shared: AxisSet, axes: AxisSet) -> Option<Vec<(Axis, usize, f64, f64)>> {
        if shared.is_empty() {
            return None;
        }
        Some(
            shared
                .iter()
                .filter_map(|axis| {
                    let slot = axes.iter().position(|a| a == axis)?;
                    let (qmin, qmax) = self.query.range(axis)?;
                    Some((axis, slot, qmin, qmax))
                })
                .collect(),
        )
    }
}
