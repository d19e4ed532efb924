//! Disjoint box octree.
//!
//! Every stored box is mapped to a point in `D = 2 × active axes` dimensions
//! (the min and max of each axis, in x, y, z, m, t order). Inner nodes split
//! that space at a per-bound median into `2^D` child slots; bit `j` of a slot
//! is set when bound `j` lies above the centroid.

use super::predicate::{Cube, Predicate, Relation};
use crate::config::IndexConfig;
use crate::error::{MobilityError, Result};
use mobility_types::bbox::{Axis, AxisSet, BoundingBox};
use smallvec::SmallVec;
use std::fmt;

/// Two bounds for each of the five axes.
pub const MAX_BOUNDS: usize = 10;

/// Bound vector of one box; only the first `D` slots are meaningful.
pub type Bounds = [f64; MAX_BOUNDS];

fn bounds_of(bbox: &BoundingBox) -> Bounds {
    let mut bounds = [0.0; MAX_BOUNDS];
    for (slot, axis) in bbox.axes.iter().enumerate() {
        if let Some((lo, hi)) = bbox.range(axis) {
            bounds[2 * slot] = lo;
            bounds[2 * slot + 1] = hi;
        }
    }
    bounds
}

struct Entry<K> {
    key: K,
    bbox: BoundingBox,
    bounds: Bounds,
}

enum Node<K> {
    Leaf(SmallVec<[Entry<K>; 4]>),
    Inner {
        centroid: Bounds,
        children: Vec<Option<Box<Node<K>>>>,
    },
}

/// A stored box satisfying every predicate of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a, K> {
    pub key: &'a K,
    pub bbox: &'a BoundingBox,
    /// The box relation only approximates the relation between the values.
    pub recheck: bool,
}

/// Shape of a built tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of stored boxes
    pub entries: usize,
    pub leaves: usize,
    pub inner_nodes: usize,
    /// Depth of the deepest leaf, the root being at depth zero
    pub depth: usize,
    /// Child slots per inner node
    pub fanout: usize,
}

/// Where a batch of boxes splits: the centroid and each box's child slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub centroid: Vec<f64>,
    pub slots: Vec<usize>,
}

/// Read-only index over bounding boxes sharing one set of axes.
///
/// # Examples
///
/// ```
/// use mobility::config::IndexConfig;
/// use mobility::index::{BoxOctree, Predicate, Relation};
/// use mobility_types::bbox::BoundingBox;
///
/// let boxes = (0..10)
///     .map(|i| (i, BoundingBox::new().with_xy(i as f64, 0.0, i as f64 + 0.5, 1.0)))
///     .collect();
/// let tree = BoxOctree::build(boxes, &IndexConfig::default()).unwrap();
///
/// let window = BoundingBox::new().with_xy(2.0, 0.0, 4.0, 1.0);
/// let hits = tree.query(&[Predicate::new(Relation::Overlaps, window)]).unwrap();
/// let mut keys: Vec<i32> = hits.iter().map(|m| *m.key).collect();
/// keys.sort();
/// assert_eq!(keys, vec![2, 3, 4]);
/// ```
pub struct BoxOctree<K> {
    root: Option<Node<K>>,
    axes: AxisSet,
    srid: i32,
    geodetic: bool,
    len: usize,
}

impl<K> BoxOctree<K> {
    /// Build a tree over `entries`.
    ///
    /// All boxes must share their active axes, SRID and geodetic flag and
    /// have finite bounds.
    pub fn build(entries: Vec<(K, BoundingBox)>, config: &IndexConfig) -> Result<Self> {
        let Some((_, first)) = entries.first() else {
            return Ok(Self {
                root: None,
                axes: AxisSet::EMPTY,
                srid: 0,
                geodetic: false,
                len: 0,
            });
        };
        let (axes, srid, geodetic) = (first.axes, first.srid, first.geodetic);
        if axes.is_empty() {
            return Err(MobilityError::InvalidInput(
                "Cannot index boxes without an active axis".into(),
            ));
        }

        let mut batch = Vec::with_capacity(entries.len());
        for (key, bbox) in entries {
            if bbox.axes != axes || bbox.srid != srid || bbox.geodetic != geodetic {
                return Err(MobilityError::FrameViolation(format!(
                    "box {} does not share the axes and reference of {}",
                    bbox, describe_frame(axes, srid, geodetic)
                )));
            }
            if !bbox.is_finite() {
                return Err(MobilityError::InvalidInput(format!(
                    "Cannot index non-finite box {}",
                    bbox
                )));
            }
            batch.push(Entry {
                key,
                bounds: bounds_of(&bbox),
                bbox,
            });
        }

        let len = batch.len();
        let dims = 2 * axes.len();
        let root = build_node(batch, dims, 0, config);
        let tree = Self {
            root: Some(root),
            axes,
            srid,
            geodetic,
            len,
        };
        let stats = tree.stats();
        log::debug!(
            "Built box octree: {} entries, {} leaves, {} inner nodes, depth {}, fanout {}",
            stats.entries,
            stats.leaves,
            stats.inner_nodes,
            stats.depth,
            stats.fanout
        );
        Ok(tree)
    }

    /// Split decision for a batch of boxes, as the builder would take it.
    ///
    /// `None` when every box is identical, in which case they share a leaf.
    pub fn plan_split(boxes: &[BoundingBox]) -> Option<SplitPlan> {
        let dims = 2 * boxes.first()?.axes.len();
        let bounds: Vec<Bounds> = boxes.iter().map(bounds_of).collect();
        let centroid = split_centroid(&bounds, dims)?;
        Some(SplitPlan {
            centroid: centroid[..dims].to_vec(),
            slots: bounds.iter().map(|b| slot_of(b, &centroid, dims)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn axes(&self) -> AxisSet {
        self.axes
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn is_geodetic(&self) -> bool {
        self.geodetic
    }

    /// Boxes satisfying every predicate.
    ///
    /// A query box with non-finite bounds matches nothing. Spatial query
    /// boxes must use the tree's SRID and geodetic flag.
    pub fn query(&self, predicates: &[Predicate]) -> Result<Vec<Match<'_, K>>> {
        let Some(root) = &self.root else {
            return Ok(Vec::new());
        };
        for predicate in predicates {
            if !predicate.query.is_finite() {
                log::warn!("Rejecting query box with non-finite coordinates: {}", predicate.query);
                return Ok(Vec::new());
            }
            let spatial = predicate.query.has(Axis::X) || predicate.query.has(Axis::Y);
            if spatial
                && (predicate.query.srid != self.srid || predicate.query.geodetic != self.geodetic)
            {
                return Err(MobilityError::FrameViolation(format!(
                    "query box {} does not match the index reference {}",
                    predicate.query,
                    describe_frame(self.axes, self.srid, self.geodetic)
                )));
            }
        }

        let dims = 2 * self.axes.len();
        let recheck = predicates.iter().any(Predicate::needs_recheck);
        let mut out = Vec::new();
        let mut stack: Vec<(&Node<K>, Cube)> = vec![(root, Cube::unbounded())];
        while let Some((node, cube)) = stack.pop() {
            match node {
                Node::Leaf(entries) => {
                    out.extend(
                        entries
                            .iter()
                            .filter(|e| predicates.iter().all(|p| p.holds(&e.bbox)))
                            .map(|e| Match {
                                key: &e.key,
                                bbox: &e.bbox,
                                recheck,
                            }),
                    );
                }
                Node::Inner { centroid, children } => {
                    for (slot, child) in children.iter().enumerate() {
                        let Some(child) = child else { continue };
                        let child_cube = cube.child(centroid, dims, slot);
                        if predicates.iter().all(|p| p.may_hold(&child_cube, self.axes)) {
                            stack.push((child, child_cube));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Boxes in `relation` with `query`.
    pub fn search(&self, relation: Relation, query: &BoundingBox) -> Result<Vec<Match<'_, K>>> {
        self.query(&[Predicate::new(relation, *query)])
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            entries: self.len,
            fanout: if self.axes.is_empty() { 0 } else { 1 << (2 * self.axes.len()) },
            ..IndexStats::default()
        };
        let Some(root) = &self.root else {
            return stats;
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Leaf(_) => {
                    stats.leaves += 1;
                    stats.depth = stats.depth.max(depth);
                }
                Node::Inner { children, .. } => {
                    stats.inner_nodes += 1;
                    stack.extend(children.iter().flatten().map(|c| (c.as_ref(), depth + 1)));
                }
            }
        }
        stats
    }
}

impl<K> fmt::Debug for BoxOctree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxOctree")
            .field("axes", &self.axes)
            .field("srid", &self.srid)
            .field("geodetic", &self.geodetic)
            .field("len", &self.len)
            .finish()
    }
}

fn describe_frame(axes: AxisSet, srid: i32, geodetic: bool) -> String {
    format!(
        "(axes {:?}, SRID {}, {})",
        axes.iter().collect::<Vec<_>>(),
        srid,
        if geodetic { "geodetic" } else { "planar" }
    )
}

fn slot_of(bounds: &Bounds, centroid: &Bounds, dims: usize) -> usize {
    (0..dims)
        .filter(|&j| bounds[j] > centroid[j])
        .fold(0, |slot, j| slot | (1 << j))
}

/// Lower median of every bound, or `None` when all boxes are identical.
///
/// When the medians would send every box to one slot (each median equals
/// the bound's maximum), each bound instead splits just below its maximum.
fn split_centroid(batch: &[Bounds], dims: usize) -> Option<Bounds> {
    let mut centroid = [0.0; MAX_BOUNDS];
    let mut below_max = [None; MAX_BOUNDS];
    let mut values = Vec::with_capacity(batch.len());
    for j in 0..dims {
        values.clear();
        values.extend(batch.iter().map(|b| b[j]));
        values.sort_by(f64::total_cmp);
        let max = *values.last()?;
        centroid[j] = values[(values.len() - 1) / 2];
        below_max[j] = values.iter().rev().copied().find(|v| *v < max);
    }

    let first = slot_of(&batch[0], &centroid, dims);
    if batch.iter().any(|b| slot_of(b, &centroid, dims) != first) {
        return Some(centroid);
    }
    if below_max[..dims].iter().all(Option::is_none) {
        return None;
    }
    for j in 0..dims {
        if let Some(v) = below_max[j] {
            centroid[j] = v;
        }
    }
    Some(centroid)
}

fn build_node<K>(batch: Vec<Entry<K>>, dims: usize, depth: usize, config: &IndexConfig) -> Node<K> {
    if batch.len() <= config.leaf_capacity || depth >= config.max_depth {
        return Node::Leaf(batch.into_iter().collect());
    }
    let bounds: Vec<Bounds> = batch.iter().map(|e| e.bounds).collect();
    let Some(centroid) = split_centroid(&bounds, dims) else {
        return Node::Leaf(batch.into_iter().collect());
    };

    let mut groups: Vec<Vec<Entry<K>>> = (0..1usize << dims).map(|_| Vec::new()).collect();
    for entry in batch {
        groups[slot_of(&entry.bounds, &centroid, dims)].push(entry);
    }
    let children = groups
        .into_iter()
        .map(|group| {
            (!group.is_empty()).then(|| Box::new(build_node(group, dims, depth + 1, config)))
        })
        .collect();
    Node::Inner { centroid, children }
}
