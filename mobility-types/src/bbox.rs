use crate::point::GeoPoint;
use crate::time::{Period, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five axes a bounding box can span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    M,
    T,
}

impl Axis {
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::M, Axis::T];

    const fn bit(self) -> u8 {
        match self {
            Axis::X => 1,
            Axis::Y => 2,
            Axis::Z => 4,
            Axis::M => 8,
            Axis::T => 16,
        }
    }
}

/// Set of active axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AxisSet(u8);

impl AxisSet {
    pub const EMPTY: AxisSet = AxisSet(0);
    pub const XY: AxisSet = AxisSet(Axis::X.bit() | Axis::Y.bit());
    pub const XYT: AxisSet = AxisSet(Axis::X.bit() | Axis::Y.bit() | Axis::T.bit());
    pub const XYZT: AxisSet =
        AxisSet(Axis::X.bit() | Axis::Y.bit() | Axis::Z.bit() | Axis::T.bit());
    pub const MT: AxisSet = AxisSet(Axis::M.bit() | Axis::T.bit());

    pub fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    pub fn with(self, axis: Axis) -> AxisSet {
        AxisSet(self.0 | axis.bit())
    }

    pub fn intersection(self, other: AxisSet) -> AxisSet {
        AxisSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Active axes in canonical order (x, y, z, m, t).
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |axis| self.contains(*axis))
    }
}

/// An axis-aligned box over up to five axes: planar x/y, vertical z, a domain
/// measure m and time t.
///
/// Inactive axes hold zeros and are ignored by every relation. Time bounds
/// take part in comparisons as microseconds converted to `f64`, which is exact
/// for any instant within ±285 years of the epoch.
///
/// # Examples
///
/// ```
/// use mobility_types::bbox::BoundingBox;
/// use mobility_types::time::Timestamp;
///
/// let trip = BoundingBox::new()
///     .with_xy(0.0, 0.0, 10.0, 0.0)
///     .with_t(Timestamp::from_secs(0), Timestamp::from_secs(60));
/// let window = BoundingBox::new().with_xy(4.0, -1.0, 6.0, 1.0);
/// assert!(trip.overlaps(&window));
///
/// let east = BoundingBox::new().with_x(20.0, 30.0);
/// assert!(trip.left(&east));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub axes: AxisSet,
    pub geodetic: bool,
    pub srid: i32,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    pub mmin: f64,
    pub mmax: f64,
    pub tmin: Timestamp,
    pub tmax: Timestamp,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// A box with no active axis.
    pub fn new() -> Self {
        Self {
            axes: AxisSet::EMPTY,
            geodetic: false,
            srid: 0,
            xmin: 0.0,
            xmax: 0.0,
            ymin: 0.0,
            ymax: 0.0,
            zmin: 0.0,
            zmax: 0.0,
            mmin: 0.0,
            mmax: 0.0,
            tmin: Timestamp::from_micros(0),
            tmax: Timestamp::from_micros(0),
        }
    }

    pub fn with_x(mut self, min: f64, max: f64) -> Self {
        self.axes = self.axes.with(Axis::X);
        self.xmin = min;
        self.xmax = max;
        self
    }

    pub fn with_y(mut self, min: f64, max: f64) -> Self {
        self.axes = self.axes.with(Axis::Y);
        self.ymin = min;
        self.ymax = max;
        self
    }

    pub fn with_xy(self, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        self.with_x(xmin, xmax).with_y(ymin, ymax)
    }

    pub fn with_z(mut self, min: f64, max: f64) -> Self {
        self.axes = self.axes.with(Axis::Z);
        self.zmin = min;
        self.zmax = max;
        self
    }

    pub fn with_m(mut self, min: f64, max: f64) -> Self {
        self.axes = self.axes.with(Axis::M);
        self.mmin = min;
        self.mmax = max;
        self
    }

    pub fn with_t(mut self, min: Timestamp, max: Timestamp) -> Self {
        self.axes = self.axes.with(Axis::T);
        self.tmin = min;
        self.tmax = max;
        self
    }

    pub fn with_period(self, period: &Period) -> Self {
        self.with_t(period.lower, period.upper)
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_geodetic(mut self, geodetic: bool) -> Self {
        self.geodetic = geodetic;
        self
    }

    /// Degenerate spatial box around a single point.
    pub fn from_point(point: &GeoPoint, geodetic: bool) -> Self {
        let bbox = Self::new()
            .with_xy(point.x, point.y, point.x, point.y)
            .with_srid(point.srid)
            .with_geodetic(geodetic);
        match point.z {
            Some(z) => bbox.with_z(z, z),
            None => bbox,
        }
    }

    pub fn has(&self, axis: Axis) -> bool {
        self.axes.contains(axis)
    }

    /// Lower and upper bound of an active axis.
    pub fn range(&self, axis: Axis) -> Option<(f64, f64)> {
        if !self.has(axis) {
            return None;
        }
        Some(match axis {
            Axis::X => (self.xmin, self.xmax),
            Axis::Y => (self.ymin, self.ymax),
            Axis::Z => (self.zmin, self.zmax),
            Axis::M => (self.mmin, self.mmax),
            Axis::T => (self.tmin.as_micros() as f64, self.tmax.as_micros() as f64),
        })
    }

    /// Time extent as a closed period.
    pub fn period(&self) -> Option<Period> {
        self.has(Axis::T).then(|| Period::closed(self.tmin, self.tmax))
    }

    /// True when every active bound is a finite number.
    pub fn is_finite(&self) -> bool {
        self.axes
            .iter()
            .filter_map(|axis| self.range(axis))
            .all(|(lo, hi)| lo.is_finite() && hi.is_finite())
    }

    /// Componentwise union over the axes active in both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        out.expand(other);
        out
    }

    /// Grow `self` to cover `other` on every shared axis.
    pub fn expand(&mut self, other: &BoundingBox) {
        self.axes = self.axes.intersection(other.axes);
        self.xmin = self.xmin.min(other.xmin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymin = self.ymin.min(other.ymin);
        self.ymax = self.ymax.max(other.ymax);
        self.zmin = self.zmin.min(other.zmin);
        self.zmax = self.zmax.max(other.zmax);
        self.mmin = self.mmin.min(other.mmin);
        self.mmax = self.mmax.max(other.mmax);
        self.tmin = self.tmin.min(other.tmin);
        self.tmax = self.tmax.max(other.tmax);
        self.clear_inactive();
    }

    fn clear_inactive(&mut self) {
        let empty = BoundingBox::new();
        if !self.has(Axis::X) {
            (self.xmin, self.xmax) = (empty.xmin, empty.xmax);
        }
        if !self.has(Axis::Y) {
            (self.ymin, self.ymax) = (empty.ymin, empty.ymax);
        }
        if !self.has(Axis::Z) {
            (self.zmin, self.zmax) = (empty.zmin, empty.zmax);
        }
        if !self.has(Axis::M) {
            (self.mmin, self.mmax) = (empty.mmin, empty.mmax);
        }
        if !self.has(Axis::T) {
            (self.tmin, self.tmax) = (empty.tmin, empty.tmax);
        }
    }

    /// Pairs of ranges for every axis active in both boxes.
    fn shared_ranges(
        &self,
        other: &BoundingBox,
    ) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        let shared = self.axes.intersection(other.axes);
        let other = *other;
        shared
            .iter()
            .filter_map(move |axis| Some((self.range(axis)?, other.range(axis)?)))
    }

    fn compare_axis(
        &self,
        other: &BoundingBox,
        axis: Axis,
        test: impl Fn((f64, f64), (f64, f64)) -> bool,
    ) -> bool {
        match (self.range(axis), other.range(axis)) {
            (Some(a), Some(b)) => test(a, b),
            _ => false,
        }
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !self.axes.intersection(other.axes).is_empty()
            && self
                .shared_ranges(other)
                .all(|((amin, amax), (bmin, bmax))| amin <= bmax && bmin <= amax)
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        !self.axes.intersection(other.axes).is_empty()
            && self
                .shared_ranges(other)
                .all(|((amin, amax), (bmin, bmax))| amin <= bmin && bmax <= amax)
    }

    pub fn contained_by(&self, other: &BoundingBox) -> bool {
        other.contains(self)
    }

    pub fn same(&self, other: &BoundingBox) -> bool {
        !self.axes.intersection(other.axes).is_empty()
            && self
                .shared_ranges(other)
                .all(|((amin, amax), (bmin, bmax))| amin == bmin && amax == bmax)
    }

    /// Strictly before on `axis`: `self.max < other.min`.
    pub fn strictly_below_on(&self, other: &BoundingBox, axis: Axis) -> bool {
        self.compare_axis(other, axis, |(_, amax), (bmin, _)| amax < bmin)
    }

    /// Before or touching on `axis`: `self.max <= other.min`.
    pub fn below_or_touching_on(&self, other: &BoundingBox, axis: Axis) -> bool {
        self.compare_axis(other, axis, |(_, amax), (bmin, _)| amax <= bmin)
    }

    pub fn left(&self, other: &BoundingBox) -> bool {
        self.strictly_below_on(other, Axis::X)
    }

    pub fn right(&self, other: &BoundingBox) -> bool {
        other.strictly_below_on(self, Axis::X)
    }

    pub fn below(&self, other: &BoundingBox) -> bool {
        self.strictly_below_on(other, Axis::Y)
    }

    pub fn above(&self, other: &BoundingBox) -> bool {
        other.strictly_below_on(self, Axis::Y)
    }

    pub fn front(&self, other: &BoundingBox) -> bool {
        self.strictly_below_on(other, Axis::Z)
    }

    pub fn back(&self, other: &BoundingBox) -> bool {
        other.strictly_below_on(self, Axis::Z)
    }

    pub fn before(&self, other: &BoundingBox) -> bool {
        self.strictly_below_on(other, Axis::T)
    }

    pub fn after(&self, other: &BoundingBox) -> bool {
        other.strictly_below_on(self, Axis::T)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BOX(")?;
        let mut first = true;
        for axis in self.axes.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match axis {
                Axis::X => write!(f, "x:[{}, {}]", self.xmin, self.xmax)?,
                Axis::Y => write!(f, "y:[{}, {}]", self.ymin, self.ymax)?,
                Axis::Z => write!(f, "z:[{}, {}]", self.zmin, self.zmax)?,
                Axis::M => write!(f, "m:[{}, {}]", self.mmin, self.mmax)?,
                Axis::T => write!(f, "t:[{}, {}]", self.tmin, self.tmax)?,
            }
        }
        f.write_str(")")
    }
}
