//! Temporal values in four durations.
//!
//! - [`TInstant`]: one value at one timestamp
//! - [`TInstantSet`]: values at discrete timestamps
//! - [`TSequence`]: instants joined by step or linear interpolation
//! - [`TSequenceSet`]: disjoint sequences with gaps between them
//!
//! [`Temporal`] wraps the four and dispatches every operation.

mod cast;
mod instant;
mod instant_set;
mod sequence;
mod sequence_set;

pub use instant::TInstant;
pub use instant_set::TInstantSet;
pub use sequence::TSequence;
pub use sequence_set::TSequenceSet;

pub(crate) use sequence_set::{can_join, join};

use crate::compute::validation::validate_binary_frames;
use crate::error::{MobilityError, Result};
use crate::index::Relation;
use mobility_types::bbox::{Axis, BoundingBox};
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::{Frame, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationKind {
    Instant,
    InstantSet,
    Sequence,
    SequenceSet,
}

impl DurationKind {
    pub const ALL: [DurationKind; 4] = [
        DurationKind::Instant,
        DurationKind::InstantSet,
        DurationKind::Sequence,
        DurationKind::SequenceSet,
    ];

    /// Wire tag.
    pub fn tag(self) -> u8 {
        match self {
            DurationKind::Instant => 1,
            DurationKind::InstantSet => 2,
            DurationKind::Sequence => 3,
            DurationKind::SequenceSet => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.tag() == tag)
    }

    /// Suffix appended to the value kind in type names.
    pub fn suffix(self) -> &'static str {
        match self {
            DurationKind::Instant => "inst",
            DurationKind::InstantSet => "instset",
            DurationKind::Sequence => "seq",
            DurationKind::SequenceSet => "seqset",
        }
    }
}

impl fmt::Display for DurationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DurationKind::Instant => "Instant",
            DurationKind::InstantSet => "InstantSet",
            DurationKind::Sequence => "Sequence",
            DurationKind::SequenceSet => "SequenceSet",
        };
        f.write_str(name)
    }
}

/// How values evolve between two instants of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Step => f.write_str("Step"),
            Interpolation::Linear => f.write_str("Linear"),
        }
    }
}

/// A temporal value of any duration.
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    Instant(TInstant),
    InstantSet(TInstantSet),
    Sequence(TSequence),
    SequenceSet(TSequenceSet),
}

impl From<TInstant> for Temporal {
    fn from(inst: TInstant) -> Self {
        Temporal::Instant(inst)
    }
}

impl From<TInstantSet> for Temporal {
    fn from(set: TInstantSet) -> Self {
        Temporal::InstantSet(set)
    }
}

impl From<TSequence> for Temporal {
    fn from(seq: TSequence) -> Self {
        Temporal::Sequence(seq)
    }
}

impl From<TSequenceSet> for Temporal {
    fn from(set: TSequenceSet) -> Self {
        Temporal::SequenceSet(set)
    }
}

impl Temporal {
    pub fn duration(&self) -> DurationKind {
        match self {
            Temporal::Instant(_) => DurationKind::Instant,
            Temporal::InstantSet(_) => DurationKind::InstantSet,
            Temporal::Sequence(_) => DurationKind::Sequence,
            Temporal::SequenceSet(_) => DurationKind::SequenceSet,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.start_value().kind()
    }

    pub fn frame(&self) -> Frame {
        self.start_value().frame()
    }

    /// Interpolation of continuous values; `None` for discrete ones.
    pub fn interpolation(&self) -> Option<Interpolation> {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => None,
            Temporal::Sequence(seq) => Some(seq.interpolation()),
            Temporal::SequenceSet(set) => Some(set.interpolation()),
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.interpolation().is_some()
    }

    /// Cached bounding volume.
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            Temporal::Instant(inst) => inst.bbox(),
            Temporal::InstantSet(set) => set.bbox(),
            Temporal::Sequence(seq) => seq.bbox(),
            Temporal::SequenceSet(set) => set.bbox(),
        }
    }

    /// Time span from the first to the last covered timestamp.
    pub fn time_span(&self) -> Period {
        match self {
            Temporal::Instant(inst) => inst.period(),
            Temporal::InstantSet(set) => set.period(),
            Temporal::Sequence(seq) => seq.period(),
            Temporal::SequenceSet(set) => set.period(),
        }
    }

    /// Periods actually covered: one per instant or sequence.
    pub fn time(&self) -> Vec<Period> {
        match self {
            Temporal::Instant(inst) => vec![inst.period()],
            Temporal::InstantSet(set) => set.instants().iter().map(TInstant::period).collect(),
            Temporal::Sequence(seq) => vec![seq.period()],
            Temporal::SequenceSet(set) => set.sequences().iter().map(TSequence::period).collect(),
        }
    }

    /// Length of covered time. Discrete values cover no duration.
    pub fn duration_micros(&self) -> i64 {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => 0,
            Temporal::Sequence(seq) => seq.duration_micros(),
            Temporal::SequenceSet(set) => set.duration_micros(),
        }
    }

    /// Every stored instant in time order.
    pub fn instants(&self) -> Vec<&TInstant> {
        match self {
            Temporal::Instant(inst) => vec![inst],
            Temporal::InstantSet(set) => set.instants().iter().collect(),
            Temporal::Sequence(seq) => seq.instants().iter().collect(),
            Temporal::SequenceSet(set) => set.instants().collect(),
        }
    }

    pub fn num_instants(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::InstantSet(set) => set.instants().len(),
            Temporal::Sequence(seq) => seq.instants().len(),
            Temporal::SequenceSet(set) => set.sequences().iter().map(|s| s.instants().len()).sum(),
        }
    }

    /// The n-th stored instant, counting from zero.
    pub fn instant_n(&self, n: usize) -> Option<&TInstant> {
        match self {
            Temporal::Instant(inst) => (n == 0).then_some(inst),
            Temporal::InstantSet(set) => set.instants().get(n),
            Temporal::Sequence(seq) => seq.instants().get(n),
            Temporal::SequenceSet(set) => set.instants().nth(n),
        }
    }

    pub fn start_instant(&self) -> &TInstant {
        match self {
            Temporal::Instant(inst) => inst,
            Temporal::InstantSet(set) => set.first(),
            Temporal::Sequence(seq) => seq.first(),
            Temporal::SequenceSet(set) => set.first().first(),
        }
    }

    pub fn end_instant(&self) -> &TInstant {
        match self {
            Temporal::Instant(inst) => inst,
            Temporal::InstantSet(set) => set.last(),
            Temporal::Sequence(seq) => seq.last(),
            Temporal::SequenceSet(set) => set.last().last(),
        }
    }

    pub fn start_value(&self) -> &Value {
        self.start_instant().value()
    }

    pub fn end_value(&self) -> &Value {
        self.end_instant().value()
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.start_instant().timestamp()
    }

    pub fn end_timestamp(&self) -> Timestamp {
        self.end_instant().timestamp()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.instants().iter().map(|inst| inst.timestamp()).collect()
    }

    /// Distinct stored values in order of first appearance.
    pub fn values(&self) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::new();
        for inst in self.instants() {
            if !out.contains(inst.value()) {
                out.push(*inst.value());
            }
        }
        out
    }

    /// Sequences of continuous values; empty for discrete ones.
    pub fn sequences(&self) -> &[TSequence] {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => &[],
            Temporal::Sequence(seq) => std::slice::from_ref(seq),
            Temporal::SequenceSet(set) => set.sequences(),
        }
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences().len()
    }

    /// Value at `t`, or `None` where the value is undefined.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobility::{Temporal, Timestamp, Value, ValueKind};
    ///
    /// let temp = Temporal::parse(
    ///     "[1@2024-01-01T00:00:00Z, 3@2024-01-01T00:00:10Z)",
    ///     ValueKind::Float,
    /// )
    /// .unwrap();
    /// let mid = "2024-01-01T00:00:05Z".parse::<Timestamp>().unwrap();
    /// assert_eq!(temp.value_at(mid), Some(Value::Float(2.0)));
    /// let end = "2024-01-01T00:00:10Z".parse::<Timestamp>().unwrap();
    /// assert_eq!(temp.value_at(end), None);
    /// ```
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        match self {
            Temporal::Instant(inst) => inst.value_at(t),
            Temporal::InstantSet(set) => set.value_at(t),
            Temporal::Sequence(seq) => seq.value_at(t),
            Temporal::SequenceSet(set) => set.value_at(t),
        }
    }

    /// Instant at `t`, or `None` when `t` is not covered.
    ///
    /// Restrictions of continuous values build new instants; they fail with
    /// `UnknownRoute` when a network position's route is no longer
    /// registered.
    pub fn at_timestamp(&self, t: Timestamp) -> Result<Option<TInstant>> {
        match self {
            Temporal::Instant(inst) => Ok((inst.timestamp() == t).then(|| inst.clone())),
            Temporal::InstantSet(set) => Ok(set
                .instants()
                .iter()
                .find(|inst| inst.timestamp() == t)
                .cloned()),
            Temporal::Sequence(seq) => seq.at_timestamp(t),
            Temporal::SequenceSet(set) => set.at_timestamp(t),
        }
    }

    /// Restrict to `period`, keeping the duration.
    pub fn at_period(&self, period: &Period) -> Result<Option<Temporal>> {
        Ok(match self {
            Temporal::Instant(inst) => inst.at_period(period).map(Temporal::from),
            Temporal::InstantSet(set) => set.at_period(period).map(Temporal::from),
            Temporal::Sequence(seq) => seq.at_period(period)?.map(Temporal::from),
            Temporal::SequenceSet(set) => set.at_period(period)?.map(Temporal::from),
        })
    }

    /// Remove `period`. Sequences may split and become sequence sets.
    pub fn minus_period(&self, period: &Period) -> Result<Option<Temporal>> {
        Ok(match self {
            Temporal::Instant(inst) => inst.minus_period(period).map(Temporal::from),
            Temporal::InstantSet(set) => set.minus_period(period).map(Temporal::from),
            Temporal::Sequence(seq) => seq.minus_period(period)?.map(Temporal::from),
            Temporal::SequenceSet(set) => set.minus_period(period)?.map(Temporal::from),
        })
    }

    /// Restrict to the times at which the value equals `value`.
    pub fn at_value(&self, value: &Value) -> Result<Option<Temporal>> {
        Ok(match self {
            Temporal::Instant(inst) => (inst.value() == value).then(|| inst.clone().into()),
            Temporal::InstantSet(set) => set.at_value(value).map(Temporal::from),
            Temporal::Sequence(seq) => seq.at_value(value)?.map(Temporal::from),
            Temporal::SequenceSet(set) => set.at_value(value)?.map(Temporal::from),
        })
    }

    /// True when the value equals `value` at some timestamp.
    pub fn ever_eq(&self, value: &Value) -> bool {
        match self {
            Temporal::Instant(inst) => inst.value() == value,
            Temporal::InstantSet(set) => set.instants().iter().any(|i| i.value() == value),
            Temporal::Sequence(seq) => seq.ever_eq(value),
            Temporal::SequenceSet(set) => set.ever_eq(value),
        }
    }

    /// True when the value equals `value` at every covered timestamp.
    pub fn always_eq(&self, value: &Value) -> bool {
        self.instants().iter().all(|inst| inst.value() == value)
    }

    /// Smallest number taken; `None` unless the values are numbers.
    pub fn min_value(&self) -> Option<f64> {
        self.bbox().range(Axis::M).map(|(lo, _)| lo)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.bbox().range(Axis::M).map(|(_, hi)| hi)
    }

    /// Extend with an instant after the last one.
    ///
    /// An instant grows into an instant set; sequences close their upper
    /// bound at the new instant. Nothing changes when validation fails.
    pub fn append(&mut self, instant: TInstant) -> Result<()> {
        match self {
            Temporal::Instant(inst) => {
                let set = TInstantSet::new(vec![inst.clone(), instant])?;
                *self = Temporal::InstantSet(set);
                Ok(())
            }
            Temporal::InstantSet(set) => set.append(instant),
            Temporal::Sequence(seq) => seq.append(instant),
            Temporal::SequenceSet(set) => set.append(instant),
        }
    }

    /// Evaluate a box relation between the two bounding volumes.
    ///
    /// Spatial values in different reference frames cannot be compared.
    pub fn relate(&self, other: &Temporal, relation: Relation) -> Result<bool> {
        validate_binary_frames(self.frame(), other.frame())?;
        Ok(relation.holds(self.bbox(), other.bbox()))
    }

    pub fn overlaps(&self, other: &Temporal) -> Result<bool> {
        self.relate(other, Relation::Overlaps)
    }

    pub fn contains(&self, other: &Temporal) -> Result<bool> {
        self.relate(other, Relation::Contains)
    }

    pub fn contained_by(&self, other: &Temporal) -> Result<bool> {
        self.relate(other, Relation::ContainedBy)
    }

    pub fn same(&self, other: &Temporal) -> Result<bool> {
        self.relate(other, Relation::Same)
    }

    /// Parse a text literal of the given value kind.
    pub fn parse(text: &str, kind: ValueKind) -> Result<Temporal> {
        crate::codec::text::parse(text, kind)
    }

    /// Encode into the binary wire format.
    pub fn to_wire(&self) -> Result<bytes::Bytes> {
        crate::codec::wire::encode(self)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Temporal> {
        crate::codec::wire::decode(bytes)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::codec::text::write_temporal(f, self)
    }
}

/// Parts of `base` outside `cut`, in time order.
pub(crate) fn period_minus(base: &Period, cut: &Period) -> Vec<Period> {
    if !base.overlaps(cut) {
        return vec![*base];
    }
    let before = Period::new(base.lower, cut.lower, base.lower_inc, !cut.lower_inc);
    let after = Period::new(cut.upper, base.upper, !cut.upper_inc, base.upper_inc);
    [before, after]
        .into_iter()
        .filter(|p| p.is_valid() && base.intersection(p).is_some())
        .collect()
}

/// Merge overlapping or touching periods.
pub(crate) fn merge_periods(mut periods: Vec<Period>) -> Vec<Period> {
    periods.sort_by(|a, b| {
        a.lower
            .cmp(&b.lower)
            .then_with(|| b.lower_inc.cmp(&a.lower_inc))
    });
    let mut out: Vec<Period> = Vec::with_capacity(periods.len());
    for period in periods {
        match out.last_mut() {
            Some(current)
                if period.lower < current.upper
                    || (period.lower == current.upper
                        && (current.upper_inc || period.lower_inc)) =>
            {
                *current = current.span(&period);
            }
            _ => out.push(period),
        }
    }
    out
}

/// Duration rejected by an operation that needs another one.
pub(crate) fn unsupported(operation: &str, temporal: &Temporal) -> MobilityError {
    MobilityError::InvalidInput(format!(
        "{} is not defined for {} values with {} instants",
        operation,
        temporal.duration(),
        temporal.num_instants()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[test]
    fn test_duration_tags() {
        for duration in DurationKind::ALL {
            assert_eq!(DurationKind::from_tag(duration.tag()), Some(duration));
        }
        assert_eq!(DurationKind::from_tag(0), None);
        assert_eq!(DurationKind::from_tag(5), None);
    }

    #[test]
    fn test_period_minus() {
        let base = Period::closed(ts(0), ts(10));
        let pieces = period_minus(&base, &Period::closed(ts(3), ts(5)));
        assert_eq!(
            pieces,
            vec![
                Period::new(ts(0), ts(3), true, false),
                Period::new(ts(5), ts(10), false, true)
            ]
        );

        let pieces = period_minus(&base, &Period::closed(ts(0), ts(10)));
        assert!(pieces.is_empty());

        let pieces = period_minus(&base, &Period::closed(ts(20), ts(30)));
        assert_eq!(pieces, vec![base]);

        // Removing an open interior leaves the boundary instants.
        let pieces = period_minus(&base, &Period::new(ts(0), ts(10), false, false));
        assert_eq!(pieces, vec![Period::instant(ts(0)), Period::instant(ts(10))]);
    }

    #[test]
    fn test_merge_periods() {
        let merged = merge_periods(vec![
            Period::new(ts(0), ts(5), true, false),
            Period::new(ts(5), ts(8), true, false),
            Period::new(ts(8), ts(9), false, true),
        ]);
        assert_eq!(
            merged,
            vec![
                Period::new(ts(0), ts(8), true, false),
                Period::new(ts(8), ts(9), false, true)
            ]
        );
    }
}
