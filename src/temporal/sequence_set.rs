use super::{Interpolation, TInstant, TSequence};
use crate::compute::bbox::merge_boxes;
use crate::compute::validation::validate_frame;
use crate::error::{MobilityError, Result};
use mobility_types::bbox::{Axis, BoundingBox};
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::Value;

/// Ordered, disjoint sequences sharing one interpolation.
///
/// Neighbours that touch at a timestamp covered by exactly one of them and
/// agree on the value there are merged on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TSequenceSet {
    sequences: Vec<TSequence>,
    bbox: BoundingBox,
}

impl TSequenceSet {
    pub fn new(sequences: Vec<TSequence>) -> Result<Self> {
        let first = sequences
            .first()
            .ok_or_else(|| MobilityError::InvalidInput("At least one sequence is required".into()))?;
        let frame = first.first().value().frame();
        let interpolation = first.interpolation();

        for seq in &sequences[1..] {
            validate_frame(frame, seq.first().value().frame())?;
            if seq.interpolation() != interpolation {
                return Err(MobilityError::InvalidInput(format!(
                    "Sequences mix {} and {} interpolation",
                    interpolation,
                    seq.interpolation()
                )));
            }
        }
        for pair in sequences.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (end, start) = (a.last().timestamp(), b.first().timestamp());
            if end > start || (end == start && a.upper_inc() && b.lower_inc()) {
                return Err(MobilityError::NonIncreasingTimestamps {
                    previous: end,
                    next: start,
                });
            }
        }
        Self::from_valid(sequences)
            .ok_or_else(|| MobilityError::InvalidInput("At least one sequence is required".into()))
    }

    /// Build from ordered, disjoint sequences, merging contiguous neighbours.
    pub(crate) fn from_valid(sequences: Vec<TSequence>) -> Option<Self> {
        Self::from_normalized(normalize(sequences))
    }

    /// Build from sequences that are already ordered, disjoint and merged.
    pub(crate) fn from_normalized(sequences: Vec<TSequence>) -> Option<Self> {
        let bbox = merge_boxes(sequences.iter().map(TSequence::bbox))?;
        Some(Self { sequences, bbox })
    }

    pub fn sequences(&self) -> &[TSequence] {
        &self.sequences
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn interpolation(&self) -> Interpolation {
        self.first().interpolation()
    }

    pub fn first(&self) -> &TSequence {
        &self.sequences[0]
    }

    pub fn last(&self) -> &TSequence {
        &self.sequences[self.sequences.len() - 1]
    }

    /// Span from the first lower bound to the last upper bound.
    pub fn period(&self) -> Period {
        self.first().period().span(&self.last().period())
    }

    /// Total time covered, gaps excluded.
    pub fn duration_micros(&self) -> i64 {
        self.sequences
            .iter()
            .map(TSequence::duration_micros)
            .fold(0i64, i64::saturating_add)
    }

    pub fn instants(&self) -> impl Iterator<Item = &TInstant> {
        self.sequences.iter().flat_map(|seq| seq.instants().iter())
    }

    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        let idx = self
            .sequences
            .partition_point(|seq| seq.last().timestamp() < t);
        // A sequence ending exclusively at `t` may be followed by one starting at `t`.
        self.sequences[idx..]
            .iter()
            .take(2)
            .find_map(|seq| seq.value_at(t))
    }

    pub fn at_timestamp(&self, t: Timestamp) -> Result<Option<TInstant>> {
        self.value_at(t)
            .map(|value| TInstant::derived(value, t))
            .transpose()
    }

    pub fn at_period(&self, period: &Period) -> Result<Option<TSequenceSet>> {
        let mut pieces = Vec::new();
        for seq in &self.sequences {
            pieces.extend(seq.at_period(period)?);
        }
        Ok(Self::from_valid(pieces))
    }

    pub fn minus_period(&self, period: &Period) -> Result<Option<TSequenceSet>> {
        let mut pieces = Vec::new();
        for seq in &self.sequences {
            if let Some(rest) = seq.minus_period(period)? {
                pieces.extend(rest.sequences);
            }
        }
        Ok(Self::from_valid(pieces))
    }

    pub fn at_value(&self, value: &Value) -> Result<Option<TSequenceSet>> {
        let mut pieces = Vec::new();
        for seq in &self.sequences {
            if let Some(hits) = seq.at_value(value)? {
                pieces.extend(hits.sequences);
            }
        }
        Ok(Self::from_valid(pieces))
    }

    pub fn ever_eq(&self, value: &Value) -> bool {
        self.sequences.iter().any(|seq| seq.ever_eq(value))
    }

    pub fn always_eq(&self, value: &Value) -> bool {
        self.sequences.iter().all(|seq| seq.always_eq(value))
    }

    pub fn min_value(&self) -> Option<f64> {
        self.bbox.range(Axis::M).map(|(lo, _)| lo)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.bbox.range(Axis::M).map(|(_, hi)| hi)
    }

    /// Append an instant to the last sequence.
    pub fn append(&mut self, instant: TInstant) -> Result<()> {
        let last = self.sequences.len() - 1;
        self.sequences[last].append(instant)?;
        self.bbox.expand(self.sequences[last].bbox());
        Ok(())
    }
}

pub(crate) fn can_join(a: &TSequence, b: &TSequence) -> bool {
    a.last().timestamp() == b.first().timestamp()
        && a.upper_inc() != b.lower_inc()
        && a.last().value() == b.first().value()
}

/// Concatenate two joinable sequences. The shared instant adds no segment,
/// so the joined box is the union of both boxes.
pub(crate) fn join(a: TSequence, b: TSequence) -> TSequence {
    let (lower_inc, upper_inc, interpolation) = (a.lower_inc(), b.upper_inc(), a.interpolation());
    let mut bbox = *a.bbox();
    bbox.expand(b.bbox());
    let mut instants: Vec<TInstant> = a.instants().to_vec();
    if a.upper_inc() {
        instants.extend(b.instants()[1..].iter().cloned());
    } else {
        instants.pop();
        instants.extend(b.instants().iter().cloned());
    }
    TSequence::from_parts(instants, lower_inc, upper_inc, interpolation, bbox)
}

fn normalize(sequences: Vec<TSequence>) -> Vec<TSequence> {
    let mut out: Vec<TSequence> = Vec::with_capacity(sequences.len());
    for seq in sequences {
        match out.pop() {
            Some(prev) if can_join(&prev, &seq) => {
                log::debug!(
                    "Merging contiguous sequences at {}",
                    seq.first().timestamp()
                );
                out.push(join(prev, seq));
            }
            Some(prev) => {
                out.push(prev);
                out.push(seq);
            }
            None => out.push(seq),
        }
    }
    out
}
