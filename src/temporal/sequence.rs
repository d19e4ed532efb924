use super::{Interpolation, TInstant, TSequenceSet, merge_periods, period_minus};
use crate::compute::bbox::sequence_box;
use crate::compute::interpolate::{left_limit, locate, value_in_run};
use crate::compute::validation::validate_instants;
use crate::error::{MobilityError, Result};
use mobility_types::bbox::{Axis, BoundingBox};
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::Value;

/// Instants joined by step or linear interpolation over one period.
///
/// A sequence of a single instant is closed at both ends. A step sequence
/// with an exclusive upper bound stores its held value in the last instant,
/// and a linear network sequence stays on one route.
#[derive(Debug, Clone, PartialEq)]
pub struct TSequence {
    instants: Vec<TInstant>,
    lower_inc: bool,
    upper_inc: bool,
    interpolation: Interpolation,
    bbox: BoundingBox,
}

impl TSequence {
    /// Validate and build a sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobility::{Interpolation, TInstant, TSequence, Timestamp, Value};
    ///
    /// let instants = vec![
    ///     TInstant::new(Value::Float(0.0), Timestamp::from_secs(0)).unwrap(),
    ///     TInstant::new(Value::Float(10.0), Timestamp::from_secs(10)).unwrap(),
    /// ];
    /// let seq = TSequence::new(instants, true, true, Interpolation::Linear).unwrap();
    /// assert_eq!(seq.value_at(Timestamp::from_secs(5)), Some(Value::Float(5.0)));
    /// ```
    pub fn new(
        instants: Vec<TInstant>,
        lower_inc: bool,
        upper_inc: bool,
        interpolation: Interpolation,
    ) -> Result<Self> {
        validate_instants(&instants)?;
        check_bounds(&instants, lower_inc, upper_inc)?;
        check_single_route(&instants, interpolation)?;
        let instants = hold_exclusive_end(instants, upper_inc, interpolation);
        Self::from_valid(instants, lower_inc, upper_inc, interpolation)?
            .ok_or_else(|| MobilityError::InvalidInput("At least one instant is required".into()))
    }

    /// Build from instants that already satisfy every sequence rule.
    pub(crate) fn from_valid(
        instants: Vec<TInstant>,
        lower_inc: bool,
        upper_inc: bool,
        interpolation: Interpolation,
    ) -> Result<Option<Self>> {
        let Some(bbox) = sequence_box(&instants, interpolation)? else {
            return Ok(None);
        };
        Ok(Some(Self::from_parts(instants, lower_inc, upper_inc, interpolation, bbox)))
    }

    /// Assemble from instants whose box is already known.
    pub(crate) fn from_parts(
        instants: Vec<TInstant>,
        lower_inc: bool,
        upper_inc: bool,
        interpolation: Interpolation,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            instants,
            lower_inc,
            upper_inc,
            interpolation,
            bbox,
        }
    }

    pub fn instants(&self) -> &[TInstant] {
        &self.instants
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn first(&self) -> &TInstant {
        &self.instants[0]
    }

    pub fn last(&self) -> &TInstant {
        &self.instants[self.instants.len() - 1]
    }

    pub fn period(&self) -> Period {
        Period::new(
            self.first().timestamp(),
            self.last().timestamp(),
            self.lower_inc,
            self.upper_inc,
        )
    }

    pub fn duration_micros(&self) -> i64 {
        self.period().duration_micros()
    }

    /// Value at `t`, or `None` outside the period.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        if !self.period().contains(t) {
            return None;
        }
        value_in_run(&self.instants, t, self.interpolation)
    }

    /// Value at `t` ignoring bound inclusivity.
    pub(crate) fn value_at_closed(&self, t: Timestamp) -> Option<Value> {
        value_in_run(&self.instants, t, self.interpolation)
    }

    /// Value approached from the left at `t`.
    pub(crate) fn left_limit(&self, t: Timestamp) -> Option<Value> {
        left_limit(&self.instants, t, self.interpolation)
    }

    pub fn at_timestamp(&self, t: Timestamp) -> Result<Option<TInstant>> {
        self.value_at(t)
            .map(|value| TInstant::derived(value, t))
            .transpose()
    }

    /// Restrict to the part of the sequence inside `period`.
    pub fn at_period(&self, period: &Period) -> Result<Option<TSequence>> {
        let Some(inter) = self.period().intersection(period) else {
            return Ok(None);
        };
        let start = self.value_at_closed(inter.lower);
        if inter.is_instant() {
            let Some(value) = start else {
                return Ok(None);
            };
            return Self::from_valid(
                vec![TInstant::derived(value, inter.lower)?],
                true,
                true,
                self.interpolation,
            );
        }

        let end = if inter.upper_inc {
            self.value_at_closed(inter.upper)
        } else {
            self.left_limit(inter.upper)
        };
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(None);
        };

        let mut instants = Vec::with_capacity(self.instants.len() + 2);
        instants.push(TInstant::derived(start, inter.lower)?);
        instants.extend(
            self.instants
                .iter()
                .filter(|inst| inst.timestamp() > inter.lower && inst.timestamp() < inter.upper)
                .cloned(),
        );
        instants.push(TInstant::derived(end, inter.upper)?);
        Self::from_valid(instants, inter.lower_inc, inter.upper_inc, self.interpolation)
    }

    /// Remove the part of the sequence inside `period`.
    pub fn minus_period(&self, period: &Period) -> Result<Option<TSequenceSet>> {
        let mut pieces = Vec::new();
        for piece in period_minus(&self.period(), period) {
            pieces.extend(self.at_period(&piece)?);
        }
        Ok(TSequenceSet::from_valid(pieces))
    }

    /// Periods over which the sequence takes `value`.
    fn periods_with_value(&self, value: &Value) -> Vec<Period> {
        let mut periods = Vec::new();
        let n = self.instants.len();
        match self.interpolation {
            Interpolation::Step => {
                for (i, inst) in self.instants.iter().enumerate() {
                    if inst.value() != value {
                        continue;
                    }
                    let held = match self.instants.get(i + 1) {
                        Some(next) => Period::new(inst.timestamp(), next.timestamp(), true, false),
                        None => Period::instant(inst.timestamp()),
                    };
                    periods.push(held);
                }
            }
            Interpolation::Linear => {
                if n == 1 && self.first().value() == value {
                    periods.push(Period::instant(self.first().timestamp()));
                }
                for pair in self.instants.windows(2) {
                    let (from, to) = (&pair[0], &pair[1]);
                    if from.value() == value && to.value() == value {
                        periods.push(Period::closed(from.timestamp(), to.timestamp()));
                    } else if let Some(f) = locate(from.value(), to.value(), value) {
                        let t = Timestamp::lerp(from.timestamp(), to.timestamp(), f);
                        periods.push(Period::instant(t));
                    }
                }
            }
        }
        let own = self.period();
        periods.iter().filter_map(|p| p.intersection(&own)).collect()
    }

    /// Restrict to the times at which the sequence equals `value`.
    pub fn at_value(&self, value: &Value) -> Result<Option<TSequenceSet>> {
        let mut pieces = Vec::new();
        for period in merge_periods(self.periods_with_value(value)) {
            let piece = if period.is_instant() {
                Self::from_valid(
                    vec![TInstant::derived(*value, period.lower)?],
                    true,
                    true,
                    self.interpolation,
                )?
            } else {
                self.at_period(&period)?
            };
            pieces.extend(piece);
        }
        Ok(TSequenceSet::from_valid(pieces))
    }

    pub fn ever_eq(&self, value: &Value) -> bool {
        !self.periods_with_value(value).is_empty()
    }

    pub fn always_eq(&self, value: &Value) -> bool {
        self.instants.iter().all(|inst| inst.value() == value)
    }

    /// Smallest number taken, for numeric sequences.
    pub fn min_value(&self) -> Option<f64> {
        self.bbox.range(Axis::M).map(|(lo, _)| lo)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.bbox.range(Axis::M).map(|(_, hi)| hi)
    }

    /// Add an instant after the last one and close the upper bound.
    ///
    /// The cached box is extended in the same step; nothing changes when
    /// validation fails.
    pub fn append(&mut self, instant: TInstant) -> Result<()> {
        let tail = [self.last().clone(), instant];
        validate_instants(&tail)?;
        if self.interpolation == Interpolation::Linear {
            check_single_route(&[self.first().clone(), tail[1].clone()], self.interpolation)?;
        }
        let extension = sequence_box(&tail, self.interpolation)?
            .ok_or_else(|| MobilityError::InvalidInput("At least one instant is required".into()))?;
        let [_, instant] = tail;
        self.bbox.expand(&extension);
        self.instants.push(instant);
        self.upper_inc = true;
        Ok(())
    }

    /// Same instants under another interpolation, when the rules allow it.
    pub(crate) fn with_interpolation(&self, interpolation: Interpolation) -> Result<TSequence> {
        TSequence::new(
            self.instants.clone(),
            self.lower_inc,
            self.upper_inc,
            interpolation,
        )
    }

    /// Split a step sequence into constant linear pieces.
    pub(crate) fn step_to_linear(&self) -> Result<Vec<TSequence>> {
        let n = self.instants.len();
        if self.interpolation == Interpolation::Linear || n == 1 {
            return Ok(TSequence::from_valid(
                self.instants.clone(),
                self.lower_inc,
                self.upper_inc,
                Interpolation::Linear,
            )?
            .into_iter()
            .collect());
        }
        let mut pieces = Vec::with_capacity(n);
        for (i, pair) in self.instants.windows(2).enumerate() {
            let held = *pair[0].value();
            let constant = vec![pair[0].clone(), pair[0].retimed(pair[1].timestamp())];
            let lower_inc = if i == 0 { self.lower_inc } else { true };
            let last_piece = i == n - 2;
            let upper_inc = last_piece && self.upper_inc && pair[1].value() == &held;
            pieces.extend(TSequence::from_valid(
                constant,
                lower_inc,
                upper_inc,
                Interpolation::Linear,
            )?);
        }
        let last = self.last();
        if self.upper_inc && self.instants[n - 2].value() != last.value() {
            pieces.extend(TSequence::from_valid(
                vec![last.clone()],
                true,
                true,
                Interpolation::Linear,
            )?);
        }
        Ok(pieces)
    }
}

fn check_bounds(instants: &[TInstant], lower_inc: bool, upper_inc: bool) -> Result<()> {
    if instants.len() == 1 && !(lower_inc && upper_inc) {
        return Err(MobilityError::InvalidBounds(
            "A sequence of one instant must include both bounds".into(),
        ));
    }
    Ok(())
}

/// A step sequence never reaches the value of an excluded last instant, so
/// that instant takes the value held before it.
fn hold_exclusive_end(
    mut instants: Vec<TInstant>,
    upper_inc: bool,
    interpolation: Interpolation,
) -> Vec<TInstant> {
    let n = instants.len();
    if interpolation == Interpolation::Step && !upper_inc && n >= 2 {
        if instants[n - 1].value() != instants[n - 2].value() {
            instants[n - 1] = instants[n - 2].retimed(instants[n - 1].timestamp());
        }
    }
    instants
}

fn check_single_route(instants: &[TInstant], interpolation: Interpolation) -> Result<()> {
    if interpolation != Interpolation::Linear {
        return Ok(());
    }
    let Some(first) = instants.first().and_then(|inst| inst.value().as_network()) else {
        return Ok(());
    };
    for inst in &instants[1..] {
        if let Some(position) = inst.value().as_network() {
            if !position.same_route(first) {
                return Err(MobilityError::FrameViolation(format!(
                    "linear network sequence moves from route {} to route {}",
                    first.route, position.route
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn ramp() -> TSequence {
        TSequence::new(vec![inst(0.0, 0), inst(10.0, 10)], true, true, Interpolation::Linear).unwrap()
    }

    #[test]
    fn test_geodetic_value_found_on_arc() {
        use mobility_types::point::GeoPoint;
        let point = |x, y, secs| TInstant::new(Value::GeogPoint(GeoPoint::new(x, y)), ts(secs)).unwrap();
        let flight = TSequence::new(
            vec![point(-74.0, 40.7, 0), point(2.35, 48.85, 3600)],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let mid = flight.value_at(ts(1800)).unwrap();
        assert!(flight.ever_eq(&mid));

        let found = flight.at_value(&mid).unwrap().unwrap();
        let when = found.period().lower;
        assert!((when.as_micros() - ts(1800).as_micros()).abs() <= 1);
    }

    #[test]
    fn test_single_instant_needs_closed_bounds() {
        let err = TSequence::new(vec![inst(1.0, 0)], true, false, Interpolation::Linear).unwrap_err();
        assert!(matches!(err, MobilityError::InvalidBounds(_)));
        assert!(TSequence::new(vec![inst(1.0, 0)], true, true, Interpolation::Linear).is_ok());
    }

    #[test]
    fn test_step_exclusive_upper_holds_value() {
        let seq = TSequence::new(vec![inst(1.0, 0), inst(2.0, 10)], true, false, Interpolation::Step)
            .unwrap();
        assert_eq!(seq.last().value(), &Value::Float(1.0));
        assert_eq!(seq.value_at(ts(5)), Some(Value::Float(1.0)));
        assert_eq!(seq.value_at(ts(10)), None);
        assert_eq!(seq.bbox().range(Axis::M), Some((1.0, 1.0)));
        assert!(!seq.ever_eq(&Value::Float(2.0)));

        let repeated =
            TSequence::new(vec![inst(1.0, 0), inst(1.0, 10)], true, false, Interpolation::Step).unwrap();
        assert_eq!(seq, repeated);
    }

    #[test]
    fn test_exclusive_bounds() {
        let seq =
            TSequence::new(vec![inst(0.0, 0), inst(10.0, 10)], false, false, Interpolation::Linear).unwrap();
        assert_eq!(seq.value_at(ts(0)), None);
        assert_eq!(seq.value_at(ts(10)), None);
        assert_eq!(seq.value_at(ts(5)), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_at_period_interpolates_bounds() {
        let part = ramp()
            .at_period(&Period::new(ts(2), ts(6), true, false))
            .unwrap()
            .unwrap();
        assert_eq!(part.instants().len(), 2);
        assert_eq!(part.first().value(), &Value::Float(2.0));
        assert_eq!(part.last().value(), &Value::Float(6.0));
        assert!(!part.upper_inc());
        assert_eq!(part.bbox().range(Axis::M), Some((2.0, 6.0)));
        assert!(ramp().at_period(&Period::closed(ts(11), ts(20))).unwrap().is_none());
    }

    #[test]
    fn test_at_period_step_exclusive_upper_uses_held_value() {
        let seq = TSequence::new(
            vec![inst(1.0, 0), inst(5.0, 10), inst(5.0, 20)],
            true,
            true,
            Interpolation::Step,
        )
        .unwrap();
        let part = seq.at_period(&Period::new(ts(0), ts(10), true, false)).unwrap().unwrap();
        assert_eq!(part.last().value(), &Value::Float(1.0));
        assert_eq!(part.bbox().range(Axis::M), Some((1.0, 1.0)));
    }

    #[test]
    fn test_minus_period_splits() {
        let rest = ramp().minus_period(&Period::closed(ts(4), ts(6))).unwrap().unwrap();
        assert_eq!(rest.sequences().len(), 2);
        assert_eq!(rest.sequences()[0].last().value(), &Value::Float(4.0));
        assert!(!rest.sequences()[0].upper_inc());
        assert!(!rest.sequences()[1].lower_inc());
    }

    #[test]
    fn test_at_value_linear() {
        let seq = TSequence::new(
            vec![inst(0.0, 0), inst(10.0, 10), inst(0.0, 20)],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let hits = seq.at_value(&Value::Float(5.0)).unwrap().unwrap();
        assert_eq!(hits.sequences().len(), 2);
        assert_eq!(hits.sequences()[0].first().timestamp(), ts(5));
        assert_eq!(hits.sequences()[1].first().timestamp(), ts(15));
        assert!(seq.ever_eq(&Value::Float(5.0)));
        assert!(!seq.ever_eq(&Value::Float(11.0)));
        assert!(!seq.always_eq(&Value::Float(5.0)));
    }

    #[test]
    fn test_at_value_step_merges_runs() {
        let seq = TSequence::new(
            vec![inst(1.0, 0), inst(1.0, 10), inst(2.0, 20)],
            true,
            true,
            Interpolation::Step,
        )
        .unwrap();
        let ones = seq.at_value(&Value::Float(1.0)).unwrap().unwrap();
        assert_eq!(ones.sequences().len(), 1);
        assert_eq!(ones.sequences()[0].period(), Period::new(ts(0), ts(20), true, false));
    }

    #[test]
    fn test_append_extends_box() {
        let mut seq = ramp();
        seq.append(inst(-5.0, 20)).unwrap();
        assert_eq!(seq.instants().len(), 3);
        assert_eq!(seq.min_value(), Some(-5.0));
        assert_eq!(seq.bbox().tmax, ts(20));

        let before = seq.clone();
        assert!(seq.append(inst(0.0, 20)).is_err());
        assert_eq!(seq, before);
    }

    #[test]
    fn test_step_to_linear() {
        let seq = TSequence::new(
            vec![inst(1.0, 0), inst(2.0, 10), inst(3.0, 20)],
            true,
            true,
            Interpolation::Step,
        )
        .unwrap();
        let pieces = seq.step_to_linear().unwrap();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].period(), Period::new(ts(0), ts(10), true, false));
        assert_eq!(pieces[2].period(), Period::instant(ts(20)));
    }
}
