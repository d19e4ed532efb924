//! Synchronization of two temporal values onto a shared timeline.
//!
//! Both outputs are restricted to the common time and carry exactly the same
//! timestamps: the union of both inputs' instants inside that time. With
//! crossings enabled, linear segments also gain the instant at which the two
//! signals cross.

use crate::compute::interpolate::crossing;
use crate::compute::validation::validate_binary_frames;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::temporal::{
    Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal, can_join, join,
};
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::Value;

/// Synchronized pair, or `None` when the inputs share no timestamp.
pub type Synchronized = Option<(Temporal, Temporal)>;

/// Align `a` and `b` on their common time.
///
/// Discrete inputs keep only the timestamps both define. A discrete input
/// against a continuous one samples the continuous value at the discrete
/// timestamps. Two continuous inputs are restricted to each overlapping pair
/// of sequences.
///
/// # Examples
///
/// ```
/// use mobility::compute::sync::synchronize;
/// use mobility::{Temporal, ValueKind};
///
/// let a = Temporal::parse("[0@2024-01-01T00:00:00Z, 10@2024-01-01T00:00:10Z]", ValueKind::Float).unwrap();
/// let b = Temporal::parse("[10@2024-01-01T00:00:00Z, 0@2024-01-01T00:00:10Z]", ValueKind::Float).unwrap();
///
/// let (sa, sb) = synchronize(&a, &b, true).unwrap().unwrap();
/// assert_eq!(sa.timestamps(), sb.timestamps());
/// assert_eq!(sa.num_instants(), 3); // the crossing at 5s is added
/// ```
pub fn synchronize(a: &Temporal, b: &Temporal, crossings: bool) -> Result<Synchronized> {
    validate_binary_frames(a.frame(), b.frame())?;

    match (a.is_continuous(), b.is_continuous()) {
        (false, false) => Ok(sync_discrete(a, b)),
        (false, true) => sample_continuous(a, b),
        (true, false) => Ok(sample_continuous(b, a)?.map(|(sampled, held)| (held, sampled))),
        (true, true) => sync_continuous(a, b, crossings),
    }
}

/// [`synchronize`] with crossing detection taken from `config`.
pub fn synchronize_with(a: &Temporal, b: &Temporal, config: &SyncConfig) -> Result<Synchronized> {
    synchronize(a, b, config.crossings)
}

fn discrete(instants: Vec<TInstant>, as_instant: bool) -> Option<Temporal> {
    if as_instant {
        return instants.into_iter().next().map(Temporal::Instant);
    }
    TInstantSet::from_valid(instants).map(Temporal::InstantSet)
}

/// Two-pointer merge keeping timestamps present in both.
fn sync_discrete(a: &Temporal, b: &Temporal) -> Synchronized {
    let (left, right) = (a.instants(), b.instants());
    let (mut i, mut j) = (0, 0);
    let (mut out_a, mut out_b) = (Vec::new(), Vec::new());
    while i < left.len() && j < right.len() {
        let (ta, tb) = (left[i].timestamp(), right[j].timestamp());
        match ta.cmp(&tb) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_a.push(left[i].clone());
                out_b.push(right[j].clone());
                i += 1;
                j += 1;
            }
        }
    }
    let as_instant = matches!(a, Temporal::Instant(_)) || matches!(b, Temporal::Instant(_));
    Some((discrete(out_a, as_instant)?, discrete(out_b, as_instant)?))
}

/// Sample a continuous value at every timestamp of a discrete one.
fn sample_continuous(discrete_side: &Temporal, continuous: &Temporal) -> Result<Synchronized> {
    let (mut out_d, mut out_c) = (Vec::new(), Vec::new());
    for inst in discrete_side.instants() {
        if let Some(value) = continuous.value_at(inst.timestamp()) {
            out_d.push(inst.clone());
            out_c.push(TInstant::derived(value, inst.timestamp())?);
        }
    }
    let as_instant = matches!(discrete_side, Temporal::Instant(_));
    Ok(discrete(out_d, as_instant).zip(discrete(out_c, as_instant)))
}

fn sync_continuous(a: &Temporal, b: &Temporal, crossings: bool) -> Result<Synchronized> {
    let (left, right) = (a.sequences(), b.sequences());
    let (mut i, mut j) = (0, 0);
    let (mut out_a, mut out_b) = (Vec::new(), Vec::new());
    while i < left.len() && j < right.len() {
        if let Some((sa, sb)) = sync_sequences(&left[i], &right[j], crossings)? {
            out_a.push(sa);
            out_b.push(sb);
        }
        // Advance whichever sequence ends first; both when they end together.
        let (end_a, end_b) = (left[i].period(), right[j].period());
        match end_a.upper.cmp(&end_b.upper) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    if matches!(a, Temporal::Sequence(_)) && matches!(b, Temporal::Sequence(_)) {
        return Ok(out_a.pop().zip(out_b.pop()).map(|(sa, sb)| (sa.into(), sb.into())));
    }
    Ok(joint_sets(out_a, out_b).map(|(set_a, set_b)| (set_a.into(), set_b.into())))
}

/// Merge neighbouring pairs only where both sides can merge, so the two
/// sets keep identical timestamps.
fn joint_sets(a: Vec<TSequence>, b: Vec<TSequence>) -> Option<(TSequenceSet, TSequenceSet)> {
    let mut out_a: Vec<TSequence> = Vec::with_capacity(a.len());
    let mut out_b: Vec<TSequence> = Vec::with_capacity(b.len());
    for (sa, sb) in a.into_iter().zip(b) {
        let mergeable = match (out_a.last(), out_b.last()) {
            (Some(pa), Some(pb)) => can_join(pa, &sa) && can_join(pb, &sb),
            _ => false,
        };
        if mergeable {
            let (pa, pb) = (out_a.pop()?, out_b.pop()?);
            out_a.push(join(pa, sa));
            out_b.push(join(pb, sb));
        } else {
            out_a.push(sa);
            out_b.push(sb);
        }
    }
    Some((
        TSequenceSet::from_normalized(out_a)?,
        TSequenceSet::from_normalized(out_b)?,
    ))
}

/// Value of `seq` at `t` inside `common`. At an exclusive upper bound the
/// value approached from the left is used.
fn value_in(seq: &TSequence, common: &Period, t: Timestamp) -> Option<Value> {
    if t == common.upper && !common.upper_inc {
        seq.left_limit(t)
    } else {
        seq.value_at_closed(t)
    }
}

fn sync_sequences(a: &TSequence, b: &TSequence, crossings: bool) -> Result<Option<(TSequence, TSequence)>> {
    let Some(common) = a.period().intersection(&b.period()) else {
        return Ok(None);
    };

    let mut timeline: Vec<Timestamp> = a
        .instants()
        .iter()
        .chain(b.instants())
        .map(TInstant::timestamp)
        .filter(|t| *t > common.lower && *t < common.upper)
        .collect();
    timeline.push(common.lower);
    timeline.push(common.upper);
    timeline.sort_unstable();
    timeline.dedup();

    let linear = a.interpolation() == Interpolation::Linear || b.interpolation() == Interpolation::Linear;
    if crossings && linear && timeline.len() > 1 {
        timeline = with_crossings(a, b, &common, timeline);
    }

    let mut out_a = Vec::with_capacity(timeline.len());
    let mut out_b = Vec::with_capacity(timeline.len());
    for t in timeline {
        let (Some(va), Some(vb)) = (value_in(a, &common, t), value_in(b, &common, t)) else {
            return Ok(None);
        };
        out_a.push(TInstant::derived(va, t)?);
        out_b.push(TInstant::derived(vb, t)?);
    }
    let sa = TSequence::from_valid(out_a, common.lower_inc, common.upper_inc, a.interpolation())?;
    let sb = TSequence::from_valid(out_b, common.lower_inc, common.upper_inc, b.interpolation())?;
    Ok(sa.zip(sb))
}

/// Add the crossing instant of every timeline segment where one exists.
///
/// Crossings rounding onto an existing timestamp are dropped.
fn with_crossings(a: &TSequence, b: &TSequence, common: &Period, timeline: Vec<Timestamp>) -> Vec<Timestamp> {
    let mut out = Vec::with_capacity(timeline.len() * 2);
    for pair in timeline.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        out.push(t0);
        let ends = (
            a.value_at_closed(t0),
            a.left_limit(t1),
            b.value_at_closed(t0),
            b.left_limit(t1),
        );
        let (Some(a0), Some(a1), Some(b0), Some(b1)) = ends else {
            continue;
        };
        if let Some(fraction) = crossing(&a0, &a1, &b0, &b1) {
            let t = Timestamp::lerp(t0, t1, fraction);
            if t > t0 && t < t1 && common.contains(t) {
                log::trace!("Crossing inserted at {}", t);
                out.push(t);
            }
        }
    }
    if let Some(last) = timeline.last() {
        out.push(*last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobility_types::value::ValueKind;

    fn parse(text: &str) -> Temporal {
        Temporal::parse(text, ValueKind::Float).unwrap()
    }

    #[test]
    fn test_discrete_intersection() {
        let a = parse("{1@2024-01-01 00:00:00, 2@2024-01-01 00:00:10, 3@2024-01-01 00:00:20}");
        let b = parse("{5@2024-01-01 00:00:10, 6@2024-01-01 00:00:30}");
        let (sa, sb) = synchronize(&a, &b, false).unwrap().unwrap();
        assert_eq!(sa.num_instants(), 1);
        assert_eq!(sa.start_value(), &Value::Float(2.0));
        assert_eq!(sb.start_value(), &Value::Float(5.0));
    }

    #[test]
    fn test_disjoint_is_none() {
        let a = parse("[1@2024-01-01 00:00:00, 2@2024-01-01 00:00:10]");
        let b = parse("[1@2024-01-02 00:00:00, 2@2024-01-02 00:00:10]");
        assert!(synchronize(&a, &b, false).unwrap().is_none());
    }

    #[test]
    fn test_sequences_share_timestamps() {
        let a = parse("[0@2024-01-01 00:00:00, 10@2024-01-01 00:00:10]");
        let b = parse("[5@2024-01-01 00:00:05, 5@2024-01-01 00:00:07, 9@2024-01-01 00:00:20)");
        let (sa, sb) = synchronize(&a, &b, false).unwrap().unwrap();
        assert_eq!(sa.timestamps(), sb.timestamps());
        assert_eq!(sa.num_instants(), 3);
        assert_eq!(sa.start_value(), &Value::Float(5.0));
        assert_eq!(sa.time_span(), sb.time_span());
    }

    #[test]
    fn test_crossing_inserted() {
        let a = parse("[0@2024-01-01 00:00:00, 10@2024-01-01 00:00:10]");
        let b = parse("[10@2024-01-01 00:00:00, 0@2024-01-01 00:00:10]");
        let (plain, _) = synchronize_with(&a, &b, &SyncConfig::default()).unwrap().unwrap();
        assert_eq!(plain.num_instants(), 2);

        let config = SyncConfig { crossings: true };
        let (sa, sb) = synchronize_with(&a, &b, &config).unwrap().unwrap();
        assert_eq!(sa.num_instants(), 3);
        assert_eq!(sa.instant_n(1).unwrap().value(), &Value::Float(5.0));
        assert_eq!(sb.instant_n(1).unwrap().value(), &Value::Float(5.0));
    }

    #[test]
    fn test_discrete_against_continuous() {
        let a = parse("{1@2024-01-01 00:00:05, 2@2024-01-01 00:00:30}");
        let b = parse("[0@2024-01-01 00:00:00, 10@2024-01-01 00:00:10]");
        let (sa, sb) = synchronize(&a, &b, false).unwrap().unwrap();
        assert_eq!(sa.duration(), crate::temporal::DurationKind::InstantSet);
        assert_eq!(sb.start_value(), &Value::Float(5.0));
        assert_eq!(sa.num_instants(), 1);

        let (tb, ta) = synchronize(&b, &a, false).unwrap().unwrap();
        assert_eq!((ta, tb), (sa, sb));
    }
}
