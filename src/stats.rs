//! Summary statistics over collections of temporal values.

use crate::temporal::{DurationKind, Temporal};
use mobility_types::bbox::BoundingBox;
use mobility_types::time::Period;

/// Counts and extents accumulated from temporal values.
///
/// # Examples
///
/// ```
/// use mobility::stats::TemporalStats;
/// use mobility::temporal::DurationKind;
/// use mobility::{Temporal, ValueKind};
///
/// let values = [
///     "1@2024-01-01T00:00:00Z",
///     "[1@2024-01-01T00:00:00Z, 5@2024-01-01T00:00:10Z]",
/// ];
/// let stats: TemporalStats = values
///     .iter()
///     .map(|text| Temporal::parse(text, ValueKind::Float).unwrap())
///     .collect();
/// assert_eq!(stats.count, 2);
/// assert_eq!(stats.count_of(DurationKind::Sequence), 1);
/// assert_eq!(stats.instants, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalStats {
    /// Number of recorded values
    pub count: usize,
    /// Number of instants across all values
    pub instants: usize,
    /// Number of sequences across continuous values
    pub sequences: usize,
    per_duration: [usize; 4],
    /// Union of every recorded box over the axes they all share
    pub bbox: Option<BoundingBox>,
    /// Span of every recorded time extent
    pub period: Option<Period>,
}

impl TemporalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, temporal: &Temporal) {
        self.count += 1;
        self.instants += temporal.num_instants();
        self.sequences += temporal.num_sequences();
        self.per_duration[usize::from(temporal.duration().tag() - 1)] += 1;
        self.bbox = Some(match self.bbox {
            Some(bbox) => bbox.union(temporal.bbox()),
            None => *temporal.bbox(),
        });
        let span = temporal.time_span();
        self.period = Some(match self.period {
            Some(period) => period.span(&span),
            None => span,
        });
    }

    /// Number of recorded values with the given duration.
    pub fn count_of(&self, duration: DurationKind) -> usize {
        self.per_duration[usize::from(duration.tag() - 1)]
    }

    /// Combine with statistics gathered elsewhere.
    pub fn merge(&mut self, other: &TemporalStats) {
        self.count += other.count;
        self.instants += other.instants;
        self.sequences += other.sequences;
        for (mine, theirs) in self.per_duration.iter_mut().zip(other.per_duration) {
            *mine += theirs;
        }
        self.bbox = match (self.bbox, other.bbox) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
        self.period = match (self.period, other.period) {
            (Some(a), Some(b)) => Some(a.span(&b)),
            (a, b) => a.or(b),
        };
    }

    /// Average number of instants per recorded value.
    pub fn mean_instants(&self) -> Option<f64> {
        (self.count > 0).then(|| self.instants as f64 / self.count as f64)
    }
}

impl<'a> Extend<&'a Temporal> for TemporalStats {
    fn extend<I: IntoIterator<Item = &'a Temporal>>(&mut self, iter: I) {
        for temporal in iter {
            self.record(temporal);
        }
    }
}

impl FromIterator<Temporal> for TemporalStats {
    fn from_iter<I: IntoIterator<Item = Temporal>>(iter: I) -> Self {
        let mut stats = Self::new();
        for temporal in iter {
            stats.record(&temporal);
        }
        stats
    }
}
