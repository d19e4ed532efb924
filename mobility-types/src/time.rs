use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time with microsecond precision, stored as microseconds since
/// the Unix epoch (UTC).
///
/// # Examples
///
/// ```
/// use mobility_types::time::Timestamp;
///
/// let t: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
/// assert_eq!(t.to_string(), "2024-01-01T00:00:00Z");
/// assert_eq!(Timestamp::from_secs(60).as_micros(), 60_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// Convert a `SystemTime`, saturating outside the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(i64::try_from(after.as_micros()).unwrap_or(i64::MAX)),
            Err(before) => Self(-i64::try_from(before.duration().as_micros()).unwrap_or(i64::MAX)),
        }
    }

    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_micros(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_micros(self.0.unsigned_abs())
        }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.timestamp_micros())
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }

    pub fn checked_add_micros(self, micros: i64) -> Option<Self> {
        self.0.checked_add(micros).map(Self)
    }

    /// True when the timestamp has a calendar form (chrono's supported range).
    pub fn is_representable(self) -> bool {
        self.to_datetime().is_some()
    }

    /// Microseconds from `other` to `self`, exact for any pair.
    fn micros_since(self, other: Timestamp) -> i128 {
        i128::from(self.0) - i128::from(other.0)
    }

    /// Position of `self` inside `[lower, upper]` as a fraction in `[0, 1]`.
    pub fn fraction_between(self, lower: Timestamp, upper: Timestamp) -> f64 {
        if upper.0 <= lower.0 {
            return 0.0;
        }
        self.micros_since(lower) as f64 / upper.micros_since(lower) as f64
    }

    /// Timestamp at `fraction` of the way from `lower` to `upper`, rounded to
    /// the nearest microsecond and clamped to `[lower, upper]`.
    pub fn lerp(lower: Timestamp, upper: Timestamp, fraction: f64) -> Timestamp {
        if fraction <= 0.0 || upper <= lower {
            return lower;
        }
        if fraction >= 1.0 {
            return upper;
        }
        let span = upper.micros_since(lower);
        let offset = ((span as f64) * fraction).round() as i128;
        let micros = i128::from(lower.0) + offset.clamp(0, span);
        Timestamp(i64::try_from(micros).unwrap_or(upper.0))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "{}us", self.0),
        }
    }
}

/// Error returned when a timestamp literal cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimestampError(pub String);

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid timestamp: {}", self.0)
    }
}

impl std::error::Error for ParseTimestampError {}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    /// Accepts RFC 3339 (any offset, normalised to UTC) and the
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]` form, which is read as UTC.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| Self::from_datetime(naive.and_utc()))
            .map_err(|_| ParseTimestampError(s.to_string()))
    }
}

/// A time interval with independent bound inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub lower: Timestamp,
    pub upper: Timestamp,
    pub lower_inc: bool,
    pub upper_inc: bool,
}

impl Period {
    pub fn new(lower: Timestamp, upper: Timestamp, lower_inc: bool, upper_inc: bool) -> Self {
        Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }

    /// Closed period `[lower, upper]`.
    pub fn closed(lower: Timestamp, upper: Timestamp) -> Self {
        Self::new(lower, upper, true, true)
    }

    /// Degenerate period containing a single timestamp.
    pub fn instant(t: Timestamp) -> Self {
        Self::new(t, t, true, true)
    }

    /// A period is well formed when it contains at least one timestamp.
    pub fn is_valid(&self) -> bool {
        self.lower < self.upper || (self.lower == self.upper && self.lower_inc && self.upper_inc)
    }

    pub fn is_instant(&self) -> bool {
        self.lower == self.upper
    }

    /// Length in microseconds, saturating at `i64::MAX`.
    pub fn duration_micros(&self) -> i64 {
        let span = self.upper.micros_since(self.lower).max(0);
        i64::try_from(span).unwrap_or(i64::MAX)
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        let above = t > self.lower || (t == self.lower && self.lower_inc);
        let below = t < self.upper || (t == self.upper && self.upper_inc);
        above && below
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        self.intersection(other).is_some()
    }

    /// Common part of two periods, `None` when they are disjoint.
    pub fn intersection(&self, other: &Period) -> Option<Period> {
        let (lower, lower_inc) = match self.lower.cmp(&other.lower) {
            std::cmp::Ordering::Less => (other.lower, other.lower_inc),
            std::cmp::Ordering::Greater => (self.lower, self.lower_inc),
            std::cmp::Ordering::Equal => (self.lower, self.lower_inc && other.lower_inc),
        };
        let (upper, upper_inc) = match self.upper.cmp(&other.upper) {
            std::cmp::Ordering::Less => (self.upper, self.upper_inc),
            std::cmp::Ordering::Greater => (other.upper, other.upper_inc),
            std::cmp::Ordering::Equal => (self.upper, self.upper_inc && other.upper_inc),
        };
        let period = Period::new(lower, upper, lower_inc, upper_inc);
        period.is_valid().then_some(period)
    }

    /// Smallest period covering both inputs.
    pub fn span(&self, other: &Period) -> Period {
        let (lower, lower_inc) = match self.lower.cmp(&other.lower) {
            std::cmp::Ordering::Less => (self.lower, self.lower_inc),
            std::cmp::Ordering::Greater => (other.lower, other.lower_inc),
            std::cmp::Ordering::Equal => (self.lower, self.lower_inc || other.lower_inc),
        };
        let (upper, upper_inc) = match self.upper.cmp(&other.upper) {
            std::cmp::Ordering::Less => (other.upper, other.upper_inc),
            std::cmp::Ordering::Greater => (self.upper, self.upper_inc),
            std::cmp::Ordering::Equal => (self.upper, self.upper_inc || other.upper_inc),
        };
        Period::new(lower, upper, lower_inc, upper_inc)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inc { ']' } else { ')' }
        )
    }
}
