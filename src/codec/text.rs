//! Text literals.
//!
//! ```text
//! [SRID=n;][Interp=Step;]body
//!
//! instant      value@timestamp
//! instant set  {instant, ...}
//! sequence     [instant, ...]   ( and ) mark exclusive bounds
//! sequence set {sequence, ...}
//!
//! value        1.5 | POINT(x y) | POINT Z(x y z) | NPoint(route,fraction)
//! ```

use crate::error::{MobilityError, Result};
use crate::temporal::{Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal};
use mobility_types::network::NetworkPosition;
use mobility_types::point::GeoPoint;
use mobility_types::time::Timestamp;
use mobility_types::value::{Value, ValueKind};
use std::fmt;

/// Parse a literal holding values of `kind`.
///
/// # Examples
///
/// ```
/// use mobility::{Temporal, ValueKind};
/// use mobility::codec::text::parse;
///
/// let trip = parse(
///     "SRID=3857;[POINT(0 0)@2024-01-01T00:00:00Z, POINT(10 0)@2024-01-01T00:01:00Z)",
///     ValueKind::GeomPoint,
/// )
/// .unwrap();
/// assert_eq!(trip.num_instants(), 2);
/// assert_eq!(trip.frame().srid, 3857);
/// assert_eq!(parse(&trip.to_string(), ValueKind::GeomPoint).unwrap(), trip);
/// ```
pub fn parse(input: &str, kind: ValueKind) -> Result<Temporal> {
    let mut parser = Parser::new(input, kind);
    let temporal = parser.temporal()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(temporal)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    kind: ValueKind,
    srid: i32,
    interpolation: Option<Interpolation>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, kind: ValueKind) -> Self {
        Self {
            text,
            pos: 0,
            kind,
            srid: 0,
            interpolation: None,
        }
    }

    fn error(&self, message: impl Into<String>) -> MobilityError {
        MobilityError::literal(message, self.pos)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    /// Consume `keyword`, ignoring ASCII case.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let matches = self
            .rest()
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword));
        if matches {
            self.pos += keyword.len();
        }
        matches
    }

    /// Consume characters while `accept` holds and return them.
    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !accept(*c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        let token = self.take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        token.parse::<f64>().map_err(|_| {
            MobilityError::literal(format!("invalid number '{}'", token), start)
        })
    }

    fn integer<T: std::str::FromStr>(&mut self) -> Result<T> {
        let start = self.pos;
        let token = self.take_while(|c| c.is_ascii_digit() || c == '-');
        token
            .parse::<T>()
            .map_err(|_| MobilityError::literal(format!("invalid integer '{}'", token), start))
    }

    fn timestamp(&mut self) -> Result<Timestamp> {
        let start = self.pos;
        let token = self.take_while(|c| !matches!(c, ',' | ']' | ')' | '}'));
        token
            .trim()
            .parse::<Timestamp>()
            .map_err(|e| MobilityError::literal(e.to_string(), start))
    }

    fn prefixes(&mut self) -> Result<()> {
        loop {
            if self.eat_keyword("SRID=") {
                if !matches!(self.kind, ValueKind::GeomPoint | ValueKind::GeogPoint) {
                    return Err(self.error(format!("{} values carry no SRID", self.kind)));
                }
                self.srid = self.integer()?;
                self.expect(';')?;
            } else if self.eat_keyword("Interp=") {
                self.interpolation = if self.eat_keyword("Step") {
                    Some(Interpolation::Step)
                } else if self.eat_keyword("Linear") {
                    Some(Interpolation::Linear)
                } else {
                    return Err(self.error("expected Step or Linear"));
                };
                self.expect(';')?;
            } else {
                return Ok(());
            }
        }
    }

    fn point(&mut self) -> Result<GeoPoint> {
        if !self.eat_keyword("POINT") {
            return Err(self.error("expected POINT"));
        }
        let declared_z = self.eat_keyword("Z");
        self.expect('(')?;
        let x = self.number()?;
        let y = self.number()?;
        let z = if self.peek() == Some(')') {
            None
        } else {
            Some(self.number()?)
        };
        self.expect(')')?;
        if declared_z && z.is_none() {
            return Err(self.error("POINT Z needs three coordinates"));
        }
        let point = match z {
            Some(z) => GeoPoint::new_3d(x, y, z),
            None => GeoPoint::new(x, y),
        };
        Ok(point.with_srid(self.srid))
    }

    fn value(&mut self) -> Result<Value> {
        match self.kind {
            ValueKind::Float => Ok(Value::Float(self.number()?)),
            ValueKind::GeomPoint => Ok(Value::GeomPoint(self.point()?)),
            ValueKind::GeogPoint => Ok(Value::GeogPoint(self.point()?)),
            ValueKind::NetworkPoint => {
                if !self.eat_keyword("NPoint") {
                    return Err(self.error("expected NPoint"));
                }
                self.expect('(')?;
                let route = self.integer::<u64>()?;
                self.expect(',')?;
                let fraction = self.number()?;
                self.expect(')')?;
                Ok(Value::NetworkPoint(NetworkPosition::new(route, fraction)))
            }
        }
    }

    fn instant(&mut self) -> Result<TInstant> {
        let value = self.value()?;
        self.expect('@')?;
        let t = self.timestamp()?;
        TInstant::new(value, t)
    }

    fn instants_until(&mut self, close: &[char]) -> Result<(Vec<TInstant>, char)> {
        let mut instants = vec![self.instant()?];
        loop {
            if self.eat(',') {
                instants.push(self.instant()?);
                continue;
            }
            match self.peek() {
                Some(c) if close.contains(&c) => {
                    self.pos += c.len_utf8();
                    return Ok((instants, c));
                }
                _ => return Err(self.error(format!("expected ',' or one of {:?}", close))),
            }
        }
    }

    fn sequence(&mut self) -> Result<TSequence> {
        let lower_inc = if self.eat('[') {
            true
        } else if self.eat('(') {
            false
        } else {
            return Err(self.error("expected '[' or '('"));
        };
        let (instants, close) = self.instants_until(&[']', ')'])?;
        let interpolation = self.interpolation.unwrap_or_default();
        TSequence::new(instants, lower_inc, close == ']', interpolation)
    }

    fn temporal(&mut self) -> Result<Temporal> {
        self.prefixes()?;
        match self.peek() {
            Some('[') | Some('(') => Ok(self.sequence()?.into()),
            Some('{') => {
                self.pos += 1;
                if matches!(self.peek(), Some('[') | Some('(')) {
                    let mut sequences = vec![self.sequence()?];
                    while self.eat(',') {
                        sequences.push(self.sequence()?);
                    }
                    self.expect('}')?;
                    Ok(TSequenceSet::new(sequences)?.into())
                } else {
                    self.discrete_only()?;
                    let (instants, _) = self.instants_until(&['}'])?;
                    Ok(TInstantSet::new(instants)?.into())
                }
            }
            Some(_) => {
                self.discrete_only()?;
                Ok(self.instant()?.into())
            }
            None => Err(self.error("empty literal")),
        }
    }

    fn discrete_only(&self) -> Result<()> {
        match self.interpolation {
            Some(_) => Err(self.error("interpolation applies to sequences only")),
            None => Ok(()),
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Float(v) => write!(f, "{}", v),
        Value::GeomPoint(p) | Value::GeogPoint(p) => match p.z {
            Some(z) => write!(f, "POINT Z({} {} {})", p.x, p.y, z),
            None => write!(f, "POINT({} {})", p.x, p.y),
        },
        Value::NetworkPoint(np) => write!(f, "NPoint({},{})", np.route, np.fraction),
    }
}

fn write_instant(f: &mut fmt::Formatter<'_>, inst: &TInstant) -> fmt::Result {
    write_value(f, inst.value())?;
    write!(f, "@{}", inst.timestamp())
}

fn write_instants(f: &mut fmt::Formatter<'_>, instants: &[TInstant]) -> fmt::Result {
    for (i, inst) in instants.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_instant(f, inst)?;
    }
    Ok(())
}

fn write_sequence(f: &mut fmt::Formatter<'_>, seq: &TSequence) -> fmt::Result {
    f.write_str(if seq.lower_inc() { "[" } else { "(" })?;
    write_instants(f, seq.instants())?;
    f.write_str(if seq.upper_inc() { "]" } else { ")" })
}

/// Canonical literal, the inverse of [`parse`].
pub(crate) fn write_temporal(f: &mut fmt::Formatter<'_>, temporal: &Temporal) -> fmt::Result {
    let frame = temporal.frame();
    if matches!(frame.kind, ValueKind::GeomPoint | ValueKind::GeogPoint) && frame.srid != 0 {
        write!(f, "SRID={};", frame.srid)?;
    }
    if temporal.interpolation() == Some(Interpolation::Step) {
        f.write_str("Interp=Step;")?;
    }
    match temporal {
        Temporal::Instant(inst) => write_instant(f, inst),
        Temporal::InstantSet(set) => {
            f.write_str("{")?;
            write_instants(f, set.instants())?;
            f.write_str("}")
        }
        Temporal::Sequence(seq) => write_sequence(f, seq),
        Temporal::SequenceSet(set) => {
            f.write_str("{")?;
            for (i, seq) in set.sequences().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_sequence(f, seq)?;
            }
            f.write_str("}")
        }
    }
}
