//! Conversions between durations, interpolations and value domains.
//!
//! Every conversion checks the catalog for the target type first.

use super::{DurationKind, Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal, unsupported};
use crate::catalog::Catalog;
use crate::error::{MobilityError, Result};
use crate::network::{NetworkTopology, point_at_fraction, vertex_fractions};
use mobility_types::point::GeoPoint;
use mobility_types::time::Timestamp;
use mobility_types::value::{Value, ValueKind};

const DEFAULT_GEODETIC_SRID: i32 = 4326;

fn require(kind: ValueKind, duration: DurationKind) -> Result<()> {
    Catalog::global().ensure_registered(kind, duration).map(|_| ())
}

fn single_instant_sequence(inst: &TInstant, interpolation: Interpolation) -> Result<TSequence> {
    TSequence::new(vec![inst.clone()], true, true, interpolation)
}

fn retyped(seq: &TSequence, interpolation: Interpolation) -> Result<TSequence> {
    if seq.interpolation() == interpolation {
        Ok(seq.clone())
    } else {
        seq.with_interpolation(interpolation)
    }
}

impl Temporal {
    /// The only instant, when there is exactly one.
    pub fn to_instant(&self) -> Result<TInstant> {
        require(self.kind(), DurationKind::Instant)?;
        if self.num_instants() != 1 {
            return Err(unsupported("Instant conversion", self));
        }
        Ok(self.start_instant().clone())
    }

    /// Discrete form. Continuous values convert only when every sequence is
    /// a single instant.
    pub fn to_instant_set(&self) -> Result<Temporal> {
        require(self.kind(), DurationKind::InstantSet)?;
        match self {
            Temporal::Instant(inst) => Ok(TInstantSet::new(vec![inst.clone()])?.into()),
            Temporal::InstantSet(_) => Ok(self.clone()),
            Temporal::Sequence(_) | Temporal::SequenceSet(_) => {
                if self.sequences().iter().any(|seq| seq.instants().len() > 1) {
                    return Err(unsupported("Instant set conversion", self));
                }
                let instants = self.instants().into_iter().cloned().collect();
                Ok(TInstantSet::new(instants)?.into())
            }
        }
    }

    /// Single sequence form.
    pub fn to_sequence(&self, interpolation: Interpolation) -> Result<Temporal> {
        require(self.kind(), DurationKind::Sequence)?;
        match self {
            Temporal::Instant(inst) => Ok(single_instant_sequence(inst, interpolation)?.into()),
            Temporal::InstantSet(set) if set.instants().len() == 1 => {
                Ok(single_instant_sequence(set.first(), interpolation)?.into())
            }
            Temporal::Sequence(seq) => Ok(retyped(seq, interpolation)?.into()),
            Temporal::SequenceSet(set) if set.sequences().len() == 1 => {
                Ok(retyped(set.first(), interpolation)?.into())
            }
            _ => Err(unsupported("Sequence conversion", self)),
        }
    }

    /// Sequence set form. Each discrete instant becomes its own sequence.
    pub fn to_sequence_set(&self, interpolation: Interpolation) -> Result<Temporal> {
        require(self.kind(), DurationKind::SequenceSet)?;
        let sequences = match self {
            Temporal::Instant(inst) => vec![single_instant_sequence(inst, interpolation)?],
            Temporal::InstantSet(set) => set
                .instants()
                .iter()
                .map(|inst| single_instant_sequence(inst, interpolation))
                .collect::<Result<Vec<_>>>()?,
            Temporal::Sequence(_) | Temporal::SequenceSet(_) => self
                .sequences()
                .iter()
                .map(|seq| retyped(seq, interpolation))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(TSequenceSet::new(sequences)?.into())
    }

    /// Step interpolation. Linear sequences convert only when they hold a
    /// constant value between consecutive instants.
    pub fn to_step(&self) -> Result<Temporal> {
        require(self.kind(), self.duration())?;
        let constant = |seq: &TSequence| {
            seq.interpolation() == Interpolation::Step
                || seq
                    .instants()
                    .windows(2)
                    .all(|pair| pair[0].value() == pair[1].value())
        };
        match self {
            Temporal::Sequence(seq) if constant(seq) => Ok(retyped(seq, Interpolation::Step)?.into()),
            Temporal::SequenceSet(set) if set.sequences().iter().all(constant) => {
                let sequences = set
                    .sequences()
                    .iter()
                    .map(|seq| retyped(seq, Interpolation::Step))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TSequenceSet::new(sequences)?.into())
            }
            _ => Err(unsupported("Step conversion", self)),
        }
    }

    /// Linear interpolation. Each step becomes a constant linear piece, so a
    /// step sequence may turn into a sequence set.
    pub fn to_linear(&self) -> Result<Temporal> {
        match self {
            Temporal::Sequence(_) | Temporal::SequenceSet(_) => {
                let mut pieces: Vec<TSequence> = Vec::new();
                for seq in self.sequences() {
                    pieces.extend(seq.step_to_linear()?);
                }
                let set = TSequenceSet::new(pieces)?;
                let out = match self {
                    Temporal::Sequence(_) if set.sequences().len() == 1 => {
                        Temporal::Sequence(set.first().clone())
                    }
                    _ => Temporal::SequenceSet(set),
                };
                require(self.kind(), out.duration())?;
                Ok(out)
            }
            _ => Err(unsupported("Linear conversion", self)),
        }
    }

    /// Rebuild with every value mapped, validating the result.
    fn map_values(&self, f: impl Fn(&Value) -> Result<Value>) -> Result<Temporal> {
        let map_instant = |inst: &TInstant| inst.with_value(f(inst.value())?);
        let map_sequence = |seq: &TSequence| -> Result<TSequence> {
            let instants = seq
                .instants()
                .iter()
                .map(map_instant)
                .collect::<Result<Vec<_>>>()?;
            TSequence::new(instants, seq.lower_inc(), seq.upper_inc(), seq.interpolation())
        };
        Ok(match self {
            Temporal::Instant(inst) => map_instant(inst)?.into(),
            Temporal::InstantSet(set) => TInstantSet::new(
                set.instants()
                    .iter()
                    .map(map_instant)
                    .collect::<Result<Vec<_>>>()?,
            )?
            .into(),
            Temporal::Sequence(seq) => map_sequence(seq)?.into(),
            Temporal::SequenceSet(set) => TSequenceSet::new(
                set.sequences()
                    .iter()
                    .map(map_sequence)
                    .collect::<Result<Vec<_>>>()?,
            )?
            .into(),
        })
    }

    /// Reinterpret planar points as longitude/latitude.
    ///
    /// Points without a spatial reference get 4326.
    pub fn to_geodetic(&self) -> Result<Temporal> {
        require(ValueKind::GeogPoint, self.duration())?;
        self.map_values(|value| match value {
            Value::GeomPoint(p) => {
                let srid = if p.srid == 0 { DEFAULT_GEODETIC_SRID } else { p.srid };
                Ok(Value::GeogPoint(p.with_srid(srid)))
            }
            other => Err(MobilityError::InvalidInput(format!(
                "Geodetic conversion expects planar points, got {}",
                other.kind()
            ))),
        })
    }

    /// Reinterpret geodetic points as planar coordinates.
    pub fn to_planar(&self) -> Result<Temporal> {
        require(ValueKind::GeomPoint, self.duration())?;
        self.map_values(|value| match value {
            Value::GeogPoint(p) => Ok(Value::GeomPoint(*p)),
            other => Err(MobilityError::InvalidInput(format!(
                "Planar conversion expects geodetic points, got {}",
                other.kind()
            ))),
        })
    }

    /// Resolve network positions to planar points along their routes.
    ///
    /// Linear sequences gain an instant at every route vertex they pass, so
    /// the resulting straight segments follow the route.
    pub fn to_geometry(&self) -> Result<Temporal> {
        require(ValueKind::GeomPoint, self.duration())?;
        let network = Catalog::global()
            .network()
            .ok_or_else(|| MobilityError::InvalidInput("No network topology is registered".into()))?;
        let resolve = |value: &Value| -> Result<Value> {
            let Value::NetworkPoint(position) = value else {
                return Err(MobilityError::InvalidInput(format!(
                    "Geometry conversion expects network positions, got {}",
                    value.kind()
                )));
            };
            let line = network
                .route_geometry(position.route)
                .ok_or(MobilityError::UnknownRoute(position.route))?;
            let point = point_at_fraction(&line, position.fraction)
                .ok_or(MobilityError::UnknownRoute(position.route))?;
            Ok(Value::GeomPoint(GeoPoint::from_geo(point, None, network.srid())))
        };

        match self {
            Temporal::Sequence(seq) if seq.interpolation() == Interpolation::Linear => {
                with_route_vertices(seq, network.as_ref())?.map_values(resolve)
            }
            Temporal::SequenceSet(set) if set.interpolation() == Interpolation::Linear => {
                let sequences = set
                    .sequences()
                    .iter()
                    .map(|seq| with_route_vertices(seq, network.as_ref()))
                    .collect::<Result<Vec<_>>>()?;
                let densified: Vec<TSequence> = sequences
                    .into_iter()
                    .flat_map(|t| t.sequences().to_vec())
                    .collect();
                Temporal::from(TSequenceSet::new(densified)?).map_values(resolve)
            }
            _ => self.map_values(resolve),
        }
    }
}

/// Insert an instant wherever a linear network sequence passes a route vertex.
fn with_route_vertices(seq: &TSequence, network: &dyn NetworkTopology) -> Result<Temporal> {
    let mut instants: Vec<TInstant> = Vec::with_capacity(seq.instants().len());
    for pair in seq.instants().windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        instants.push(from.clone());
        let (Value::NetworkPoint(a), Value::NetworkPoint(b)) = (from.value(), to.value()) else {
            continue;
        };
        let line = network
            .route_geometry(a.route)
            .ok_or(MobilityError::UnknownRoute(a.route))?;
        let (lo, hi) = (a.fraction.min(b.fraction), a.fraction.max(b.fraction));
        let mut crossed: Vec<f64> = vertex_fractions(&line)
            .into_iter()
            .map(|(fraction, _)| fraction)
            .filter(|f| *f > lo && *f < hi)
            .collect();
        if b.fraction < a.fraction {
            crossed.reverse();
        }
        for fraction in crossed {
            let share = (fraction - a.fraction) / (b.fraction - a.fraction);
            let t = Timestamp::lerp(from.timestamp(), to.timestamp(), share);
            let after_last = instants.last().is_none_or(|last| t > last.timestamp());
            if after_last && t < to.timestamp() {
                let mut position = *a;
                position.fraction = fraction;
                instants.push(TInstant::new(Value::NetworkPoint(position), t)?);
            }
        }
    }
    instants.push(seq.last().clone());
    Ok(TSequence::new(instants, seq.lower_inc(), seq.upper_inc(), seq.interpolation())?.into())
}
