//! Binary wire format.
//!
//! All integers are little endian.
//!
//! ```text
//! header       u8 duration tag (1..4), u8 value kind tag (1..4)
//!              u8 interpolation (0 step, 1 linear) for sequences and sets
//! instant      i64 microseconds, then f64 for numbers or u32 length + blob
//! instant set  u32 count, instants
//! sequence     u8 bound flags (bit 0 lower, bit 1 upper), u32 count, instants
//! sequence set u32 count, sequences
//! ```
//!
//! Point blobs come from the geometry engine codec; network positions are
//! bincode encoded.

use crate::catalog::Catalog;
use crate::engine::engine_for;
use crate::error::{MobilityError, Result};
use crate::temporal::{
    DurationKind, Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use mobility_types::network::NetworkPosition;
use mobility_types::time::Timestamp;
use mobility_types::value::{Value, ValueKind};

const LOWER_INC: u8 = 0b01;
const UPPER_INC: u8 = 0b10;

/// Encode a temporal value.
///
/// # Examples
///
/// ```
/// use mobility::codec::wire::{decode, encode};
/// use mobility::{Temporal, ValueKind};
///
/// let temp = Temporal::parse("{1@2024-01-01T00:00:00Z, 2@2024-01-01T00:00:01Z}", ValueKind::Float).unwrap();
/// let bytes = encode(&temp).unwrap();
/// assert_eq!(bytes[0], 2); // instant set
/// assert_eq!(decode(&bytes).unwrap(), temp);
/// ```
pub fn encode(temporal: &Temporal) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(16 + temporal.num_instants() * 24);
    buf.put_u8(temporal.duration().tag());
    buf.put_u8(temporal.kind().tag());
    if let Some(interpolation) = temporal.interpolation() {
        buf.put_u8(match interpolation {
            Interpolation::Step => 0,
            Interpolation::Linear => 1,
        });
    }
    match temporal {
        Temporal::Instant(inst) => put_instant(&mut buf, inst)?,
        Temporal::InstantSet(set) => put_instants(&mut buf, set.instants())?,
        Temporal::Sequence(seq) => put_sequence(&mut buf, seq)?,
        Temporal::SequenceSet(set) => {
            put_count(&mut buf, set.sequences().len())?;
            for seq in set.sequences() {
                put_sequence(&mut buf, seq)?;
            }
        }
    }
    Ok(buf.freeze())
}

fn put_count(buf: &mut BytesMut, count: usize) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| MobilityError::InvalidInput(format!("{} elements exceed the wire limit", count)))?;
    buf.put_u32_le(count);
    Ok(())
}

fn put_instant(buf: &mut BytesMut, inst: &TInstant) -> Result<()> {
    buf.put_i64_le(inst.timestamp().as_micros());
    match inst.value() {
        Value::Float(v) => buf.put_f64_le(*v),
        Value::GeomPoint(p) | Value::GeogPoint(p) => {
            let blob = engine_for(inst.value().kind()).serialize(p)?;
            put_count(buf, blob.len())?;
            buf.put_slice(&blob);
        }
        Value::NetworkPoint(np) => {
            let blob = bincode::serialize(np)?;
            put_count(buf, blob.len())?;
            buf.put_slice(&blob);
        }
    }
    Ok(())
}

fn put_instants(buf: &mut BytesMut, instants: &[TInstant]) -> Result<()> {
    put_count(buf, instants.len())?;
    for inst in instants {
        put_instant(buf, inst)?;
    }
    Ok(())
}

fn put_sequence(buf: &mut BytesMut, seq: &TSequence) -> Result<()> {
    let mut flags = 0;
    if seq.lower_inc() {
        flags |= LOWER_INC;
    }
    if seq.upper_inc() {
        flags |= UPPER_INC;
    }
    buf.put_u8(flags);
    put_instants(buf, seq.instants())
}

/// Decode a temporal value, validating it like a constructor would.
pub fn decode(bytes: &[u8]) -> Result<Temporal> {
    let mut reader = Reader { buf: bytes };
    let duration_tag = reader.u8()?;
    let duration = DurationKind::from_tag(duration_tag)
        .ok_or_else(|| MobilityError::MalformedWire(format!("unknown duration tag {}", duration_tag)))?;
    let kind_tag = reader.u8()?;
    let kind = ValueKind::from_tag(kind_tag)
        .ok_or_else(|| MobilityError::MalformedWire(format!("unknown value kind tag {}", kind_tag)))?;
    Catalog::global().ensure_registered(kind, duration)?;

    let temporal = match duration {
        DurationKind::Instant => reader.instant(kind)?.into(),
        DurationKind::InstantSet => TInstantSet::new(reader.instants(kind)?)?.into(),
        DurationKind::Sequence => {
            let interpolation = reader.interpolation()?;
            reader.sequence(kind, interpolation)?.into()
        }
        DurationKind::SequenceSet => {
            let interpolation = reader.interpolation()?;
            let count = reader.count()?;
            let mut sequences = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                sequences.push(reader.sequence(kind, interpolation)?);
            }
            TSequenceSet::new(sequences)?.into()
        }
    };
    if reader.remaining() > 0 {
        return Err(MobilityError::MalformedWire(format!(
            "{} trailing bytes",
            reader.remaining()
        )));
    }
    Ok(temporal)
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(MobilityError::MalformedWire(format!(
                "truncated payload: needed {} bytes, {} left",
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn count(&mut self) -> Result<usize> {
        self.need(4)?;
        Ok(self.buf.get_u32_le() as usize)
    }

    fn interpolation(&mut self) -> Result<Interpolation> {
        match self.u8()? {
            0 => Ok(Interpolation::Step),
            1 => Ok(Interpolation::Linear),
            other => Err(MobilityError::MalformedWire(format!(
                "unknown interpolation flag {}",
                other
            ))),
        }
    }

    fn blob(&mut self) -> Result<&[u8]> {
        let len = self.count()?;
        self.need(len)?;
        let (blob, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(blob)
    }

    fn value(&mut self, kind: ValueKind) -> Result<Value> {
        Ok(match kind {
            ValueKind::Float => {
                self.need(8)?;
                Value::Float(self.buf.get_f64_le())
            }
            ValueKind::GeomPoint => Value::GeomPoint(engine_for(kind).deserialize(self.blob()?)?),
            ValueKind::GeogPoint => Value::GeogPoint(engine_for(kind).deserialize(self.blob()?)?),
            ValueKind::NetworkPoint => {
                let position: NetworkPosition = bincode::deserialize(self.blob()?)?;
                Value::NetworkPoint(position)
            }
        })
    }

    fn instant(&mut self, kind: ValueKind) -> Result<TInstant> {
        self.need(8)?;
        let t = Timestamp::from_micros(self.buf.get_i64_le());
        if !t.is_representable() {
            return Err(MobilityError::MalformedWire(format!(
                "timestamp {}us is outside the supported calendar range",
                t.as_micros()
            )));
        }
        let value = self.value(kind)?;
        TInstant::new(value, t)
    }

    fn instants(&mut self, kind: ValueKind) -> Result<Vec<TInstant>> {
        let count = self.count()?;
        // Every instant takes at least 12 bytes; cap the allocation by what is left.
        let mut instants = Vec::with_capacity(count.min(self.remaining() / 12));
        for _ in 0..count {
            instants.push(self.instant(kind)?);
        }
        Ok(instants)
    }

    fn sequence(&mut self, kind: ValueKind, interpolation: Interpolation) -> Result<TSequence> {
        let flags = self.u8()?;
        if flags & !(LOWER_INC | UPPER_INC) != 0 {
            return Err(MobilityError::MalformedWire(format!(
                "unknown bound flags {:#04b}",
                flags
            )));
        }
        let instants = self.instants(kind)?;
        TSequence::new(
            instants,
            flags & LOWER_INC != 0,
            flags & UPPER_INC != 0,
            interpolation,
        )
    }
}
