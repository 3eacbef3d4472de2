//! SenML pack resolution (RFC 8428 §4.6)

use chrono::{DateTime, Duration, Utc};
use contracts::{Message, Record, RecordValue};
use serde::Deserialize;

use crate::error::{Result, TransformError};

/// Resolved times below this value are relative to the ingestion instant
const RELATIVE_TIME_THRESHOLD: f64 = 268_435_456.0; // 2^28

/// Highest SenML version this decoder understands
const MAX_VERSION: i64 = 10;

/// One SenML entry as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct SenmlEntry {
    pub bn: Option<String>,
    pub bt: Option<f64>,
    pub bu: Option<String>,
    pub bv: Option<f64>,
    pub bs: Option<f64>,
    pub bver: Option<i64>,
    pub n: Option<String>,
    pub u: Option<String>,
    pub v: Option<f64>,
    pub vs: Option<String>,
    pub vb: Option<bool>,
    pub vd: Option<String>,
    pub s: Option<f64>,
    pub t: Option<f64>,
    pub ut: Option<f64>,
}

impl SenmlEntry {
    fn has_base_fields(&self) -> bool {
        self.bn.is_some()
            || self.bt.is_some()
            || self.bu.is_some()
            || self.bv.is_some()
            || self.bs.is_some()
            || self.bver.is_some()
    }

    fn value_count(&self) -> usize {
        [
            self.v.is_some(),
            self.vs.is_some(),
            self.vb.is_some(),
            self.vd.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Base values carried forward through the pack
#[derive(Debug, Default)]
struct Base {
    name: String,
    time: f64,
    unit: Option<String>,
    value: f64,
    sum: f64,
}

impl Base {
    fn absorb(&mut self, index: usize, entry: &SenmlEntry) -> Result<()> {
        if let Some(version) = entry.bver {
            if !(1..=MAX_VERSION).contains(&version) {
                return Err(TransformError::invalid_pack(
                    index,
                    format!("unsupported version {version}"),
                ));
            }
        }
        if let Some(ref bn) = entry.bn {
            self.name = bn.clone();
        }
        if let Some(bt) = entry.bt {
            self.time = finite(index, "bt", bt)?;
        }
        if let Some(ref bu) = entry.bu {
            self.unit = Some(bu.clone());
        }
        if let Some(bv) = entry.bv {
            self.value = finite(index, "bv", bv)?;
        }
        if let Some(bs) = entry.bs {
            self.sum = finite(index, "bs", bs)?;
        }
        Ok(())
    }
}

/// Resolve a decoded pack into canonical records
pub(crate) fn resolve(entries: Vec<SenmlEntry>, msg: &Message) -> Result<Vec<Record>> {
    if entries.is_empty() {
        return Err(TransformError::invalid_pack(0, "empty pack"));
    }

    let mut base = Base::default();
    let mut records = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        base.absorb(index, &entry)?;

        let values = entry.value_count();
        if values == 0 && entry.s.is_none() {
            if entry.n.is_none() && entry.has_base_fields() {
                // base-only entry, nothing to emit
                continue;
            }
            return Err(TransformError::invalid_pack(index, "missing value or sum"));
        }
        if values > 1 {
            return Err(TransformError::invalid_pack(index, "more than one value"));
        }

        records.push(resolve_entry(index, entry, &base, msg)?);
    }

    Ok(records)
}

fn resolve_entry(index: usize, entry: SenmlEntry, base: &Base, msg: &Message) -> Result<Record> {
    let name = format!("{}{}", base.name, entry.n.as_deref().unwrap_or_default());
    validate_name(index, &name)?;

    let value = if let Some(v) = entry.v {
        Some(RecordValue::Float(finite(index, "v", base.value + v)?))
    } else if let Some(vs) = entry.vs {
        Some(RecordValue::String(vs))
    } else if let Some(vb) = entry.vb {
        Some(RecordValue::Bool(vb))
    } else {
        entry.vd.map(RecordValue::Data)
    };

    let sum = entry
        .s
        .map(|s| finite(index, "s", base.sum + s))
        .transpose()?;

    let t = finite(index, "t", base.time + entry.t.unwrap_or(0.0))?;
    let time = resolve_time(index, t, msg.created)?;

    Ok(Record {
        channel: msg.channel.clone(),
        subtopic: msg.subtopic.clone(),
        publisher: msg.publisher.clone(),
        protocol: msg.protocol.clone(),
        name,
        unit: entry.u.or_else(|| base.unit.clone()),
        value,
        sum,
        time,
        update_time: entry.ut,
    })
}

/// Names must be non-empty, start with an alphanumeric character and use
/// only `A-Z a-z 0-9 : . / _ -`.
fn validate_name(index: usize, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TransformError::invalid_pack(index, "missing name"));
    }

    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest =
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '/' | '_' | '-'));

    if !valid_first || !valid_rest {
        return Err(TransformError::invalid_pack(
            index,
            format!("invalid name '{name}'"),
        ));
    }
    Ok(())
}

fn resolve_time(index: usize, t: f64, created: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let resolved = if t < RELATIVE_TIME_THRESHOLD {
        seconds_to_duration(t).and_then(|offset| created.checked_add_signed(offset))
    } else {
        let secs = t.floor();
        let nanos = ((t - secs) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    };

    resolved.ok_or_else(|| TransformError::invalid_pack(index, format!("time {t} out of range")))
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    let nanos = secs * 1e9;
    if nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(nanos.round() as i64))
}

fn finite(index: usize, label: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TransformError::invalid_pack(
            index,
            format!("'{label}' is not a finite number"),
        ))
    }
}
