//! JSON transformer
//!
//! Flattens arbitrary JSON objects into one record per top-level scalar.

use chrono::{DateTime, Utc};
use contracts::{Message, Record, RecordValue, TimeField, TimeFormat};
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::error::{Result, TransformError};

/// JSON transformer
///
/// Owns its time-field table; two instances never share configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTransformer {
    time_fields: Vec<TimeField>,
}

impl JsonTransformer {
    /// Create a JSON transformer with time fields in priority order
    pub fn new(time_fields: Vec<TimeField>) -> Self {
        Self { time_fields }
    }

    pub fn time_fields(&self) -> &[TimeField] {
        &self.time_fields
    }

    pub fn time_fields_mut(&mut self) -> &mut Vec<TimeField> {
        &mut self.time_fields
    }

    /// Transform a message into records
    ///
    /// The payload is an object or an array of objects; each object is
    /// flattened independently.
    pub fn transform(&self, msg: &Message) -> Result<Vec<Record>> {
        let value: Value =
            serde_json::from_slice(&msg.payload).map_err(|e| TransformError::decode("json", e))?;

        let records = match value {
            Value::Object(object) => self.transform_object(msg, &object)?,
            Value::Array(items) => {
                let mut records = Vec::new();
                for (idx, item) in items.iter().enumerate() {
                    let Value::Object(object) = item else {
                        return Err(TransformError::unsupported(format!(
                            "array element {idx} is not an object"
                        )));
                    };
                    records.extend(self.transform_object(msg, object)?);
                }
                records
            }
            _ => {
                return Err(TransformError::unsupported(
                    "payload must be a JSON object or an array of objects",
                ))
            }
        };

        trace!(subject = %msg.subject, records = records.len(), "json payload flattened");
        Ok(records)
    }

    fn transform_object(&self, msg: &Message, object: &Map<String, Value>) -> Result<Vec<Record>> {
        let time = self.find_time(object)?.unwrap_or(msg.created);

        let records = object
            .iter()
            .filter(|(key, _)| !self.is_time_field(key))
            .filter_map(|(key, value)| {
                scalar(value).map(|value| Record::from_message(msg, key.as_str(), value, time))
            })
            .collect();

        Ok(records)
    }

    /// First configured time field present in `object`
    fn find_time(&self, object: &Map<String, Value>) -> Result<Option<DateTime<Utc>>> {
        for field in &self.time_fields {
            if let Some(value) = object.get(&field.field_name) {
                return parse_epoch(field, value).map(Some);
            }
        }
        Ok(None)
    }

    fn is_time_field(&self, key: &str) -> bool {
        self.time_fields.iter().any(|f| f.field_name == key)
    }
}

fn scalar(value: &Value) -> Option<RecordValue> {
    match value {
        Value::Number(n) => n.as_f64().map(RecordValue::Float),
        Value::String(s) => Some(RecordValue::String(s.clone())),
        Value::Bool(b) => Some(RecordValue::Bool(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Interpret an epoch value per the field's format. Every supported
/// location is UTC, so no offset is applied.
fn parse_epoch(field: &TimeField, value: &Value) -> Result<DateTime<Utc>> {
    let Value::Number(number) = value else {
        return Err(TransformError::invalid_time_field(
            &field.field_name,
            format!("expected a number, got {value}"),
        ));
    };

    epoch_to_datetime(field.field_format, number).ok_or_else(|| {
        TransformError::invalid_time_field(
            &field.field_name,
            format!("{number} is out of range for {:?}", field.field_format),
        )
    })
}

fn epoch_to_datetime(format: TimeFormat, number: &Number) -> Option<DateTime<Utc>> {
    if let Some(value) = number.as_i64() {
        return match format {
            TimeFormat::Unix => DateTime::from_timestamp(value, 0),
            TimeFormat::UnixMs => DateTime::from_timestamp_millis(value),
            TimeFormat::UnixUs => DateTime::from_timestamp_micros(value),
            TimeFormat::UnixNs => Some(DateTime::from_timestamp_nanos(value)),
        };
    }

    let value = number.as_f64()?;
    let nanos = value * format.nanos_per_unit() as f64;
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(DateTime::from_timestamp_nanos(nanos.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::default_time_fields;

    fn message(payload: &'static str) -> Message {
        Message::new("json.ch1", "application/json", payload)
            .with_channel("ch1")
            .with_publisher("thing1")
            .with_created(DateTime::from_timestamp(1_000, 0).unwrap())
    }

    fn transformer() -> JsonTransformer {
        JsonTransformer::new(default_time_fields())
    }

    fn find<'a>(records: &'a [Record], name: &str) -> &'a Record {
        records.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_millis_time_field() {
        let records = transformer()
            .transform(&message(r#"{"millis_key": 1700000000000, "temp": 21.5}"#))
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "temp");
        assert_eq!(records[0].value, Some(RecordValue::Float(21.5)));
        assert_eq!(records[0].time.to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(records[0].channel, "ch1");
        assert_eq!(records[0].publisher, "thing1");
    }

    #[test]
    fn test_each_resolution() {
        let cases = [
            r#"{"seconds_key": 1700000000, "v": 1}"#,
            r#"{"micros_key": 1700000000000000, "v": 1}"#,
            r#"{"nanos_key": 1700000000000000000, "v": 1}"#,
        ];
        for payload in cases {
            let records = transformer().transform(&message(payload)).unwrap();
            assert_eq!(records[0].time.timestamp(), 1_700_000_000, "{payload}");
        }
    }

    #[test]
    fn test_fractional_seconds() {
        let records = transformer()
            .transform(&message(r#"{"seconds_key": 1700000000.5, "v": 1}"#))
            .unwrap();
        assert_eq!(records[0].time.timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_missing_time_field_uses_ingestion_time() {
        let records = transformer()
            .transform(&message(r#"{"temp": 21.5, "hum": 40}"#))
            .unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.time.timestamp(), 1_000);
        }
    }

    #[test]
    fn test_priority_order() {
        let records = transformer()
            .transform(&message(
                r#"{"millis_key": 2000, "seconds_key": 5, "v": 1}"#,
            ))
            .unwrap();

        // seconds_key wins, both time fields are left out
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time.timestamp(), 5);
    }

    #[test]
    fn test_scalar_kinds_and_skipped_values() {
        let records = transformer()
            .transform(&message(
                r#"{"n": 1.5, "s": "on", "b": true, "nil": null, "obj": {"x": 1}, "arr": [1]}"#,
            ))
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(find(&records, "n").value, Some(RecordValue::Float(1.5)));
        assert_eq!(
            find(&records, "s").value,
            Some(RecordValue::String("on".into()))
        );
        assert_eq!(find(&records, "b").value, Some(RecordValue::Bool(true)));
    }

    #[test]
    fn test_array_of_objects() {
        let records = transformer()
            .transform(&message(
                r#"[{"seconds_key": 10, "a": 1}, {"seconds_key": 20, "a": 2}]"#,
            ))
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time.timestamp(), 10);
        assert_eq!(records[1].time.timestamp(), 20);
    }

    #[test]
    fn test_malformed_json() {
        let err = transformer().transform(&message(r#"{"temp": "#)).unwrap_err();
        assert!(matches!(err, TransformError::Decode { .. }));
    }

    #[test]
    fn test_scalar_payload_rejected() {
        let err = transformer().transform(&message("42")).unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedPayload { .. }));
    }

    #[test]
    fn test_non_numeric_time_field() {
        let err = transformer()
            .transform(&message(r#"{"seconds_key": "yesterday", "v": 1}"#))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidTimeField { .. }));
    }

    #[test]
    fn test_custom_time_field_table() {
        let mut transformer = transformer();
        transformer
            .time_fields_mut()
            .insert(0, TimeField::new("ts", TimeFormat::UnixMs));

        let records = transformer
            .transform(&message(r#"{"ts": 5000, "v": 1}"#))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time.timestamp(), 5);
    }
}
