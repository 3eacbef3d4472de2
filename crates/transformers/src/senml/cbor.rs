//! SenML-CBOR decoding (RFC 8428 §6)
//!
//! CBOR packs use integer labels; text labels are accepted as well.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ciborium::value::Value;

use super::pack::SenmlEntry;
use crate::error::{Result, TransformError};

const ENCODING: &str = "cbor";

/// Decode a CBOR payload into wire entries
pub(crate) fn decode(payload: &[u8]) -> Result<Vec<SenmlEntry>> {
    let value: Value =
        ciborium::de::from_reader(payload).map_err(|e| TransformError::decode(ENCODING, e))?;

    let Value::Array(items) = value else {
        return Err(TransformError::decode(ENCODING, "pack must be an array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Map(fields) => decode_entry(index, fields),
            _ => Err(TransformError::decode(
                ENCODING,
                format!("entry {index} is not a map"),
            )),
        })
        .collect()
}

fn decode_entry(index: usize, fields: Vec<(Value, Value)>) -> Result<SenmlEntry> {
    let mut entry = SenmlEntry::default();

    for (key, value) in fields {
        let Some(label) = label_of(&key) else {
            continue;
        };
        match label {
            "bver" => entry.bver = Some(integer(index, label, value)?),
            "bn" => entry.bn = Some(text(index, label, value)?),
            "bt" => entry.bt = Some(number(index, label, value)?),
            "bu" => entry.bu = Some(text(index, label, value)?),
            "bv" => entry.bv = Some(number(index, label, value)?),
            "bs" => entry.bs = Some(number(index, label, value)?),
            "n" => entry.n = Some(text(index, label, value)?),
            "u" => entry.u = Some(text(index, label, value)?),
            "v" => entry.v = Some(number(index, label, value)?),
            "vs" => entry.vs = Some(text(index, label, value)?),
            "vb" => entry.vb = Some(boolean(index, label, value)?),
            "s" => entry.s = Some(number(index, label, value)?),
            "t" => entry.t = Some(number(index, label, value)?),
            "ut" => entry.ut = Some(number(index, label, value)?),
            "vd" => entry.vd = Some(data(index, label, value)?),
            _ => {}
        }
    }

    Ok(entry)
}

/// Map an integer or text key to its SenML label
fn label_of(key: &Value) -> Option<&'static str> {
    match key {
        Value::Integer(i) => match i128::from(*i) {
            -1 => Some("bver"),
            -2 => Some("bn"),
            -3 => Some("bt"),
            -4 => Some("bu"),
            -5 => Some("bv"),
            -6 => Some("bs"),
            0 => Some("n"),
            1 => Some("u"),
            2 => Some("v"),
            3 => Some("vs"),
            4 => Some("vb"),
            5 => Some("s"),
            6 => Some("t"),
            7 => Some("ut"),
            8 => Some("vd"),
            _ => None,
        },
        Value::Text(s) => match s.as_str() {
            "bver" => Some("bver"),
            "bn" => Some("bn"),
            "bt" => Some("bt"),
            "bu" => Some("bu"),
            "bv" => Some("bv"),
            "bs" => Some("bs"),
            "n" => Some("n"),
            "u" => Some("u"),
            "v" => Some("v"),
            "vs" => Some("vs"),
            "vb" => Some("vb"),
            "s" => Some("s"),
            "t" => Some("t"),
            "ut" => Some("ut"),
            "vd" => Some("vd"),
            _ => None,
        },
        _ => None,
    }
}

fn type_error(index: usize, label: &str, expected: &str) -> TransformError {
    TransformError::decode(
        ENCODING,
        format!("entry {index}: '{label}' must be {expected}"),
    )
}

fn number(index: usize, label: &str, value: Value) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(f),
        Value::Integer(i) => Ok(i128::from(i) as f64),
        _ => Err(type_error(index, label, "a number")),
    }
}

fn integer(index: usize, label: &str, value: Value) -> Result<i64> {
    match value {
        Value::Integer(i) => {
            i64::try_from(i128::from(i)).map_err(|_| type_error(index, label, "an i64"))
        }
        _ => Err(type_error(index, label, "an integer")),
    }
}

fn text(index: usize, label: &str, value: Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        _ => Err(type_error(index, label, "a text string")),
    }
}

/// Data values are byte strings in CBOR; they are kept as the base64url
/// text the JSON form carries. Text is accepted as already encoded.
fn data(index: usize, label: &str, value: Value) -> Result<String> {
    match value {
        Value::Bytes(bytes) => Ok(URL_SAFE_NO_PAD.encode(bytes)),
        Value::Text(s) => Ok(s),
        _ => Err(type_error(index, label, "a byte string")),
    }
}

fn boolean(index: usize, label: &str, value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        _ => Err(type_error(index, label, "a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_decode_integer_labels() {
        let pack = Value::Array(vec![Value::Map(vec![
            (Value::Integer((-2).into()), Value::Text("dev1/".into())),
            (Value::Integer(0.into()), Value::Text("temp".into())),
            (Value::Integer(1.into()), Value::Text("Cel".into())),
            (Value::Integer(2.into()), Value::Float(21.5)),
            (Value::Integer(6.into()), Value::Integer(1_600_000_000.into())),
        ])]);

        let entries = decode(&encode(&pack)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bn.as_deref(), Some("dev1/"));
        assert_eq!(entries[0].n.as_deref(), Some("temp"));
        assert_eq!(entries[0].u.as_deref(), Some("Cel"));
        assert_eq!(entries[0].v, Some(21.5));
        assert_eq!(entries[0].t, Some(1_600_000_000.0));
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let pack = Value::Array(vec![Value::Map(vec![
            (Value::Integer(0.into()), Value::Text("x".into())),
            (Value::Integer(42.into()), Value::Null),
            (Value::Integer(4.into()), Value::Bool(false)),
        ])]);

        let entries = decode(&encode(&pack)).unwrap();
        assert_eq!(entries[0].vb, Some(false));
    }

    #[test]
    fn test_wrong_value_type() {
        let pack = Value::Array(vec![Value::Map(vec![
            (Value::Integer(0.into()), Value::Text("x".into())),
            (Value::Integer(2.into()), Value::Text("not a number".into())),
        ])]);

        let err = decode(&encode(&pack)).unwrap_err();
        assert!(err.to_string().contains("'v' must be a number"));
    }

    #[test]
    fn test_data_value_byte_string() {
        let pack = Value::Array(vec![
            Value::Map(vec![
                (Value::Integer(0.into()), Value::Text("blob".into())),
                (Value::Integer(8.into()), Value::Bytes(vec![0x01, 0x02, 0x03, 0xfb])),
            ]),
            Value::Map(vec![
                (Value::Integer(0.into()), Value::Text("text".into())),
                (Value::Integer(8.into()), Value::Text("AQID".into())),
            ]),
        ]);

        let entries = decode(&encode(&pack)).unwrap();
        assert_eq!(entries[0].vd.as_deref(), Some("AQID-w"));
        assert_eq!(entries[1].vd.as_deref(), Some("AQID"));
    }

    #[test]
    fn test_data_value_wrong_type() {
        let pack = Value::Array(vec![Value::Map(vec![
            (Value::Integer(0.into()), Value::Text("blob".into())),
            (Value::Integer(8.into()), Value::Integer(3.into())),
        ])]);

        let err = decode(&encode(&pack)).unwrap_err();
        assert!(err.to_string().contains("'vd' must be a byte string"));
    }

    #[test]
    fn test_non_array_pack() {
        let err = decode(&encode(&Value::Integer(1.into()))).unwrap_err();
        assert!(matches!(err, TransformError::Decode { encoding: "cbor", .. }));
    }

    #[test]
    fn test_truncated_payload() {
        assert!(decode(&[0x81, 0xa2]).is_err());
    }
}
