use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Error code the upstream pairs with `msg` when it rejects a caller.
pub const REJECTED_CODE: &str = "9999";

/// A single camera record.
///
/// Ports and channels arrive as numbers or strings depending on the
/// operator, and coordinates are sometimes quoted. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CameraRecord {
    #[serde(rename = "CCTVID", default, deserialize_with = "lenient_string")]
    pub cctv_id: Option<String>,

    #[serde(rename = "CCTVNAME", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(rename = "CENTERNAME", default, deserialize_with = "lenient_string")]
    pub center: Option<String>,

    /// Longitude
    #[serde(rename = "XCOORD", default, deserialize_with = "lenient_f64")]
    pub x_coord: Option<f64>,

    /// Latitude
    #[serde(rename = "YCOORD", default, deserialize_with = "lenient_f64")]
    pub y_coord: Option<f64>,

    /// Kind declared by the upstream. `Some(None)` is an explicit `null`,
    /// which the viewer receives as the text `null`.
    #[serde(rename = "KIND", default, deserialize_with = "nullable_string")]
    pub kind: Option<Option<String>>,

    #[serde(rename = "CCTVIP", default, deserialize_with = "lenient_string")]
    pub address: Option<String>,

    #[serde(rename = "CH", default, deserialize_with = "lenient_string")]
    pub channel: Option<String>,

    /// Internal device identifier, also the river observatory code
    #[serde(rename = "ID", default, deserialize_with = "lenient_string")]
    pub internal_id: Option<String>,

    /// Device credential, also the river water-level observatory code
    #[serde(rename = "PASSWD", default, deserialize_with = "lenient_string")]
    pub credential: Option<String>,

    #[serde(rename = "PORT", default, deserialize_with = "lenient_string")]
    pub port: Option<String>,

    /// Kept as raw JSON; only a non-empty string counts for the sentinel
    #[serde(default)]
    pub msg: Option<Value>,

    /// Kept as raw JSON; only the string `"9999"` counts for the sentinel
    #[serde(default)]
    pub code: Option<Value>,
}

impl CameraRecord {
    /// True when the upstream flagged the request as abnormal access.
    pub fn is_rejected(&self) -> bool {
        let has_msg = matches!(&self.msg, Some(Value::String(m)) if !m.is_empty());
        let rejected_code = matches!(&self.code, Some(Value::String(c)) if c == REJECTED_CODE);
        has_msg && rejected_code
    }

    /// Declared kind, with an explicit null treated as absent.
    pub fn declared_kind(&self) -> Option<&str> {
        self.kind.as_ref().and_then(Option::as_deref)
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Accept a string, number or bool; null becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

/// Like [`lenient_string`], but keeps an explicit null as `Some(None)`.
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(scalar_to_string(Value::deserialize(deserializer)?)))
}

/// Accept a number or a numeric string; anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_mixed_field_types() {
        let record: CameraRecord = serde_json::from_value(json!({
            "CCTVID": "L010001",
            "CCTVNAME": "Gangnam Station",
            "CENTERNAME": "Seoul Traffic Center",
            "XCOORD": 127.0276,
            "YCOORD": "37.4979",
            "KIND": "S",
            "CCTVIP": "10.0.0.5",
            "CH": 3,
            "PORT": 8080,
            "ID": null
        }))
        .unwrap();

        assert_eq!(record.cctv_id.as_deref(), Some("L010001"));
        assert_eq!(record.x_coord, Some(127.0276));
        assert_eq!(record.y_coord, Some(37.4979));
        assert_eq!(record.declared_kind(), Some("S"));
        assert_eq!(record.channel.as_deref(), Some("3"));
        assert_eq!(record.port.as_deref(), Some("8080"));
        assert_eq!(record.internal_id, None);
        assert_eq!(record.credential, None);
    }

    #[test]
    fn test_empty_object_parses() {
        let record: CameraRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, CameraRecord::default());
        assert!(!record.is_rejected());
    }

    #[test]
    fn test_null_kind_is_distinct_from_missing_kind() {
        let null_kind: CameraRecord =
            serde_json::from_value(json!({"CCTVID": "E990001", "KIND": null})).unwrap();
        assert_eq!(null_kind.kind, Some(None));
        assert_eq!(null_kind.declared_kind(), None);

        let missing: CameraRecord = serde_json::from_value(json!({"CCTVID": "E990001"})).unwrap();
        assert_eq!(missing.kind, None);
    }

    #[test]
    fn test_rejection_sentinel() {
        let record: CameraRecord =
            serde_json::from_value(json!({"msg": "abnormal access", "code": "9999"})).unwrap();
        assert!(record.is_rejected());

        let no_msg: CameraRecord = serde_json::from_value(json!({"code": "9999"})).unwrap();
        assert!(!no_msg.is_rejected());

        let other_code: CameraRecord =
            serde_json::from_value(json!({"msg": "ok", "code": "0000"})).unwrap();
        assert!(!other_code.is_rejected());
    }

    #[test]
    fn test_rejection_sentinel_requires_string_values() {
        for body in [
            json!({"msg": "abnormal access", "code": 9999}),
            json!({"msg": false, "code": "9999"}),
            json!({"msg": 0, "code": "9999"}),
            json!({"msg": "", "code": "9999"}),
            json!({"msg": null, "code": "9999"}),
        ] {
            let record: CameraRecord = serde_json::from_value(body.clone()).unwrap();
            assert!(!record.is_rejected(), "body {}", body);
        }
    }
}
