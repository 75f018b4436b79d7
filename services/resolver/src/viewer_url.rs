use crate::classifier::Classification;
use crate::record::CameraRecord;
use crate::river::RiverType;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped by ECMAScript `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const VIEWER_PATH: &str = "/jsp/map/openDataCctvStream.jsp";

/// Placeholder the viewer expects for absent fields
const UNDEFINED: &str = "undefined";

/// Placeholder for a kind the upstream sent as JSON null
const NULL: &str = "null";

/// Builds destination URLs for resolved cameras
#[derive(Debug, Clone)]
pub struct ViewerUrlBuilder {
    host: String,
    access_key: String,
}

impl ViewerUrlBuilder {
    pub fn new(host: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            access_key: access_key.into(),
        }
    }

    /// River portal URL when `river` is set, generic viewer URL otherwise.
    pub fn synthesize(
        &self,
        record: &CameraRecord,
        classification: &Classification,
        river: Option<RiverType>,
    ) -> String {
        match river {
            Some(river) => river.portal_url(record),
            None => self.generic_url(record, classification),
        }
    }

    /// Generic viewer URL. Parameter order is significant.
    pub fn generic_url(&self, record: &CameraRecord, classification: &Classification) -> String {
        let params = [
            ("key", self.access_key.clone()),
            ("cctvid", verbatim(record.cctv_id.as_deref())),
            ("cctvName", double_encode(record.name.as_deref().unwrap_or(""))),
            ("kind", kind_param(record, classification)),
            ("cctvip", or_undefined(record.address.as_deref())),
            ("cctvch", or_undefined(record.channel.as_deref())),
            ("id", or_undefined(record.internal_id.as_deref())),
            ("cctvpasswd", or_undefined(record.credential.as_deref())),
            ("cctvport", or_undefined(record.port.as_deref())),
        ];

        let query = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{scheme}://{host}{path}?{query}",
            scheme = classification.protocol,
            host = self.host,
            path = VIEWER_PATH,
            query = query
        )
    }
}

/// Percent-encode twice; the viewer decodes the name twice.
pub fn double_encode(value: &str) -> String {
    let once = utf8_percent_encode(value, URI_COMPONENT).to_string();
    utf8_percent_encode(&once, URI_COMPONENT).to_string()
}

/// Absent, null and empty all become `undefined`.
fn or_undefined(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNDEFINED.to_string(),
    }
}

/// Interpolated as-is; only a missing value becomes `undefined`.
fn verbatim(value: Option<&str>) -> String {
    value.unwrap_or(UNDEFINED).to_string()
}

/// Resolved kind, or `null` when the upstream sent an explicit null.
fn kind_param(record: &CameraRecord, classification: &Classification) -> String {
    match (&classification.kind, &record.kind) {
        (Some(kind), _) => kind.clone(),
        (None, Some(None)) => NULL.to_string(),
        (None, _) => UNDEFINED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, Protocol};
    use percent_encoding::percent_decode_str;

    fn builder() -> ViewerUrlBuilder {
        ViewerUrlBuilder::new("www.utic.go.kr", "KEY")
    }

    fn full_record() -> CameraRecord {
        CameraRecord {
            cctv_id: Some("L010001".to_string()),
            name: Some("강남역".to_string()),
            center: Some("서울교통정보센터".to_string()),
            kind: Some(Some("S".to_string())),
            address: Some("10.1.2.3".to_string()),
            channel: Some("2".to_string()),
            internal_id: Some("77".to_string()),
            credential: Some("pw".to_string()),
            port: Some("554".to_string()),
            ..Default::default()
        }
    }

    fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
        let query = url.split_once('?')?.1;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
    }

    #[test]
    fn test_exact_url_for_sample_record() {
        let record = full_record();
        let url = builder().generic_url(&record, &classify(&record));

        assert_eq!(
            url,
            "https://www.utic.go.kr/jsp/map/openDataCctvStream.jsp?key=KEY&cctvid=L010001\
             &cctvName=%25EA%25B0%2595%25EB%2582%25A8%25EC%2597%25AD&kind=Seoul\
             &cctvip=10.1.2.3&cctvch=2&id=77&cctvpasswd=pw&cctvport=554"
        );
    }

    #[test]
    fn test_parameter_order_is_fixed() {
        let record = full_record();
        let url = builder().generic_url(&record, &classify(&record));
        let query = url.split_once('?').unwrap().1;
        let names: Vec<&str> = query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap().0)
            .collect();

        assert_eq!(
            names,
            vec!["key", "cctvid", "cctvName", "kind", "cctvip", "cctvch", "id", "cctvpasswd", "cctvport"]
        );
    }

    #[test]
    fn test_missing_device_fields_are_undefined() {
        let record = CameraRecord {
            cctv_id: Some("E440001".to_string()),
            name: Some("Toll Gate".to_string()),
            kind: Some(Some("EX".to_string())),
            address: Some(String::new()),
            ..Default::default()
        };
        let url = builder().generic_url(&record, &classify(&record));

        assert!(url.starts_with("http://www.utic.go.kr/"));
        assert!(url.ends_with(
            "&cctvip=undefined&cctvch=undefined&id=undefined&cctvpasswd=undefined&cctvport=undefined"
        ));
    }

    #[test]
    fn test_name_double_encoding_round_trips() {
        for name in ["A&B/C", "Exit 3 (north) ?=#", "한강대교 북단 100%", "plain"] {
            let record = CameraRecord {
                cctv_id: Some("L990001".to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            };
            let url = builder().generic_url(&record, &classify(&record));
            let encoded = query_param(&url, "cctvName").unwrap();

            let once = percent_decode_str(encoded).decode_utf8().unwrap();
            let twice = percent_decode_str(&once).decode_utf8().unwrap();
            assert_eq!(twice, name);
            assert!(!encoded.contains('&') && !encoded.contains('/'));
        }
    }

    #[test]
    fn test_double_encode_matches_uri_component_set() {
        assert_eq!(double_encode("a b"), "a%2520b");
        assert_eq!(double_encode("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(double_encode("&"), "%2526");
        assert_eq!(double_encode(""), "");
    }

    #[test]
    fn test_missing_id_name_and_kind() {
        let record = CameraRecord::default();
        let classification = classify(&record);
        let url = builder().generic_url(&record, &classification);

        assert_eq!(classification.protocol, Protocol::Https);
        assert_eq!(query_param(&url, "cctvid"), Some("undefined"));
        assert_eq!(query_param(&url, "cctvName"), Some(""));
        assert_eq!(query_param(&url, "kind"), Some("undefined"));
    }

    #[test]
    fn test_null_kind_renders_as_null() {
        let record: CameraRecord =
            serde_json::from_value(serde_json::json!({"CCTVID": "E990001", "KIND": null}))
                .unwrap();
        let url = builder().generic_url(&record, &classify(&record));

        assert!(url.contains("&kind=null&"), "url {}", url);
    }

    #[test]
    fn test_kind_override_wins_over_null_kind() {
        let mut record = full_record();
        record.kind = Some(None);
        let url = builder().generic_url(&record, &classify(&record));

        assert_eq!(query_param(&url, "kind"), Some("Seoul"));
    }

    #[test]
    fn test_river_bypasses_generic_path() {
        let mut record = full_record();
        record.center = Some("한강홍수통제소".to_string());
        let url = builder().synthesize(&record, &classify(&record), Some(RiverType::Hangang));

        assert_eq!(url, "http://hrfco.go.kr/sumun/cctvPopup.do?Obscd=77");
    }
}
