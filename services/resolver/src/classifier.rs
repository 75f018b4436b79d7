use crate::record::CameraRecord;
use serde::Serialize;
use std::fmt;

/// Prefix -> kind tag expected by the stream viewer
const KIND_OVERRIDES: &[(&str, &str)] = &[
    ("L01", "Seoul"),
    ("L02", "N"),
    ("L03", "O"),
    ("L04", "P"),
    ("L08", "d"), // Yongin
];

/// Prefixes whose viewer is only reachable over plain HTTP
const HTTP_ONLY_PREFIXES: &[&str] = &[
    "E44", "E53", "L19", "E43", "L08", // Yongin
    "L24", // Yangsan
    "L34", // Wonju
];

const PREFIX_LEN: usize = 3;

/// Transport scheme for the viewer URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts derived from a record's ID prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Corrected kind, or the record's declared kind
    pub kind: Option<String>,
    pub protocol: Protocol,
}

/// Classify a record.
pub fn classify(record: &CameraRecord) -> Classification {
    let id = record.cctv_id.as_deref();

    Classification {
        kind: resolve_kind(id, record.declared_kind()),
        protocol: resolve_protocol(id),
    }
}

/// Kind for an ID, falling back to the declared kind for unknown prefixes.
pub fn resolve_kind(cctv_id: Option<&str>, declared: Option<&str>) -> Option<String> {
    let corrected = cctv_id.and_then(prefix).and_then(|p| {
        KIND_OVERRIDES
            .iter()
            .find(|(candidate, _)| *candidate == p)
            .map(|(_, tag)| *tag)
    });

    corrected.or(declared).map(str::to_string)
}

/// Protocol for an ID. Missing or short IDs get `https`.
pub fn resolve_protocol(cctv_id: Option<&str>) -> Protocol {
    match cctv_id.and_then(prefix) {
        Some(p) if HTTP_ONLY_PREFIXES.contains(&p) => Protocol::Http,
        _ => Protocol::Https,
    }
}

/// First three characters, or `None` when the ID is shorter.
fn prefix(id: &str) -> Option<&str> {
    match id.char_indices().nth(PREFIX_LEN) {
        Some((end, _)) => Some(&id[..end]),
        None if id.chars().count() == PREFIX_LEN => Some(id),
        None => None,
    }
}
