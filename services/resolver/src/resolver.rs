use crate::classifier::{classify, Protocol};
use crate::fetcher::{FetchError, MetadataFetcher};
use crate::record::CameraRecord;
use crate::river::{detect_river, RiverType};
use crate::viewer_url::ViewerUrlBuilder;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Camera coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A successfully resolved camera
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub cctv_id: String,
    pub name: Option<String>,
    pub center: Option<String>,
    pub location: Location,
    pub stream_page_url: String,
    pub kind: Option<String>,
    pub protocol: Protocol,
    pub river_type: Option<RiverType>,
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedResult {
    Success(Resolution),
    /// The upstream flagged the lookup as abnormal access
    Forbidden { cctv_id: String },
    /// The upstream could not be reached or answered garbage
    TransportError { cctv_id: String, message: String },
}

impl ResolvedResult {
    pub fn cctv_id(&self) -> &str {
        match self {
            ResolvedResult::Success(r) => &r.cctv_id,
            ResolvedResult::Forbidden { cctv_id } => cctv_id,
            ResolvedResult::TransportError { cctv_id, .. } => cctv_id,
        }
    }
}

/// Resolves camera IDs to viewer URLs
pub struct CctvResolver {
    fetcher: Arc<dyn MetadataFetcher>,
    urls: ViewerUrlBuilder,
}

impl CctvResolver {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, urls: ViewerUrlBuilder) -> Self {
        Self { fetcher, urls }
    }

    /// Fetch, classify and build the URL for one camera.
    #[instrument(skip(self))]
    pub async fn resolve(&self, cctv_id: &str) -> ResolvedResult {
        let outcome = self.fetcher.fetch(cctv_id).await;
        let result = assemble(cctv_id, outcome, &self.urls);

        match &result {
            ResolvedResult::Success(r) => {
                metrics::counter!("resolver.requests.success").increment(1);
                if r.river_type.is_some() {
                    metrics::counter!("resolver.river.resolved").increment(1);
                }
            }
            ResolvedResult::Forbidden { .. } => {
                metrics::counter!("resolver.requests.forbidden").increment(1);
            }
            ResolvedResult::TransportError { .. } => {
                metrics::counter!("resolver.requests.transport_error").increment(1);
            }
        }

        result
    }
}

/// Turn a fetch outcome into the response contract.
pub fn assemble(
    cctv_id: &str,
    outcome: Result<CameraRecord, FetchError>,
    urls: &ViewerUrlBuilder,
) -> ResolvedResult {
    let record = match outcome {
        Ok(record) => record,
        Err(e) => {
            error!(cctv_id = %cctv_id, error = %e, "Camera lookup failed");
            return ResolvedResult::TransportError {
                cctv_id: cctv_id.to_string(),
                message: e.to_string(),
            };
        }
    };

    if record.is_rejected() {
        error!(cctv_id = %cctv_id, msg = ?record.msg, "Upstream rejected lookup as abnormal access");
        return ResolvedResult::Forbidden {
            cctv_id: cctv_id.to_string(),
        };
    }

    let classification = classify(&record);
    debug!(
        upstream_id = ?record.cctv_id,
        declared_kind = ?record.declared_kind(),
        kind = ?classification.kind,
        protocol = %classification.protocol,
        "Classified camera"
    );

    let river_type = detect_river(&record);
    if let Some(river) = river_type {
        debug!(river = %river, center = ?record.center, "River authority camera");
    }

    let stream_page_url = urls.synthesize(&record, &classification, river_type);
    debug!(url = %stream_page_url, "Viewer URL");

    info!(
        cctv_id = %cctv_id,
        name = ?record.name,
        center = ?record.center,
        kind = ?classification.kind,
        protocol = %classification.protocol,
        river = ?river_type,
        "Resolved camera"
    );

    ResolvedResult::Success(Resolution {
        cctv_id: cctv_id.to_string(),
        name: record.name,
        center: record.center,
        location: Location {
            lat: record.y_coord,
            lng: record.x_coord,
        },
        stream_page_url,
        kind: classification.kind,
        protocol: classification.protocol,
        river_type,
    })
}
