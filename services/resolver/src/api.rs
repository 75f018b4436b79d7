use crate::config::ApiConfig;
use crate::logging::{LogLevel, LogLevelControl};
use crate::resolver::{CctvResolver, Location, ResolvedResult};
use crate::river::RiverType;
use anyhow::{Context, Result};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Body text returned when the upstream flags abnormal access
const FORBIDDEN_MESSAGE: &str = "비정상적인 접근";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CctvResolver>,
    pub log_control: Arc<LogLevelControl>,
    pub cache_control: HeaderValue,
    pub service_name: String,
}

impl AppState {
    pub fn new(
        resolver: Arc<CctvResolver>,
        log_control: Arc<LogLevelControl>,
        config: &ApiConfig,
        service_name: impl Into<String>,
    ) -> Self {
        let cache_control = HeaderValue::from_str(&format!(
            "public, max-age={}",
            config.cache_max_age_secs
        ))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));

        Self {
            resolver,
            log_control,
            cache_control,
            service_name: service_name.into(),
        }
    }
}

/// Resolved camera response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CctvResponse {
    pub success: bool,
    pub cctv_id: String,
    pub name: Option<String>,
    pub center: Option<String>,
    pub location: Location,
    pub stream_page_url: String,
    pub kind: Option<String>,
    pub protocol: &'static str,
    pub river_type: Option<RiverType>,
    /// Always null; clients play the stream page in a web view
    pub direct_video_url: Option<String>,
    pub player_type: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub cctv_id: String,
}

/// Current log level response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLevelResponse {
    pub log_level: LogLevel,
}

/// Map a resolution outcome to a status code and JSON body
pub fn into_http(result: ResolvedResult) -> (StatusCode, Json<serde_json::Value>) {
    let (status, body) = match result {
        ResolvedResult::Success(r) => (
            StatusCode::OK,
            serde_json::to_value(CctvResponse {
                success: true,
                cctv_id: r.cctv_id,
                name: r.name,
                center: r.center,
                location: r.location,
                stream_page_url: r.stream_page_url,
                kind: r.kind,
                protocol: r.protocol.as_str(),
                river_type: r.river_type,
                direct_video_url: None,
                player_type: "webview",
            }),
        ),
        ResolvedResult::Forbidden { cctv_id } => (
            StatusCode::FORBIDDEN,
            serde_json::to_value(ErrorResponse {
                success: false,
                error: FORBIDDEN_MESSAGE.to_string(),
                cctv_id,
            }),
        ),
        ResolvedResult::TransportError { cctv_id, message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::to_value(ErrorResponse {
                success: false,
                error: message,
                cctv_id,
            }),
        ),
    };

    (status, Json(body.unwrap_or(serde_json::Value::Null)))
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let mut router = Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/api/cctv/:cctv_id", get(get_cctv))
        .route("/admin/log-level", get(get_log_level))
        .route("/admin/log-level/:level", get(set_log_level));

    if let Some(dir) = config.static_dir.as_deref() {
        if std::path::Path::new(dir).is_dir() {
            router = router.fallback_service(ServeDir::new(dir));
        } else {
            warn!(static_dir = %dir, "Static directory not found, not serving assets");
        }
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.service_name
    }))
}

/// Service description
async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let rivers: serde_json::Map<String, serde_json::Value> = RiverType::ALL
        .iter()
        .map(|r| (r.as_str().to_string(), r.template().into()))
        .collect();

    Json(serde_json::json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "logLevel": state.log_control.level(),
        "endpoints": {
            "GET /api/cctv/:cctvId": "Camera metadata and viewer URL",
            "GET /admin/log-level": "Current log level",
            "GET /admin/log-level/:level": "Change log level (loopback only)"
        },
        "urlPattern": {
            "protocol": "Derived from the first three characters of the camera ID",
            "encoding": "cctvName is percent-encoded twice",
            "undefinedHandling": "Missing device fields are sent as \"undefined\"",
            "parameterOrder": "key, cctvid, cctvName, kind, cctvip, cctvch, id, cctvpasswd, cctvport"
        },
        "riverSupport": rivers
    }))
}

/// Resolve a camera ID
async fn get_cctv(State(state): State<AppState>, Path(cctv_id): Path<String>) -> Response {
    let result = state.resolver.resolve(&cctv_id).await;
    let (status, body) = into_http(result);

    (
        status,
        [(header::CACHE_CONTROL, state.cache_control.clone())],
        body,
    )
        .into_response()
}

/// Report the current log level
async fn get_log_level(State(state): State<AppState>) -> Json<LogLevelResponse> {
    Json(LogLevelResponse {
        log_level: state.log_control.level(),
    })
}

/// Change the log level. Loopback clients only.
async fn set_log_level(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Path(level): Path<String>,
) -> Response {
    let remote = connect_info.map(|ConnectInfo(addr)| addr.ip());
    if !remote.is_some_and(is_loopback) {
        warn!(remote = ?remote, "Rejected log level change from non-local client");
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "forbidden" })),
        )
            .into_response();
    }

    let level = match level.parse::<LogLevel>() {
        Ok(level) => level,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match state.log_control.set(level) {
        Ok(()) => Json(serde_json::json!({
            "success": true,
            "logLevel": level
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Loopback, including IPv4-mapped IPv6 loopback
fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
    }
}

/// Start the resolver API server
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting resolver API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("API server error")?;

    Ok(())
}
