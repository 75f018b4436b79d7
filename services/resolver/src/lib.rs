//! CCTV Resolver Service
//!
//! Resolves traffic camera IDs to a viewer URL a client can open. The camera
//! record is looked up in the UTIC open data directory, classified by its ID
//! prefix, and turned into either the UTIC stream viewer URL or, for cameras
//! run by one of the four river flood control offices, that office's portal.
//!
//! ## Features
//!
//! - **Prefix Classification**: kind corrections and HTTP-only deployments
//!   keyed by the first three characters of the camera ID
//! - **River Authority Routing**: Han, Nakdong, Geum and Yeongsan river
//!   cameras bypass the generic viewer
//! - **Viewer Compatibility**: fixed parameter order, double-encoded names and
//!   `undefined` placeholders, exactly as the upstream viewer expects
//! - **Runtime Log Level**: loopback-only admin endpoint
//!
//! ## Architecture
//!
//! ```text
//!   GET /api/cctv/:id
//!          │
//!          ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Metadata     │──▶│ Classifier   │──▶│ Viewer URL   │
//! │ Fetcher      │   │ River        │   │ Builder      │
//! └──────────────┘   │ Detector     │   └──────────────┘
//!        │           └──────────────┘          │
//!        ▼                                     ▼
//! ┌──────────────┐                      ┌──────────────┐
//! │ UTIC         │                      │ Result       │
//! │ Directory    │                      │ Assembler    │
//! └──────────────┘                      └──────────────┘
//! ```

pub mod api;
pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod logging;
pub mod record;
pub mod resolver;
pub mod river;
pub mod viewer_url;

pub use api::{AppState, CctvResponse};
pub use classifier::{classify, Classification, Protocol};
pub use config::Config;
pub use fetcher::{FetchError, MetadataFetcher, UticClient};
pub use logging::{LogLevel, LogLevelControl};
pub use record::CameraRecord;
pub use resolver::{assemble, CctvResolver, Resolution, ResolvedResult};
pub use river::{detect_river, RiverType};
pub use viewer_url::ViewerUrlBuilder;
