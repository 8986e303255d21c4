//! HTTP surface.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST | `/process-document/` | `converted_template.csv` |
//! | POST | `/export-to-excel/` | `exported_data.xlsx` |
//! | GET  | `/health` | `{"status":"ok","version":...}` |
//!
//! Both POST routes take a multipart form with one `file` field. Errors are
//! returned as `{"detail": "..."}` with the status chosen by [`status_for`].

use crate::config::ServerConfig;
use crate::convert::Extractor;
use crate::error::{ErrorKind, LedgerScanError};
use crate::export::Export;
use crate::pipeline::input::DocumentKind;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Name of the multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

/// Shared state: the process-wide extractor.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Build the application router.
///
/// Separated from [`serve`] so tests can drive it with `oneshot`.
pub fn create_router(extractor: Arc<Extractor>, max_upload_bytes: usize) -> Router {
    let state = AppState { extractor };

    Router::new()
        .route("/health", get(health))
        .route("/process-document/", post(process_document))
        .route("/process-document", post(process_document))
        .route("/export-to-excel/", post(export_to_excel))
        .route("/export-to-excel", post(export_to_excel))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, extractor: Arc<Extractor>) -> std::io::Result<()> {
    let app = create_router(extractor, config.max_upload_bytes);
    let addr = config.addr();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    info!("  POST /process-document/  - ledger → template CSV");
    info!("  POST /export-to-excel/   - table  → XLSX");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn process_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (bytes, kind) = read_upload(multipart).await?;
    let export = state.extractor.template_export_kind(bytes, kind).await?;
    Ok(download(export))
}

pub async fn export_to_excel(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (bytes, kind) = read_upload(multipart).await?;
    let export = state.extractor.direct_export_kind(bytes, kind).await?;
    Ok(download(export))
}

/// Find the `file` field, gate its content type, then read its bytes.
async fn read_upload(mut multipart: Multipart) -> Result<(Vec<u8>, DocumentKind), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or("").to_string();
        let kind = DocumentKind::from_mime(&content_type)?;
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(ApiError::multipart)?;
        info!("Upload '{}': {} bytes, {}", file_name, bytes.len(), kind.mime());
        return Ok((bytes.to_vec(), kind));
    }

    Err(LedgerScanError::MissingUpload {
        field: UPLOAD_FIELD.to_string(),
    }
    .into())
}

fn download(export: Export) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, export.media_type.to_string()),
            (header::CONTENT_DISPOSITION, export.content_disposition()),
        ],
        export.bytes,
    )
        .into_response()
}

/// HTTP status for a library error.
///
/// Model-response problems (no headers, unparsable JSON, failed call) are all
/// upstream failures and share 502; a deadline overrun is 504.
pub fn status_for(err: &LedgerScanError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::NoData => StatusCode::BAD_REQUEST,
        ErrorKind::Extraction => match err {
            LedgerScanError::GenerationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        },
        ErrorKind::Processing | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error response: a status plus a `detail` message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn multipart(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            detail: format!("Invalid multipart upload: {}", e.body_text()),
        }
    }
}

impl From<LedgerScanError> for ApiError {
    fn from(err: LedgerScanError) -> Self {
        Self {
            status: status_for(&err),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status.as_u16(), self.detail);
        } else {
            warn!("{} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
