//! Web API module for klipconf.
//!
//! This module provides a REST API for a browser-based configurator. The
//! server is stateless apart from the immutable board catalog: every preview
//! request carries a complete session document and gets rendered config text
//! back. Requests carry a client-chosen version that is echoed in the
//! response; clients drop responses older than their newest request.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/boards` - List boards (optional `?role=`)
//! - `GET /api/boards/{id}` - One board with its ports
//! - `GET /api/functions` - Logical functions (optional `?category=`)
//! - `POST /api/preview` - Render a session document

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::catalog::{BoardCatalog, Catalog};
use crate::cli::functions::{function_infos, FunctionInfo};
use crate::constants::APP_NAME;
use crate::error::ConfigError;
use crate::firmware::{render, RenderMode};
use crate::models::{Board, BoardRole, PortCategory, SessionDocument};
use crate::services::AssignmentService;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Board catalog (immutable after load)
    catalog: Arc<Catalog>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Returns the board catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
    /// Number of boards in the catalog.
    pub boards: usize,
}

/// Query parameters for board listing.
#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    /// Only boards designed for this role.
    pub role: Option<BoardRole>,
}

/// Query parameters for function listing.
#[derive(Debug, Deserialize)]
pub struct FunctionQuery {
    /// Only functions using this port category.
    pub category: Option<PortCategory>,
}

/// Board summary for listings.
#[derive(Debug, Serialize)]
pub struct BoardSummary {
    /// Catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Role the board is designed for.
    pub role: BoardRole,
    /// MCU type.
    pub mcu: String,
    /// Port categories present on the board.
    pub categories: Vec<PortCategory>,
}

impl From<&Board> for BoardSummary {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id.clone(),
            name: board.name.clone(),
            manufacturer: board.manufacturer.clone(),
            role: board.role,
            mcu: board.mcu.clone(),
            categories: board.categories(),
        }
    }
}

/// Board list response.
#[derive(Debug, Serialize)]
pub struct BoardListResponse {
    /// Boards ordered by id.
    pub boards: Vec<BoardSummary>,
    /// Number of boards.
    pub count: usize,
}

/// Preview request: a full session plus the client's request version.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Client version, echoed back so the client can drop stale responses.
    #[serde(default)]
    pub version: u64,
    /// Render mode (defaults to placeholder for previews).
    #[serde(default = "default_preview_mode")]
    pub mode: RenderMode,
    /// Session to render.
    pub session: SessionDocument,
}

const fn default_preview_mode() -> RenderMode {
    RenderMode::Placeholder
}

/// Successful preview.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// Request version.
    pub version: u64,
    /// Mode used.
    pub mode: RenderMode,
    /// Rendered files by name.
    pub files: std::collections::BTreeMap<String, String>,
    /// Validator findings.
    pub warnings: Vec<String>,
    /// Session entries that could not be restored.
    pub issues: Vec<String>,
    /// Render time.
    pub rendered_at: DateTime<Utc>,
}

/// Failed preview.
#[derive(Debug, Serialize)]
pub struct PreviewError {
    /// Request version.
    pub version: u64,
    /// Error message.
    pub error: String,
    /// Machine-readable error kind.
    pub kind: String,
    /// Missing fields or other context.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl PreviewError {
    fn from_config_error(version: u64, err: &ConfigError) -> Self {
        let details = match err {
            ConfigError::MissingRequiredField { fields } => fields.clone(),
            _ => Vec::new(),
        };
        Self {
            version,
            error: err.to_string(),
            kind: err.kind().to_string(),
            details,
        }
    }
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        boards: state.catalog.len(),
    })
}

/// GET /api/boards
async fn list_boards(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Json<BoardListResponse> {
    let boards: Vec<BoardSummary> = match query.role {
        Some(role) => state.catalog.boards_for_role(role),
        None => state.catalog.boards(),
    }
    .into_iter()
    .map(BoardSummary::from)
    .collect();

    Json(BoardListResponse {
        count: boards.len(),
        boards,
    })
}

/// GET /api/boards/{id}
async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<Json<Board>, (StatusCode, Json<ApiError>)> {
    state
        .catalog
        .get_board(&board_id)
        .map(|board| Json(board.clone()))
        .map_err(|e| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::with_details("Board not found", e.to_string())),
            )
        })
}

/// GET /api/functions
async fn list_functions(Query(query): Query<FunctionQuery>) -> Json<Vec<FunctionInfo>> {
    Json(function_infos(query.category))
}

/// POST /api/preview
async fn preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, (StatusCode, Json<PreviewError>)> {
    let version = request.version;

    let (session, restore_issues) =
        AssignmentService::new(state.catalog.as_ref()).restore(&request.session);

    let rendered = render(&session, request.mode).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(PreviewError::from_config_error(version, &e)),
        )
    })?;

    debug!(version, mode = %request.mode, "rendered preview");
    let (files, warnings) = rendered.into_parts();
    Ok(Json(PreviewResponse {
        version,
        mode: request.mode,
        files,
        warnings,
        issues: restore_issues.iter().map(ToString::to_string).collect(),
        rendered_at: Utc::now(),
    }))
}

/// Fallback for unknown API routes.
async fn not_found() -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError::new("Not found")))
}

// ============================================================================
// Router
// ============================================================================

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS: the server is meant to run locally next to the frontend.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/boards", get(list_boards))
        .route("/api/boards/{id}", get(get_board))
        .route("/api/functions", get(list_functions))
        .route("/api/preview", post(preview))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server.
///
/// # Errors
///
/// Returns an error if the server fails to bind or serve.
pub async fn run_server(catalog: Catalog, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(AppState::new(catalog));

    info!("Starting {APP_NAME} web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_error_details() {
        let err = ConfigError::MissingRequiredField {
            fields: vec!["board".to_string(), "kinematics".to_string()],
        };
        let body = PreviewError::from_config_error(4, &err);
        assert_eq!(body.version, 4);
        assert_eq!(body.kind, "missing_required_field");
        assert_eq!(body.details, vec!["board", "kinematics"]);
    }

    #[test]
    fn test_preview_request_defaults() {
        let request: PreviewRequest = serde_json::from_str(r#"{"session": {}}"#).unwrap();
        assert_eq!(request.version, 0);
        assert_eq!(request.mode, RenderMode::Placeholder);
        assert_eq!(request.session, SessionDocument::default());
    }

    #[test]
    fn test_board_summary() {
        let catalog = Catalog::load().unwrap();
        let board = catalog.get_board("btt-ebb36-v1.2").unwrap();
        let summary = BoardSummary::from(board);
        assert_eq!(summary.role, BoardRole::Toolboard);
        assert!(summary.categories.contains(&PortCategory::Fan));
    }
}
