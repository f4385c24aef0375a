//! HTTP retrieval server.
//!
//! Exposes the retrieval path as a small JSON API, so a chat front end can
//! hydrate conversation context with file contents before forwarding it to
//! an assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/files/resolve` | Resolve relative paths to stored contents |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "internal", "message": "store unavailable: ..." } }
//! ```
//!
//! Paths missing from the store are not errors; they come back in
//! `not_found` next to whatever was found.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use code_snapshot_core::retrieve::{resolve, Resolution};
use code_snapshot_core::store::FileStore;

use crate::config::Config;
use crate::sqlite_store::SqliteFileStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn FileStore>,
    case_fold_paths: bool,
}

/// Starts the server on `[server].bind` backed by the configured SQLite
/// store. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteFileStore::open(config).await?;
    let pool = store.pool().clone();

    let listener = TcpListener::bind(&config.server.bind).await?;
    println!("snapshot server listening on http://{}", config.server.bind);

    let result = serve(
        listener,
        Arc::new(store),
        config.ingest.case_fold_paths,
    )
    .await;
    pool.close().await;
    result
}

/// Serve the API on an already-bound listener over any [`FileStore`].
pub async fn serve(
    listener: TcpListener,
    store: Arc<dyn FileStore>,
    case_fold_paths: bool,
) -> anyhow::Result<()> {
    axum::serve(listener, router(store, case_fold_paths)).await?;
    Ok(())
}

pub fn router(store: Arc<dyn FileStore>, case_fold_paths: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/files/resolve", post(handle_resolve))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState {
            store,
            case_fold_paths,
        })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /files/resolve ============

#[derive(Deserialize)]
struct ResolveRequest {
    #[serde(default)]
    paths: Vec<String>,
}

async fn handle_resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<Resolution>, AppError> {
    let resolution = resolve(state.store.as_ref(), &request.paths, state.case_fold_paths)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "resolve failed");
            internal(e.to_string())
        })?;

    tracing::debug!(
        requested = request.paths.len(),
        found = resolution.found.len(),
        missing = resolution.not_found.len(),
        "resolved files"
    );

    Ok(Json(resolution))
}
