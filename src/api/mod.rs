use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    /// Published snapshot; the temp sibling is never served
    pub snapshot_path: PathBuf,
}

/// Build the Axum router serving the latest snapshot.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/live.json", get(live_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "ts": chrono::Utc::now().timestamp(),
    }))
}

/// GET /live.json
async fn live_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match tokio::fs::read(&state.snapshot_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "application/json")], bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err((StatusCode::SERVICE_UNAVAILABLE, "No data yet".to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
