use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::ServerConfig;
use crate::error::FetchError;
use crate::fetch::Orchestrator;
use crate::model::TranscriptResult;

/// Error body returned by the API: `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!("Transcript request failed: {}", err);
        } else {
            tracing::info!("Transcript not found: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/transcript/:video_id", get(get_transcript))
        .with_state(orchestrator)
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health() -> &'static str {
    "OK"
}

/// GET /api/transcript/:video_id
async fn get_transcript(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(video_id): Path<String>,
) -> Result<Json<TranscriptResult>, ApiError> {
    // Providers and the store block, so keep them off the async workers.
    let result = tokio::task::spawn_blocking(move || orchestrator.get_transcript(&video_id))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("transcript task failed: {}", e),
        })??;
    Ok(Json(result))
}

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(orchestrator: Arc<Orchestrator>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = router(orchestrator, &config.allowed_origins);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let err: ApiError = FetchError::VideoNotFound("abc".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains("abc"));

        let err: ApiError = FetchError::TranscriptUnavailable {
            video_id: "abc".to_string(),
            reason: "no caption tracks".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        for err in [
            FetchError::Metadata("bad duration".to_string()),
            FetchError::Upstream("timeout".to_string()),
            FetchError::Store(crate::error::StoreError::LockPoisoned),
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
