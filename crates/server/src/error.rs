use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine_analysis::AnalysisError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Chess.com or Lichess failed or returned something unusable
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Analysis(AnalysisError::Replay(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            AppError::Analysis(AnalysisError::EngineUnavailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Analysis engine unavailable".to_string(),
            ),
            AppError::Analysis(e) => {
                tracing::error!("Analysis error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::ReplayError;

    async fn detail(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["detail"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_illegal_move_is_unprocessable() {
        let err = AppError::from(AnalysisError::Replay(ReplayError::IllegalMove {
            ply: 2,
            san: "Qh6".to_string(),
            reason: "illegal san".to_string(),
        }));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(detail(resp).await.contains("Qh6"));
    }

    #[tokio::test]
    async fn test_engine_unavailable_is_service_unavailable() {
        let resp = AppError::from(AnalysisError::EngineUnavailable).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(detail(resp).await, "Analysis engine unavailable");
    }

    #[tokio::test]
    async fn test_other_analysis_errors_are_internal() {
        let resp = AppError::from(AnalysisError::SchedulerClosed).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail(resp).await, "Analysis failed");
    }
}
