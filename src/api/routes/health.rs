use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::config::DataMode;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: DataMode,
    pub source: &'static str,
    pub timestamp: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        mode: state.service.mode(),
        source: state.service.source_name(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::config::AppConfig;
    use crate::source::StatsService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_mode() {
        let config = AppConfig::default();
        let service = StatsService::from_config(&config).unwrap();
        let app = build_router(AppState::new(config, service));

        let resp = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["mode"], "mock");
        assert_eq!(json["source"], "mock");
        assert!(json["timestamp"].is_string());
    }
}
