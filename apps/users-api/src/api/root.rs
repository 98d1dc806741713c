//! `GET /` service banner.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    pub message: &'static str,
    /// Seconds since the process started
    pub uptime_secs: f64,
}

pub fn router(started_at: Instant) -> Router {
    Router::new().route("/", get(root)).with_state(started_at)
}

/// Service banner with process uptime
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses(
        (status = 200, description = "Service is up", body = RootResponse)
    )
)]
pub async fn root(State(started_at): State<Instant>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Users API",
        uptime_secs: started_at.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_reports_message_and_uptime() {
        let response = router(Instant::now())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Users API");
        assert!(body["uptimeSecs"].as_f64().unwrap() >= 0.0);
    }
}
