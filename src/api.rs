//! REST API Server for the call risk classifier
//!
//! Exposes the engine via HTTP endpoints for the telephony webhook and
//! dashboard services.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::RiskEngine;

/// Upper bound on in-flight classifications (and oracle calls) per batch
pub const MAX_CONCURRENT_CLASSIFICATIONS: usize = 8;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchClassifyRequest {
    pub transcripts: Vec<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<RiskEngine>,
}

/// =============================
/// Helpers: Call Id Correlation
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Provider call ids are opaque; map them onto a UUID for log correlation
fn correlation_id(call_id: Option<&str>) -> uuid::Uuid {
    match call_id {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => uuid::Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "oracle": if state.engine.oracle_enabled() { "enabled" } else { "disabled" },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Classification Endpoints
/// =============================

async fn classify_handler(
    State(state): State<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let correlation = correlation_id(req.call_id.as_deref());
    let transcript = req.transcript.unwrap_or_default();

    info!(
        correlation_id = %correlation,
        transcript_chars = transcript.chars().count(),
        "Received classification request"
    );

    let result = state.engine.classify(&transcript).await;

    let mut data = match serde_json::to_value(&result) {
        Ok(value) => value,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to serialize result: {}", e))),
            )
        }
    };

    if let Some(call_id) = req.call_id {
        data["callId"] = serde_json::json!(call_id);
    }

    (StatusCode::OK, Json(ApiResponse::success(data)))
}

async fn classify_batch_handler(
    State(state): State<ApiState>,
    Json(req): Json<BatchClassifyRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(count = req.transcripts.len(), "Received batch classification request");

    let results: Vec<_> = stream::iter(req.transcripts)
        .map(|transcript| {
            let engine = state.engine.clone();
            async move { engine.classify(&transcript).await }
        })
        .buffered(MAX_CONCURRENT_CLASSIFICATIONS)
        .collect()
        .await;

    (StatusCode::OK, Json(ApiResponse::success(results)))
}

/// =============================
/// Router
/// =============================

pub fn create_router(engine: Arc<RiskEngine>) -> Router {
    let state = ApiState { engine };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/classify", post(classify_handler))
        .route("/api/classify/batch", post(classify_batch_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    engine: Arc<RiskEngine>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(engine);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::oracle::MockOracle;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(Arc::new(RiskEngine::new(ClassifierConfig::default()).unwrap()))
    }

    async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["oracle"], "disabled");
    }

    #[tokio::test]
    async fn test_classify_returns_external_shape() {
        let (status, json) = post_json(
            router(),
            "/api/classify",
            serde_json::json!({
                "transcript": "Main marna chahta hun. Koi raah nahi hai.",
                "callId": "CA1234"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        let data = &json["data"];
        assert_eq!(data["tendency"], "severe");
        assert_eq!(data["needsCounselling"], "yes");
        assert_eq!(data["immediateIntervention"], true);
        assert!(data["detectedTerms"].as_array().unwrap().len() >= 2);
        assert!(data["geminiAnalysis"].is_null());
        assert_eq!(data["callId"], "CA1234");
    }

    #[tokio::test]
    async fn test_classify_missing_transcript() {
        let (status, json) = post_json(router(), "/api/classify", serde_json::json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["tendency"], "no");
        assert_eq!(json["data"]["score"], 0);
    }

    #[tokio::test]
    async fn test_classify_with_oracle() {
        let engine = RiskEngine::new(ClassifierConfig::default())
            .unwrap()
            .with_oracle(Arc::new(MockOracle::new(
                r#"{"riskLevel": "medium", "assessmentSummary": "Work stress."}"#,
            )));

        let (_, json) = post_json(
            create_router(Arc::new(engine)),
            "/api/classify",
            serde_json::json!({ "transcript": "I'm really stressed about work and feel overwhelmed." }),
        )
        .await;

        let data = &json["data"];
        assert_eq!(data["tendency"], "medium");
        assert_eq!(data["needsCounselling"], "advised");
        assert_eq!(data["geminiAnalysis"]["riskLevel"], "medium");
        assert_eq!(data["geminiAnalysis"]["assessmentSummary"], "Work stress.");
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let (status, json) = post_json(
            router(),
            "/api/classify/batch",
            serde_json::json!({
                "transcripts": [
                    "I want to kill myself. I have no reason to live.",
                    "Thank you, I feel better now after talking.",
                    "I'm really stressed about work and feel overwhelmed."
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().unwrap();
        let levels: Vec<_> = data.iter().map(|r| r["tendency"].as_str().unwrap()).collect();
        assert_eq!(levels, vec!["severe", "no", "low"]);
    }

    #[tokio::test]
    async fn test_large_batch_keeps_order() {
        let transcripts: Vec<&str> = (0..MAX_CONCURRENT_CLASSIFICATIONS * 3)
            .map(|i| {
                if i % 3 == 0 {
                    "I want to kill myself. I have no reason to live."
                } else {
                    "Thank you, I feel better now after talking."
                }
            })
            .collect();

        let (status, json) = post_json(
            router(),
            "/api/classify/batch",
            serde_json::json!({ "transcripts": transcripts }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), transcripts.len());
        for (i, r) in data.iter().enumerate() {
            let expected = if i % 3 == 0 { "severe" } else { "no" };
            assert_eq!(r["tendency"], expected, "position {}", i);
        }
    }

    #[test]
    fn test_correlation_id() {
        let uuid = uuid::Uuid::new_v4();
        assert_eq!(correlation_id(Some(&uuid.to_string())), uuid);
        assert_eq!(correlation_id(Some("CA1234")), correlation_id(Some("CA1234")));
        assert_ne!(correlation_id(Some("CA1234")), correlation_id(Some("CA9999")));
    }
}
