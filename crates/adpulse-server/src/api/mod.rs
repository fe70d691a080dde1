mod campaigns;
mod export;
mod metrics;
mod overview;

use std::sync::Arc;

use adpulse_store::{Repository, StoreError};
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Repository>,
    /// ISO 4217 code for currency columns in exports.
    pub currency: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Repository>, currency: &str) -> Self {
        Self {
            store,
            currency: Arc::from(currency),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, req_id: RequestId) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(req_id.0),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::CampaignNotFound(id) => {
            ApiError::new(request_id, "not_found", format!("campaign {id} not found"))
        }
        StoreError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        StoreError::Poisoned => {
            tracing::error!(error = %error, "store access failed");
            ApiError::new(request_id, "internal_error", "store access failed")
        }
    }
}

/// Unwrap a JSON body, turning extractor rejections into `validation_error`.
pub(super) fn json_body<T>(
    req_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(req_id, "validation_error", rejection.body_text()))
}

pub(super) fn parse_campaign_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        ApiError::new(
            req_id,
            "validation_error",
            format!("'{raw}' is not a valid campaign id"),
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/api/v1/campaigns/{id}",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route(
            "/api/v1/metrics",
            get(metrics::list_metrics).post(metrics::create_metric),
        )
        .route("/api/v1/metrics/summary", get(metrics::metrics_summary))
        .route("/api/v1/metrics/daily", get(metrics::metrics_daily))
        .route("/api/v1/overview", get(overview::get_overview))
        .route(
            "/api/v1/export/overview.csv",
            get(export::export_overview_csv),
        )
        .route(
            "/api/v1/export/campaigns.csv",
            get(export::export_campaigns_csv),
        )
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    ApiResponse::new(HealthData { status: "ok" }, req_id)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use adpulse_core::seed::parse_seed;
    use adpulse_store::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use super::{build_app, AppState};

    pub(crate) const SEED: &str = r#"
campaigns:
  - name: Holiday Shopping Campaign
    platform: Google Ads
    status: active
    budget: "50000.00"
    spent: "32450.00"
    metrics:
      - date: 2024-11-01
        impressions: 1000
        clicks: 50
        conversions: 5
        spend: "100.00"
        revenue: "500.00"
      - date: 2024-11-02
        impressions: 2000
        clicks: 100
        conversions: 10
        spend: "200.00"
        revenue: "800.00"
  - name: Black Friday Sale
    platform: Facebook
    status: paused
"#;

    pub(crate) fn seeded_app() -> Router {
        let store = MemoryStore::from_seed(parse_seed(SEED).expect("seed")).expect("store");
        app_with(store)
    }

    pub(crate) fn empty_app() -> Router {
        app_with(MemoryStore::new())
    }

    fn app_with(store: MemoryStore) -> Router {
        build_app(AppState::new(Arc::new(store), "USD"))
    }

    pub(crate) async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, bytes.to_vec())
    }

    pub(crate) async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, json)
    }

    pub(crate) async fn campaign_id(app: &Router, name: &str) -> String {
        let (_, json) = send_json(app, "GET", "/api/v1/campaigns", None).await;
        json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .find(|c| c["name"] == name)
            .and_then(|c| c["id"].as_str())
            .expect("campaign id")
            .to_string()
    }
}
