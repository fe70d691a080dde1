use adpulse_core::{
    aggregate, aggregate_by_day, metrics::parse_timestamp, AggregateResult, DailyAggregate,
    MetricRecord, NewMetricRecord,
};
use adpulse_store::MetricsFilter;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{json_body, map_store_error, parse_campaign_id, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetricsQuery {
    pub campaign_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_date(req_id: &str, field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    parse_timestamp(raw)
        .map(|ts| ts.date_naive())
        .ok_or_else(|| {
            ApiError::new(
                req_id,
                "validation_error",
                format!("'{field}' must be YYYY-MM-DD or an RFC 3339 timestamp, got '{raw}'"),
            )
        })
}

impl MetricsQuery {
    pub(super) fn to_filter(&self, req_id: &str) -> Result<MetricsFilter, ApiError> {
        let campaign_id = self
            .campaign_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|raw| parse_campaign_id(req_id, raw))
            .transpose()?;
        let start = self
            .start_date
            .as_deref()
            .map(|raw| parse_date(req_id, "startDate", raw))
            .transpose()?;
        let end = self
            .end_date
            .as_deref()
            .map(|raw| parse_date(req_id, "endDate", raw))
            .transpose()?;

        let filter = MetricsFilter {
            campaign_id,
            start,
            end,
        };
        filter
            .validate()
            .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))?;
        Ok(filter)
    }
}

pub(super) fn load_metrics(
    state: &AppState,
    req_id: &str,
    query: &MetricsQuery,
) -> Result<Vec<MetricRecord>, ApiError> {
    let filter = query.to_filter(req_id)?;
    state
        .store
        .list_metrics(&filter)
        .map_err(|e| map_store_error(req_id.to_owned(), &e))
}

/// GET /api/v1/metrics
pub(super) async fn list_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<Vec<MetricRecord>>>, ApiError> {
    let records = load_metrics(&state, &req_id.0, &query)?;
    Ok(ApiResponse::new(records, req_id))
}

/// POST /api/v1/metrics
pub(super) async fn create_metric(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<NewMetricRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MetricRecord>>), ApiError> {
    let mut record = json_body(&req_id.0, body)?;
    record.id = None;
    let stored = state
        .store
        .create_metric(record)
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    Ok((StatusCode::CREATED, ApiResponse::new(stored, req_id)))
}

/// GET /api/v1/metrics/summary
pub(super) async fn metrics_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<AggregateResult>>, ApiError> {
    let records = load_metrics(&state, &req_id.0, &query)?;
    Ok(ApiResponse::new(aggregate(&records), req_id))
}

/// GET /api/v1/metrics/daily
pub(super) async fn metrics_daily(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<Vec<DailyAggregate>>>, ApiError> {
    let records = load_metrics(&state, &req_id.0, &query)?;
    Ok(ApiResponse::new(aggregate_by_day(&records), req_id))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::test_support::{campaign_id, empty_app, seeded_app, send_json};

    fn decimal(value: &serde_json::Value) -> f64 {
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("decimal string")
    }

    #[tokio::test]
    async fn list_returns_records_sorted_by_date() {
        let app = seeded_app();
        let (status, json) = send_json(&app, "GET", "/api/v1/metrics", None).await;
        assert_eq!(status, StatusCode::OK);

        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["date"], "2024-11-01T00:00:00Z");
        assert_eq!(data[0]["spend"], "100.00");
        assert!(data[0]["campaignId"].is_string());
    }

    #[tokio::test]
    async fn summary_aggregates_filtered_records() {
        let app = seeded_app();
        let (status, json) = send_json(
            &app,
            "GET",
            "/api/v1/metrics/summary?startDate=2024-11-01&endDate=2024-11-02",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let data = &json["data"];
        assert_eq!(data["totalImpressions"], 3000);
        assert_eq!(data["totalClicks"], 150);
        assert_eq!(data["totalConversions"], 15);
        assert_eq!(data["totalSpend"], "300.00");
        assert_eq!(data["totalRevenue"], "1300.00");
        assert!((decimal(&data["averageCTR"]) - 5.0).abs() < f64::EPSILON);
        assert!((decimal(&data["averageROAS"]) - 4.333).abs() < 0.001);
    }

    #[tokio::test]
    async fn summary_of_no_records_is_all_zero() {
        let app = empty_app();
        let (status, json) = send_json(&app, "GET", "/api/v1/metrics/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["totalImpressions"], 0);
        assert_eq!(json["data"]["averageCTR"], "0");
        assert_eq!(json["data"]["averageROAS"], "0");
    }

    #[tokio::test]
    async fn campaign_filter_excludes_other_campaigns() {
        let app = seeded_app();
        let id = campaign_id(&app, "Black Friday Sale").await;
        let (status, json) = send_json(
            &app,
            "GET",
            &format!("/api/v1/metrics/summary?campaignId={id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["totalImpressions"], 0);
    }

    #[tokio::test]
    async fn inverted_date_range_is_validation_error() {
        let app = seeded_app();
        let (status, json) = send_json(
            &app,
            "GET",
            "/api/v1/metrics?startDate=2024-11-05&endDate=2024-11-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn malformed_date_is_validation_error() {
        let app = seeded_app();
        let (status, json) =
            send_json(&app, "GET", "/api/v1/metrics?startDate=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("startDate")));
    }

    #[tokio::test]
    async fn daily_series_has_one_entry_per_day() {
        let app = seeded_app();
        let (status, json) = send_json(&app, "GET", "/api/v1/metrics/daily", None).await;
        assert_eq!(status, StatusCode::OK);

        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["date"], "2024-11-01");
        assert_eq!(data[0]["totalImpressions"], 1000);
        assert_eq!(data[1]["date"], "2024-11-02");
        assert_eq!(data[1]["totalSpend"], "200.00");
    }

    #[tokio::test]
    async fn create_accepts_malformed_numbers_and_summary_coerces_them() {
        let app = empty_app();
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/v1/metrics",
            Some(json!({
                "id": "6f1c1d7e-8a4b-4c1e-9b9e-2f8d2c3a4b5c",
                "date": "2024-11-05",
                "impressions": 1000,
                "clicks": "50",
                "spend": "abc",
                "revenue": 250.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(json["data"]["id"], "6f1c1d7e-8a4b-4c1e-9b9e-2f8d2c3a4b5c");
        assert_eq!(json["data"]["spend"], "abc");

        let (_, json) = send_json(&app, "GET", "/api/v1/metrics/summary", None).await;
        assert_eq!(json["data"]["totalClicks"], 50);
        assert_eq!(json["data"]["totalSpend"], "0");
        assert!((decimal(&json["data"]["totalRevenue"]) - 250.5).abs() < f64::EPSILON);
        assert_eq!(json["data"]["averageROAS"], "0");
    }

    #[tokio::test]
    async fn create_without_date_is_rejected() {
        let app = empty_app();
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/v1/metrics",
            Some(json!({ "impressions": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
