use adpulse_core::Overview;
use adpulse_store::MetricsFilter;
use axum::{extract::State, Extension, Json};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState};

pub(super) fn build_overview(state: &AppState, req_id: &str) -> Result<Overview, ApiError> {
    let campaigns = state
        .store
        .list_campaigns()
        .map_err(|e| map_store_error(req_id.to_owned(), &e))?;
    let records = state
        .store
        .list_metrics(&MetricsFilter::default())
        .map_err(|e| map_store_error(req_id.to_owned(), &e))?;
    Ok(Overview::build(&campaigns, &records))
}

/// GET /api/v1/overview
pub(super) async fn get_overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Overview>>, ApiError> {
    let overview = build_overview(&state, &req_id.0)?;
    Ok(ApiResponse::new(overview, req_id))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::test_support::{empty_app, seeded_app, send_json};

    #[tokio::test]
    async fn overview_reports_totals_and_active_count() {
        let app = seeded_app();
        let (status, json) = send_json(&app, "GET", "/api/v1/overview", None).await;
        assert_eq!(status, StatusCode::OK);

        let data = &json["data"];
        assert_eq!(data["totalRevenue"], "1300.00");
        assert_eq!(data["totalSpend"], "300.00");
        assert_eq!(data["totalConversions"], 15);
        assert_eq!(data["roas"], "4.3");
        assert_eq!(data["ctr"], "5.0");
        assert_eq!(data["activeCampaigns"], 1);
        assert_eq!(data["campaigns"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn overview_of_empty_store_is_zero() {
        let app = empty_app();
        let (status, json) = send_json(&app, "GET", "/api/v1/overview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["roas"], "0.0");
        assert_eq!(json["data"]["activeCampaigns"], 0);
    }
}
