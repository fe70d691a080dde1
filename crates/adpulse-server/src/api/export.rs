use adpulse_core::{
    aggregate,
    export::{campaign_rows, export_filename, overview_rows, to_csv_string},
    AggregateResult, Campaign, ExportError,
};
use adpulse_store::MetricsFilter;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;

use crate::middleware::RequestId;

use super::{map_store_error, overview::build_overview, ApiError, AppState};

fn map_export_error(request_id: String, error: &ExportError) -> ApiError {
    tracing::error!(error = %error, "export failed");
    ApiError::new(request_id, "internal_error", "export failed")
}

fn csv_response(prefix: &str, body: String) -> Response {
    if body.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    let filename = export_filename(prefix, Utc::now().date_naive());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/v1/export/overview.csv
pub(super) async fn export_overview_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let overview = build_overview(&state, &req_id.0)?;
    let csv = to_csv_string(&overview_rows(&overview))
        .map_err(|e| map_export_error(req_id.0.clone(), &e))?;
    Ok(csv_response("overview", csv))
}

/// GET /api/v1/export/campaigns.csv
pub(super) async fn export_campaigns_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let campaigns = state
        .store
        .list_campaigns()
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let mut rollups: Vec<(Campaign, AggregateResult)> = Vec::with_capacity(campaigns.len());
    for campaign in campaigns {
        let records = state
            .store
            .list_metrics(&MetricsFilter::for_campaign(campaign.id))
            .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
        let totals = aggregate(&records);
        rollups.push((campaign, totals));
    }

    let csv = campaign_rows(&rollups, &state.currency)
        .and_then(|rows| to_csv_string(&rows))
        .map_err(|e| map_export_error(req_id.0.clone(), &e))?;
    Ok(csv_response("campaigns", csv))
}
