use adpulse_core::{Campaign, CampaignPatch, NewCampaign};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::middleware::RequestId;

use super::{json_body, map_store_error, parse_campaign_id, ApiError, ApiResponse, AppState};

/// GET /api/v1/campaigns
pub(super) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Campaign>>>, ApiError> {
    let campaigns = state
        .store
        .list_campaigns()
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(campaigns, req_id))
}

/// GET /api/v1/campaigns/{id}
pub(super) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let id = parse_campaign_id(&req_id.0, &id)?;
    let campaign = state
        .store
        .get_campaign(id)
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", format!("campaign {id} not found")))?;
    Ok(ApiResponse::new(campaign, req_id))
}

/// POST /api/v1/campaigns
pub(super) async fn create_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<NewCampaign>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Campaign>>), ApiError> {
    let new = json_body(&req_id.0, body)?;
    let campaign = state
        .store
        .create_campaign(new)
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    tracing::info!(id = %campaign.id, name = %campaign.name, "campaign created");
    Ok((StatusCode::CREATED, ApiResponse::new(campaign, req_id)))
}

/// PATCH /api/v1/campaigns/{id}
pub(super) async fn update_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<CampaignPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let id = parse_campaign_id(&req_id.0, &id)?;
    let patch = json_body(&req_id.0, body)?;
    let campaign = state
        .store
        .update_campaign(id, &patch)
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(campaign, req_id))
}

/// DELETE /api/v1/campaigns/{id}
pub(super) async fn delete_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_campaign_id(&req_id.0, &id)?;
    state
        .store
        .delete_campaign(id)
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    tracing::info!(%id, "campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}
