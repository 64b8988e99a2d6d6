use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApprovalHistoryQuery {
    /// Month of approval (1-12)
    pub month: Option<u32>,
    /// Year of approval
    pub year: Option<i32>,
}

/// Approval history, reconciled against the separations table before
/// listing: entries whose separation is gone or no longer approved are
/// evicted.
#[utoipa::path(
    get,
    path = "/api/v1/approvals",
    params(ApprovalHistoryQuery),
    responses((status = 200, description = "Approval history", body = [crate::services::approvals::ApprovedOrder])),
    tag = "approvals"
)]
pub async fn list_approvals(
    State(state): State<AppState>,
    Query(query): Query<ApprovalHistoryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::InvalidInput(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
    }

    let entries = state
        .services
        .approvals
        .list(&state.db, query.month, query.year)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Pending-to-invoice versus already-invoiced split of an approved
/// separation, derived from current order balances.
#[utoipa::path(
    get,
    path = "/api/v1/approvals/{separation_id}/billing",
    params(("separation_id" = Uuid, Path, description = "Separation id")),
    responses(
        (status = 200, description = "Billing position", body = crate::services::separations::BillingPosition),
        (status = 400, description = "Separation is not approved"),
        (status = 404, description = "Unknown separation")
    ),
    tag = "approvals"
)]
pub async fn separation_billing(
    State(state): State<AppState>,
    Path(separation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let position = state
        .services
        .separations
        .billing_position(separation_id)
        .await?;
    Ok(Json(ApiResponse::success(position)))
}
