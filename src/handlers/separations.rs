use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::separation::SeparationStatus,
    errors::ServiceError,
    services::export,
    services::grouping::group_by_client,
    services::separations::CreateSeparationsRequest,
    ApiResponse, AppState,
};

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SeparationListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// pendente | aprovada | rejeitada
    pub status: Option<String>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<SeparationStatus>, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("pendente") => Ok(Some(SeparationStatus::Pending)),
        Some(v) if v.eq_ignore_ascii_case("aprovada") => Ok(Some(SeparationStatus::Approved)),
        Some(v) if v.eq_ignore_ascii_case("rejeitada") => Ok(Some(SeparationStatus::Rejected)),
        Some(other) => Err(ServiceError::InvalidStatus(format!(
            "Unknown separation status: {other}"
        ))),
    }
}

/// Creates separations from the selected item codes, one per client card
/// touched by the selection. Partial failures are reported per client.
#[utoipa::path(
    post,
    path = "/api/v1/separations",
    request_body = CreateSeparationsRequest,
    responses(
        (status = 201, description = "At least one separation created", body = crate::services::separations::SeparationBatchResult),
        (status = 200, description = "No separation created, errors reported", body = crate::services::separations::SeparationBatchResult),
        (status = 400, description = "Empty selection")
    ),
    tag = "separations"
)]
pub async fn create_separations(
    State(state): State<AppState>,
    Json(request): Json<CreateSeparationsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_orders_with_items().await?;
    let groups = group_by_client(&orders).groups;

    let result = state
        .services
        .separations
        .create_from_selection(&groups, &request)
        .await?;

    let status = if result.success_count > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(result))))
}

#[utoipa::path(
    get,
    path = "/api/v1/separations",
    params(SeparationListQuery),
    responses((status = 200, description = "Separation list", body = crate::services::separations::SeparationListResponse)),
    tag = "separations"
)]
pub async fn list_separations(
    State(state): State<AppState>,
    Query(query): Query<SeparationListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = parse_status(query.status.as_deref())?;
    let result = state
        .services
        .separations
        .list_separations(query.page.max(1), query.limit.clamp(1, 100), status)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

#[utoipa::path(
    get,
    path = "/api/v1/separations/{id}",
    params(("id" = Uuid, Path, description = "Separation id")),
    responses(
        (status = 200, description = "Separation detail", body = crate::services::separations::SeparationDetailResponse),
        (status = 404, description = "Unknown separation")
    ),
    tag = "separations"
)]
pub async fn get_separation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.separations.get_separation(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/separations/{id}/approve",
    params(("id" = Uuid, Path, description = "Separation id")),
    responses(
        (status = 200, description = "Separation approved", body = crate::services::separations::SeparationResponse),
        (status = 400, description = "Separation is not pending"),
        (status = 404, description = "Unknown separation")
    ),
    tag = "separations"
)]
pub async fn approve_separation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.separations.approve(id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/separations/{id}/reject",
    params(("id" = Uuid, Path, description = "Separation id")),
    responses(
        (status = 200, description = "Separation rejected", body = crate::services::separations::SeparationResponse),
        (status = 400, description = "Separation is not pending"),
        (status = 404, description = "Unknown separation")
    ),
    tag = "separations"
)]
pub async fn reject_separation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.separations.reject(id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// CSV download with the separation header and its line items as two
/// sections in one file.
#[utoipa::path(
    get,
    path = "/api/v1/separations/{id}/export",
    params(("id" = Uuid, Path, description = "Separation id")),
    responses(
        (status = 200, description = "Two-section CSV export"),
        (status = 404, description = "Unknown separation")
    ),
    tag = "separations"
)]
pub async fn export_separation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.separations.get_separation(id).await?;
    let csv = export::separation_csv(&detail)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"separacao.csv\"",
            ),
        ],
        csv,
    ))
}
