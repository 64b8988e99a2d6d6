use axum::{extract::State, response::IntoResponse, Json};

use crate::{errors::ServiceError, ApiResponse, AppState};

/// Billing dashboard: per-month invoiced totals, open balance and
/// separation status counts. The fetch is raced against the configured
/// deadline and times out with 504.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/billing",
    responses(
        (status = 200, description = "Billing dashboard", body = crate::services::dashboard::BillingDashboard),
        (status = 504, description = "Dashboard fetch exceeded its deadline")
    ),
    tag = "dashboard"
)]
pub async fn billing_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let dashboard = state.services.dashboard.load().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}
