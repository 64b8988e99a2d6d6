use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ServiceError,
    services::export,
    services::filtering::{filter_groups, GroupFilter, OrderStatus, SearchMode},
    services::grouping::{
        group_by_client, group_by_representative, ClientOrderGroup, GroupTotals, GroupView,
        UnassignedOrder,
    },
    services::orders::ImportOrdersRequest,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupQuery {
    /// Grouping key: "client" (default) or "representative"
    pub view: Option<String>,
    /// Free-text search, matched according to `search_mode`
    pub search: Option<String>,
    /// "client" (default), "order" or "item"
    pub search_mode: Option<String>,
    /// Order status, canonical name or legacy digit code
    pub status: Option<String>,
    /// Representative code
    pub representative: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupedOrdersResponse {
    pub view: GroupView,
    pub groups: Vec<ClientOrderGroup>,
    pub totals: GroupTotals,
    pub unassigned: Vec<UnassignedOrder>,
}

fn parse_view(raw: Option<&str>) -> Result<GroupView, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(GroupView::Client),
        Some(v) if v.eq_ignore_ascii_case("client") => Ok(GroupView::Client),
        Some(v) if v.eq_ignore_ascii_case("representative") => Ok(GroupView::Representative),
        Some(other) => Err(ServiceError::InvalidInput(format!(
            "Unknown grouping view: {other}"
        ))),
    }
}

fn parse_search_mode(raw: Option<&str>) -> Result<SearchMode, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(SearchMode::Client),
        Some(v) if v.eq_ignore_ascii_case("client") => Ok(SearchMode::Client),
        Some(v) if v.eq_ignore_ascii_case("order") => Ok(SearchMode::Order),
        Some(v) if v.eq_ignore_ascii_case("item") => Ok(SearchMode::Item),
        Some(other) => Err(ServiceError::InvalidInput(format!(
            "Unknown search mode: {other}"
        ))),
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => OrderStatus::parse(raw).map(Some).ok_or_else(|| {
            ServiceError::InvalidStatus(format!("Unknown order status: {raw}"))
        }),
    }
}

/// Shared by the grouped view and its CSV export so both render exactly the
/// same slice of the portfolio.
async fn build_grouped_view(
    state: &AppState,
    query: &GroupQuery,
) -> Result<
    (
        GroupView,
        BTreeMap<String, ClientOrderGroup>,
        Vec<UnassignedOrder>,
    ),
    ServiceError,
> {
    let view = parse_view(query.view.as_deref())?;
    let filter = GroupFilter {
        search: query.search.clone(),
        search_mode: parse_search_mode(query.search_mode.as_deref())?,
        status: parse_status_filter(query.status.as_deref())?,
        representative: query
            .representative
            .clone()
            .filter(|r| !r.trim().is_empty()),
    };

    let orders = state.services.orders.list_orders_with_items().await?;
    let outcome = match view {
        GroupView::Client => group_by_client(&orders),
        GroupView::Representative => {
            let names = state.services.orders.representative_names().await?;
            group_by_representative(&orders, &names)
        }
    };

    let groups = if filter.is_empty() {
        outcome.groups
    } else {
        filter_groups(&outcome.groups, &filter)
    };

    Ok((view, groups, outcome.unassigned))
}

/// Grouped portfolio view with the four value totals per card.
#[utoipa::path(
    get,
    path = "/api/v1/orders/groups",
    params(GroupQuery),
    responses(
        (status = 200, description = "Grouped orders", body = GroupedOrdersResponse),
        (status = 400, description = "Invalid view, search mode or status filter")
    ),
    tag = "orders"
)]
pub async fn list_order_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (view, groups, unassigned) = build_grouped_view(&state, &query).await?;

    let mut totals = GroupTotals::default();
    for group in groups.values() {
        totals.merge(&group.totals);
    }

    Ok(Json(ApiResponse::success(GroupedOrdersResponse {
        view,
        groups: groups.into_values().collect(),
        totals,
        unassigned,
    })))
}

/// CSV download of the filtered grouped view, one row per item.
#[utoipa::path(
    get,
    path = "/api/v1/orders/groups/export",
    params(GroupQuery),
    responses((status = 200, description = "CSV export of the filtered item rows")),
    tag = "orders"
)]
pub async fn export_order_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (_, groups, _) = build_grouped_view(&state, &query).await?;
    let csv = export::grouped_items_csv(&groups)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"carteira_pedidos.csv\"",
            ),
        ],
        csv,
    ))
}

/// Replaces stored order snapshots with a fresh batch from the ERP.
#[utoipa::path(
    post,
    path = "/api/v1/orders/import",
    request_body = ImportOrdersRequest,
    responses(
        (status = 201, description = "Snapshots imported"),
        (status = 400, description = "Invalid batch")
    ),
    tag = "orders"
)]
pub async fn import_orders(
    State(state): State<AppState>,
    Json(request): Json<ImportOrdersRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.orders.import_snapshot(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}
