use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;
use crate::handlers;
use crate::handlers::orders::GroupedOrdersResponse;
use crate::services::approvals::{ApprovedOrder, ClientFinancialSnapshot};
use crate::services::dashboard::{BillingDashboard, MonthlyBilling, SeparationStatusCounts};
use crate::services::grouping::{
    ClientOrderGroup, GroupTotals, GroupView, ItemRow, OrderSummary, UnassignedOrder,
    UnassignedReason,
};
use crate::services::orders::{
    ImportOrdersRequest, ImportOrdersResponse, OrderItemSnapshot, OrderSnapshot,
};
use crate::services::separations::{
    BillingPosition, CreateSeparationsRequest, SelectionMeta, SeparationBatchResult,
    SeparationDetailResponse, SeparationFailure, SeparationItemResponse, SeparationListResponse,
    SeparationResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carteira API",
        version = "0.3.0",
        description = "Client order portfolio aggregation, separation (pick list) workflows, approval history and billing dashboards."
    ),
    paths(
        handlers::orders::list_order_groups,
        handlers::orders::export_order_groups,
        handlers::orders::import_orders,
        handlers::separations::create_separations,
        handlers::separations::list_separations,
        handlers::separations::get_separation,
        handlers::separations::approve_separation,
        handlers::separations::reject_separation,
        handlers::separations::export_separation,
        handlers::approvals::list_approvals,
        handlers::approvals::separation_billing,
        handlers::dashboard::billing_dashboard,
    ),
    components(schemas(
        ErrorResponse,
        GroupedOrdersResponse,
        GroupView,
        OrderSummary,
        ItemRow,
        GroupTotals,
        ClientOrderGroup,
        UnassignedOrder,
        UnassignedReason,
        ImportOrdersRequest,
        OrderSnapshot,
        OrderItemSnapshot,
        ImportOrdersResponse,
        CreateSeparationsRequest,
        SelectionMeta,
        SeparationBatchResult,
        SeparationFailure,
        SeparationResponse,
        SeparationItemResponse,
        SeparationDetailResponse,
        SeparationListResponse,
        BillingPosition,
        ApprovedOrder,
        ClientFinancialSnapshot,
        BillingDashboard,
        MonthlyBilling,
        SeparationStatusCounts,
    )),
    tags(
        (name = "orders", description = "Order portfolio grouping and snapshot import"),
        (name = "separations", description = "Separation (pick list) lifecycle"),
        (name = "approvals", description = "Approval history and billing position"),
        (name = "dashboard", description = "Billing dashboard"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
