pub mod approvals;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod separations;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::approvals::ApprovalLog;
use crate::services::dashboard::DashboardService;
use crate::services::orders::OrderService;
use crate::services::separations::SeparationService;
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub separations: Arc<SeparationService>,
    pub approvals: Arc<ApprovalLog>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        approval_log: Arc<ApprovalLog>,
        dashboard_timeout: Duration,
    ) -> Self {
        let orders = Arc::new(OrderService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let separations = Arc::new(SeparationService::new(
            db_pool.clone(),
            Some(event_sender),
            approval_log.clone(),
            orders.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(db_pool, dashboard_timeout));

        Self {
            orders,
            separations,
            approvals: approval_log,
            dashboard,
        }
    }
}
