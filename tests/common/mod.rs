use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use carteira_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::approvals::ApprovalLog,
    AppState,
};

/// Helper harness spinning up the application router over an in-memory
/// SQLite database and a temp-dir approval log.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    #[allow(dead_code)]
    approvals_dir: tempfile::TempDir,
    #[allow(dead_code)]
    event_task: tokio::task::JoinHandle<()>,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        // a single connection keeps every query on the same in-memory database
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        dashboard_fetch_timeout_secs: 30,
        approval_log_path: "approved_orders.json".to_string(),
        webhook_url: None,
        webhook_secret: None,
        outbox_poll_interval_ms: 500,
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = test_config();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let approvals_dir = tempfile::tempdir().expect("create temp dir");
        let approval_log = Arc::new(
            ApprovalLog::open(approvals_dir.path().join("approved_orders.json"))
                .await
                .expect("open approval log"),
        );

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            approval_log,
            Duration::from_secs(cfg.dashboard_fetch_timeout_secs),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .merge(carteira_api::health_routes())
            .nest("/api/v1", carteira_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            approvals_dir,
            event_task,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("execute request")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

/// Import payload with two client cards plus one order without client name,
/// shared by the portfolio and separation flow tests.
pub fn sample_import_payload() -> Value {
    serde_json::json!({
        "orders": [
            {
                "order_number": "P100",
                "client_code": "C1",
                "client_name": "Acme",
                "representative_code": "R1",
                "status": "Aberto",
                "order_date": "2025-06-01T12:00:00Z",
                "items": [
                    {
                        "item_code": "BOLT",
                        "description": "Parafuso sextavado",
                        "quantity_ordered": "11",
                        "quantity_delivered": "1",
                        "quantity_saldo": "10",
                        "unit_price": "5",
                        "physical_stock": "0"
                    },
                    {
                        "item_code": "NUT",
                        "description": "Porca",
                        "quantity_ordered": "5",
                        "quantity_delivered": "1",
                        "quantity_saldo": "4",
                        "unit_price": "2",
                        "physical_stock": "10"
                    }
                ]
            },
            {
                "order_number": "P200",
                "client_code": "C2",
                "client_name": "Bravo",
                "representative_code": "R2",
                "status": "Parcial",
                "order_date": "2025-07-01T12:00:00Z",
                "items": [
                    {
                        "item_code": "SCREW",
                        "description": "Parafuso philips",
                        "quantity_ordered": "7",
                        "quantity_delivered": "1",
                        "quantity_saldo": "6",
                        "unit_price": "3",
                        "physical_stock": "2"
                    }
                ]
            },
            {
                "order_number": "P300",
                "client_code": null,
                "client_name": "Sem Codigo",
                "representative_code": "R1",
                "status": "Aberto",
                "order_date": "2025-07-02T12:00:00Z",
                "items": [
                    {
                        "item_code": "WASHER",
                        "description": "Arruela",
                        "quantity_ordered": "3",
                        "quantity_delivered": "0",
                        "quantity_saldo": "3",
                        "unit_price": "1",
                        "physical_stock": "0"
                    }
                ]
            },
            {
                "order_number": "P400",
                "client_code": null,
                "client_name": null,
                "representative_code": null,
                "status": "Aberto",
                "order_date": "2025-07-03T12:00:00Z",
                "items": [
                    {
                        "item_code": "TAPE",
                        "description": "Fita adesiva",
                        "quantity_ordered": "2",
                        "quantity_delivered": "0",
                        "quantity_saldo": "2",
                        "unit_price": "1",
                        "physical_stock": "0"
                    }
                ]
            }
        ]
    })
}
