mod common;

use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

use carteira_api::entities::{
    financial_title,
    separation::{self, Entity as SeparationEntity, SeparationStatus},
    separation_item::{self, Entity as SeparationItemEntity},
};
use common::{response_json, sample_import_payload, TestApp};

async fn seeded_app() -> TestApp {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/import",
            Some(sample_import_payload()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    app
}

#[tokio::test]
async fn selection_creates_one_separation_and_reports_the_codeless_card() {
    let app = seeded_app().await;

    let payload = json!({
        "selected_item_codes": ["BOLT", "NUT", "WASHER"],
        "selection_meta": {
            "BOLT": {
                "quantity": "10",
                "value": "50",
                "client_code": "C1",
                "client_name": "Acme"
            }
        }
    });

    let response = app
        .request(Method::POST, "/api/v1/separations", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let data = &body["data"];

    // the Acme bucket commits even though the code-less card fails
    assert_eq!(data["success_count"], 1);
    assert_eq!(data["created_ids"].as_array().map(|a| a.len()), Some(1));
    let errors = data["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["client_name"], "Sem Codigo");

    let separation_id: Uuid = data["created_ids"][0]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("created id");

    let stored = SeparationEntity::find_by_id(separation_id)
        .one(&*app.state.db)
        .await
        .expect("query separation")
        .expect("separation exists");
    assert_eq!(stored.client_code, "C1");
    assert_eq!(stored.client_name, "Acme");
    assert_eq!(stored.status, SeparationStatus::Pending);
    assert_eq!(stored.item_count, 2);
    assert_eq!(stored.total_value, dec!(58));

    let items = SeparationItemEntity::find()
        .filter(separation_item::Column::SeparationId.eq(separation_id))
        .all(&*app.state.db)
        .await
        .expect("query separation items");
    assert_eq!(items.len(), 2);
    let batch_value: rust_decimal::Decimal = items.iter().map(|i| i.total_price).sum();
    assert_eq!(batch_value, stored.total_value);
}

async fn create_separation(app: &TestApp, codes: &[&str]) -> Uuid {
    let payload = json!({ "selected_item_codes": codes });
    let response = app
        .request(Method::POST, "/api/v1/separations", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    body["data"]["created_ids"][0]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("created id")
}

#[tokio::test]
async fn approval_flow_records_history_and_billing_position() {
    let app = seeded_app().await;
    let id = create_separation(&app, &["BOLT", "NUT"]).await;

    // receivables for Acme: one title still to fall due, one overdue
    for (value, due, number) in [
        (dec!(100), NaiveDate::from_ymd_opt(2999, 1, 1).unwrap(), "T-1"),
        (dec!(50), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), "T-2"),
    ] {
        financial_title::ActiveModel {
            id: Set(Uuid::new_v4()),
            client_code: Set("C1".to_string()),
            title_number: Set(number.to_string()),
            open_value: Set(value),
            due_date: Set(due),
            status: Set("aberto".to_string()),
        }
        .insert(&*app.state.db)
        .await
        .expect("insert financial title");
    }

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/separations/{id}/approve"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "aprovada");

    // approving twice is an invalid transition
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/separations/{id}/approve"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // the history log now carries the approval snapshot
    let response = app.request(Method::GET, "/api/v1/approvals", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let entries = body["data"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["separation_id"], id.to_string());
    assert_eq!(entries[0]["total_value"], "58");
    assert_eq!(entries[0]["financial"]["open_titles"], 2);
    assert_eq!(entries[0]["financial"]["total_open_value"], "150");
    assert_eq!(entries[0]["financial"]["total_overdue_value"], "50");

    // nothing invoiced yet: the full order balance is still open
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/approvals/{id}/billing"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["pending_to_invoice"], "58");
    assert_eq!(body["data"]["invoiced"], "0");

    // the ERP invoices everything: re-import P100 with zero saldo
    let reimport = json!({
        "orders": [
            {
                "order_number": "P100",
                "client_code": "C1",
                "client_name": "Acme",
                "representative_code": "R1",
                "status": "Total",
                "order_date": "2025-06-01T12:00:00Z",
                "items": [
                    {
                        "item_code": "BOLT",
                        "description": "Parafuso sextavado",
                        "quantity_ordered": "11",
                        "quantity_delivered": "11",
                        "quantity_saldo": "0",
                        "unit_price": "5",
                        "physical_stock": "0"
                    },
                    {
                        "item_code": "NUT",
                        "description": "Porca",
                        "quantity_ordered": "5",
                        "quantity_delivered": "5",
                        "quantity_saldo": "0",
                        "unit_price": "2",
                        "physical_stock": "10"
                    }
                ]
            }
        ]
    });
    let response = app
        .request(Method::POST, "/api/v1/orders/import", Some(reimport))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/approvals/{id}/billing"),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pending_to_invoice"], "0");
    assert_eq!(body["data"]["invoiced"], "58");
}

#[tokio::test]
async fn billing_position_requires_an_approved_separation() {
    let app = seeded_app().await;
    let id = create_separation(&app, &["SCREW"]).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/approvals/{id}/billing"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_separation_cannot_be_approved() {
    let app = seeded_app().await;
    let id = create_separation(&app, &["SCREW"]).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/separations/{id}/reject"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "rejeitada");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/separations/{id}/approve"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_evicts_entries_no_longer_approved_upstream() {
    let app = seeded_app().await;
    let id = create_separation(&app, &["SCREW"]).await;

    app.request(
        Method::POST,
        &format!("/api/v1/separations/{id}/approve"),
        None,
    )
    .await;

    let body = response_json(app.request(Method::GET, "/api/v1/approvals", None).await).await;
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(1));

    // the system of record flips the separation away from approved
    let stored = SeparationEntity::find_by_id(id)
        .one(&*app.state.db)
        .await
        .expect("query separation")
        .expect("separation exists");
    let mut active: separation::ActiveModel = stored.into();
    active.status = Set(SeparationStatus::Rejected);
    active
        .update(&*app.state.db)
        .await
        .expect("flip separation status");

    let body = response_json(app.request(Method::GET, "/api/v1/approvals", None).await).await;
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(0));
}

#[tokio::test]
async fn separation_detail_and_csv_export() {
    let app = seeded_app().await;
    let id = create_separation(&app, &["BOLT", "NUT"]).await;

    let response = app
        .request(Method::GET, &format!("/api/v1/separations/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(body["data"]["total_value"], "58");

    let response = app
        .request(Method::GET, "/api/v1/separations?status=pendente", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/separations/{id}/export"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("separacao,cliente"));
    assert_eq!(lines[2], "\"\"");
    assert!(lines[3].starts_with("pedido,codigo_item"));
    assert_eq!(lines.len(), 6);
}

#[tokio::test]
async fn empty_selection_is_rejected_before_any_write() {
    let app = seeded_app().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/separations",
            Some(json!({ "selected_item_codes": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let count = SeparationEntity::find()
        .all(&*app.state.db)
        .await
        .expect("query separations");
    assert!(count.is_empty());
}
