mod common;

use axum::http::{Method, StatusCode};

use common::{response_json, sample_import_payload, TestApp};

#[tokio::test]
async fn billing_dashboard_aggregates_by_month() {
    let app = TestApp::new().await;
    app.request(
        Method::POST,
        "/api/v1/orders/import",
        Some(sample_import_payload()),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/dashboard/billing", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let data = &body["data"];

    // delivered quantities: P100 -> 1*5 + 1*2, P200 -> 1*3
    assert_eq!(data["total_faturado"], "10");
    assert_eq!(data["total_saldo"], "81");

    let monthly = data["monthly"].as_array().expect("monthly");
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0]["year"], 2025);
    assert_eq!(monthly[0]["month"], 6);
    assert_eq!(monthly[0]["valor_faturado"], "7");
    assert_eq!(monthly[1]["month"], 7);
    assert_eq!(monthly[1]["valor_faturado"], "3");

    assert_eq!(data["separations"]["pending"], 0);
}

#[tokio::test]
async fn health_endpoints_answer() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");

    let response = app.request(Method::GET, "/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ready");
}
