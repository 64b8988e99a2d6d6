//! Signed webhook delivery.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Carteira-Signature";
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// POSTs event payloads to a configured endpoint. Every request carries the
/// delivery id as idempotency key; when a secret is configured the body is
/// HMAC-SHA256 signed.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(url: String, secret: Option<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        Ok(Self {
            client,
            url,
            secret,
        })
    }

    pub async fn deliver(
        &self,
        delivery_id: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        let envelope = json!({
            "id": delivery_id,
            "type": event_type,
            "payload": payload,
            "sent_at": Utc::now(),
        });
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(IDEMPOTENCY_HEADER, delivery_id.to_string());

        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        debug!(delivery_id = %delivery_id, event_type, "webhook delivered");
        Ok(())
    }
}

fn sign(secret: &str, body: &[u8]) -> Result<String, ServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InternalError(format!("invalid webhook secret: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
