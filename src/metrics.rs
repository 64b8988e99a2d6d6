use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::errors::ServiceError;

fn counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric can be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric can be registered");
    counter
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref SEPARATION_CREATIONS: IntCounter = counter(
        "separation_creations_total",
        "Total number of separations created"
    );
    pub static ref SEPARATION_CREATION_FAILURES: IntCounter = counter(
        "separation_creation_failures_total",
        "Total number of failed separation creations"
    );
    pub static ref SEPARATION_APPROVALS: IntCounter = counter(
        "separation_approvals_total",
        "Total number of separations approved"
    );
    pub static ref SEPARATION_REJECTIONS: IntCounter = counter(
        "separation_rejections_total",
        "Total number of separations rejected"
    );
    pub static ref WEBHOOK_DELIVERIES: IntCounter = counter(
        "webhook_deliveries_total",
        "Total number of webhook deliveries"
    );
    pub static ref WEBHOOK_DELIVERY_FAILURES: IntCounter = counter(
        "webhook_delivery_failures_total",
        "Total number of failed webhook delivery attempts"
    );
    pub static ref EVENTS_PROCESSED: IntCounter = counter(
        "events_processed_total",
        "Total number of in-process domain events observed"
    );
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("failed to encode metrics: {e}")))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics are not valid UTF-8: {e}")))
}
