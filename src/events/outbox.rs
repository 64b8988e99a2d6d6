//! Durable webhook outbox.
//!
//! Events are enqueued inside the same transaction as the write they
//! describe; a background worker drains pending rows and delivers them with
//! exponential backoff. Delivery is at least once; the row id is the
//! idempotency key receivers deduplicate on.

use crate::entities::outbox_event::{self, Entity as OutboxEventEntity, OutboxStatus};
use crate::errors::ServiceError;
use crate::events::Event;
use crate::metrics;
use crate::webhooks::WebhookDispatcher;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const MAX_ATTEMPTS: i32 = 8;
const BASE_BACKOFF_SECS: u64 = 2;
const MAX_BACKOFF_SECS: u64 = 3_600;

/// Enqueues a domain event. Call inside the transaction of the write that
/// produced it.
pub async fn enqueue<C: ConnectionTrait>(db: &C, event: &Event) -> Result<(), ServiceError> {
    let now = Utc::now();
    let row = outbox_event::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_type: Set(event.event_type().to_string()),
        payload: Set(event.payload()),
        status: Set(OutboxStatus::Pending),
        attempts: Set(0),
        available_at: Set(now),
        last_error: Set(None),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    };
    let row = row.insert(db).await.map_err(ServiceError::DatabaseError)?;
    debug!(outbox_id = %row.id, event_type = %row.event_type, "outbox event enqueued");
    Ok(())
}

/// Background worker polling the outbox. Not started when webhook delivery
/// is unconfigured; enqueued rows then simply stay pending.
pub fn start_worker(
    db: Arc<DatabaseConnection>,
    dispatcher: Option<Arc<WebhookDispatcher>>,
    poll_interval: Duration,
) {
    let Some(dispatcher) = dispatcher else {
        info!("webhook URL not configured; outbox worker disabled");
        return;
    };

    tokio::spawn(async move {
        info!("outbox worker started");
        loop {
            if let Err(e) = drain_once(&db, &dispatcher, 50).await {
                error!(error = %e, "outbox worker pass failed");
            }
            sleep(poll_interval).await;
        }
    });
}

async fn drain_once(
    db: &DatabaseConnection,
    dispatcher: &WebhookDispatcher,
    batch_size: u64,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    let pending = OutboxEventEntity::find()
        .filter(outbox_event::Column::Status.eq(OutboxStatus::Pending))
        .filter(outbox_event::Column::AvailableAt.lte(now))
        .order_by_asc(outbox_event::Column::CreatedAt)
        .limit(batch_size)
        .all(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    for row in pending {
        let attempts = row.attempts + 1;
        let delivery = dispatcher
            .deliver(row.id, &row.event_type, &row.payload)
            .await;

        let mut row_update: outbox_event::ActiveModel = row.clone().into();
        row_update.attempts = Set(attempts);
        row_update.updated_at = Set(Some(Utc::now()));

        match delivery {
            Ok(()) => {
                metrics::WEBHOOK_DELIVERIES.inc();
                row_update.status = Set(OutboxStatus::Delivered);
                row_update.last_error = Set(None);
                debug!(outbox_id = %row.id, attempts, "webhook delivered");
            }
            Err(e) => {
                metrics::WEBHOOK_DELIVERY_FAILURES.inc();
                row_update.last_error = Set(Some(e.to_string()));
                if attempts < MAX_ATTEMPTS {
                    let backoff = backoff_delay(attempts);
                    row_update.status = Set(OutboxStatus::Pending);
                    row_update.available_at = Set(Utc::now() + backoff);
                    warn!(
                        outbox_id = %row.id,
                        attempts,
                        retry_in_secs = backoff.num_seconds(),
                        error = %e,
                        "webhook delivery failed, will retry"
                    );
                } else {
                    row_update.status = Set(OutboxStatus::Failed);
                    error!(outbox_id = %row.id, attempts, error = %e, "webhook delivery abandoned");
                }
            }
        }

        row_update
            .update(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
    }

    Ok(())
}

fn backoff_delay(attempts: i32) -> ChronoDuration {
    let secs = BASE_BACKOFF_SECS
        .saturating_pow(attempts.max(1) as u32)
        .min(MAX_BACKOFF_SECS);
    let jitter_ms = rand::thread_rng().gen_range(0..1_000);
    ChronoDuration::seconds(secs as i64) + ChronoDuration::milliseconds(jitter_ms)
}
