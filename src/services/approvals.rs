//! Approval history log.
//!
//! The separations table is the system of record for approval state; this
//! log is an explicit cache of approval-time snapshots kept for the history
//! view. Every listing reconciles against the table: entries whose
//! separation is gone or no longer approved are evicted and the file is
//! rewritten.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::financial_title::{self, Entity as FinancialTitleEntity};
use crate::entities::separation::{self, Entity as SeparationEntity, SeparationStatus};
use crate::errors::ServiceError;

/// Client receivables position captured at approval time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClientFinancialSnapshot {
    pub open_titles: u64,
    pub total_open_value: Decimal,
    pub total_overdue_value: Decimal,
    pub as_of: DateTime<Utc>,
}

impl ClientFinancialSnapshot {
    /// Builds the snapshot from the client's open financial titles.
    #[instrument(skip(db))]
    pub async fn load(
        db: &DatabaseConnection,
        client_code: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Self, ServiceError> {
        let titles = FinancialTitleEntity::find()
            .filter(financial_title::Column::ClientCode.eq(client_code))
            .filter(financial_title::Column::Status.eq("aberto"))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let today = as_of.date_naive();
        let mut total_open_value = Decimal::ZERO;
        let mut total_overdue_value = Decimal::ZERO;
        for title in &titles {
            total_open_value += title.open_value;
            if title.due_date < today {
                total_overdue_value += title.open_value;
            }
        }

        Ok(Self {
            open_titles: titles.len() as u64,
            total_open_value,
            total_overdue_value,
            as_of,
        })
    }
}

/// One approval history entry. Serialized with ISO-8601 timestamps; parsing
/// the file back yields the same instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApprovedOrder {
    pub separation_id: Uuid,
    pub client_code: String,
    pub client_name: String,
    pub total_value: Decimal,
    pub financial: ClientFinancialSnapshot,
    pub approved_at: DateTime<Utc>,
}

/// File-backed, single-writer approval log.
pub struct ApprovalLog {
    path: PathBuf,
    entries: Mutex<Vec<ApprovedOrder>>,
}

impl ApprovalLog {
    /// Opens the log, loading any existing entries. A missing file is an
    /// empty log; a corrupt file is an error so history is never silently
    /// discarded.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::SerializationError(format!(
                    "approval log {} is not readable: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(ServiceError::InternalError(format!(
                    "failed to open approval log {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub async fn append(&self, entry: ApprovedOrder) -> Result<(), ServiceError> {
        let mut entries = self.entries.lock().await;
        entries.push(entry);
        persist(&self.path, &entries).await
    }

    /// Drops entries whose separation is missing or no longer approved.
    /// Returns how many entries were evicted.
    #[instrument(skip(self, db))]
    pub async fn reconcile(&self, db: &DatabaseConnection) -> Result<usize, ServiceError> {
        let ids: Vec<Uuid> = {
            let entries = self.entries.lock().await;
            entries.iter().map(|e| e.separation_id).collect()
        };
        if ids.is_empty() {
            return Ok(0);
        }

        let still_approved: HashSet<Uuid> = SeparationEntity::find()
            .filter(separation::Column::Id.is_in(ids))
            .filter(separation::Column::Status.eq(SeparationStatus::Approved))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| still_approved.contains(&e.separation_id));
        let evicted = before - entries.len();
        if evicted > 0 {
            info!(evicted, "evicted stale approval log entries");
            persist(&self.path, &entries).await?;
        }
        Ok(evicted)
    }

    /// Reconciled listing, newest first, optionally narrowed to one
    /// month/year of approval.
    pub async fn list(
        &self,
        db: &DatabaseConnection,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<ApprovedOrder>, ServiceError> {
        self.reconcile(db).await?;

        let entries = self.entries.lock().await;
        Ok(filter_by_period(&entries, month, year))
    }
}

fn filter_by_period(
    entries: &[ApprovedOrder],
    month: Option<u32>,
    year: Option<i32>,
) -> Vec<ApprovedOrder> {
    let mut selected: Vec<ApprovedOrder> = entries
        .iter()
        .filter(|e| month.map_or(true, |m| e.approved_at.month() == m))
        .filter(|e| year.map_or(true, |y| e.approved_at.year() == y))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
    selected
}

async fn persist(path: &Path, entries: &[ApprovedOrder]) -> Result<(), ServiceError> {
    let json = serde_json::to_vec_pretty(entries)
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await.map_err(|e| {
        ServiceError::InternalError(format!("failed to write approval log: {e}"))
    })?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!(error = %e, "atomic rename of approval log failed");
        return Err(ServiceError::InternalError(format!(
            "failed to replace approval log: {e}"
        )));
    }
    Ok(())
}
