use crate::{
    db::DbPool,
    entities::separation::{self, Entity as SeparationEntity, SeparationStatus},
    entities::separation_item::{self, Entity as SeparationItemEntity},
    errors::ServiceError,
    events::{outbox, Event, EventSender},
    metrics,
    services::approvals::{ApprovalLog, ApprovedOrder, ClientFinancialSnapshot},
    services::grouping::{ClientOrderGroup, ItemRow},
    services::orders::OrderService,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Selection metadata keyed by item code. The same item code can sit under
/// several client cards at once; the metadata pins the card the user picked
/// it from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectionMeta {
    pub quantity: Decimal,
    pub value: Decimal,
    pub client_code: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSeparationsRequest {
    #[validate(length(min = 1, message = "At least one item must be selected"))]
    pub selected_item_codes: Vec<String>,
    /// Optional; items without metadata fall back to the first card that
    /// contains them (legacy callers do not send metadata).
    #[serde(default)]
    pub selection_meta: HashMap<String, SelectionMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeparationFailure {
    pub client_name: String,
    pub message: String,
}

/// Partial-failure result: valid buckets commit even when others fail.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SeparationBatchResult {
    pub success_count: usize,
    pub created_ids: Vec<Uuid>,
    pub errors: Vec<SeparationFailure>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeparationResponse {
    pub id: Uuid,
    pub client_code: String,
    pub client_name: String,
    pub item_count: i32,
    pub total_value: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeparationItemResponse {
    pub id: Uuid,
    pub order_number: String,
    pub item_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeparationDetailResponse {
    #[serde(flatten)]
    pub separation: SeparationResponse,
    pub items: Vec<SeparationItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeparationListResponse {
    pub separations: Vec<SeparationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Invoicing position of an approved separation, derived from current order
/// balances.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingPosition {
    pub separation_id: Uuid,
    pub client_code: String,
    pub client_name: String,
    pub total_value: Decimal,
    pub pending_to_invoice: Decimal,
    pub invoiced: Decimal,
}

/// One pick list to be created: all selected rows of a single
/// (client code, card) pair.
#[derive(Debug)]
struct Bucket {
    card_name: String,
    client_code: Option<String>,
    rows: Vec<ItemRow>,
}

impl Bucket {
    fn total_value(&self) -> Decimal {
        self.rows.iter().map(ItemRow::saldo_value).sum()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Buckets selected item codes by (client code, card name). Resolution
/// prefers the selection metadata; items without metadata scan the cards in
/// order and take the first match. Pure so the partition rules are testable
/// without a database.
fn build_buckets(
    groups: &BTreeMap<String, ClientOrderGroup>,
    selected_item_codes: &[String],
    selection_meta: &HashMap<String, SelectionMeta>,
) -> (Vec<Bucket>, Vec<SeparationFailure>) {
    let mut buckets: BTreeMap<(String, String), Bucket> = BTreeMap::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for code in selected_item_codes {
        let code = code.trim();
        if code.is_empty() || !seen.insert(code.to_string()) {
            continue;
        }

        let pinned_card = selection_meta
            .get(code)
            .and_then(|meta| non_blank(&meta.client_name).map(|card| (meta, card)));

        let resolved = match pinned_card {
            Some((meta, card_name)) => {
                match groups.get(&card_name) {
                    Some(group) => {
                        let rows: Vec<ItemRow> = group
                            .items
                            .iter()
                            .filter(|row| row.item_code == code)
                            .cloned()
                            .collect();
                        if rows.is_empty() {
                            Err(SeparationFailure {
                                client_name: card_name.clone(),
                                message: format!(
                                    "item {code} is not present under card {card_name}"
                                ),
                            })
                        } else {
                            let client_code =
                                non_blank(&meta.client_code).or_else(|| group.client_code.clone());
                            Ok((card_name, client_code, rows))
                        }
                    }
                    None => Err(SeparationFailure {
                        client_name: card_name.clone(),
                        message: format!("card {card_name} not found for item {code}"),
                    }),
                }
            }
            None => {
                // legacy path: first card containing the item wins
                groups
                    .values()
                    .find_map(|group| {
                        let rows: Vec<ItemRow> = group
                            .items
                            .iter()
                            .filter(|row| row.item_code == code)
                            .cloned()
                            .collect();
                        if rows.is_empty() {
                            None
                        } else {
                            Some((group.key.clone(), group.client_code.clone(), rows))
                        }
                    })
                    .ok_or_else(|| SeparationFailure {
                        client_name: String::new(),
                        message: format!("item {code} not found in any client card"),
                    })
            }
        };

        match resolved {
            Ok((card_name, client_code, rows)) => {
                let bucket_key = (
                    card_name.clone(),
                    client_code.clone().unwrap_or_default(),
                );
                buckets
                    .entry(bucket_key)
                    .or_insert_with(|| Bucket {
                        card_name,
                        client_code,
                        rows: Vec::new(),
                    })
                    .rows
                    .extend(rows);
            }
            Err(failure) => failures.push(failure),
        }
    }

    (buckets.into_values().collect(), failures)
}

/// Pick-list lifecycle: creation from a portfolio selection, approval and
/// rejection, listings and the derived billing position.
#[derive(Clone)]
pub struct SeparationService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    approval_log: Arc<ApprovalLog>,
    order_service: Arc<OrderService>,
}

impl SeparationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        approval_log: Arc<ApprovalLog>,
        order_service: Arc<OrderService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            approval_log,
            order_service,
        }
    }

    /// Creates one separation per (client code, card) bucket in the
    /// selection. Buckets are processed sequentially; a failing bucket is
    /// recorded and the remaining buckets still commit. There is no
    /// cross-bucket rollback.
    #[instrument(skip(self, groups, request), fields(selected = request.selected_item_codes.len()))]
    pub async fn create_from_selection(
        &self,
        groups: &BTreeMap<String, ClientOrderGroup>,
        request: &CreateSeparationsRequest,
    ) -> Result<SeparationBatchResult, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let (buckets, mut errors) =
            build_buckets(groups, &request.selected_item_codes, &request.selection_meta);

        let mut result = SeparationBatchResult::default();

        for bucket in buckets {
            let Some(client_code) = bucket.client_code.clone() else {
                warn!(card = %bucket.card_name, "selection resolved to a card without client code");
                metrics::SEPARATION_CREATION_FAILURES.inc();
                errors.push(SeparationFailure {
                    client_name: bucket.card_name.clone(),
                    message: format!("client code missing for card {}", bucket.card_name),
                });
                continue;
            };

            match self.insert_bucket(&client_code, &bucket).await {
                Ok(id) => {
                    metrics::SEPARATION_CREATIONS.inc();
                    result.success_count += 1;
                    result.created_ids.push(id);

                    if let Some(event_sender) = &self.event_sender {
                        if let Err(e) = event_sender.send(Event::SeparationCreated(id)).await {
                            warn!(error = %e, separation_id = %id, "Failed to send separation created event");
                        }
                    }
                }
                Err(e) => {
                    metrics::SEPARATION_CREATION_FAILURES.inc();
                    error!(error = %e, card = %bucket.card_name, "Failed to create separation");
                    errors.push(SeparationFailure {
                        client_name: bucket.card_name.clone(),
                        message: e.response_message(),
                    });
                }
            }
        }

        result.errors = errors;
        info!(
            success_count = result.success_count,
            failures = result.errors.len(),
            "Separation batch processed"
        );
        Ok(result)
    }

    /// Parent row first, then the item batch, in one transaction so a
    /// half-written pick list can never be observed.
    async fn insert_bucket(&self, client_code: &str, bucket: &Bucket) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let separation_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let parent = separation::ActiveModel {
            id: Set(separation_id),
            client_code: Set(client_code.to_string()),
            client_name: Set(bucket.card_name.clone()),
            item_count: Set(bucket.rows.len() as i32),
            total_value: Set(bucket.total_value()),
            status: Set(SeparationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        parent.insert(&txn).await.map_err(|e| {
            error!(error = %e, separation_id = %separation_id, "Failed to insert separation");
            ServiceError::DatabaseError(e)
        })?;

        let items: Vec<separation_item::ActiveModel> = bucket
            .rows
            .iter()
            .map(|row| separation_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                separation_id: Set(separation_id),
                order_number: Set(row.order_number.clone()),
                item_code: Set(row.item_code.clone()),
                description: Set(row.description.clone()),
                quantity: Set(row.quantity_saldo),
                unit_price: Set(row.unit_price),
                total_price: Set(row.saldo_value()),
                created_at: Set(now),
            })
            .collect();

        SeparationItemEntity::insert_many(items)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, separation_id = %separation_id, "Failed to insert separation items");
                ServiceError::DatabaseError(e)
            })?;

        outbox::enqueue(&txn, &Event::SeparationCreated(separation_id)).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            separation_id = %separation_id,
            client_code = %client_code,
            items = bucket.rows.len(),
            "Separation created"
        );
        Ok(separation_id)
    }

    #[instrument(skip(self))]
    pub async fn list_separations(
        &self,
        page: u64,
        per_page: u64,
        status: Option<SeparationStatus>,
    ) -> Result<SeparationListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = SeparationEntity::find().order_by_desc(separation::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(separation::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let separations = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(SeparationListResponse {
            separations: separations.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self), fields(separation_id = %id))]
    pub async fn get_separation(&self, id: Uuid) -> Result<SeparationDetailResponse, ServiceError> {
        let (separation, items) = self.load_with_items(id).await?;

        Ok(SeparationDetailResponse {
            separation: model_to_response(separation),
            items: items
                .into_iter()
                .map(|item| SeparationItemResponse {
                    id: item.id,
                    order_number: item.order_number,
                    item_code: item.item_code,
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
        })
    }

    /// Approves a pending separation and appends the approval-time client
    /// financial snapshot to the history log.
    #[instrument(skip(self), fields(separation_id = %id))]
    pub async fn approve(&self, id: Uuid) -> Result<SeparationResponse, ServiceError> {
        let updated = self
            .transition(id, |model| model.approve(), Event::SeparationApproved(id))
            .await?;
        metrics::SEPARATION_APPROVALS.inc();

        let db = &*self.db_pool;
        let now = updated.updated_at.unwrap_or_else(Utc::now);
        let financial = ClientFinancialSnapshot::load(db, &updated.client_code, now).await?;
        let entry = ApprovedOrder {
            separation_id: updated.id,
            client_code: updated.client_code.clone(),
            client_name: updated.client_name.clone(),
            total_value: updated.total_value,
            financial,
            approved_at: now,
        };
        // the history log is a cache; an append failure must not undo the approval
        if let Err(e) = self.approval_log.append(entry).await {
            warn!(error = %e, separation_id = %id, "Failed to append approval history entry");
        }

        Ok(model_to_response(updated))
    }

    #[instrument(skip(self), fields(separation_id = %id))]
    pub async fn reject(&self, id: Uuid) -> Result<SeparationResponse, ServiceError> {
        let updated = self
            .transition(id, |model| model.reject(), Event::SeparationRejected(id))
            .await?;
        metrics::SEPARATION_REJECTIONS.inc();
        Ok(model_to_response(updated))
    }

    /// Derives the invoicing position of an approved separation from
    /// current order balances. The recorded total is assumed never to
    /// decrease; the invoiced figure is clamped at zero in case upstream
    /// edits break that assumption.
    #[instrument(skip(self), fields(separation_id = %id))]
    pub async fn billing_position(&self, id: Uuid) -> Result<BillingPosition, ServiceError> {
        let (separation, items) = self.load_with_items(id).await?;

        if separation.status != SeparationStatus::Approved {
            return Err(ServiceError::InvalidOperation(
                "Billing position is only available for approved separations".to_string(),
            ));
        }

        let order_numbers: Vec<String> = items
            .iter()
            .map(|item| item.order_number.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let balances = self
            .order_service
            .open_balance_by_order(&order_numbers)
            .await?;
        let pending_to_invoice: Decimal = balances.values().copied().sum();
        let invoiced = (separation.total_value - pending_to_invoice).max(Decimal::ZERO);

        Ok(BillingPosition {
            separation_id: separation.id,
            client_code: separation.client_code,
            client_name: separation.client_name,
            total_value: separation.total_value,
            pending_to_invoice,
            invoiced,
        })
    }

    async fn load_with_items(
        &self,
        id: Uuid,
    ) -> Result<(separation::Model, Vec<separation_item::Model>), ServiceError> {
        let db = &*self.db_pool;

        let separation = SeparationEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Separation {id} not found")))?;

        let items = separation
            .get_items(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((separation, items))
    }

    async fn transition(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut separation::Model) -> Result<(), String>,
        event: Event,
    ) -> Result<separation::Model, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let model = SeparationEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Separation {id} not found")))?;

        let mut model = model;
        apply(&mut model).map_err(ServiceError::InvalidOperation)?;

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let mut active: separation::ActiveModel = model.clone().into();
        active.status = Set(model.status);
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, separation_id = %id, "Failed to update separation status");
            ServiceError::DatabaseError(e)
        })?;

        outbox::enqueue(&txn, &event).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(separation_id = %id, status = %updated.status, "Separation status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, separation_id = %id, "Failed to send separation status event");
            }
        }

        Ok(updated)
    }
}

fn model_to_response(model: separation::Model) -> SeparationResponse {
    SeparationResponse {
        id: model.id,
        client_code: model.client_code,
        client_name: model.client_name,
        item_count: model.item_count,
        total_value: model.total_value,
        status: model.status.to_string(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grouping::tests::{item, order};
    use crate::services::grouping::group_by_client;
    use rust_decimal_macros::dec;

    fn groups() -> BTreeMap<String, ClientOrderGroup> {
        let orders = vec![
            (
                order("P1", Some("C1"), Some("Acme"), None, "Aberto"),
                vec![
                    item("P1", "BOLT", dec!(10), dec!(5), dec!(0)),
                    item("P1", "NUT", dec!(4), dec!(2), dec!(10)),
                ],
            ),
            (
                order("P2", None, Some("Sem Codigo"), None, "Aberto"),
                vec![item("P2", "WASHER", dec!(3), dec!(1), dec!(0))],
            ),
            (
                order("P3", Some("C3"), Some("Bravo"), None, "Aberto"),
                vec![item("P3", "BOLT", dec!(2), dec!(7), dec!(0))],
            ),
        ];
        group_by_client(&orders).groups
    }

    #[test]
    fn metadata_pins_the_card_for_ambiguous_codes() {
        let groups = groups();
        let meta = HashMap::from([(
            "BOLT".to_string(),
            SelectionMeta {
                quantity: dec!(2),
                value: dec!(14),
                client_code: Some("C3".to_string()),
                client_name: Some("Bravo".to_string()),
            },
        )]);

        let (buckets, failures) = build_buckets(&groups, &["BOLT".to_string()], &meta);
        assert!(failures.is_empty());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].card_name, "Bravo");
        assert_eq!(buckets[0].client_code.as_deref(), Some("C3"));
        assert_eq!(buckets[0].total_value(), dec!(14));
    }

    #[test]
    fn legacy_path_takes_first_card_containing_the_item() {
        let groups = groups();
        let (buckets, failures) =
            build_buckets(&groups, &["BOLT".to_string()], &HashMap::new());

        assert!(failures.is_empty());
        assert_eq!(buckets.len(), 1);
        // BTreeMap iteration order: "Acme" before "Bravo"
        assert_eq!(buckets[0].card_name, "Acme");
        assert_eq!(buckets[0].total_value(), dec!(50));
    }

    #[test]
    fn one_bucket_per_client_card_pair() {
        let groups = groups();
        let (buckets, failures) = build_buckets(
            &groups,
            &["BOLT".to_string(), "NUT".to_string()],
            &HashMap::new(),
        );

        assert!(failures.is_empty());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].rows.len(), 2);
        assert_eq!(buckets[0].total_value(), dec!(58));
    }

    #[test]
    fn unknown_item_is_a_recorded_failure() {
        let groups = groups();
        let (buckets, failures) =
            build_buckets(&groups, &["MISSING".to_string()], &HashMap::new());

        assert!(buckets.is_empty());
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("MISSING"));
    }

    #[test]
    fn card_without_client_code_still_buckets_for_later_rejection() {
        let groups = groups();
        let (buckets, failures) =
            build_buckets(&groups, &["WASHER".to_string()], &HashMap::new());

        assert!(failures.is_empty());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].card_name, "Sem Codigo");
        assert!(buckets[0].client_code.is_none());
    }

    #[test]
    fn duplicate_selection_codes_are_counted_once() {
        let groups = groups();
        let (buckets, _) = build_buckets(
            &groups,
            &["NUT".to_string(), "NUT".to_string()],
            &HashMap::new(),
        );

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].rows.len(), 1);
        assert_eq!(buckets[0].total_value(), dec!(8));
    }
}
