use crate::{
    db::DbPool,
    entities::client_order::{self, Entity as ClientOrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::representative::{self, Entity as RepresentativeEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Incoming snapshot of one ERP order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderSnapshot {
    #[validate(length(min = 1, max = 50, message = "Order number is required"))]
    pub order_number: String,
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub representative_code: Option<String>,
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItemSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemSnapshot {
    #[validate(length(min = 1, message = "Item code is required"))]
    pub item_code: String,
    pub description: String,
    pub quantity_ordered: Decimal,
    pub quantity_delivered: Decimal,
    pub quantity_saldo: Decimal,
    pub unit_price: Decimal,
    pub physical_stock: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportOrdersRequest {
    #[validate(length(min = 1, message = "At least one order is required"))]
    pub orders: Vec<OrderSnapshot>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportOrdersResponse {
    pub imported: usize,
}

/// Read side of the portfolio: order snapshots, items, representative names
/// and per-order open balances.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Fetches every order snapshot together with its items, oldest first.
    #[instrument(skip(self))]
    pub async fn list_orders_with_items(
        &self,
    ) -> Result<Vec<(client_order::Model, Vec<order_item::Model>)>, ServiceError> {
        let db = &*self.db_pool;

        let orders = ClientOrderEntity::find()
            .find_with_related(OrderItemEntity)
            .order_by_asc(client_order::Column::OrderNumber)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch orders with items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(orders)
    }

    /// Representative code to name map, fetched once per grouping batch.
    #[instrument(skip(self))]
    pub async fn representative_names(&self) -> Result<HashMap<String, String>, ServiceError> {
        let db = &*self.db_pool;

        let reps = RepresentativeEntity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to fetch representatives");
            ServiceError::DatabaseError(e)
        })?;

        Ok(reps
            .into_iter()
            .map(|representative::Model { code, name }| (code, name))
            .collect())
    }

    /// Current open balance (Σ saldo × unit price) per order number.
    #[instrument(skip(self, order_numbers))]
    pub async fn open_balance_by_order(
        &self,
        order_numbers: &[String],
    ) -> Result<HashMap<String, Decimal>, ServiceError> {
        if order_numbers.is_empty() {
            return Ok(HashMap::new());
        }

        let db = &*self.db_pool;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderNumber.is_in(order_numbers.to_vec()))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch item balances");
                ServiceError::DatabaseError(e)
            })?;

        let mut balances: HashMap<String, Decimal> = HashMap::new();
        for item in items {
            *balances.entry(item.order_number).or_insert(Decimal::ZERO) +=
                item.quantity_saldo * item.unit_price;
        }
        Ok(balances)
    }

    /// Replaces the stored snapshot of each order in the batch. The whole
    /// batch is applied in one transaction so readers never observe an order
    /// without its items.
    #[instrument(skip(self, request), fields(orders = request.orders.len()))]
    pub async fn import_snapshot(
        &self,
        request: ImportOrdersRequest,
    ) -> Result<ImportOrdersResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for snapshot in &request.orders {
            snapshot
                .validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            for item in &snapshot.items {
                item.validate()
                    .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let count = request.orders.len();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for snapshot import");
            ServiceError::DatabaseError(e)
        })?;

        for snapshot in &request.orders {
            OrderItemEntity::delete_many()
                .filter(order_item::Column::OrderNumber.eq(snapshot.order_number.clone()))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, order_number = %snapshot.order_number, "Failed to clear previous item snapshot");
                    ServiceError::DatabaseError(e)
                })?;
            ClientOrderEntity::delete_many()
                .filter(client_order::Column::OrderNumber.eq(snapshot.order_number.clone()))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, order_number = %snapshot.order_number, "Failed to clear previous order snapshot");
                    ServiceError::DatabaseError(e)
                })?;

            let order_model = client_order::ActiveModel {
                order_number: Set(snapshot.order_number.clone()),
                client_code: Set(snapshot.client_code.clone()),
                client_name: Set(snapshot.client_name.clone()),
                representative_code: Set(snapshot.representative_code.clone()),
                status: Set(snapshot.status.clone()),
                order_date: Set(snapshot.order_date),
                imported_at: Set(now),
            };
            order_model.insert(&txn).await.map_err(|e| {
                error!(error = %e, order_number = %snapshot.order_number, "Failed to insert order snapshot");
                ServiceError::DatabaseError(e)
            })?;

            if !snapshot.items.is_empty() {
                let item_models: Vec<order_item::ActiveModel> = snapshot
                    .items
                    .iter()
                    .map(|item| order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_number: Set(snapshot.order_number.clone()),
                        item_code: Set(item.item_code.clone()),
                        description: Set(item.description.clone()),
                        quantity_ordered: Set(item.quantity_ordered),
                        quantity_delivered: Set(item.quantity_delivered),
                        quantity_saldo: Set(item.quantity_saldo),
                        unit_price: Set(item.unit_price),
                        physical_stock: Set(item.physical_stock),
                        imported_at: Set(now),
                    })
                    .collect();

                OrderItemEntity::insert_many(item_models)
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, order_number = %snapshot.order_number, "Failed to insert item snapshot");
                        ServiceError::DatabaseError(e)
                    })?;
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit snapshot import");
            ServiceError::DatabaseError(e)
        })?;

        info!(imported = count, "Order snapshots imported");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrdersImported { orders: count }).await {
                warn!(error = %e, "Failed to send orders imported event");
            }
        }

        Ok(ImportOrdersResponse { imported: count })
    }
}
