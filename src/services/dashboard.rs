use crate::{
    db::DbPool,
    entities::client_order::{self, Entity as ClientOrderEntity},
    entities::order_item,
    entities::separation::{self, Entity as SeparationEntity, SeparationStatus},
    errors::ServiceError,
};
use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyBilling {
    pub year: i32,
    pub month: u32,
    pub valor_faturado: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SeparationStatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingDashboard {
    pub monthly: Vec<MonthlyBilling>,
    pub total_faturado: Decimal,
    pub total_saldo: Decimal,
    pub separations: SeparationStatusCounts,
}

/// Commercial billing dashboard. The load is raced against a configurable
/// deadline; an elapsed deadline surfaces as a typed timeout error rather
/// than leaving the caller waiting on the database.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    deadline: Duration,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, deadline: Duration) -> Self {
        Self { db_pool, deadline }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<BillingDashboard, ServiceError> {
        match timeout(self.deadline, self.load_inner()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_secs = self.deadline.as_secs(), "billing dashboard fetch timed out");
                Err(ServiceError::Timeout(format!(
                    "billing dashboard fetch exceeded {}s",
                    self.deadline.as_secs()
                )))
            }
        }
    }

    async fn load_inner(&self) -> Result<BillingDashboard, ServiceError> {
        let db = &*self.db_pool;

        let orders = ClientOrderEntity::find()
            .find_with_related(order_item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let (monthly, total_faturado, total_saldo) = aggregate_billing(&orders);

        let mut counts = SeparationStatusCounts::default();
        for (status, slot) in [
            (SeparationStatus::Pending, &mut counts.pending),
            (SeparationStatus::Approved, &mut counts.approved),
            (SeparationStatus::Rejected, &mut counts.rejected),
        ] {
            *slot = SeparationEntity::find()
                .filter(separation::Column::Status.eq(status))
                .count(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        Ok(BillingDashboard {
            monthly,
            total_faturado,
            total_saldo,
            separations: counts,
        })
    }
}

fn aggregate_billing(
    orders: &[(client_order::Model, Vec<order_item::Model>)],
) -> (Vec<MonthlyBilling>, Decimal, Decimal) {
    let mut by_month: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    let mut total_faturado = Decimal::ZERO;
    let mut total_saldo = Decimal::ZERO;

    for (order, items) in orders {
        let key = (order.order_date.year(), order.order_date.month());
        for item in items {
            let faturado = item.quantity_delivered * item.unit_price;
            total_faturado += faturado;
            total_saldo += item.quantity_saldo * item.unit_price;
            *by_month.entry(key).or_insert(Decimal::ZERO) += faturado;
        }
    }

    let monthly = by_month
        .into_iter()
        .map(|((year, month), valor_faturado)| MonthlyBilling {
            year,
            month,
            valor_faturado,
        })
        .collect();

    (monthly, total_faturado, total_saldo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn order_on(number: &str, year: i32, month: u32) -> client_order::Model {
        client_order::Model {
            order_number: number.to_string(),
            client_code: Some("C1".to_string()),
            client_name: Some("Acme".to_string()),
            representative_code: None,
            status: "Parcial".to_string(),
            order_date: Utc.with_ymd_and_hms(year, month, 5, 12, 0, 0).unwrap(),
            imported_at: Utc::now(),
        }
    }

    fn item_for(number: &str, delivered: Decimal, saldo: Decimal, price: Decimal) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_number: number.to_string(),
            item_code: "X".to_string(),
            description: "x".to_string(),
            quantity_ordered: delivered + saldo,
            quantity_delivered: delivered,
            quantity_saldo: saldo,
            unit_price: price,
            physical_stock: Decimal::ZERO,
            imported_at: Utc::now(),
        }
    }

    #[test]
    fn billing_aggregates_by_order_month() {
        let orders = vec![
            (
                order_on("P1", 2025, 1),
                vec![item_for("P1", dec!(2), dec!(3), dec!(10))],
            ),
            (
                order_on("P2", 2025, 1),
                vec![item_for("P2", dec!(1), dec!(0), dec!(5))],
            ),
            (
                order_on("P3", 2025, 2),
                vec![item_for("P3", dec!(4), dec!(1), dec!(2))],
            ),
        ];

        let (monthly, total_faturado, total_saldo) = aggregate_billing(&orders);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0], MonthlyBilling { year: 2025, month: 1, valor_faturado: dec!(25) });
        assert_eq!(monthly[1], MonthlyBilling { year: 2025, month: 2, valor_faturado: dec!(8) });
        assert_eq!(total_faturado, dec!(33));
        assert_eq!(total_saldo, dec!(32));
    }
}
