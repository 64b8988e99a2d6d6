use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Line of exactly one order. `quantity_saldo` is maintained upstream as
/// `quantity_ordered - quantity_delivered` and trusted as given here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub item_code: String,
    pub description: String,
    pub quantity_ordered: Decimal,
    pub quantity_delivered: Decimal,
    pub quantity_saldo: Decimal,
    pub unit_price: Decimal,
    /// Physical stock on hand at snapshot time, not a live figure.
    pub physical_stock: Decimal,
    pub imported_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client_order::Entity",
        from = "Column::OrderNumber",
        to = "super::client_order::Column::OrderNumber"
    )]
    ClientOrder,
}

impl Related<super::client_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
