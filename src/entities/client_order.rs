use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Snapshot of an ERP order. Rows are replaced wholesale on import and never
/// edited in place; the ERP remains the system of record for order data.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "client_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,

    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub representative_code: Option<String>,

    /// Status as stored upstream ("Aberto", "Parcial", "Total", "Bloqueado",
    /// "Cancelado"); legacy exports may carry single-digit codes instead.
    pub status: String,

    pub order_date: DateTime<Utc>,
    pub imported_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
