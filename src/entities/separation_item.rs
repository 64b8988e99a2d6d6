use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Line of a separation, frozen at creation time. There is no update or
/// delete path for these rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "separation_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub separation_id: Uuid,
    pub order_number: String,
    pub item_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::separation::Entity",
        from = "Column::SeparationId",
        to = "super::separation::Column::Id"
    )]
    Separation,
}

impl Related<super::separation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Separation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
