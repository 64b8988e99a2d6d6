use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Pick-list created from a selection of open order items for one client
/// card. After creation only the status field ever changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "separations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, message = "Client code is required"))]
    pub client_code: String,
    pub client_name: String,

    pub item_count: i32,
    pub total_value: Decimal,
    pub status: SeparationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::separation_item::Entity")]
    SeparationItems,
}

impl Related<super::separation_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeparationItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SeparationStatus {
    #[sea_orm(string_value = "pendente")]
    Pending,
    #[sea_orm(string_value = "aprovada")]
    Approved,
    #[sea_orm(string_value = "rejeitada")]
    Rejected,
}

impl fmt::Display for SeparationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparationStatus::Pending => write!(f, "pendente"),
            SeparationStatus::Approved => write!(f, "aprovada"),
            SeparationStatus::Rejected => write!(f, "rejeitada"),
        }
    }
}

impl Model {
    pub fn approve(&mut self) -> Result<(), String> {
        if self.status == SeparationStatus::Pending {
            self.status = SeparationStatus::Approved;
            Ok(())
        } else {
            Err("Separation can only be approved from pending status".to_string())
        }
    }

    pub fn reject(&mut self) -> Result<(), String> {
        if self.status == SeparationStatus::Pending {
            self.status = SeparationStatus::Rejected;
            Ok(())
        } else {
            Err("Separation can only be rejected from pending status".to_string())
        }
    }

    pub async fn get_items(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<super::separation_item::Model>, DbErr> {
        super::separation_item::Entity::find()
            .filter(super::separation_item::Column::SeparationId.eq(self.id))
            .all(db)
            .await
    }
}
