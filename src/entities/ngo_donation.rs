use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Running donation total per NGO. NGO identity lives in `services::donations::NGOS`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ngo_donations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ngo_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount_donated: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
