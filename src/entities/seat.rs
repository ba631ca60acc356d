use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub auditorium_id: Uuid,
    pub aisle: String,
    pub number: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::auditorium::Entity",
        from = "Column::AuditoriumId",
        to = "super::auditorium::Column::Id"
    )]
    Auditorium,
}

impl Related<super::auditorium::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auditorium.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
