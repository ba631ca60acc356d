use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auditoriums")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub theatre_id: Uuid,
    pub number: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::theatre::Entity",
        from = "Column::TheatreId",
        to = "super::theatre::Column::Id"
    )]
    Theatre,
}

impl Related<super::theatre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Theatre.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
