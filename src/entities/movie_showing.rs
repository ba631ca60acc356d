use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled screening of a movie in an auditorium
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie_showings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movie_id: Uuid,
    pub auditorium_id: Uuid,
    pub start_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movie::Entity",
        from = "Column::MovieId",
        to = "super::movie::Column::Id"
    )]
    Movie,
    #[sea_orm(
        belongs_to = "super::auditorium::Entity",
        from = "Column::AuditoriumId",
        to = "super::auditorium::Column::Id"
    )]
    Auditorium,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movie.def()
    }
}

impl Related<super::auditorium::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auditorium.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
