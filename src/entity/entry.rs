use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A visit to a club location. Created unvalidated, validated exactly once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub entry_id: i32,
  pub user_id: i32,
  pub location_id: i32,
  pub entry_time: DateTime,
  pub validated_by: Option<i32>,
  pub validated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::UserId"
  )]
  User,
  #[sea_orm(
    belongs_to = "super::location::Entity",
    from = "Column::LocationId",
    to = "super::location::Column::LocationId"
  )]
  Location,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::location::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Location.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
