use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offpick_cards")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub card_id: i32,
  pub name: String,
  pub month: i32,
  pub year: i32,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_offpick_card::Entity")]
  Assignments,
}

impl Related<super::user_offpick_card::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Assignments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
