use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_offpeak_cards")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub card_id: i32,
  pub assigned_by: i32,
  pub assigned_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::offpeak_card::Entity",
    from = "Column::CardId",
    to = "super::offpeak_card::Column::CardId"
  )]
  Card,
}

impl Related<super::offpeak_card::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Card.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
