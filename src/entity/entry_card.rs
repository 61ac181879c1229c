use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stamps needed to complete a punch card.
pub const CARD_CAPACITY: i32 = 10;

/// Punch card. At most one active card per user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_cards")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub card_id: i32,
  pub user_id: i32,
  pub entry_count: i32,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::UserId"
  )]
  User,
  #[sea_orm(has_many = "super::card_entry::Entity")]
  CardEntries,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::card_entry::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::CardEntries.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
