use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "card_entries")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub card_entry_id: i32,
  pub card_id: i32,
  pub entry_id: i32,
  /// Card count after this entry was applied
  pub num_of_entries: i32,
  pub is_special: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::entry_card::Entity",
    from = "Column::CardId",
    to = "super::entry_card::Column::CardId"
  )]
  Card,
  #[sea_orm(
    belongs_to = "super::entry::Entity",
    from = "Column::EntryId",
    to = "super::entry::Column::EntryId"
  )]
  Entry,
}

impl Related<super::entry_card::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Card.def()
  }
}

impl Related<super::entry::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Entry.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
