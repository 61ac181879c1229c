use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
  Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
  #[sea_orm(string_value = "admin")]
  Admin,
  #[default]
  #[sea_orm(string_value = "player")]
  Player,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub user_id: i32,
  #[sea_orm(unique)]
  pub email: String,
  pub phone: Option<String>,
  /// argon2 PHC string, never serialized
  #[serde(skip_serializing)]
  pub password: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub birthdate: Option<DateTime>,
  pub user_type: UserType,
  pub video_credits: i32,
  pub created_at: DateTime,
}

impl Model {
  pub fn is_admin(&self) -> bool {
    self.user_type == UserType::Admin
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::entry::Entity")]
  Entries,
  #[sea_orm(has_many = "super::entry_card::Entity")]
  EntryCards,
  #[sea_orm(has_many = "super::users_credits_history::Entity")]
  CreditsHistory,
}

impl Related<super::entry::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Entries.def()
  }
}

impl Related<super::entry_card::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::EntryCards.def()
  }
}

impl Related<super::users_credits_history::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::CreditsHistory.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_accounts_are_players() {
    assert_eq!(UserType::default(), UserType::Player);
    assert_eq!(json::to_value(UserType::default()).unwrap(), "player");
  }
}
