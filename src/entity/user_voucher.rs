use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A voucher assigned to a user, with its own credit balance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_vouchers")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub user_voucher_id: i32,
  pub voucher_id: i32,
  pub assigned_to: i32,
  pub assigned_by: i32,
  pub reason: Option<String>,
  pub credit_limit: i32,
  pub credit_balance: i32,
  pub is_active: bool,
  pub assigned_at: DateTime,
  pub activated_by: Option<i32>,
  pub activated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::voucher::Entity",
    from = "Column::VoucherId",
    to = "super::voucher::Column::VoucherId"
  )]
  Voucher,
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::AssignedTo",
    to = "super::user::Column::UserId"
  )]
  User,
  #[sea_orm(has_many = "super::voucher_transaction::Entity")]
  Transactions,
}

impl Related<super::voucher::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Voucher.def()
  }
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::voucher_transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Transactions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
