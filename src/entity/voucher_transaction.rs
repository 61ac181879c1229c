use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voucher_transactions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub transaction_id: i32,
  pub user_voucher_id: i32,
  pub credits_before: i32,
  pub credits_after: i32,
  pub changed_by: i32,
  pub observation: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user_voucher::Entity",
    from = "Column::UserVoucherId",
    to = "super::user_voucher::Column::UserVoucherId"
  )]
  UserVoucher,
}

impl Related<super::user_voucher::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::UserVoucher.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
