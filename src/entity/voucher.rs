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
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum VoucherType {
  /// Monetary credit with a balance ledger
  #[sea_orm(string_value = "credito")]
  Credito,
  #[sea_orm(string_value = "oferta")]
  Oferta,
}

impl Default for VoucherType {
  fn default() -> Self {
    Self::Oferta
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub voucher_id: i32,
  pub name: String,
  pub voucher_type: VoucherType,
  pub image_url: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_voucher::Entity")]
  Assignments,
}

impl Related<super::user_voucher::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Assignments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
