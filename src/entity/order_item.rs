use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub order_item_id: i32,
  pub order_id: i32,
  pub product_id: i32,
  pub quantity: i32,
  /// Unit price in cents at the time of the order
  pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::order::Entity",
    from = "Column::OrderId",
    to = "super::order::Column::OrderId"
  )]
  Order,
}

impl Related<super::order::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Order.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
