use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub article_id: i32,
  pub title: String,
  #[sea_orm(column_type = "Text")]
  pub content: String,
  pub author: Option<String>,
  pub image_url: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
