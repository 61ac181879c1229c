use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Named club links shown by the client ("Torneios", "Ligas").
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "configs")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub name: String,
  pub href: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
