use serde::Deserialize;

use crate::{entity::config, prelude::*};

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigEdit {
  pub name: String,
  pub href: Option<String>,
}

/// Club links shown on the dashboard.
pub struct Settings<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Settings<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<config::Model>> {
    let configs = config::Entity::find()
      .order_by_asc(config::Column::Name)
      .all(self.db)
      .await?;
    Ok(configs)
  }

  /// Only known links can be edited, the set itself is fixed.
  pub async fn edit(
    &self,
    edits: Vec<ConfigEdit>,
  ) -> Result<Vec<config::Model>> {
    if edits.is_empty() {
      return Err(Error::validation("Nothing to update"));
    }

    let txn = self.db.begin().await?;
    for edit in edits {
      let config = config::Entity::find_by_id(edit.name.clone())
        .one(&txn)
        .await?
        .ok_or(Error::NotFound("Config"))?;

      let href = edit.href.filter(|href| !href.trim().is_empty());
      config::ActiveModel { href: Set(href), ..config.into() }
        .update(&txn)
        .await?;
    }
    txn.commit().await?;

    self.all().await
  }
}
