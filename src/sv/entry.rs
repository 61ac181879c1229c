use sea_orm::{Condition, sea_query::Expr};
use serde::{Deserialize, Serialize};

use super::{BatchResult, card};
use crate::{
  entity::{entry, location, user},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEntry {
  pub user_email: Option<String>,
  pub user_phone: Option<String>,
  pub location_id: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySort {
  EntryId,
  UserId,
  LocationId,
  #[default]
  EntryTime,
  ValidatedAt,
}

impl SortKey<entry::Entity> for EntrySort {
  fn column(&self) -> entry::Column {
    match self {
      Self::EntryId => entry::Column::EntryId,
      Self::UserId => entry::Column::UserId,
      Self::LocationId => entry::Column::LocationId,
      Self::EntryTime => entry::Column::EntryTime,
      Self::ValidatedAt => entry::Column::ValidatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilters {
  pub entry_id: Option<i32>,
  pub location_id: Option<i32>,
  pub validated: Option<bool>,
  /// Matches the user's email, phone or name
  pub search: Option<String>,
}

pub struct Entry<'a> {
  db: &'a DatabaseConnection,
  cooldown: Duration,
}

impl<'a> Entry<'a> {
  pub fn new(db: &'a DatabaseConnection, cooldown: Duration) -> Self {
    Self { db, cooldown }
  }

  pub async fn register(&self, req: RegisterEntry) -> Result<entry::Model> {
    self.register_at(req, utils::now()).await
  }

  /// Records an unvalidated visit at `now`. A user gets at most one entry per
  /// cooldown window, whatever the location.
  pub async fn register_at(
    &self,
    req: RegisterEntry,
    now: DateTime,
  ) -> Result<entry::Model> {
    let user = self.resolve_user(&req).await?;

    location::Entity::find_by_id(req.location_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Location"))?;

    let cooldown = TimeDelta::from_std(self.cooldown)
      .map_err(|err| Error::Internal(err.to_string()))?;

    let txn = self.db.begin().await?;

    // serializes registrations of the same user
    user::Entity::find_by_id(user.user_id).lock_exclusive().one(&txn).await?;

    let last = entry::Entity::find()
      .filter(entry::Column::UserId.eq(user.user_id))
      .order_by_desc(entry::Column::EntryTime)
      .one(&txn)
      .await?;

    if let Some(last) = last
      && now - last.entry_time < cooldown
    {
      return Err(Error::conflict(format!(
        "User already has an entry in the last {}",
        humantime::format_duration(self.cooldown)
      )));
    }

    let entry = entry::ActiveModel {
      user_id: Set(user.user_id),
      location_id: Set(req.location_id),
      entry_time: Set(now),
      validated_by: Set(None),
      validated_at: Set(None),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!("Entry {} registered for user {}", entry.entry_id, user.user_id);
    Ok(entry)
  }

  async fn resolve_user(&self, req: &RegisterEntry) -> Result<user::Model> {
    let query = match (&req.user_email, &req.user_phone) {
      (Some(email), _) if !utils::is_blank(Some(email.as_str())) => {
        user::Entity::find().filter(user::Column::Email.eq(email.trim()))
      }
      (_, Some(phone)) if !utils::is_blank(Some(phone.as_str())) => {
        user::Entity::find().filter(user::Column::Phone.eq(phone.trim()))
      }
      _ => return Err(Error::validation("User email or phone is required")),
    };

    query.one(self.db).await?.ok_or(Error::NotFound("User"))
  }

  pub async fn by_id(&self, entry_id: i32) -> Result<entry::Model> {
    entry::Entity::find_by_id(entry_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Entry"))
  }

  /// Deletes an entry that was never validated. Validated entries back a card
  /// stamp and stay.
  pub async fn remove(&self, entry_id: i32) -> Result<()> {
    let entry = self.by_id(entry_id).await?;

    if entry.validated_by.is_some() {
      return Err(Error::conflict(format!(
        "Entry {entry_id} is already validated"
      )));
    }

    entry::Entity::delete_by_id(entry_id).exec(self.db).await?;
    Ok(())
  }

  pub async fn validate(
    &self,
    entry_ids: &[i32],
    admin_id: i32,
  ) -> Result<BatchResult> {
    self.validate_at(entry_ids, admin_id, utils::now()).await
  }

  /// Validates entries in the given order. Each entry is validated and
  /// stamped on its user's card in one transaction, so a failed stamp leaves
  /// the entry unvalidated. One failing entry does not stop the batch.
  pub async fn validate_at(
    &self,
    entry_ids: &[i32],
    admin_id: i32,
    now: DateTime,
  ) -> Result<BatchResult> {
    if entry_ids.is_empty() {
      return Err(Error::validation("No entries supplied"));
    }

    let mut ids = Vec::with_capacity(entry_ids.len());
    for &id in entry_ids {
      if !ids.contains(&id) {
        ids.push(id);
      }
    }

    let known: HashMap<i32, entry::Model> = entry::Entity::find()
      .filter(entry::Column::EntryId.is_in(ids.clone()))
      .all(self.db)
      .await?
      .into_iter()
      .map(|entry| (entry.entry_id, entry))
      .collect();

    let mut result = BatchResult::default();

    for id in ids {
      let Some(entry) = known.get(&id) else {
        warn!("Entry {id} does not exist");
        result.failed.push(id);
        continue;
      };

      if entry.validated_by.is_some() {
        result.skipped.push(id);
        continue;
      }

      match self.validate_one(entry, admin_id, now).await {
        Ok(true) => result.succeeded.push(id),
        Ok(false) => result.skipped.push(id),
        Err(err) => {
          warn!("Failed to validate entry {id}: {err}");
          result.failed.push(id);
        }
      }
    }

    info!(
      "Validated entries: {} ok, {} failed, {} skipped",
      result.succeeded.len(),
      result.failed.len(),
      result.skipped.len()
    );
    Ok(result)
  }

  /// `false` when another validation got there first.
  async fn validate_one(
    &self,
    entry: &entry::Model,
    admin_id: i32,
    now: DateTime,
  ) -> Result<bool> {
    let txn = self.db.begin().await?;

    let updated = entry::Entity::update_many()
      .col_expr(entry::Column::ValidatedBy, Expr::value(admin_id))
      .col_expr(entry::Column::ValidatedAt, Expr::value(now))
      .filter(entry::Column::EntryId.eq(entry.entry_id))
      .filter(entry::Column::ValidatedBy.is_null())
      .exec(&txn)
      .await?;

    if updated.rows_affected == 0 {
      return Ok(false);
    }

    card::accrue(&txn, entry.user_id, entry.entry_id).await?;

    txn.commit().await?;
    Ok(true)
  }

  pub async fn list(
    &self,
    req: ListReq<EntrySort, EntryFilters>,
  ) -> Result<Page<entry::Model, EntrySort>> {
    let ListReq { pagination, filters } = req;

    let mut query = entry::Entity::find();
    if let Some(entry_id) = filters.entry_id {
      query = query.filter(entry::Column::EntryId.eq(entry_id));
    }
    if let Some(location_id) = filters.location_id {
      query = query.filter(entry::Column::LocationId.eq(location_id));
    }
    if let Some(validated) = filters.validated {
      let column = entry::Column::ValidatedBy;
      query = query.filter(if validated {
        column.is_not_null()
      } else {
        column.is_null()
      });
    }
    if let Some(search) = filters.search.as_deref()
      && !utils::is_blank(Some(search))
    {
      let pattern = utils::like(search);
      query = query.inner_join(user::Entity).filter(
        Condition::any()
          .add(user::Column::Email.like(&pattern))
          .add(user::Column::Phone.like(&pattern))
          .add(user::Column::FirstName.like(&pattern))
          .add(user::Column::LastName.like(&pattern)),
      );
    }

    page::fetch(self.db, query, pagination).await
  }
}
