use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    card_entry,
    entry_card::{self, CARD_CAPACITY},
    user,
  },
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSort {
  #[default]
  CardId,
  UserId,
  EntryCount,
  CreatedAt,
}

impl SortKey<entry_card::Entity> for CardSort {
  fn column(&self) -> entry_card::Column {
    match self {
      Self::CardId => entry_card::Column::CardId,
      Self::UserId => entry_card::Column::UserId,
      Self::EntryCount => entry_card::Column::EntryCount,
      Self::CreatedAt => entry_card::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilters {
  pub card_id: Option<i32>,
  pub user_id: Option<i32>,
  pub is_active: Option<bool>,
}

/// Stamps one validated entry on the user's active card, opening a new card
/// when there is none. Must run inside the transaction that validated the
/// entry.
///
/// The user row is locked first so concurrent accruals for the same user
/// queue up instead of both opening a card. The card itself is written with
/// a compare-and-set on the count it was read with, and reaching the
/// capacity closes the card in that same write.
pub async fn accrue(
  txn: &DatabaseTransaction,
  user_id: i32,
  entry_id: i32,
) -> Result<card_entry::Model> {
  user::Entity::find_by_id(user_id)
    .lock_exclusive()
    .one(txn)
    .await?
    .ok_or(Error::NotFound("User"))?;

  let active = entry_card::Entity::find()
    .filter(entry_card::Column::UserId.eq(user_id))
    .filter(entry_card::Column::IsActive.eq(true))
    .lock_exclusive()
    .one(txn)
    .await?;

  let card = match active {
    Some(card) => card,
    None => {
      entry_card::ActiveModel {
        user_id: Set(user_id),
        entry_count: Set(0),
        is_active: Set(true),
        created_at: Set(utils::now()),
        ..Default::default()
      }
      .insert(txn)
      .await?
    }
  };

  punch(txn, &card, entry_id).await
}

/// Writes stamp `count + 1` on `card` as it was read. A card that moved since
/// the read is left alone and reported as a conflict.
async fn punch(
  txn: &DatabaseTransaction,
  card: &entry_card::Model,
  entry_id: i32,
) -> Result<card_entry::Model> {
  let next = card.entry_count + 1;
  if next > CARD_CAPACITY {
    return Err(Error::conflict(format!(
      "Card {} is already complete",
      card.card_id
    )));
  }

  let updated = entry_card::Entity::update_many()
    .col_expr(entry_card::Column::EntryCount, Expr::value(next))
    .col_expr(entry_card::Column::IsActive, Expr::value(next < CARD_CAPACITY))
    .filter(entry_card::Column::CardId.eq(card.card_id))
    .filter(entry_card::Column::EntryCount.eq(card.entry_count))
    .filter(entry_card::Column::IsActive.eq(true))
    .exec(txn)
    .await?;

  if updated.rows_affected == 0 {
    return Err(Error::conflict(format!(
      "Card {} was modified concurrently",
      card.card_id
    )));
  }

  let stamp = card_entry::ActiveModel {
    card_id: Set(card.card_id),
    entry_id: Set(entry_id),
    num_of_entries: Set(next),
    is_special: Set(next == CARD_CAPACITY),
    ..Default::default()
  }
  .insert(txn)
  .await?;

  if stamp.is_special {
    info!("Card {} of user {} completed", card.card_id, card.user_id);
  }

  Ok(stamp)
}

pub struct Card<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Card<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, card_id: i32) -> Result<entry_card::Model> {
    entry_card::Entity::find_by_id(card_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Card"))
  }

  pub async fn active(
    &self,
    user_id: i32,
  ) -> Result<Option<entry_card::Model>> {
    let card = entry_card::Entity::find()
      .filter(entry_card::Column::UserId.eq(user_id))
      .filter(entry_card::Column::IsActive.eq(true))
      .one(self.db)
      .await?;
    Ok(card)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<entry_card::Model>> {
    let cards = entry_card::Entity::find()
      .filter(entry_card::Column::UserId.eq(user_id))
      .order_by_desc(entry_card::Column::CardId)
      .all(self.db)
      .await?;
    Ok(cards)
  }

  pub async fn list(
    &self,
    req: ListReq<CardSort, CardFilters>,
  ) -> Result<Page<entry_card::Model, CardSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = entry_card::Entity::find();
    if let Some(card_id) = filters.card_id {
      query = query.filter(entry_card::Column::CardId.eq(card_id));
    }
    if let Some(user_id) = filters.user_id {
      query = query.filter(entry_card::Column::UserId.eq(user_id));
    }
    if let Some(is_active) = filters.is_active {
      query = query.filter(entry_card::Column::IsActive.eq(is_active));
    }

    page::fetch(self.db, query, pagination).await
  }

  /// Stamps of a card in the order they were applied.
  pub async fn entries(&self, card_id: i32) -> Result<Vec<card_entry::Model>> {
    self.by_id(card_id).await?;

    let entries = card_entry::Entity::find()
      .filter(card_entry::Column::CardId.eq(card_id))
      .order_by_asc(card_entry::Column::NumOfEntries)
      .all(self.db)
      .await?;
    Ok(entries)
  }

  /// Manual correction of a card count. The card stays active exactly while
  /// it is below capacity.
  pub async fn set_entry_count(
    &self,
    card_id: i32,
    entry_count: i32,
  ) -> Result<entry_card::Model> {
    if !(0..=CARD_CAPACITY).contains(&entry_count) {
      return Err(Error::validation(format!(
        "Entry count must be between 0 and {CARD_CAPACITY}"
      )));
    }

    let txn = self.db.begin().await?;

    let card = entry_card::Entity::find_by_id(card_id)
      .lock_exclusive()
      .one(&txn)
      .await?
      .ok_or(Error::NotFound("Card"))?;

    let is_active = entry_count < CARD_CAPACITY;
    if is_active && !card.is_active {
      let other = entry_card::Entity::find()
        .filter(entry_card::Column::UserId.eq(card.user_id))
        .filter(entry_card::Column::IsActive.eq(true))
        .filter(entry_card::Column::CardId.ne(card_id))
        .count(&txn)
        .await?;

      if other > 0 {
        return Err(Error::conflict(
          "User already has another active card, this one cannot be reopened",
        ));
      }
    }

    let card = entry_card::ActiveModel {
      entry_count: Set(entry_count),
      is_active: Set(is_active),
      ..card.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(card)
  }
}
