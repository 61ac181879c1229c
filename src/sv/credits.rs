use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{user, users_credits_history as history},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySort {
  Id,
  UserId,
  #[default]
  CreatedAt,
}

impl SortKey<history::Entity> for HistorySort {
  fn column(&self) -> history::Column {
    match self {
      Self::Id => history::Column::Id,
      Self::UserId => history::Column::UserId,
      Self::CreatedAt => history::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilters {
  pub user_id: Option<i32>,
  pub given_by: Option<i32>,
}

/// Moves `users.video_credits` from its current value to `change(current)`
/// and appends the history row, inside the caller's transaction.
async fn adjust(
  txn: &DatabaseTransaction,
  user_id: i32,
  given_by: i32,
  change: impl FnOnce(i32) -> Result<i32>,
) -> Result<history::Model> {
  let user = user::Entity::find_by_id(user_id)
    .lock_exclusive()
    .one(txn)
    .await?
    .ok_or(Error::NotFound("User"))?;

  let before = user.video_credits;
  let after = change(before)?;

  let updated = user::Entity::update_many()
    .col_expr(user::Column::VideoCredits, Expr::value(after))
    .filter(user::Column::UserId.eq(user_id))
    .filter(user::Column::VideoCredits.eq(before))
    .exec(txn)
    .await?;

  if updated.rows_affected == 0 {
    return Err(Error::conflict("Credits were modified concurrently"));
  }

  let row = history::ActiveModel {
    user_id: Set(user_id),
    credits_before: Set(before),
    credits_after: Set(after),
    given_by: Set(given_by),
    created_at: Set(utils::now()),
    ..Default::default()
  }
  .insert(txn)
  .await?;

  Ok(row)
}

/// Spends one credit of `user_id` on a clip request.
pub async fn debit(
  txn: &DatabaseTransaction,
  user_id: i32,
) -> Result<history::Model> {
  adjust(txn, user_id, user_id, |credits| {
    if credits <= 0 {
      return Err(Error::InsufficientCredits);
    }
    Ok(credits - 1)
  })
  .await
}

/// Gives back the credit of a clip that was never delivered.
pub async fn refund(
  txn: &DatabaseTransaction,
  user_id: i32,
  given_by: i32,
) -> Result<history::Model> {
  adjust(txn, user_id, given_by, |credits| {
    credits
      .checked_add(1)
      .ok_or_else(|| Error::validation("Credit balance is already at maximum"))
  })
  .await
}

pub struct Credits<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Credits<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Admin top-up: sets the balance to an absolute value.
  pub async fn set(
    &self,
    user_id: i32,
    credits: i32,
    given_by: i32,
  ) -> Result<history::Model> {
    if credits < 0 {
      return Err(Error::validation("Credits cannot be negative"));
    }

    let txn = self.db.begin().await?;
    let row = adjust(&txn, user_id, given_by, |_| Ok(credits)).await?;
    txn.commit().await?;

    info!("User {user_id} video credits set to {credits} by {given_by}");
    Ok(row)
  }

  pub async fn history(
    &self,
    req: ListReq<HistorySort, HistoryFilters>,
  ) -> Result<Page<history::Model, HistorySort>> {
    let ListReq { pagination, filters } = req;

    let mut query = history::Entity::find();
    if let Some(user_id) = filters.user_id {
      query = query.filter(history::Column::UserId.eq(user_id));
    }
    if let Some(given_by) = filters.given_by {
      query = query.filter(history::Column::GivenBy.eq(given_by));
    }

    page::fetch(self.db, query, pagination).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing;

  #[tokio::test]
  async fn test_set_debit_refund() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Credits::new(&db);

    let row = sv.set(user.user_id, 2, admin.user_id).await.unwrap();
    assert_eq!((row.credits_before, row.credits_after), (0, 2));

    let txn = db.begin().await.unwrap();
    let row = debit(&txn, user.user_id).await.unwrap();
    assert_eq!((row.credits_before, row.credits_after), (2, 1));
    assert_eq!(row.given_by, user.user_id);

    let row = refund(&txn, user.user_id, admin.user_id).await.unwrap();
    assert_eq!((row.credits_before, row.credits_after), (1, 2));
    txn.commit().await.unwrap();

    assert_eq!(testing::credits(&db, user.user_id).await, 2);
    assert!(matches!(
      sv.set(user.user_id, -3, admin.user_id).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn test_debit_without_credits_writes_nothing() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "ana@club.pt").await;

    let txn = db.begin().await.unwrap();
    assert!(matches!(
      debit(&txn, user.user_id).await,
      Err(Error::InsufficientCredits)
    ));
    txn.rollback().await.unwrap();

    assert_eq!(history::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(testing::credits(&db, user.user_id).await, 0);
  }

  #[tokio::test]
  async fn test_refund_at_maximum_is_refused() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    Credits::new(&db).set(user.user_id, i32::MAX, admin.user_id).await.unwrap();

    let txn = db.begin().await.unwrap();
    assert!(matches!(
      refund(&txn, user.user_id, admin.user_id).await,
      Err(Error::Validation(_))
    ));
    txn.rollback().await.unwrap();

    assert_eq!(testing::credits(&db, user.user_id).await, i32::MAX);
    assert_eq!(history::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_history_filter() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let ana = testing::user(&db, "ana@club.pt").await;
    let rui = testing::user(&db, "rui@club.pt").await;
    let sv = Credits::new(&db);

    sv.set(ana.user_id, 3, admin.user_id).await.unwrap();
    sv.set(rui.user_id, 1, admin.user_id).await.unwrap();

    let txn = db.begin().await.unwrap();
    debit(&txn, ana.user_id).await.unwrap();
    txn.commit().await.unwrap();

    let req = ListReq {
      pagination: Default::default(),
      filters: HistoryFilters { user_id: Some(ana.user_id), given_by: None },
    };
    let page = sv.history(req).await.unwrap();

    assert_eq!(page.pagination.total, 2);
    assert!(page.data.iter().all(|row| row.user_id == ana.user_id));
  }
}
