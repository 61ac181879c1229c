use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{VoucherType, user, user_voucher, voucher, voucher_transaction},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVoucher {
  pub name: String,
  #[serde(default)]
  pub voucher_type: VoucherType,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVoucher {
  pub voucher_id: i32,
  pub user_id: i32,
  pub reason: Option<String>,
  pub credit_limit: Option<i32>,
  #[serde(default)]
  pub activate: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalance {
  pub user_voucher_id: i32,
  pub new_credit_balance: i32,
  pub observation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSort {
  UserVoucherId,
  AssignedTo,
  CreditBalance,
  #[default]
  AssignedAt,
}

impl SortKey<user_voucher::Entity> for AssignmentSort {
  fn column(&self) -> user_voucher::Column {
    match self {
      Self::UserVoucherId => user_voucher::Column::UserVoucherId,
      Self::AssignedTo => user_voucher::Column::AssignedTo,
      Self::CreditBalance => user_voucher::Column::CreditBalance,
      Self::AssignedAt => user_voucher::Column::AssignedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFilters {
  /// Voucher name
  pub name: Option<String>,
  pub assigned_to: Option<i32>,
  pub is_active: Option<bool>,
}

/// An assignment together with its voucher template.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
  #[serde(flatten)]
  pub assignment: user_voucher::Model,
  pub voucher: Option<voucher::Model>,
}

pub struct Voucher<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Voucher<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, req: NewVoucher) -> Result<voucher::Model> {
    if utils::is_blank(Some(&req.name)) {
      return Err(Error::validation("Voucher name is required"));
    }

    let voucher = voucher::ActiveModel {
      name: Set(req.name.trim().to_string()),
      voucher_type: Set(req.voucher_type),
      image_url: Set(req.image_url),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    Ok(voucher)
  }

  pub async fn templates(&self) -> Result<Vec<voucher::Model>> {
    let vouchers = voucher::Entity::find()
      .order_by_asc(voucher::Column::Name)
      .all(self.db)
      .await?;
    Ok(vouchers)
  }

  pub async fn by_id(&self, voucher_id: i32) -> Result<voucher::Model> {
    voucher::Entity::find_by_id(voucher_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Voucher"))
  }

  pub async fn update(
    &self,
    voucher_id: i32,
    req: NewVoucher,
  ) -> Result<voucher::Model> {
    if utils::is_blank(Some(&req.name)) {
      return Err(Error::validation("Voucher name is required"));
    }

    let voucher = self.by_id(voucher_id).await?;
    let voucher = voucher::ActiveModel {
      name: Set(req.name.trim().to_string()),
      voucher_type: Set(req.voucher_type),
      image_url: Set(req.image_url),
      ..voucher.into()
    }
    .update(self.db)
    .await?;

    Ok(voucher)
  }

  pub async fn delete(&self, voucher_id: i32) -> Result<()> {
    self.by_id(voucher_id).await?;

    let assigned = user_voucher::Entity::find()
      .filter(user_voucher::Column::VoucherId.eq(voucher_id))
      .count(self.db)
      .await?;
    if assigned > 0 {
      return Err(Error::conflict(format!(
        "Voucher is assigned to {assigned} user(s)"
      )));
    }

    voucher::Entity::delete_by_id(voucher_id).exec(self.db).await?;
    Ok(())
  }

  /// Hands a voucher to a user. Credit vouchers start with a full balance.
  pub async fn assign(
    &self,
    req: AssignVoucher,
    admin_id: i32,
  ) -> Result<user_voucher::Model> {
    let voucher = self.by_id(req.voucher_id).await?;

    user::Entity::find_by_id(req.user_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("User"))?;

    let credit_limit = match (voucher.voucher_type, req.credit_limit) {
      (VoucherType::Credito, Some(limit)) if limit > 0 => limit,
      (VoucherType::Credito, _) => {
        return Err(Error::validation(
          "Credit vouchers need a positive credit limit",
        ));
      }
      (VoucherType::Oferta, _) => 0,
    };

    let now = utils::now();
    let activation = req.activate.then_some((admin_id, now));

    let assignment = user_voucher::ActiveModel {
      voucher_id: Set(voucher.voucher_id),
      assigned_to: Set(req.user_id),
      assigned_by: Set(admin_id),
      reason: Set(req.reason),
      credit_limit: Set(credit_limit),
      credit_balance: Set(credit_limit),
      is_active: Set(req.activate),
      assigned_at: Set(now),
      activated_by: Set(activation.map(|(by, _)| by)),
      activated_at: Set(activation.map(|(_, at)| at)),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!(
      "Voucher {} assigned to user {} by {admin_id}",
      voucher.voucher_id, req.user_id
    );
    Ok(assignment)
  }

  pub async fn assignment(
    &self,
    user_voucher_id: i32,
  ) -> Result<user_voucher::Model> {
    user_voucher::Entity::find_by_id(user_voucher_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("User voucher"))
  }

  /// Activation happens once and is never undone.
  pub async fn activate(
    &self,
    user_voucher_id: i32,
    admin_id: i32,
  ) -> Result<user_voucher::Model> {
    let now = utils::now();

    let updated = user_voucher::Entity::update_many()
      .col_expr(user_voucher::Column::IsActive, Expr::value(true))
      .col_expr(user_voucher::Column::ActivatedBy, Expr::value(admin_id))
      .col_expr(user_voucher::Column::ActivatedAt, Expr::value(now))
      .filter(user_voucher::Column::UserVoucherId.eq(user_voucher_id))
      .filter(user_voucher::Column::ActivatedAt.is_null())
      .exec(self.db)
      .await?;

    if updated.rows_affected == 0 {
      self.assignment(user_voucher_id).await?;
      return Err(Error::conflict("Voucher is already activated"));
    }

    self.assignment(user_voucher_id).await
  }

  /// Sets the balance of an assignment and appends the matching ledger row,
  /// both in one transaction. The balance never leaves `0..=credit_limit`.
  pub async fn update_credit_balance(
    &self,
    req: UpdateBalance,
    changed_by: i32,
  ) -> Result<voucher_transaction::Model> {
    let txn = self.db.begin().await?;

    let assignment = user_voucher::Entity::find_by_id(req.user_voucher_id)
      .lock_exclusive()
      .one(&txn)
      .await?
      .ok_or(Error::NotFound("User voucher"))?;

    if !(0..=assignment.credit_limit).contains(&req.new_credit_balance) {
      return Err(Error::validation(format!(
        "Credit balance must be between 0 and {}",
        assignment.credit_limit
      )));
    }

    let before = assignment.credit_balance;
    let updated = user_voucher::Entity::update_many()
      .col_expr(
        user_voucher::Column::CreditBalance,
        Expr::value(req.new_credit_balance),
      )
      .filter(user_voucher::Column::UserVoucherId.eq(req.user_voucher_id))
      .filter(user_voucher::Column::CreditBalance.eq(before))
      .exec(&txn)
      .await?;

    if updated.rows_affected == 0 {
      return Err(Error::conflict("Balance was modified concurrently"));
    }

    let transaction = voucher_transaction::ActiveModel {
      user_voucher_id: Set(req.user_voucher_id),
      credits_before: Set(before),
      credits_after: Set(req.new_credit_balance),
      changed_by: Set(changed_by),
      observation: Set(req.observation),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!(
      "User voucher {}: {before} -> {}",
      req.user_voucher_id, req.new_credit_balance
    );
    Ok(transaction)
  }

  /// Ledger of an assignment, oldest first.
  pub async fn transactions(
    &self,
    user_voucher_id: i32,
  ) -> Result<Vec<voucher_transaction::Model>> {
    self.assignment(user_voucher_id).await?;

    let rows = voucher_transaction::Entity::find()
      .filter(voucher_transaction::Column::UserVoucherId.eq(user_voucher_id))
      .order_by_asc(voucher_transaction::Column::TransactionId)
      .all(self.db)
      .await?;
    Ok(rows)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<Assignment>> {
    let rows = user_voucher::Entity::find()
      .filter(user_voucher::Column::AssignedTo.eq(user_id))
      .order_by_desc(user_voucher::Column::AssignedAt)
      .find_also_related(voucher::Entity)
      .all(self.db)
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(assignment, voucher)| Assignment { assignment, voucher })
        .collect(),
    )
  }

  pub async fn list(
    &self,
    req: ListReq<AssignmentSort, AssignmentFilters>,
  ) -> Result<Page<user_voucher::Model, AssignmentSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = user_voucher::Entity::find();
    if let Some(user_id) = filters.assigned_to {
      query = query.filter(user_voucher::Column::AssignedTo.eq(user_id));
    }
    if let Some(is_active) = filters.is_active {
      query = query.filter(user_voucher::Column::IsActive.eq(is_active));
    }
    if let Some(name) = filters.name.as_deref()
      && !utils::is_blank(Some(name))
    {
      query = query
        .inner_join(voucher::Entity)
        .filter(voucher::Column::Name.like(utils::like(name)));
    }

    page::fetch(self.db, query, pagination).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing;

  async fn credit_voucher(db: &DatabaseConnection) -> voucher::Model {
    Voucher::new(db)
      .create(NewVoucher {
        name: String::from("Vale 50"),
        voucher_type: VoucherType::Credito,
        image_url: None,
      })
      .await
      .unwrap()
  }

  fn assign(voucher_id: i32, user_id: i32, limit: i32) -> AssignVoucher {
    AssignVoucher {
      voucher_id,
      user_id,
      reason: Some(String::from("aniversário")),
      credit_limit: Some(limit),
      activate: false,
    }
  }

  fn balance(user_voucher_id: i32, value: i32, note: &str) -> UpdateBalance {
    UpdateBalance {
      user_voucher_id,
      new_credit_balance: value,
      observation: Some(note.to_string()),
    }
  }

  #[tokio::test]
  async fn test_partial_discount() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let voucher = credit_voucher(&db).await;
    let assignment = sv
      .assign(assign(voucher.voucher_id, user.user_id, 50), admin.user_id)
      .await
      .unwrap();
    assert_eq!(assignment.credit_balance, 50);

    let tx = sv
      .update_credit_balance(
        balance(assignment.user_voucher_id, 30, "desconto parcial"),
        admin.user_id,
      )
      .await
      .unwrap();

    assert_eq!(tx.credits_before, 50);
    assert_eq!(tx.credits_after, 30);
    assert_eq!(tx.observation.as_deref(), Some("desconto parcial"));

    let assignment = sv.assignment(assignment.user_voucher_id).await.unwrap();
    assert_eq!(assignment.credit_balance, 30);
  }

  #[tokio::test]
  async fn test_ledger_chain() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let voucher = credit_voucher(&db).await;
    let assignment = sv
      .assign(assign(voucher.voucher_id, user.user_id, 50), admin.user_id)
      .await
      .unwrap();
    let id = assignment.user_voucher_id;

    for value in [40, 25, 25, 0] {
      sv.update_credit_balance(balance(id, value, "uso"), admin.user_id)
        .await
        .unwrap();
    }

    let rows = sv.transactions(id).await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].credits_before, 50);
    for pair in rows.windows(2) {
      assert_eq!(pair[0].credits_after, pair[1].credits_before);
    }

    let current = sv.assignment(id).await.unwrap().credit_balance;
    assert_eq!(rows.last().unwrap().credits_after, current);
  }

  #[tokio::test]
  async fn test_balance_bounds() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let voucher = credit_voucher(&db).await;
    let assignment = sv
      .assign(assign(voucher.voucher_id, user.user_id, 50), admin.user_id)
      .await
      .unwrap();
    let id = assignment.user_voucher_id;

    for value in [-1, 51] {
      let res =
        sv.update_credit_balance(balance(id, value, "x"), admin.user_id).await;
      assert!(matches!(res, Err(Error::Validation(_))));
    }
    assert!(sv.transactions(id).await.unwrap().is_empty());

    let res =
      sv.update_credit_balance(balance(999, 10, "x"), admin.user_id).await;
    assert!(matches!(res, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn test_assign_rules() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let credit = credit_voucher(&db).await;
    let mut req = assign(credit.voucher_id, user.user_id, 0);
    req.credit_limit = None;
    assert!(matches!(
      sv.assign(req, admin.user_id).await,
      Err(Error::Validation(_))
    ));

    let gift = sv
      .create(NewVoucher {
        name: String::from("Aula grátis"),
        voucher_type: VoucherType::Oferta,
        image_url: None,
      })
      .await
      .unwrap();
    let mut req = assign(gift.voucher_id, user.user_id, 100);
    req.activate = true;
    let assignment = sv.assign(req, admin.user_id).await.unwrap();

    assert_eq!(assignment.credit_limit, 0);
    assert!(assignment.is_active);
    assert_eq!(assignment.activated_by, Some(admin.user_id));

    let assigned = sv.by_user(user.user_id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].voucher.as_ref().unwrap().name, "Aula grátis");
  }

  #[tokio::test]
  async fn test_activate_once() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let voucher = credit_voucher(&db).await;
    let assignment = sv
      .assign(assign(voucher.voucher_id, user.user_id, 50), admin.user_id)
      .await
      .unwrap();
    assert!(!assignment.is_active);

    let active =
      sv.activate(assignment.user_voucher_id, admin.user_id).await.unwrap();
    assert!(active.is_active);
    assert!(active.activated_at.is_some());

    assert!(matches!(
      sv.activate(assignment.user_voucher_id, admin.user_id).await,
      Err(Error::Conflict(_))
    ));
    assert!(matches!(
      sv.activate(999, admin.user_id).await,
      Err(Error::NotFound(_))
    ));

    assert!(matches!(
      sv.delete(voucher.voucher_id).await,
      Err(Error::Conflict(_))
    ));
  }

  #[tokio::test]
  async fn test_list_by_voucher_name() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Voucher::new(&db);

    let credit = credit_voucher(&db).await;
    let gift = sv
      .create(NewVoucher {
        name: String::from("Aula grátis"),
        voucher_type: VoucherType::Oferta,
        image_url: None,
      })
      .await
      .unwrap();
    for id in [credit.voucher_id, gift.voucher_id] {
      sv.assign(assign(id, user.user_id, 50), admin.user_id).await.unwrap();
    }

    let req = ListReq {
      pagination: Default::default(),
      filters: AssignmentFilters {
        name: Some(String::from("Vale")),
        ..Default::default()
      },
    };
    let page = sv.list(req).await.unwrap();

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.data[0].voucher_id, credit.voucher_id);
  }
}
