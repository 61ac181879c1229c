use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{Admin, AuthUser, Reply, Routes, done, message, ok};
use crate::{
  entity::{user_voucher, voucher, voucher_transaction},
  page::{ListReq, Page},
  prelude::*,
  state::AppState,
  sv::voucher::{
    AssignVoucher, Assignment, AssignmentFilters, AssignmentSort, NewVoucher,
    UpdateBalance,
  },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateReq {
  pub user_voucher_id: i32,
}

pub fn router() -> Routes {
  Router::new()
    .route("/voucher", post(create))
    .route("/vouchers", get(templates).post(assignments))
    .route("/voucher/{id}", get(by_id).put(update).delete(delete))
    .route("/voucher/assign", post(assign))
    .route("/voucher/updateCreditBalance", post(update_credit_balance))
    .route("/activate", post(activate))
    .route("/user/{id}", get(by_user))
    .route("/transactions/{id}", get(transactions))
}

async fn create(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<NewVoucher>,
) -> Result<Json<Reply<voucher::Model>>> {
  let voucher = app.sv().voucher.create(req).await?;
  Ok(done("Voucher created", voucher))
}

async fn templates(
  State(app): State<Arc<AppState>>,
  _: Admin,
) -> Result<Json<Reply<Vec<voucher::Model>>>> {
  Ok(ok(app.sv().voucher.templates().await?))
}

async fn assignments(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<ListReq<AssignmentSort, AssignmentFilters>>,
) -> Result<Json<Page<user_voucher::Model, AssignmentSort>>> {
  Ok(Json(app.sv().voucher.list(req).await?))
}

async fn by_id(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<voucher::Model>>> {
  Ok(ok(app.sv().voucher.by_id(id).await?))
}

async fn update(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
  Json(req): Json<NewVoucher>,
) -> Result<Json<Reply<voucher::Model>>> {
  let voucher = app.sv().voucher.update(id, req).await?;
  Ok(done("Voucher updated", voucher))
}

async fn delete(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<()>>> {
  app.sv().voucher.delete(id).await?;
  Ok(message("Voucher deleted"))
}

async fn assign(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Json(req): Json<AssignVoucher>,
) -> Result<Json<Reply<user_voucher::Model>>> {
  let assignment = app.sv().voucher.assign(req, admin.id()).await?;
  Ok(done("Voucher assigned", assignment))
}

async fn activate(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Json(req): Json<ActivateReq>,
) -> Result<Json<Reply<user_voucher::Model>>> {
  let assignment =
    app.sv().voucher.activate(req.user_voucher_id, admin.id()).await?;
  Ok(done("Voucher activated", assignment))
}

async fn update_credit_balance(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Json(req): Json<UpdateBalance>,
) -> Result<Json<Reply<voucher_transaction::Model>>> {
  let transaction =
    app.sv().voucher.update_credit_balance(req, admin.id()).await?;
  Ok(done("Credit balance updated", transaction))
}

async fn by_user(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<Vec<Assignment>>>> {
  caller.ensure_self_or_admin(id)?;
  Ok(ok(app.sv().voucher.by_user(id).await?))
}

async fn transactions(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<Vec<voucher_transaction::Model>>>> {
  let assignment = app.sv().voucher.assignment(id).await?;
  caller.ensure_self_or_admin(assignment.assigned_to)?;
  Ok(ok(app.sv().voucher.transactions(id).await?))
}
