use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use super::{Admin, AuthUser, Reply, Routes, done, message, ok};
use crate::{
  entity::{entry_card, user},
  page::{ListReq, Page},
  prelude::*,
  state::AppState,
  sv::user::{
    AccountPatch, NewUser, Profile, UserFilters, UserPatch, UserSort,
  },
};

#[derive(Debug, Deserialize)]
pub struct LoginReq {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
  pub status: bool,
  pub token: String,
  pub user: user::Model,
}

pub fn router() -> Routes {
  Router::new()
    .route("/register", post(register))
    .route("/login", post(login))
    .route("/me", get(me))
    .route("/users", post(list))
    .route("/users/{id}", get(by_id).put(update).delete(delete))
    .route("/users/cards/{id}", get(cards))
    .route("/account/{id}", put(update_account))
}

async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<NewUser>,
) -> Result<Json<Session>> {
  let user = app.sv().user.register(req).await?;
  let token = app.keys.issue(user.user_id, user.user_type)?;
  Ok(Json(Session { status: true, token, user }))
}

async fn login(
  State(app): State<Arc<AppState>>,
  Json(req): Json<LoginReq>,
) -> Result<Json<Session>> {
  let user = app.sv().user.login(&req.email, &req.password).await?;
  let token = app.keys.issue(user.user_id, user.user_type)?;
  Ok(Json(Session { status: true, token, user }))
}

async fn me(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
) -> Result<Json<Reply<Profile>>> {
  Ok(ok(app.sv().user.profile(caller.id()).await?))
}

async fn list(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<ListReq<UserSort, UserFilters>>,
) -> Result<Json<Page<user::Model, UserSort>>> {
  Ok(Json(app.sv().user.list(req).await?))
}

async fn by_id(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<Profile>>> {
  caller.ensure_self_or_admin(id)?;
  Ok(ok(app.sv().user.profile(id).await?))
}

async fn update(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
  Json(patch): Json<UserPatch>,
) -> Result<Json<Reply<user::Model>>> {
  let user = app.sv().user.update(id, patch).await?;
  Ok(done("User updated", user))
}

async fn delete(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<()>>> {
  if admin.id() == id {
    return Err(Error::conflict("Administrators cannot delete themselves"));
  }
  app.sv().user.delete(id).await?;
  Ok(message("User deleted"))
}

async fn update_account(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
  Json(patch): Json<AccountPatch>,
) -> Result<Json<Reply<user::Model>>> {
  if caller.id() != id {
    return Err(Error::Forbidden);
  }
  let user = app.sv().user.update_own(id, patch).await?;
  Ok(done("Account updated", user))
}

async fn cards(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<Vec<entry_card::Model>>>> {
  caller.ensure_self_or_admin(id)?;
  Ok(ok(app.sv().card.by_user(id).await?))
}
