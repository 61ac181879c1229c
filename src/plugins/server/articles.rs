use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post},
};

use super::{Admin, AuthUser, Reply, Routes, done, message, ok};
use crate::{
  entity::article,
  page::{ListReq, Page},
  prelude::*,
  state::AppState,
  sv::article::{ArticleFilters, ArticleSort, NewArticle},
};

pub fn router() -> Routes {
  Router::new()
    .route("/article", post(add))
    .route("/articles", post(list))
    .route("/article/{id}", get(by_id).put(update).delete(delete))
}

async fn add(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<NewArticle>,
) -> Result<Json<Reply<article::Model>>> {
  let article = app.sv().article.add(req).await?;
  Ok(done("Article created", article))
}

async fn list(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(mut req): Json<ListReq<ArticleSort, ArticleFilters>>,
) -> Result<Json<Page<article::Model, ArticleSort>>> {
  if !caller.is_admin() {
    req.filters.is_active = Some(true);
  }
  Ok(Json(app.sv().article.list(req).await?))
}

async fn by_id(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<article::Model>>> {
  Ok(ok(app.sv().article.by_id(id).await?))
}

async fn update(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
  Json(req): Json<NewArticle>,
) -> Result<Json<Reply<article::Model>>> {
  let article = app.sv().article.update(id, req).await?;
  Ok(done("Article updated", article))
}

async fn delete(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<()>>> {
  app.sv().article.delete(id).await?;
  Ok(message("Article deleted"))
}
