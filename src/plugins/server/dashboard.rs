use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{Admin, AuthUser, Reply, Routes, done, ok};
use crate::{
  entity::{card_entry, config, entry, entry_card},
  page::{ListReq, Page},
  prelude::*,
  state::AppState,
  sv::{
    card::{CardFilters, CardSort},
    entry::{EntryFilters, EntrySort},
    settings::ConfigEdit,
  },
};

#[derive(Debug, Deserialize)]
pub struct ConfigsReq {
  pub configs: Vec<ConfigEdit>,
}

pub fn router() -> Routes {
  Router::new()
    .route("/entries", post(entries))
    .route("/cards", post(cards))
    .route("/cards/{id}/entries", get(card_entries))
    .route("/configs", get(configs).post(edit_configs))
}

async fn entries(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<ListReq<EntrySort, EntryFilters>>,
) -> Result<Json<Page<entry::Model, EntrySort>>> {
  Ok(Json(app.sv().entry.list(req).await?))
}

async fn cards(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<ListReq<CardSort, CardFilters>>,
) -> Result<Json<Page<entry_card::Model, CardSort>>> {
  Ok(Json(app.sv().card.list(req).await?))
}

async fn card_entries(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<Vec<card_entry::Model>>>> {
  let card = app.sv().card.by_id(id).await?;
  caller.ensure_self_or_admin(card.user_id)?;
  Ok(ok(app.sv().card.entries(id).await?))
}

async fn configs(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
) -> Result<Json<Reply<Vec<config::Model>>>> {
  Ok(ok(app.sv().settings.all().await?))
}

async fn edit_configs(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<ConfigsReq>,
) -> Result<Json<Reply<Vec<config::Model>>>> {
  let configs = app.sv().settings.edit(req.configs).await?;
  Ok(done("Configs updated", configs))
}
