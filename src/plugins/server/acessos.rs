use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{delete, post},
};
use serde::Deserialize;

use super::{Admin, BatchReply, Reply, Routes, done, message};
use crate::{
  entity::{entry, entry_card},
  prelude::*,
  state::AppState,
  sv::entry::RegisterEntry,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReq {
  pub entry_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCountReq {
  pub card_id: i32,
  pub entry_count: i32,
}

pub fn router() -> Routes {
  Router::new()
    .route("/entry", post(register))
    .route("/entry/{id}", delete(remove))
    .route("/validate", post(validate))
    .route("/update-entry-count", post(update_entry_count))
}

async fn register(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<RegisterEntry>,
) -> Result<Json<Reply<entry::Model>>> {
  let entry = app.sv().entry.register(req).await?;
  Ok(done("Entry registered", entry))
}

async fn remove(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<()>>> {
  app.sv().entry.remove(id).await?;
  Ok(message("Entry removed"))
}

async fn validate(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Json(req): Json<ValidateReq>,
) -> Result<Json<BatchReply>> {
  let result = app.sv().entry.validate(&req.entry_ids, admin.id()).await?;
  Ok(BatchReply::new(
    result,
    "Entries validated",
    "All supplied entries were already validated",
  ))
}

async fn update_entry_count(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<EntryCountReq>,
) -> Result<Json<Reply<entry_card::Model>>> {
  let card = app.sv().card.set_entry_count(req.card_id, req.entry_count).await?;
  Ok(done("Card updated", card))
}
