use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post, put},
};
use serde::Deserialize;

use super::{Admin, AuthUser, Reply, Routes, done, ok};
use crate::{
  entity::{VideoStatus, users_credits_history, video_processed},
  page::{ListReq, Page},
  plugins::worker::ScriptJob,
  prelude::*,
  state::AppState,
  sv::{
    credits::{HistoryFilters, HistorySort},
    video::{VideoFilters, VideoRequest, VideoSort},
  },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsReq {
  pub user_id: i32,
  pub credits: i32,
}

pub fn router() -> Routes {
  Router::new()
    .route("/credits", put(set_credits))
    .route("/credits-history", post(history))
    .route("/request", post(request))
    .route("/processed", post(processed))
    .route("/processed/{id}", get(by_id))
    .route("/processed/{id}/reject", post(reject))
    .route("/processed/{id}/complete", post(complete))
}

async fn set_credits(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Json(req): Json<CreditsReq>,
) -> Result<Json<Reply<users_credits_history::Model>>> {
  let row = app.sv().credits.set(req.user_id, req.credits, admin.id()).await?;
  Ok(done("Credits updated", row))
}

async fn history(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(mut req): Json<ListReq<HistorySort, HistoryFilters>>,
) -> Result<Json<Page<users_credits_history::Model, HistorySort>>> {
  if !caller.is_admin() {
    req.filters.user_id = Some(caller.id());
  }
  Ok(Json(app.sv().credits.history(req).await?))
}

/// Hands a freshly requested clip to the worker without holding up the
/// response. A worker that cannot be reached marks the clip failed.
fn dispatch(app: Arc<AppState>, video: &video_processed::Model) {
  let job = ScriptJob::new(video);
  let url = format!("{}/script", app.config.video_service_url);

  tokio::spawn(async move {
    let video_id = job.video_id;
    let sent = app
      .http
      .post(&url)
      .json(&job)
      .send()
      .await
      .and_then(|res| res.error_for_status());

    if let Err(err) = sent {
      error!("Failed to hand video {video_id} to the worker: {err}");
      if let Err(err) = app.sv().video.mark(video_id, VideoStatus::Failed).await
      {
        error!("Failed to mark video {video_id} as failed: {err}");
      }
    }
  });
}

async fn request(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(req): Json<VideoRequest>,
) -> Result<Json<Reply<video_processed::Model>>> {
  let video = app.sv().video.request(caller.id(), req).await?;
  dispatch(app.clone(), &video);
  Ok(done("Video requested", video))
}

async fn processed(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(mut req): Json<ListReq<VideoSort, VideoFilters>>,
) -> Result<Json<Page<video_processed::Model, VideoSort>>> {
  if !caller.is_admin() {
    req.filters.user_id = Some(caller.id());
  }
  Ok(Json(app.sv().video.list(req).await?))
}

async fn by_id(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<video_processed::Model>>> {
  let video = app.sv().video.by_id(id).await?;
  caller.ensure_self_or_admin(video.user_id)?;
  Ok(ok(video))
}

async fn reject(
  State(app): State<Arc<AppState>>,
  admin: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<video_processed::Model>>> {
  let video = app.sv().video.reject(id, admin.id()).await?;
  Ok(done("Video rejected and credit refunded", video))
}

async fn complete(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<video_processed::Model>>> {
  let video = app.sv().video.complete(id).await?;
  Ok(done("Video completed", video))
}
