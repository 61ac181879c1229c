use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use super::credits;
use crate::{
  entity::{VideoStatus, location, video_processed as video},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
  pub location_id: i32,
  pub court: String,
  pub date: NaiveDate,
  pub start_time: NaiveTime,
  pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSort {
  VideoId,
  RecordedOn,
  Status,
  #[default]
  CreatedAt,
}

impl SortKey<video::Entity> for VideoSort {
  fn column(&self) -> video::Column {
    match self {
      Self::VideoId => video::Column::VideoId,
      Self::RecordedOn => video::Column::RecordedOn,
      Self::Status => video::Column::Status,
      Self::CreatedAt => video::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFilters {
  pub user_id: Option<i32>,
  pub status: Option<VideoStatus>,
  pub location_id: Option<i32>,
}

pub struct Video<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Video<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Spends one credit and records a pending clip request. Handing the job
  /// to the worker is up to the caller.
  pub async fn request(
    &self,
    user_id: i32,
    req: VideoRequest,
  ) -> Result<video::Model> {
    if utils::is_blank(Some(&req.court)) {
      return Err(Error::validation("Court is required"));
    }
    if req.end_time <= req.start_time {
      return Err(Error::validation("End time must be after start time"));
    }

    location::Entity::find_by_id(req.location_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Location"))?;

    let txn = self.db.begin().await?;

    credits::debit(&txn, user_id).await?;

    let video = video::ActiveModel {
      user_id: Set(user_id),
      location_id: Set(req.location_id),
      court: Set(req.court.trim().to_string()),
      recorded_on: Set(req.date),
      start_time: Set(req.start_time),
      end_time: Set(req.end_time),
      status: Set(VideoStatus::Pending),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!("Video {} requested by user {user_id}", video.video_id);
    Ok(video)
  }

  pub async fn by_id(&self, video_id: i32) -> Result<video::Model> {
    video::Entity::find_by_id(video_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Video"))
  }

  /// Moves a clip to `status` unless it was rejected in the meantime.
  pub async fn mark(
    &self,
    video_id: i32,
    status: VideoStatus,
  ) -> Result<video::Model> {
    self.transition(video_id, status, &[VideoStatus::Rejected]).await
  }

  /// Writes `status` in one conditional update that skips rows sitting in
  /// any of the `closed` states.
  async fn transition(
    &self,
    video_id: i32,
    status: VideoStatus,
    closed: &[VideoStatus],
  ) -> Result<video::Model> {
    let mut update = video::Entity::update_many()
      .col_expr(video::Column::Status, Expr::value(status))
      .filter(video::Column::VideoId.eq(video_id));
    for &state in closed {
      update = update.filter(video::Column::Status.ne(state));
    }

    let updated = update.exec(self.db).await?;
    let video = self.by_id(video_id).await?;

    if updated.rows_affected == 0 {
      return Err(Error::conflict(format!(
        "Video {video_id} is already {}",
        video.status.as_str()
      )));
    }
    Ok(video)
  }

  /// Refuses a request that never produced a clip and gives the credit back.
  pub async fn reject(
    &self,
    video_id: i32,
    admin_id: i32,
  ) -> Result<video::Model> {
    let txn = self.db.begin().await?;

    let video = video::Entity::find_by_id(video_id)
      .lock_exclusive()
      .one(&txn)
      .await?
      .ok_or(Error::NotFound("Video"))?;

    if !matches!(video.status, VideoStatus::Pending | VideoStatus::Failed) {
      return Err(Error::conflict(format!(
        "Video {video_id} cannot be rejected while {}",
        video.status.as_str()
      )));
    }

    let user_id = video.user_id;
    let video =
      video::ActiveModel { status: Set(VideoStatus::Rejected), ..video.into() }
        .update(&txn)
        .await?;

    credits::refund(&txn, user_id, admin_id).await?;

    txn.commit().await?;
    Ok(video)
  }

  pub async fn complete(&self, video_id: i32) -> Result<video::Model> {
    self
      .transition(
        video_id,
        VideoStatus::Completed,
        &[VideoStatus::Rejected, VideoStatus::Completed],
      )
      .await
  }

  pub async fn list(
    &self,
    req: ListReq<VideoSort, VideoFilters>,
  ) -> Result<Page<video::Model, VideoSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = video::Entity::find();
    if let Some(user_id) = filters.user_id {
      query = query.filter(video::Column::UserId.eq(user_id));
    }
    if let Some(status) = filters.status {
      query = query.filter(video::Column::Status.eq(status));
    }
    if let Some(location_id) = filters.location_id {
      query = query.filter(video::Column::LocationId.eq(location_id));
    }

    page::fetch(self.db, query, pagination).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::users_credits_history as history,
    sv::{Credits, testing},
  };

  fn clip(location_id: i32) -> VideoRequest {
    VideoRequest {
      location_id,
      court: String::from("Campo 2"),
      date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
      start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
      end_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
    }
  }

  #[tokio::test]
  async fn test_request_spends_last_credit() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let lisboa = testing::location(&db, "Lisboa").await;
    Credits::new(&db).set(user.user_id, 1, admin.user_id).await.unwrap();
    let sv = Video::new(&db);

    let video =
      sv.request(user.user_id, clip(lisboa.location_id)).await.unwrap();
    assert_eq!(video.status, VideoStatus::Pending);
    assert_eq!(testing::credits(&db, user.user_id).await, 0);

    let rows = history::Entity::find()
      .filter(history::Column::GivenBy.eq(user.user_id))
      .all(&db)
      .await
      .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].credits_before, rows[0].credits_after), (1, 0));

    let res = sv.request(user.user_id, clip(lisboa.location_id)).await;
    assert!(matches!(res, Err(Error::InsufficientCredits)));

    // no history row and no video for the refused request
    assert_eq!(history::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(video::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_reject_refunds() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let lisboa = testing::location(&db, "Lisboa").await;
    Credits::new(&db).set(user.user_id, 1, admin.user_id).await.unwrap();
    let sv = Video::new(&db);

    let video =
      sv.request(user.user_id, clip(lisboa.location_id)).await.unwrap();
    let video = sv.reject(video.video_id, admin.user_id).await.unwrap();

    assert_eq!(video.status, VideoStatus::Rejected);
    assert_eq!(testing::credits(&db, user.user_id).await, 1);

    // a second rejection must not refund twice
    assert!(matches!(
      sv.reject(video.video_id, admin.user_id).await,
      Err(Error::Conflict(_))
    ));
    assert_eq!(testing::credits(&db, user.user_id).await, 1);

    // a late worker update leaves the rejection in place
    assert!(matches!(
      sv.mark(video.video_id, VideoStatus::Failed).await,
      Err(Error::Conflict(_))
    ));
    assert_eq!(
      sv.by_id(video.video_id).await.unwrap().status,
      VideoStatus::Rejected
    );
  }

  #[tokio::test]
  async fn test_completion_after_rejection_is_refused() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let lisboa = testing::location(&db, "Lisboa").await;
    Credits::new(&db).set(user.user_id, 1, admin.user_id).await.unwrap();
    let sv = Video::new(&db);

    let video =
      sv.request(user.user_id, clip(lisboa.location_id)).await.unwrap();
    sv.mark(video.video_id, VideoStatus::Processing).await.unwrap();

    // the worker saw a running clip, the admin rejected it meanwhile
    let running = sv.by_id(video.video_id).await.unwrap();
    assert_eq!(running.status, VideoStatus::Processing);
    sv.mark(video.video_id, VideoStatus::Failed).await.unwrap();
    sv.reject(video.video_id, admin.user_id).await.unwrap();

    assert!(matches!(
      sv.complete(running.video_id).await,
      Err(Error::Conflict(_))
    ));
    assert_eq!(
      sv.by_id(video.video_id).await.unwrap().status,
      VideoStatus::Rejected
    );
    assert_eq!(testing::credits(&db, user.user_id).await, 1);
  }

  #[tokio::test]
  async fn test_complete_and_validation() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let lisboa = testing::location(&db, "Lisboa").await;
    Credits::new(&db).set(user.user_id, 5, admin.user_id).await.unwrap();
    let sv = Video::new(&db);

    let mut bad = clip(lisboa.location_id);
    bad.end_time = bad.start_time;
    assert!(matches!(
      sv.request(user.user_id, bad).await,
      Err(Error::Validation(_))
    ));

    let video =
      sv.request(user.user_id, clip(lisboa.location_id)).await.unwrap();
    let video = sv.complete(video.video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Completed);

    assert!(matches!(
      sv.reject(video.video_id, admin.user_id).await,
      Err(Error::Conflict(_))
    ));
    assert!(matches!(
      sv.complete(video.video_id).await,
      Err(Error::Conflict(_))
    ));

    let req = ListReq {
      pagination: Default::default(),
      filters: VideoFilters {
        status: Some(VideoStatus::Completed),
        ..Default::default()
      },
    };
    assert_eq!(sv.list(req).await.unwrap().pagination.total, 1);
  }
}
