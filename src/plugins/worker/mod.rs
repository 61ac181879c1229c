//! Video companion: accepts clip jobs, runs the extraction script for each
//! one, and streams the finished files.

mod queue;
mod stream;

use std::{net::SocketAddr, path::PathBuf, process::Stdio, sync::Arc};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use json::json;
use tokio::{process::Command, sync::Notify};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use queue::ScriptJob;
use queue::{Job, JobStatus, Queue};

use crate::{
  entity::VideoStatus,
  prelude::*,
  state::{AppState, Config},
};

struct Worker {
  app: Arc<AppState>,
  queue: Queue,
  wake: Notify,
}

impl Worker {
  fn config(&self) -> &Config {
    &self.app.config
  }

  fn command(&self, job: &ScriptJob) -> Command {
    let config = self.config();
    let mut cmd = Command::new(&config.video_interpreter);
    cmd
      .arg(&config.video_script)
      .arg(&job.start)
      .arg(&job.end)
      .arg(&job.court)
      .arg(job.video_id.to_string())
      .stdin(Stdio::null())
      .kill_on_drop(true);
    cmd
  }

  async fn execute(&self, job: &ScriptJob) -> Result<(), String> {
    let output = self
      .command(job)
      .output()
      .await
      .map_err(|err| format!("Failed to spawn script: {err}"))?;

    if output.status.success() {
      return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: String = stderr.trim().lines().last().unwrap_or_default().into();
    Err(format!("Script exited with {}: {tail}", output.status))
  }

  async fn set_status(&self, video_id: i32, status: VideoStatus) {
    let res = match status {
      VideoStatus::Completed => self.app.sv().video.complete(video_id).await,
      status => self.app.sv().video.mark(video_id, status).await,
    };
    if let Err(err) = res {
      warn!("Failed to mark video {video_id} as {}: {err}", status.as_str());
    }
  }

  async fn persist(&self) {
    if let Err(err) = self.queue.save().await {
      error!("Failed to persist job queue: {err:#}");
    }
  }

  async fn run(&self, id: &str) {
    let Some(job) = self.queue.begin(id) else {
      return;
    };
    let video_id = job.script.video_id;
    info!("Running job {id} for video {video_id} (attempt {})", job.attempts);

    match self.app.sv().video.mark(video_id, VideoStatus::Processing).await {
      Ok(_) => {}
      Err(err @ (Error::Conflict(_) | Error::NotFound(_))) => {
        warn!("Dropping job {id}: {err}");
        self.queue.abandon(id, err.to_string());
        self.persist().await;
        return;
      }
      Err(err) => {
        warn!("Failed to mark video {video_id} as processing: {err}");
      }
    }

    let outcome = self.execute(&job.script).await;
    if let Err(err) = &outcome {
      warn!("Job {id} failed: {err}");
    }

    match self.queue.finish(id, outcome) {
      Some(JobStatus::Completed) => {
        self.set_status(video_id, VideoStatus::Completed).await;
      }
      Some(JobStatus::Failed) => {
        error!("Job {id} gave up after {} attempts", job.attempts);
        self.set_status(video_id, VideoStatus::Failed).await;
      }
      _ => {}
    }

    self.persist().await;
  }

  async fn sweep(&self) {
    let due = self.queue.due();
    if !due.is_empty() {
      debug!("Sweeping {} due job(s)", due.len());
    }
    for id in due {
      self.run(&id).await;
    }
  }
}

async fn script(
  State(worker): State<Arc<Worker>>,
  Json(job): Json<ScriptJob>,
) -> Response {
  if job.video_id <= 0 || utils::is_blank(Some(job.court.as_str())) {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({ "status": false, "message": "Invalid job" })),
    )
      .into_response();
  }

  match worker.queue.push(job).await {
    Ok(job_id) => {
      worker.wake.notify_one();
      Json(json!({ "status": true, "jobId": job_id })).into_response()
    }
    Err(err) => {
      error!("Failed to enqueue job: {err:#}");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": false, "message": "Failed to enqueue job" })),
      )
        .into_response()
    }
  }
}

async fn status(
  State(worker): State<Arc<Worker>>,
  Path(job_id): Path<String>,
) -> Result<Json<Job>, (StatusCode, &'static str)> {
  worker
    .queue
    .get(&job_id)
    .map(Json)
    .ok_or((StatusCode::NOT_FOUND, "Job not found"))
}

async fn video(
  State(worker): State<Arc<Worker>>,
  Path(video_id): Path<i32>,
  headers: HeaderMap,
) -> Result<Response, (StatusCode, &'static str)> {
  let path: PathBuf =
    worker.config().videos_dir.join(format!("{video_id}.mp4"));
  stream::serve(&path, &headers).await
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let config = &app.config;
    let queue = Queue::load(&config.jobs_file, config.max_attempts).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_port));
    let interval = config.sweep_interval;

    let worker =
      Arc::new(Worker { app: app.clone(), queue, wake: Notify::new() });

    let router = Router::new()
      .route("/script", post(script))
      .route("/status/{job_id}", get(status))
      .route("/stream/{video_id}", get(video))
      .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
      .with_state(worker.clone());

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Video worker listening on {addr}");

    let sweeper = async {
      let mut ticker = time::interval(interval);
      loop {
        tokio::select! {
          _ = ticker.tick() => {}
          _ = worker.wake.notified() => {}
        }
        worker.sweep().await;
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Worker server error")
    };

    tokio::select! {
      result = server => result,
      _ = sweeper => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::video_processed,
    sv::{Credits, testing, video::VideoRequest},
  };

  async fn worker(dir: &std::path::Path) -> Worker {
    let config = Config {
      database_url: String::from("sqlite::memory:"),
      jwt_secret: String::from("secret"),
      jobs_file: dir.join("jobs.json"),
      videos_dir: dir.join("videos"),
      video_interpreter: dir.join("missing-interpreter").display().to_string(),
      ..Config::default()
    };
    let app = Arc::new(AppState::new(config).await.unwrap());
    let queue = Queue::load(dir.join("jobs.json"), 5).await.unwrap();
    Worker { app, queue, wake: Notify::new() }
  }

  /// A pending clip and the admin who can reject it.
  async fn requested(worker: &Worker) -> (video_processed::Model, i32) {
    let db = &worker.app.db;
    let admin = testing::admin(db).await;
    let user = testing::user(db, "ana@club.pt").await;
    let lisboa = testing::location(db, "Lisboa").await;
    Credits::new(db).set(user.user_id, 1, admin.user_id).await.unwrap();

    let req = VideoRequest {
      location_id: lisboa.location_id,
      court: String::from("Campo 1"),
      date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
      start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
      end_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
    };
    let video = worker.app.sv().video.request(user.user_id, req).await.unwrap();
    (video, admin.user_id)
  }

  #[tokio::test]
  async fn test_rejected_video_is_not_run() {
    let dir = tempfile::tempdir().unwrap();
    let worker = worker(dir.path()).await;
    let (video, admin) = requested(&worker).await;

    let id = worker.queue.push(ScriptJob::new(&video)).await.unwrap();
    worker.app.sv().video.reject(video.video_id, admin).await.unwrap();

    worker.run(&id).await;

    let job = worker.queue.get(&id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.attempts, 1);
    assert!(job.last_error.unwrap().contains("rejected"));

    let video = worker.app.sv().video.by_id(video.video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Rejected);
  }

  #[tokio::test]
  async fn test_failed_run_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let worker = worker(dir.path()).await;
    let (video, _) = requested(&worker).await;

    let id = worker.queue.push(ScriptJob::new(&video)).await.unwrap();
    worker.run(&id).await;

    let job = worker.queue.get(&id).unwrap();
    assert_eq!(job.status, JobStatus::Retrying);
    assert!(job.last_error.unwrap().contains("Failed to spawn script"));

    let video = worker.app.sv().video.by_id(video.video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Processing);
  }
}
