//! Work queue persisted as one JSON object keyed by job id.

use std::{
  collections::BTreeMap,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{entity::video_processed, prelude::*};

/// Clip to cut: court and the recording window as `%Y-%m-%d %H:%M:%S`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptJob {
  pub video_id: i32,
  pub court: String,
  pub start: String,
  pub end: String,
}

impl ScriptJob {
  pub fn new(video: &video_processed::Model) -> Self {
    let at = |time: NaiveTime| {
      video.recorded_on.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string()
    };

    Self {
      video_id: video.video_id,
      court: video.court.clone(),
      start: at(video.start_time),
      end: at(video.end_time),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Pending,
  Processing,
  Completed,
  Failed,
  Retrying,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  #[serde(flatten)]
  pub script: ScriptJob,
  pub status: JobStatus,
  pub attempts: u32,
  pub last_error: Option<String>,
  pub updated_at: DateTime,
}

impl Job {
  fn is_due(&self) -> bool {
    matches!(self.status, JobStatus::Pending | JobStatus::Retrying)
  }
}

pub struct Queue {
  path: PathBuf,
  max_attempts: u32,
  jobs: DashMap<String, Job>,
  write: Mutex<()>,
}

impl Queue {
  /// Reads the queue file, starting empty when it does not exist yet. Jobs
  /// caught mid-run by a restart are queued for another attempt.
  pub async fn load(
    path: impl AsRef<Path>,
    max_attempts: u32,
  ) -> anyhow::Result<Self> {
    let path = path.as_ref().to_path_buf();

    let jobs: BTreeMap<String, Job> = match tokio::fs::read(&path).await {
      Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
      Ok(raw) => json::from_slice(&raw)
        .with_context(|| format!("Malformed job file {}", path.display()))?,
      Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
      Err(err) => {
        return Err(err)
          .with_context(|| format!("Failed to read {}", path.display()));
      }
    };

    let jobs: DashMap<String, Job> = jobs
      .into_iter()
      .map(|(id, mut job)| {
        if job.status == JobStatus::Processing {
          job.status = JobStatus::Retrying;
        }
        (id, job)
      })
      .collect();

    info!("Loaded {} video job(s) from {}", jobs.len(), path.display());
    Ok(Self { path, max_attempts, jobs, write: Mutex::new(()) })
  }

  pub async fn save(&self) -> anyhow::Result<()> {
    let _guard = self.write.lock().await;

    let snapshot: BTreeMap<String, Job> = self
      .jobs
      .iter()
      .map(|job| (job.key().clone(), job.value().clone()))
      .collect();
    let raw = json::to_vec_pretty(&snapshot)?;

    let tmp = self.path.with_extension("tmp");
    tokio::fs::write(&tmp, raw)
      .await
      .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, &self.path)
      .await
      .with_context(|| format!("Failed to replace {}", self.path.display()))?;
    Ok(())
  }

  pub async fn push(&self, script: ScriptJob) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let job = Job {
      script,
      status: JobStatus::Pending,
      attempts: 0,
      last_error: None,
      updated_at: utils::now(),
    };

    self.jobs.insert(id.clone(), job);
    self.save().await?;
    Ok(id)
  }

  pub fn get(&self, id: &str) -> Option<Job> {
    self.jobs.get(id).map(|job| job.value().clone())
  }

  /// Ids waiting for a run, oldest first.
  pub fn due(&self) -> Vec<String> {
    let mut due: Vec<(DateTime, String)> = self
      .jobs
      .iter()
      .filter(|job| job.is_due())
      .map(|job| (job.updated_at, job.key().clone()))
      .collect();
    due.sort();
    due.into_iter().map(|(_, id)| id).collect()
  }

  /// Claims a due job for a run. `None` if it is gone or not due anymore.
  pub fn begin(&self, id: &str) -> Option<Job> {
    let mut job = self.jobs.get_mut(id)?;
    if !job.is_due() {
      return None;
    }

    job.status = JobStatus::Processing;
    job.attempts += 1;
    job.updated_at = utils::now();
    Some(job.value().clone())
  }

  /// Records the outcome of a run. A failed run is retried until the job has
  /// used up its attempts.
  pub fn finish(
    &self,
    id: &str,
    outcome: Result<(), String>,
  ) -> Option<JobStatus> {
    let mut job = self.jobs.get_mut(id)?;

    job.status = match outcome {
      Ok(()) => {
        job.last_error = None;
        JobStatus::Completed
      }
      Err(err) => {
        job.last_error = Some(err);
        if job.attempts >= self.max_attempts {
          JobStatus::Failed
        } else {
          JobStatus::Retrying
        }
      }
    };
    job.updated_at = utils::now();
    Some(job.status)
  }

  /// Gives up on a job without spending its remaining attempts.
  pub fn abandon(&self, id: &str, reason: String) -> Option<JobStatus> {
    let mut job = self.jobs.get_mut(id)?;
    job.status = JobStatus::Failed;
    job.last_error = Some(reason);
    job.updated_at = utils::now();
    Some(job.status)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn script(video_id: i32) -> ScriptJob {
    ScriptJob {
      video_id,
      court: String::from("Campo 1"),
      start: String::from("2024-09-14 18:00:00"),
      end: String::from("2024-09-14 18:30:00"),
    }
  }

  #[tokio::test]
  async fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let queue = Queue::load(dir.path().join("jobs.json"), 5).await.unwrap();
    assert!(queue.due().is_empty());
  }

  #[tokio::test]
  async fn test_retry_until_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let queue = Queue::load(dir.path().join("jobs.json"), 2).await.unwrap();

    let id = queue.push(script(1)).await.unwrap();
    assert_eq!(queue.due(), vec![id.clone()]);

    queue.begin(&id).unwrap();
    assert!(queue.begin(&id).is_none());
    assert_eq!(
      queue.finish(&id, Err(String::from("exit 1"))),
      Some(JobStatus::Retrying)
    );

    let job = queue.begin(&id).unwrap();
    assert_eq!(job.attempts, 2);
    assert_eq!(
      queue.finish(&id, Err(String::from("exit 1"))),
      Some(JobStatus::Failed)
    );
    assert!(queue.due().is_empty());
    assert_eq!(queue.get(&id).unwrap().last_error.as_deref(), Some("exit 1"));
  }

  #[tokio::test]
  async fn test_reload_requeues_interrupted_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.json");

    let queue = Queue::load(&path, 5).await.unwrap();
    let done = queue.push(script(1)).await.unwrap();
    let running = queue.push(script(2)).await.unwrap();

    queue.begin(&done).unwrap();
    queue.finish(&done, Ok(()));
    queue.begin(&running).unwrap();
    queue.save().await.unwrap();

    let queue = Queue::load(&path, 5).await.unwrap();
    assert_eq!(queue.get(&done).unwrap().status, JobStatus::Completed);
    assert_eq!(queue.get(&running).unwrap().status, JobStatus::Retrying);
    assert_eq!(queue.due(), vec![running]);
  }

  #[tokio::test]
  async fn test_abandon_skips_retries() {
    let dir = tempfile::tempdir().unwrap();
    let queue = Queue::load(dir.path().join("jobs.json"), 5).await.unwrap();

    let id = queue.push(script(3)).await.unwrap();
    queue.begin(&id).unwrap();
    assert_eq!(
      queue.abandon(&id, String::from("Video 3 is already rejected")),
      Some(JobStatus::Failed)
    );

    assert!(queue.due().is_empty());
    assert_eq!(queue.get(&id).unwrap().attempts, 1);
    assert!(queue.abandon("unknown", String::new()).is_none());
  }

  #[test]
  fn test_job_file_layout() {
    let job = Job {
      script: script(7),
      status: JobStatus::Pending,
      attempts: 0,
      last_error: None,
      updated_at: utils::now(),
    };

    let value = json::to_value(&job).unwrap();
    assert_eq!(value["videoId"], 7);
    assert_eq!(value["status"], "pending");
    assert_eq!(value["court"], "Campo 1");
  }

  #[test]
  fn test_script_job_times() {
    let video = video_processed::Model {
      video_id: 12,
      user_id: 1,
      location_id: 1,
      court: String::from("Campo 2"),
      recorded_on: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
      start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
      end_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
      status: crate::entity::VideoStatus::Pending,
      created_at: utils::now(),
    };

    let job = ScriptJob::new(&video);
    assert_eq!(job.start, "2024-09-14 18:00:00");
    assert_eq!(job.end, "2024-09-14 18:30:00");
    assert_eq!(job.court, "Campo 2");
  }
}
