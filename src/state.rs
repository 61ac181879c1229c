use std::{env, path::PathBuf, str::FromStr};

use migration::Migrator;

use crate::{auth::Keys, prelude::*, sv};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub jwt_secret: String,
  pub port: u16,
  pub token_ttl: Duration,
  pub entry_cooldown: Duration,

  pub video_service_url: String,
  pub video_worker: bool,
  pub worker_port: u16,
  pub videos_dir: PathBuf,
  pub jobs_file: PathBuf,
  pub sweep_interval: Duration,
  pub max_attempts: u32,
  pub video_interpreter: String,
  pub video_script: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:padel.db?mode=rwc"),
      jwt_secret: String::new(),
      port: 5005,
      token_ttl: Duration::from_secs(8 * 3600),
      entry_cooldown: Duration::from_secs(10 * 60),

      video_service_url: String::from("http://127.0.0.1:3010"),
      video_worker: false,
      worker_port: 3010,
      videos_dir: PathBuf::from("videos"),
      jobs_file: PathBuf::from("execution_status.json"),
      sweep_interval: Duration::from_secs(5 * 60),
      max_attempts: 5,
      video_interpreter: String::from("python"),
      video_script: String::from("/www/padel/padel.py"),
    }
  }
}

fn var<T: FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|err| anyhow::anyhow!("Invalid value for {key}: {err}")),
    _ => Ok(None),
  }
}

fn duration(key: &str) -> anyhow::Result<Option<Duration>> {
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => humantime::parse_duration(raw.trim())
      .map(Some)
      .with_context(|| format!("Invalid duration for {key}")),
    _ => Ok(None),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let default = Self::default();

    let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;
    if jwt_secret.trim().is_empty() {
      anyhow::bail!("JWT_SECRET must not be empty");
    }

    Ok(Self {
      database_url: var("DATABASE_URL")?.unwrap_or(default.database_url),
      jwt_secret,
      port: var("PORT")?.unwrap_or(default.port),
      token_ttl: duration("TOKEN_TTL")?.unwrap_or(default.token_ttl),
      entry_cooldown: duration("ENTRY_COOLDOWN")?
        .unwrap_or(default.entry_cooldown),

      video_service_url: var("VIDEO_SERVICE_URL")?
        .unwrap_or(default.video_service_url),
      video_worker: var("VIDEO_WORKER")?.unwrap_or(default.video_worker),
      worker_port: var("WORKER_PORT")?.unwrap_or(default.worker_port),
      videos_dir: var("VIDEOS_DIR")?.unwrap_or(default.videos_dir),
      jobs_file: var("JOBS_FILE")?.unwrap_or(default.jobs_file),
      sweep_interval: duration("SWEEP_INTERVAL")?
        .unwrap_or(default.sweep_interval),
      max_attempts: var("MAX_ATTEMPTS")?.unwrap_or(default.max_attempts),
      video_interpreter: var("VIDEO_INTERPRETER")?
        .unwrap_or(default.video_interpreter),
      video_script: var("VIDEO_SCRIPT")?.unwrap_or(default.video_script),
    })
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub entry: sv::Entry<'a>,
  pub card: sv::Card<'a>,
  pub voucher: sv::Voucher<'a>,
  pub credits: sv::Credits<'a>,
  pub video: sv::Video<'a>,
  pub offpeak: sv::Offpeak<'a>,
  pub offpick: sv::Offpick<'a>,
  pub product: sv::Product<'a>,
  pub order: sv::Order<'a>,
  pub article: sv::Article<'a>,
  pub settings: sv::Settings<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub keys: Keys,
  pub http: reqwest::Client,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      db,
      keys: Keys::new(&config.jwt_secret, config.token_ttl),
      http,
      config,
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      entry: sv::Entry::new(&self.db, self.config.entry_cooldown),
      card: sv::Card::new(&self.db),
      voucher: sv::Voucher::new(&self.db),
      credits: sv::Credits::new(&self.db),
      video: sv::Video::new(&self.db),
      offpeak: sv::Offpeak::new(&self.db),
      offpick: sv::Offpick::new(&self.db),
      product: sv::Product::new(&self.db),
      order: sv::Order::new(&self.db),
      article: sv::Article::new(&self.db),
      settings: sv::Settings::new(&self.db),
    }
  }

  pub async fn close(&self) -> anyhow::Result<()> {
    self.db.clone().close().await.context("Failed to close database pool")
  }
}
