mod acessos;
mod articles;
mod auth;
mod dashboard;
mod discount;
mod extract;
mod store;
mod video;
mod vouchers;

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState, sv::BatchResult};

pub use extract::{Admin, AuthUser};

type Routes = Router<Arc<AppState>>;

/// Success envelope shared by every mutating endpoint.
#[derive(Debug, Serialize)]
pub struct Reply<T> {
  pub status: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Reply<T>> {
  Json(Reply { status: true, message: None, data: Some(data) })
}

pub fn done<T: Serialize>(
  message: impl Into<String>,
  data: T,
) -> Json<Reply<T>> {
  Json(Reply { status: true, message: Some(message.into()), data: Some(data) })
}

pub fn message(message: impl Into<String>) -> Json<Reply<()>> {
  Json(Reply { status: true, message: Some(message.into()), data: None })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReply {
  pub status: bool,
  pub message: String,
  pub success_count: usize,
  pub failed_count: usize,
  pub successful_ids: Vec<i32>,
  pub failed_ids: Vec<i32>,
  pub skipped_ids: Vec<i32>,
}

impl BatchReply {
  pub fn new(result: BatchResult, success: &str, skipped: &str) -> Json<Self> {
    let (status, message) = if !result.is_clean() {
      (false, format!("Failed for ids: {}", utils::join_ids(&result.failed)))
    } else if result.all_skipped() {
      (false, skipped.to_string())
    } else {
      (true, success.to_string())
    };

    Json(Self {
      status,
      message,
      success_count: result.succeeded.len(),
      failed_count: result.failed.len(),
      successful_ids: result.succeeded,
      failed_ids: result.failed,
      skipped_ids: result.skipped,
    })
  }
}

async fn health() -> &'static str {
  "OK"
}

pub fn api() -> Routes {
  Router::new()
    .nest("/auth", auth::router())
    .nest("/acessos", acessos::router())
    .nest("/dashboard", dashboard::router())
    .nest("/vouchers", vouchers::router())
    .nest("/offpeak", discount::offpeak::router())
    .nest("/offpick", discount::offpick::router())
    .nest("/orders", store::router())
    .nest("/articles", articles::router())
    .nest("/video", video::router())
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let port = app.config.port;

    let router = Router::new()
      .route("/health", get(health))
      .nest("/api", api())
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .with_state(app)
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}
