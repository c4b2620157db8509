//! HTTP server wiring for Podio: configuration and the top-level router.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use chrono::FixedOffset;
use podio_core::{config::ScoringConfig, store::BrokerageStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PODIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Minutes east of UTC at which the brokerage's "today" is read.
  #[serde(default)]
  pub utc_offset_minutes: i32,
  #[serde(default)]
  pub scoring:            ScoringConfig,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `PODIO_*` variables.
  pub fn load(path: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PODIO"))
      .build()?
      .try_deserialize()
  }

  /// `utc_offset_minutes` as a chrono offset; `None` if out of range.
  pub fn utc_offset(&self) -> Option<FixedOffset> {
    FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The JSON API under `/api`, with request tracing.
pub fn router<S>(
  store: Arc<S>,
  scoring: Arc<ScoringConfig>,
  utc_offset: FixedOffset,
) -> Router
where
  S: BrokerageStore + 'static,
{
  Router::new()
    .nest("/api", podio_api::api_router(store, scoring, utc_offset))
    .layer(TraceLayer::new_for_http())
}
