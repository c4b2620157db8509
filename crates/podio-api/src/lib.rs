//! JSON REST API for Podio.
//!
//! Exposes an axum [`Router`] backed by any
//! [`podio_core::store::BrokerageStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", podio_api::api_router(store.clone(), scoring.clone(), offset))
//! ```

pub mod commission;
pub mod competition;
pub mod error;
pub mod roster;
pub mod transactions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use chrono::FixedOffset;
use podio_core::{config::ScoringConfig, store::BrokerageStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub scoring:    Arc<ScoringConfig>,
  /// Offset at which "today" is read when deciding which weeks to show.
  pub utc_offset: FixedOffset,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      scoring:    Arc::clone(&self.scoring),
      utc_offset: self.utc_offset,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(
  store: Arc<S>,
  scoring: Arc<ScoringConfig>,
  utc_offset: FixedOffset,
) -> Router<()>
where
  S: BrokerageStore + 'static,
{
  Router::new()
    // Competition
    .route("/competition", get(competition::handler::<S>))
    // Roster
    .route("/roster", get(roster::list::<S>))
    .route(
      "/roster/{agent_id}",
      put(roster::join::<S>)
        .patch(roster::move_one::<S>)
        .delete(roster::deactivate::<S>),
    )
    // Commission
    .route("/commission/preview", post(commission::preview))
    .route("/transactions", post(transactions::close::<S>))
    .route("/transactions/{id}", get(transactions::get_one::<S>))
    .route("/transactions/{id}/commission", post(transactions::recompute::<S>))
    .with_state(AppState { store, scoring, utc_offset })
}

#[cfg(test)]
mod tests;
