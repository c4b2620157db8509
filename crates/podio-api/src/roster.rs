//! Handlers for `/roster` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/roster` | Active members in roster order |
//! | `PUT`    | `/roster/:agent_id` | Body: `{"team":"negro"}`; joins or reactivates |
//! | `PATCH`  | `/roster/:agent_id` | Body: `{"team":"dorado"}`; 404 if not on the roster |
//! | `DELETE` | `/roster/:agent_id` | Soft-deactivate; 404 if not on the roster |

use axum::{
  Json,
  extract::{Path, State},
};
use podio_core::{
  model::{Team, TeamMember},
  store::BrokerageStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TeamBody {
  pub team: Team,
}

fn not_on_roster(agent_id: Uuid) -> ApiError {
  ApiError::NotFound(format!("agent {agent_id} is not on the roster"))
}

/// `GET /roster`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<TeamMember>>, ApiError>
where
  S: BrokerageStore,
{
  let roster = state.store.active_roster().await.map_err(ApiError::store)?;
  Ok(Json(roster))
}

/// `PUT /roster/:agent_id`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  Path(agent_id): Path<Uuid>,
  Json(body): Json<TeamBody>,
) -> Result<Json<TeamMember>, ApiError>
where
  S: BrokerageStore,
{
  let member = state
    .store
    .upsert_member(agent_id, body.team)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%agent_id, team = %member.team, "member joined");
  Ok(Json(member))
}

/// `PATCH /roster/:agent_id`
pub async fn move_one<S>(
  State(state): State<AppState<S>>,
  Path(agent_id): Path<Uuid>,
  Json(body): Json<TeamBody>,
) -> Result<Json<TeamMember>, ApiError>
where
  S: BrokerageStore,
{
  let member = state
    .store
    .move_member(agent_id, body.team)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_on_roster(agent_id))?;
  tracing::info!(%agent_id, team = %member.team, "member moved");
  Ok(Json(member))
}

/// `DELETE /roster/:agent_id`
pub async fn deactivate<S>(
  State(state): State<AppState<S>>,
  Path(agent_id): Path<Uuid>,
) -> Result<Json<TeamMember>, ApiError>
where
  S: BrokerageStore,
{
  let member = state
    .store
    .deactivate_member(agent_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_on_roster(agent_id))?;
  tracing::info!(%agent_id, "member deactivated");
  Ok(Json(member))
}
