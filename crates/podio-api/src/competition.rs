//! Handler for `GET /competition`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/competition` | `?start=YYYY-MM-DD&end=YYYY-MM-DD`, both inclusive |
//!
//! The response carries a strong `ETag` over the loaded inputs, the scoring
//! rules and the evaluation day; a matching `If-None-Match` yields
//! `304 Not Modified`. The evaluation day is taken at the router's
//! configured UTC offset.

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use podio_core::{
  config::ScoringConfig,
  engine::{self, CompetitionSnapshot},
  model::{CrmEventKind, DateRange},
  store::BrokerageStore,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

/// Read everything the engine needs for `range`.
///
/// The roster comes first since every other read is keyed on its agent ids;
/// the rest run concurrently and the first failure aborts the whole load.
pub async fn load_snapshot<S>(
  store: &S,
  range: DateRange,
  scoring: &ScoringConfig,
) -> Result<CompetitionSnapshot, S::Error>
where
  S: BrokerageStore,
{
  let roster = store.active_roster().await?;
  let ids: Vec<Uuid> = roster.iter().map(|m| m.agent_id).collect();
  let (from, to) = range.timestamp_bounds();
  let year = scoring.objective_year.unwrap_or(range.end.year());

  let (profiles, activities, transactions, contacts, searches, objectives) = tokio::try_join!(
    store.profiles(&ids),
    store.activities(&ids, range),
    store.transactions(&ids, range),
    store.crm_events(CrmEventKind::NewContact, &ids, from, to),
    store.crm_events(CrmEventKind::NewSearch, &ids, from, to),
    store.objectives(year),
  )?;

  let mut crm_events = contacts;
  crm_events.extend(searches);

  Ok(CompetitionSnapshot {
    range,
    roster,
    profiles,
    activities,
    transactions,
    crm_events,
    objectives,
  })
}

/// Strong ETag over the serialized snapshot, the scoring rules it is scored
/// with, and the day it was evaluated on.
pub fn snapshot_etag(
  snapshot: &CompetitionSnapshot,
  scoring: &ScoringConfig,
  today: NaiveDate,
) -> Result<String, ApiError> {
  let mut hasher = Sha256::new();
  hasher.update(serde_json::to_vec(snapshot)?);
  hasher.update(serde_json::to_vec(scoring)?);
  hasher.update(today.to_string().as_bytes());
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// The calendar day `now` falls on at `offset`. Weeks whose Monday is after
/// this day are left out of the result.
pub fn evaluation_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
  now.with_timezone(&offset).date_naive()
}

/// `GET /competition?start=<date>&end=<date>`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<RangeParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: BrokerageStore,
{
  let range = DateRange::new(params.start, params.end)?;
  let today = evaluation_day(Utc::now(), state.utc_offset);

  let snapshot = load_snapshot(state.store.as_ref(), range, &state.scoring)
    .await
    .map_err(ApiError::store)?;
  let etag = snapshot_etag(&snapshot, &state.scoring, today)?;

  let unchanged = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"));

  if unchanged {
    tracing::debug!(start = %range.start, end = %range.end, "competition unchanged");
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let data = engine::compute(&snapshot, &state.scoring, today);
  tracing::info!(
    start = %range.start,
    end = %range.end,
    members = data.members.len(),
    weeks = data.weekly_results.len(),
    negro = data.negro.total_points,
    dorado = data.dorado.total_points,
    "competition computed"
  );

  Ok(([(header::ETAG, etag)], Json(data)).into_response())
}
