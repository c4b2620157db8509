//! Handlers for `/transactions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/transactions` | Body: [`NewTransaction`]; splits with the office's current royalty; 201 |
//! | `GET`  | `/transactions/:id` | 404 if not found |
//! | `POST` | `/transactions/:id/commission` | Body: [`RecomputeBody`]; re-splits and stores |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use podio_core::{
  commission::{CommissionInput, CommissionRecord},
  model::{NewTransaction, Organization, Transaction},
  store::BrokerageStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, commission::validate, error::ApiError};

async fn organization<S>(store: &S, organization_id: Uuid) -> Result<Organization, ApiError>
where
  S: BrokerageStore,
{
  store
    .get_organization(organization_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("unknown organization {organization_id}"))
    })
}

// ─── Close ────────────────────────────────────────────────────────────────────

/// `POST /transactions`
pub async fn close<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewTransaction>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BrokerageStore,
{
  let org = organization(state.store.as_ref(), body.organization_id).await?;

  let input = CommissionInput {
    actual_price:           body.actual_price,
    sides:                  body.sides,
    commission_percentage:  body.commission_percentage,
    agent_split_percentage: body.agent_split_percentage,
    royalty_percentage:     org.royalty_percentage,
  };
  validate(&input)?;
  let record = CommissionRecord::compute(&input);

  let tx = state
    .store
    .record_transaction(body, record)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    transaction_id = %tx.transaction_id,
    agent_id = %tx.agent_id,
    gross = tx.gross_commission,
    "transaction closed"
  );
  Ok((StatusCode::CREATED, Json(tx)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /transactions/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError>
where
  S: BrokerageStore,
{
  let tx = state
    .store
    .get_transaction(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;
  Ok(Json(tx))
}

// ─── Recompute ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RecomputeBody {
  /// Royalty to split with. Defaults to the organization's current rate.
  #[serde(default)]
  pub royalty_percentage: Option<f64>,
}

/// `POST /transactions/:id/commission`
///
/// Price, sides and the commission and agent percentages come from the stored
/// transaction; only the royalty may be overridden.
pub async fn recompute<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RecomputeBody>,
) -> Result<Json<Transaction>, ApiError>
where
  S: BrokerageStore,
{
  let tx = state
    .store
    .get_transaction(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;

  let royalty = match body.royalty_percentage {
    Some(rate) => rate,
    None => {
      organization(state.store.as_ref(), tx.organization_id)
        .await?
        .royalty_percentage
    }
  };

  let input = CommissionInput {
    actual_price:           tx.actual_price,
    sides:                  tx.sides,
    commission_percentage:  tx.commission_percentage,
    agent_split_percentage: tx.agent_split_percentage,
    royalty_percentage:     royalty,
  };
  validate(&input)?;

  let updated = state
    .store
    .record_commission(id, CommissionRecord::compute(&input))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;
  tracing::info!(transaction_id = %id, royalty, "commission recomputed");
  Ok(Json(updated))
}
