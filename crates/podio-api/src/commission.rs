//! Handler for `POST /commission/preview` and the range checks shared with
//! the transaction endpoints.
//!
//! The split itself never validates its inputs, so this layer does.

use axum::Json;
use podio_core::commission::{CommissionInput, CommissionSplit};

use crate::error::ApiError;

fn check_percentage(name: &str, value: f64) -> Result<(), ApiError> {
  if (0.0..=100.0).contains(&value) {
    Ok(())
  } else {
    Err(ApiError::BadRequest(format!("{name} must be within 0..=100, got {value}")))
  }
}

/// Reject inputs outside `actual_price >= 0` and percentages in `0..=100`.
pub fn validate(input: &CommissionInput) -> Result<(), ApiError> {
  if input.actual_price.is_nan() || input.actual_price < 0.0 {
    return Err(ApiError::BadRequest(format!(
      "actual_price must be non-negative, got {}",
      input.actual_price
    )));
  }
  check_percentage("commission_percentage", input.commission_percentage)?;
  check_percentage("agent_split_percentage", input.agent_split_percentage)?;
  check_percentage("royalty_percentage", input.royalty_percentage)?;
  Ok(())
}

/// `POST /commission/preview`. Body: [`CommissionInput`]; nothing is stored.
pub async fn preview(
  Json(input): Json<CommissionInput>,
) -> Result<Json<CommissionSplit>, ApiError> {
  validate(&input)?;
  Ok(Json(CommissionSplit::compute(&input)))
}
