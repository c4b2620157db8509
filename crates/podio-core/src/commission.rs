//! Three-way commission split: network royalty, agent payout, office
//! residual.
//!
//! The office share is always the remainder of the gross after the other two
//! parts, so `master + agent + office == gross` holds no matter how the
//! percentages round.

use serde::{Deserialize, Serialize};

use crate::model::Sides;

/// Inputs for a split. Percentages are on a `0..=100` scale; range checks
/// belong to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionInput {
  pub actual_price:           f64,
  pub sides:                  Sides,
  pub commission_percentage:  f64,
  pub agent_split_percentage: f64,
  pub royalty_percentage:     f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSplit {
  pub gross_commission: f64,
  /// Network royalty.
  pub master_amount:    f64,
  pub agent_amount:     f64,
  pub office_amount:    f64,
}

impl CommissionSplit {
  pub fn compute(input: &CommissionInput) -> Self {
    let gross = input.actual_price
      * (input.commission_percentage / 100.0)
      * f64::from(input.sides.get());
    let master = gross * (input.royalty_percentage / 100.0);
    let agent = gross * (input.agent_split_percentage / 100.0);

    Self {
      gross_commission: gross,
      master_amount:    master,
      agent_amount:     agent,
      office_amount:    gross - master - agent,
    }
  }
}

/// Free-function form of [`CommissionSplit::compute`].
pub fn split(
  actual_price: f64,
  sides: Sides,
  commission_percentage: f64,
  agent_split_percentage: f64,
  royalty_percentage: f64,
) -> CommissionSplit {
  CommissionSplit::compute(&CommissionInput {
    actual_price,
    sides,
    commission_percentage,
    agent_split_percentage,
    royalty_percentage,
  })
}

/// What gets persisted onto a transaction row: the split plus the royalty
/// rate it was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
  #[serde(flatten)]
  pub split:                         CommissionSplit,
  pub royalty_percentage_at_closure: f64,
}

impl CommissionRecord {
  pub fn compute(input: &CommissionInput) -> Self {
    Self {
      split:                         CommissionSplit::compute(input),
      royalty_percentage_at_closure: input.royalty_percentage,
    }
  }
}
