//! Season configuration for the competition: point values, perfect-week
//! thresholds, and which activities qualify a referral.
//!
//! A [`ScoringConfig`] is an immutable value handed to
//! [`crate::engine::compute`] on every call. Two seasons with different point
//! tables can be scored side by side without interfering.

use serde::{Deserialize, Serialize};

use crate::model::ActivityType;

/// Flat per-occurrence point values for each scoring category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointTable {
  pub green_meeting:    i64,
  pub pre_listing:      i64,
  pub pre_buying:       i64,
  pub listing:          i64,
  pub showing:          i64,
  /// Closings are scored per side, not per transaction.
  pub closing_per_side: i64,
  /// Awarded once per credited `(agent, person)` referral.
  pub referral_bonus:   i64,
  pub new_contact:      i64,
  pub new_search:       i64,
}

impl Default for PointTable {
  fn default() -> Self {
    Self {
      green_meeting:    5,
      pre_listing:      40,
      pre_buying:       40,
      listing:          50,
      showing:          10,
      closing_per_side: 30,
      referral_bonus:   100,
      new_contact:      2,
      new_search:       3,
    }
  }
}

impl PointTable {
  /// Points for one logged activity of the given type. `Referred` is worth
  /// nothing on its own; it only feeds the referral bonus.
  pub fn for_activity(&self, activity_type: ActivityType) -> i64 {
    match activity_type {
      ActivityType::GreenMeeting => self.green_meeting,
      ActivityType::PreListing => self.pre_listing,
      ActivityType::PreBuying => self.pre_buying,
      ActivityType::Listing => self.listing,
      ActivityType::Showing => self.showing,
      ActivityType::Referred => 0,
    }
  }
}

/// Global thresholds for a perfect week. The pre-listing targets are personal
/// and come from each agent's objective instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfectWeekRules {
  pub green_meetings: u32,
  pub referred:       u32,
  pub bonus:          i64,
}

impl Default for PerfectWeekRules {
  fn default() -> Self { Self { green_meetings: 15, referred: 2, bonus: 200 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub points:              PointTable,
  pub perfect_week:        PerfectWeekRules,
  /// Activity types that, tagged with the same person as a `referred`
  /// activity, trigger the referral bonus.
  pub referral_qualifying: [ActivityType; 3],
  /// Year whose objectives drive the perfect-week check. `None` means the
  /// year of the range's end date.
  pub objective_year:      Option<i32>,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      points:              PointTable::default(),
      perfect_week:        PerfectWeekRules::default(),
      referral_qualifying: [
        ActivityType::PreListing,
        ActivityType::PreBuying,
        ActivityType::Listing,
      ],
      objective_year:      None,
    }
  }
}

impl ScoringConfig {
  pub fn qualifies_referral(&self, activity_type: ActivityType) -> bool {
    self.referral_qualifying.contains(&activity_type)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_override_keeps_other_defaults() {
    let cfg: ScoringConfig =
      serde_json::from_str(r#"{"points":{"pre_listing":55}}"#).unwrap();
    assert_eq!(cfg.points.pre_listing, 55);
    assert_eq!(cfg.points.closing_per_side, 30);
    assert_eq!(cfg.perfect_week, PerfectWeekRules::default());
  }

  #[test]
  fn referred_scores_nothing_by_itself() {
    let points = PointTable::default();
    assert_eq!(points.for_activity(ActivityType::Referred), 0);
    assert_eq!(points.for_activity(ActivityType::PreListing), 40);
  }
}
