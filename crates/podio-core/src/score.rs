//! Derived competition results. Never stored, always recomputed.
//!
//! Field names serialise in camelCase because these types are the response
//! body consumed by the dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  config::ScoringConfig,
  model::{ActivityType, CrmEventKind, DateRange, Sides, Team},
};

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Raw per-category occurrence counts for one agent over some window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
  pub green_meetings:   u32,
  pub pre_listings:     u32,
  pub pre_buyings:      u32,
  pub listings:         u32,
  pub showings:         u32,
  pub referred:         u32,
  /// Number of closed transactions.
  pub closings:         u32,
  /// Sum of sides across those transactions.
  pub sides:            u32,
  pub new_contacts:     u32,
  pub new_searches:     u32,
  pub referral_bonuses: u32,
  pub perfect_weeks:    u32,
}

impl ActivityCounts {
  pub fn record_activity(&mut self, activity_type: ActivityType) {
    let slot = match activity_type {
      ActivityType::GreenMeeting => &mut self.green_meetings,
      ActivityType::PreListing => &mut self.pre_listings,
      ActivityType::PreBuying => &mut self.pre_buyings,
      ActivityType::Listing => &mut self.listings,
      ActivityType::Showing => &mut self.showings,
      ActivityType::Referred => &mut self.referred,
    };
    *slot += 1;
  }

  pub fn record_closing(&mut self, sides: Sides) {
    self.closings += 1;
    self.sides += u32::from(sides.get());
  }

  pub fn record_crm_event(&mut self, kind: CrmEventKind) {
    match kind {
      CrmEventKind::NewContact => self.new_contacts += 1,
      CrmEventKind::NewSearch => self.new_searches += 1,
    }
  }

  /// Pre-listings and pre-buyings together.
  pub fn critical(&self) -> u32 { self.pre_listings + self.pre_buyings }
}

// ─── Points ──────────────────────────────────────────────────────────────────

/// Points per scoring category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBreakdown {
  pub green_meeting: i64,
  pub pre_listing:   i64,
  pub pre_buying:    i64,
  pub listing:       i64,
  pub showing:       i64,
  pub closing:       i64,
  pub referral:      i64,
  pub new_contact:   i64,
  pub new_search:    i64,
  pub perfect_weeks: i64,
}

impl PointBreakdown {
  pub fn score(counts: &ActivityCounts, config: &ScoringConfig) -> Self {
    let p = &config.points;
    let n = |c: u32| i64::from(c);
    Self {
      green_meeting: n(counts.green_meetings) * p.green_meeting,
      pre_listing:   n(counts.pre_listings) * p.pre_listing,
      pre_buying:    n(counts.pre_buyings) * p.pre_buying,
      listing:       n(counts.listings) * p.listing,
      showing:       n(counts.showings) * p.showing,
      closing:       n(counts.sides) * p.closing_per_side,
      referral:      n(counts.referral_bonuses) * p.referral_bonus,
      new_contact:   n(counts.new_contacts) * p.new_contact,
      new_search:    n(counts.new_searches) * p.new_search,
      perfect_weeks: n(counts.perfect_weeks) * config.perfect_week.bonus,
    }
  }

  pub fn total(&self) -> i64 {
    self.green_meeting
      + self.pre_listing
      + self.pre_buying
      + self.listing
      + self.showing
      + self.closing
      + self.referral
      + self.new_contact
      + self.new_search
      + self.perfect_weeks
  }

  pub fn accumulate(&mut self, other: &Self) {
    self.green_meeting += other.green_meeting;
    self.pre_listing += other.pre_listing;
    self.pre_buying += other.pre_buying;
    self.listing += other.listing;
    self.showing += other.showing;
    self.closing += other.closing;
    self.referral += other.referral;
    self.new_contact += other.new_contact;
    self.new_search += other.new_search;
    self.perfect_weeks += other.perfect_weeks;
  }
}

// ─── Per-agent and per-team results ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentScore {
  pub agent_id:     Uuid,
  pub display_name: Option<String>,
  pub team:         Team,
  pub breakdown:    PointBreakdown,
  pub counts:       ActivityCounts,
  pub total_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScore {
  pub team:         Team,
  pub member_count: usize,
  pub breakdown:    PointBreakdown,
  pub total_points: i64,
  /// Sum of gross commission over the team's transactions in range.
  pub revenue:      f64,
}

impl TeamScore {
  pub fn empty(team: Team) -> Self {
    Self {
      team,
      member_count: 0,
      breakdown: PointBreakdown::default(),
      total_points: 0,
      revenue: 0.0,
    }
  }
}

/// The top scorer of a week or of the whole range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mvp {
  pub agent_id:     Uuid,
  pub display_name: Option<String>,
  pub team:         Team,
  pub points:       i64,
  pub pre_listings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfectWeekAward {
  pub agent_id:     Uuid,
  pub display_name: Option<String>,
  pub team:         Team,
}

/// Head-to-head result for one Monday..Sunday week.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyResult {
  pub week_start:    NaiveDate,
  pub week_end:      NaiveDate,
  pub week_number:   u32,
  pub negro_total:   i64,
  pub dorado_total:  i64,
  pub mvp:           Option<Mvp>,
  pub perfect_weeks: Vec<PerfectWeekAward>,
}

impl WeeklyResult {
  pub fn total_for(&self, team: Team) -> i64 {
    match team {
      Team::Negro => self.negro_total,
      Team::Dorado => self.dorado_total,
    }
  }
}

/// The full competition snapshot for a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionData {
  pub range:          DateRange,
  pub negro:          TeamScore,
  pub dorado:         TeamScore,
  pub weekly_results: Vec<WeeklyResult>,
  pub mvp:            Option<Mvp>,
  /// Every scored agent, in roster order.
  pub members:        Vec<AgentScore>,
}

impl CompetitionData {
  /// The all-zero result returned for an empty roster.
  pub fn empty(range: DateRange) -> Self {
    Self {
      range,
      negro: TeamScore::empty(Team::Negro),
      dorado: TeamScore::empty(Team::Dorado),
      weekly_results: Vec::new(),
      mvp: None,
      members: Vec::new(),
    }
  }

  pub fn team(&self, team: Team) -> &TeamScore {
    match team {
      Team::Negro => &self.negro,
      Team::Dorado => &self.dorado,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closings_score_by_side_not_by_transaction() {
    let mut counts = ActivityCounts::default();
    counts.record_closing(Sides::TWO);
    counts.record_closing(Sides::ONE);
    assert_eq!(counts.closings, 2);
    assert_eq!(counts.sides, 3);

    let breakdown = PointBreakdown::score(&counts, &ScoringConfig::default());
    assert_eq!(breakdown.closing, 90);
    assert_eq!(breakdown.total(), 90);
  }

  #[test]
  fn perfect_weeks_are_part_of_the_total() {
    let counts = ActivityCounts {
      pre_listings: 1,
      perfect_weeks: 2,
      ..Default::default()
    };
    let breakdown = PointBreakdown::score(&counts, &ScoringConfig::default());
    assert_eq!(breakdown.perfect_weeks, 400);
    assert_eq!(breakdown.total(), 440);
  }
}
