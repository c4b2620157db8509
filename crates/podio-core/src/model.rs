//! Input records: the facts the scoring engine reads.
//!
//! Activities, transactions and CRM events are immutable once recorded. The
//! roster is the only mutable input, and even there a member is deactivated
//! rather than deleted so that past ranges can be re-scored.

use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Teams ───────────────────────────────────────────────────────────────────

/// One of the two competing teams.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Team {
  Negro,
  Dorado,
}

impl Team {
  /// Parse the discriminant stored in the `team` column.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownTeam(s.to_owned()))
  }
}

/// A roster entry. A member is never hard-deleted; `is_active = false` takes
/// them out of scoring while keeping the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
  pub agent_id:  Uuid,
  pub team:      Team,
  pub is_active: bool,
  pub joined_at: DateTime<Utc>,
}

/// Display identity for an agent. Only used to label derived results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
  pub agent_id:   Uuid,
  pub first_name: String,
  pub last_name:  String,
}

impl AgentProfile {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_owned()
  }
}

// ─── Activities ──────────────────────────────────────────────────────────────

/// A logged sales action category.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityType {
  /// In-person prospecting meeting ("reunión verde").
  GreenMeeting,
  PreListing,
  PreBuying,
  /// A signed listing agreement ("captación").
  Listing,
  Showing,
  /// The agent tagged a person as referred to them.
  Referred,
}

impl ActivityType {
  /// Parse the discriminant stored in the `activity_type` column.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownActivityType(s.to_owned()))
  }
}

/// A sales action logged by an agent on a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
  pub activity_id:   Uuid,
  pub agent_id:      Uuid,
  pub activity_type: ActivityType,
  pub date:          NaiveDate,
  /// The CRM person this activity concerns, if any.
  pub person_id:     Option<Uuid>,
}

/// Input to [`crate::store::BrokerageStore::record_activity`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
  pub agent_id:      Uuid,
  pub activity_type: ActivityType,
  pub date:          NaiveDate,
  #[serde(default)]
  pub person_id:     Option<Uuid>,
}

impl NewActivity {
  pub fn new(agent_id: Uuid, activity_type: ActivityType, date: NaiveDate) -> Self {
    Self { agent_id, activity_type, date, person_id: None }
  }

  pub fn for_person(mut self, person_id: Uuid) -> Self {
    self.person_id = Some(person_id);
    self
  }
}

// ─── CRM events ──────────────────────────────────────────────────────────────

/// CRM events that score like activities but are keyed by creation time.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CrmEventKind {
  NewContact,
  NewSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmEvent {
  pub event_id:   Uuid,
  pub agent_id:   Uuid,
  pub kind:       CrmEventKind,
  pub created_at: DateTime<Utc>,
}

impl CrmEvent {
  /// The calendar day the event is scored on (UTC).
  pub fn date(&self) -> NaiveDate { self.created_at.date_naive() }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// Number of deal sides ("puntas") the office represented: 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Sides(u8);

impl Sides {
  pub const ONE: Self = Self(1);
  pub const TWO: Self = Self(2);

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Sides {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    match value {
      1 | 2 => Ok(Self(value)),
      other => Err(Error::InvalidSides(other)),
    }
  }
}

impl From<Sides> for u8 {
  fn from(sides: Sides) -> Self { sides.0 }
}

/// A closed transaction with the commission split persisted at closing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
  pub transaction_id:                Uuid,
  pub agent_id:                      Uuid,
  pub organization_id:               Uuid,
  pub sides:                         Sides,
  pub actual_price:                  f64,
  pub commission_percentage:         f64,
  pub agent_split_percentage:        f64,
  pub transaction_date:              NaiveDate,
  pub gross_commission:              f64,
  pub master_amount:                 f64,
  pub agent_amount:                  f64,
  pub office_amount:                 f64,
  /// Royalty rate in effect when the split was computed.
  pub royalty_percentage_at_closure: Option<f64>,
  pub buyer_person_id:               Option<Uuid>,
  pub seller_person_id:              Option<Uuid>,
}

/// Input to [`crate::store::BrokerageStore::record_transaction`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
  pub agent_id:               Uuid,
  pub organization_id:        Uuid,
  pub sides:                  Sides,
  pub actual_price:           f64,
  pub commission_percentage:  f64,
  pub agent_split_percentage: f64,
  pub transaction_date:       NaiveDate,
  #[serde(default)]
  pub buyer_person_id:        Option<Uuid>,
  #[serde(default)]
  pub seller_person_id:       Option<Uuid>,
}

/// A franchise office. Its royalty rate can change over time, which is why
/// transactions snapshot the rate at closing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
  pub organization_id:    Uuid,
  pub name:               String,
  pub royalty_percentage: f64,
}

// ─── Objectives ──────────────────────────────────────────────────────────────

/// Per-agent weekly targets for one scoring year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentObjective {
  pub agent_id:                    Uuid,
  pub year:                        i32,
  /// Weekly target for pre-listings plus pre-buyings combined.
  pub weekly_pl_pb_target:         i32,
  pub required_prelistings_weekly: i32,
}

impl AgentObjective {
  /// An objective with a non-positive target is treated as not configured.
  pub fn is_configured(&self) -> bool {
    self.weekly_pl_pb_target > 0 && self.required_prelistings_weekly > 0
  }
}

// ─── Date range ──────────────────────────────────────────────────────────────

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidRange { start, end });
    }
    Ok(Self { start, end })
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }

  /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)` in UTC,
  /// used to query timestamp-keyed collections over the same days.
  pub fn timestamp_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = self.start.and_time(NaiveTime::MIN).and_utc();
    let to = self
      .end
      .checked_add_days(Days::new(1))
      .unwrap_or(self.end)
      .and_time(NaiveTime::MIN)
      .and_utc();
    (from, to)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn sides_rejects_anything_but_one_or_two() {
    assert_eq!(Sides::try_from(1).unwrap(), Sides::ONE);
    assert_eq!(Sides::try_from(2).unwrap(), Sides::TWO);
    assert!(matches!(Sides::try_from(0), Err(Error::InvalidSides(0))));
    assert!(matches!(Sides::try_from(3), Err(Error::InvalidSides(3))));
  }

  #[test]
  fn sides_deserialises_from_bare_integer() {
    let sides: Sides = serde_json::from_str("2").unwrap();
    assert_eq!(sides, Sides::TWO);
    assert!(serde_json::from_str::<Sides>("5").is_err());
  }

  #[test]
  fn activity_type_parses_snake_case() {
    assert_eq!(
      ActivityType::parse("green_meeting").unwrap(),
      ActivityType::GreenMeeting
    );
    assert_eq!(ActivityType::PreBuying.as_ref(), "pre_buying");
    assert!(matches!(
      ActivityType::parse("coffee"),
      Err(Error::UnknownActivityType(s)) if s == "coffee"
    ));
  }

  #[test]
  fn team_round_trips_through_its_discriminant() {
    assert_eq!(Team::parse(Team::Dorado.as_ref()).unwrap(), Team::Dorado);
    assert!(Team::parse("azul").is_err());
  }

  #[test]
  fn inverted_range_is_rejected() {
    let err = DateRange::new(day(2025, 3, 10), day(2025, 3, 1)).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
  }

  #[test]
  fn timestamp_bounds_cover_the_last_day() {
    let range = DateRange::new(day(2025, 3, 3), day(2025, 3, 9)).unwrap();
    let (from, to) = range.timestamp_bounds();
    assert_eq!(from.date_naive(), day(2025, 3, 3));
    assert_eq!(to.date_naive(), day(2025, 3, 10));
  }

  #[test]
  fn objective_with_zero_target_is_not_configured() {
    let objective = AgentObjective {
      agent_id:                    Uuid::nil(),
      year:                        2025,
      weekly_pl_pb_target:         0,
      required_prelistings_weekly: 2,
    };
    assert!(!objective.is_configured());
  }
}
