//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexicographic order matches chronological order. Calendar days are
//! `YYYY-MM-DD`. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use podio_core::model::{
  Activity, ActivityType, AgentObjective, AgentProfile, CrmEvent, CrmEventKind,
  Organization, Sides, Team, TeamMember, Transaction,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> / NaiveDate ────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Discriminants ────────────────────────────────────────────────────────────

fn decode_sides(n: i64) -> Result<Sides> {
  let n = u8::try_from(n)
    .map_err(|_| Error::InvalidValue(format!("sides out of range: {n}")))?;
  Ok(Sides::try_from(n)?)
}

fn decode_crm_kind(s: &str) -> Result<CrmEventKind> {
  s.parse()
    .map_err(|_| Error::InvalidValue(format!("unknown crm event kind: {s:?}")))
}

fn decode_bool(n: i64) -> Result<bool> {
  match n {
    0 => Ok(false),
    1 => Ok(true),
    other => Err(Error::InvalidValue(format!("not a boolean: {other}"))),
  }
}

fn decode_count(n: i64) -> Result<i32> {
  i32::try_from(n).map_err(|_| Error::InvalidValue(format!("count out of range: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `team_members` row.
pub struct RawMember {
  pub agent_id:  String,
  pub team:      String,
  pub is_active: i64,
  pub joined_at: String,
}

impl RawMember {
  pub const COLUMNS: &'static str = "agent_id, team, is_active, joined_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      agent_id:  row.get(0)?,
      team:      row.get(1)?,
      is_active: row.get(2)?,
      joined_at: row.get(3)?,
    })
  }

  pub fn into_member(self) -> Result<TeamMember> {
    Ok(TeamMember {
      agent_id:  decode_uuid(&self.agent_id)?,
      team:      Team::parse(&self.team)?,
      is_active: decode_bool(self.is_active)?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub struct RawProfile {
  pub agent_id:   String,
  pub first_name: String,
  pub last_name:  String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<AgentProfile> {
    Ok(AgentProfile {
      agent_id:   decode_uuid(&self.agent_id)?,
      first_name: self.first_name,
      last_name:  self.last_name,
    })
  }
}

pub struct RawActivity {
  pub activity_id:   String,
  pub agent_id:      String,
  pub activity_type: String,
  pub date:          String,
  pub person_id:     Option<String>,
}

impl RawActivity {
  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      activity_id:   decode_uuid(&self.activity_id)?,
      agent_id:      decode_uuid(&self.agent_id)?,
      activity_type: ActivityType::parse(&self.activity_type)?,
      date:          decode_date(&self.date)?,
      person_id:     decode_opt_uuid(self.person_id)?,
    })
  }
}

pub struct RawCrmEvent {
  pub event_id:   String,
  pub agent_id:   String,
  pub kind:       String,
  pub created_at: String,
}

impl RawCrmEvent {
  pub fn into_event(self) -> Result<CrmEvent> {
    Ok(CrmEvent {
      event_id:   decode_uuid(&self.event_id)?,
      agent_id:   decode_uuid(&self.agent_id)?,
      kind:       decode_crm_kind(&self.kind)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawOrganization {
  pub organization_id:    String,
  pub name:               String,
  pub royalty_percentage: f64,
}

impl RawOrganization {
  pub fn into_organization(self) -> Result<Organization> {
    Ok(Organization {
      organization_id:    decode_uuid(&self.organization_id)?,
      name:               self.name,
      royalty_percentage: self.royalty_percentage,
    })
  }
}

/// Raw values read directly from a `transactions` row.
pub struct RawTransaction {
  pub transaction_id:                String,
  pub agent_id:                      String,
  pub organization_id:               String,
  pub sides:                         i64,
  pub actual_price:                  f64,
  pub commission_percentage:         f64,
  pub agent_split_percentage:        f64,
  pub transaction_date:              String,
  pub gross_commission:              f64,
  pub master_amount:                 f64,
  pub agent_amount:                  f64,
  pub office_amount:                 f64,
  pub royalty_percentage_at_closure: Option<f64>,
  pub buyer_person_id:               Option<String>,
  pub seller_person_id:              Option<String>,
}

impl RawTransaction {
  pub const COLUMNS: &'static str = "transaction_id, agent_id, organization_id, sides,
     actual_price, commission_percentage, agent_split_percentage,
     transaction_date, gross_commission, master_amount, agent_amount,
     office_amount, royalty_percentage_at_closure, buyer_person_id,
     seller_person_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transaction_id:                row.get(0)?,
      agent_id:                      row.get(1)?,
      organization_id:               row.get(2)?,
      sides:                         row.get(3)?,
      actual_price:                  row.get(4)?,
      commission_percentage:         row.get(5)?,
      agent_split_percentage:        row.get(6)?,
      transaction_date:              row.get(7)?,
      gross_commission:              row.get(8)?,
      master_amount:                 row.get(9)?,
      agent_amount:                  row.get(10)?,
      office_amount:                 row.get(11)?,
      royalty_percentage_at_closure: row.get(12)?,
      buyer_person_id:               row.get(13)?,
      seller_person_id:              row.get(14)?,
    })
  }

  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction {
      transaction_id:                decode_uuid(&self.transaction_id)?,
      agent_id:                      decode_uuid(&self.agent_id)?,
      organization_id:               decode_uuid(&self.organization_id)?,
      sides:                         decode_sides(self.sides)?,
      actual_price:                  self.actual_price,
      commission_percentage:         self.commission_percentage,
      agent_split_percentage:        self.agent_split_percentage,
      transaction_date:              decode_date(&self.transaction_date)?,
      gross_commission:              self.gross_commission,
      master_amount:                 self.master_amount,
      agent_amount:                  self.agent_amount,
      office_amount:                 self.office_amount,
      royalty_percentage_at_closure: self.royalty_percentage_at_closure,
      buyer_person_id:               decode_opt_uuid(self.buyer_person_id)?,
      seller_person_id:              decode_opt_uuid(self.seller_person_id)?,
    })
  }
}

pub struct RawObjective {
  pub agent_id:                    String,
  pub year:                        i64,
  pub weekly_pl_pb_target:         i64,
  pub required_prelistings_weekly: i64,
}

impl RawObjective {
  pub fn into_objective(self) -> Result<AgentObjective> {
    Ok(AgentObjective {
      agent_id:                    decode_uuid(&self.agent_id)?,
      year:                        decode_count(self.year)?,
      weekly_pl_pb_target:         decode_count(self.weekly_pl_pb_target)?,
      required_prelistings_weekly: decode_count(self.required_prelistings_weekly)?,
    })
  }
}
