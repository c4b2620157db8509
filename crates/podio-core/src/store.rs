//! The `BrokerageStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `podio-store-sqlite`).
//! Higher layers (`podio-api`) depend on this abstraction, not on any
//! concrete backend. Reads are assumed to be authorization-filtered already.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  commission::CommissionRecord,
  model::{
    Activity, AgentObjective, AgentProfile, CrmEvent, CrmEventKind, DateRange,
    NewActivity, NewTransaction, Organization, Team, TeamMember, Transaction,
  },
};

/// Abstraction over a Podio store backend.
///
/// Activities, transactions and CRM events are append-only. Roster rows are
/// updated in place and never deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BrokerageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Roster ────────────────────────────────────────────────────────────

  /// All members with `is_active = true`, ordered by `joined_at` then
  /// `agent_id`. That order is the scoring engine's last tie-break.
  fn active_roster(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamMember>, Self::Error>> + Send + '_;

  fn get_member(
    &self,
    agent_id: Uuid,
  ) -> impl Future<Output = Result<Option<TeamMember>, Self::Error>> + Send + '_;

  /// Insert or reactivate `agent_id` on `team`. `joined_at` is set on first
  /// insert only.
  fn upsert_member(
    &self,
    agent_id: Uuid,
    team: Team,
  ) -> impl Future<Output = Result<TeamMember, Self::Error>> + Send + '_;

  /// Change the team of an existing member with a single-row update.
  /// Returns `None` if the agent has no roster row.
  fn move_member(
    &self,
    agent_id: Uuid,
    team: Team,
  ) -> impl Future<Output = Result<Option<TeamMember>, Self::Error>> + Send + '_;

  /// Soft-delete: set `is_active = false`. Returns `None` if the agent has
  /// no roster row.
  fn deactivate_member(
    &self,
    agent_id: Uuid,
  ) -> impl Future<Output = Result<Option<TeamMember>, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn add_profile(
    &self,
    profile: AgentProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn profiles<'a>(
    &'a self,
    agent_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<AgentProfile>, Self::Error>> + Send + 'a;

  // ── Activities and CRM events ─────────────────────────────────────────

  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Activities of `agent_ids` dated within `range` (inclusive).
  fn activities<'a>(
    &'a self,
    agent_ids: &'a [Uuid],
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + 'a;

  fn record_crm_event(
    &self,
    agent_id: Uuid,
    kind: CrmEventKind,
    created_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<CrmEvent, Self::Error>> + Send + '_;

  /// CRM events of one kind with `from <= created_at < to`.
  fn crm_events<'a>(
    &'a self,
    kind: CrmEventKind,
    agent_ids: &'a [Uuid],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CrmEvent>, Self::Error>> + Send + 'a;

  // ── Organizations and transactions ────────────────────────────────────

  fn add_organization(
    &self,
    name: String,
    royalty_percentage: f64,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn get_organization(
    &self,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// Persist a closed transaction together with its computed split.
  fn record_transaction(
    &self,
    input: NewTransaction,
    commission: CommissionRecord,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  fn get_transaction(
    &self,
    transaction_id: Uuid,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  /// Transactions of `agent_ids` with `transaction_date` within `range`.
  fn transactions<'a>(
    &'a self,
    agent_ids: &'a [Uuid],
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<Transaction>, Self::Error>> + Send + 'a;

  /// Overwrite the split columns of an existing transaction. Returns `None`
  /// if the transaction does not exist.
  fn record_commission(
    &self,
    transaction_id: Uuid,
    commission: CommissionRecord,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  // ── Objectives ────────────────────────────────────────────────────────

  /// Insert or replace the objective for `(agent_id, year)`.
  fn upsert_objective(
    &self,
    objective: AgentObjective,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn objectives(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Vec<AgentObjective>, Self::Error>> + Send + '_;
}
