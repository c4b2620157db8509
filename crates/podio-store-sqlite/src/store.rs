//! [`SqliteStore`], the SQLite implementation of [`BrokerageStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use podio_core::{
  commission::CommissionRecord,
  model::{
    Activity, AgentObjective, AgentProfile, CrmEvent, CrmEventKind, DateRange,
    NewActivity, NewTransaction, Organization, Team, TeamMember, Transaction,
  },
  store::BrokerageStore,
};

use crate::{
  encode::{
    encode_date, encode_dt, encode_uuid, RawActivity, RawCrmEvent, RawMember,
    RawObjective, RawOrganization, RawProfile, RawTransaction,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Podio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// `?, ?, ?` with `n` placeholders, for `IN (...)` clauses.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn select_member(
  conn: &rusqlite::Connection,
  agent_id: &str,
) -> rusqlite::Result<Option<RawMember>> {
  conn
    .query_row(
      &format!("SELECT {} FROM team_members WHERE agent_id = ?1", RawMember::COLUMNS),
      rusqlite::params![agent_id],
      RawMember::from_row,
    )
    .optional()
}

fn select_transaction(
  conn: &rusqlite::Connection,
  transaction_id: &str,
) -> rusqlite::Result<Option<RawTransaction>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM transactions WHERE transaction_id = ?1",
        RawTransaction::COLUMNS
      ),
      rusqlite::params![transaction_id],
      RawTransaction::from_row,
    )
    .optional()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }

  /// Run a single-row roster update and return the row afterwards, or `None`
  /// if no row matched.
  async fn update_member(
    &self,
    agent_id: Uuid,
    sql: &'static str,
    value: Option<String>,
  ) -> Result<Option<TeamMember>> {
    let id_str = encode_uuid(agent_id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        let changed = match value {
          Some(v) => conn.execute(sql, rusqlite::params![id_str, v])?,
          None => conn.execute(sql, rusqlite::params![id_str])?,
        };
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_member(conn, &id_str)?)
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }
}

// ─── BrokerageStore impl ─────────────────────────────────────────────────────

impl BrokerageStore for SqliteStore {
  type Error = crate::Error;

  // ── Roster ────────────────────────────────────────────────────────────────

  async fn active_roster(&self) -> Result<Vec<TeamMember>> {
    let raws: Vec<RawMember> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM team_members
           WHERE is_active = 1
           ORDER BY joined_at, agent_id",
          RawMember::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn get_member(&self, agent_id: Uuid) -> Result<Option<TeamMember>> {
    let id_str = encode_uuid(agent_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_member(conn, &id_str)?))
      .await?;
    raw.map(RawMember::into_member).transpose()
  }

  async fn upsert_member(&self, agent_id: Uuid, team: Team) -> Result<TeamMember> {
    let id_str   = encode_uuid(agent_id);
    let team_str = team.as_ref().to_owned();
    let at_str   = encode_dt(Utc::now());

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO team_members (agent_id, team, is_active, joined_at)
           VALUES (?1, ?2, 1, ?3)
           ON CONFLICT (agent_id) DO UPDATE
             SET team = excluded.team, is_active = 1",
          rusqlite::params![id_str, team_str, at_str],
        )?;
        Ok(select_member(conn, &id_str)?)
      })
      .await?;

    tracing::debug!(%agent_id, %team, "roster upsert");
    match raw {
      Some(raw) => raw.into_member(),
      None => Err(crate::Error::InvalidValue(format!(
        "roster row for {agent_id} vanished after upsert"
      ))),
    }
  }

  async fn move_member(&self, agent_id: Uuid, team: Team) -> Result<Option<TeamMember>> {
    tracing::debug!(%agent_id, %team, "roster move");
    self
      .update_member(
        agent_id,
        "UPDATE team_members SET team = ?2 WHERE agent_id = ?1",
        Some(team.as_ref().to_owned()),
      )
      .await
  }

  async fn deactivate_member(&self, agent_id: Uuid) -> Result<Option<TeamMember>> {
    tracing::debug!(%agent_id, "roster deactivate");
    self
      .update_member(
        agent_id,
        "UPDATE team_members SET is_active = 0 WHERE agent_id = ?1",
        None,
      )
      .await
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn add_profile(&self, profile: AgentProfile) -> Result<()> {
    let id_str = encode_uuid(profile.agent_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (agent_id, first_name, last_name)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (agent_id) DO UPDATE
             SET first_name = excluded.first_name, last_name = excluded.last_name",
          rusqlite::params![id_str, profile.first_name, profile.last_name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn profiles(&self, agent_ids: &[Uuid]) -> Result<Vec<AgentProfile>> {
    if agent_ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<String> = agent_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT agent_id, first_name, last_name FROM profiles
           WHERE agent_id IN ({})",
          placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok(RawProfile {
              agent_id:   row.get(0)?,
              first_name: row.get(1)?,
              last_name:  row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Activities and CRM events ─────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
    let activity = Activity {
      activity_id:   Uuid::new_v4(),
      agent_id:      input.agent_id,
      activity_type: input.activity_type,
      date:          input.date,
      person_id:     input.person_id,
    };

    let id_str     = encode_uuid(activity.activity_id);
    let agent_str  = encode_uuid(activity.agent_id);
    let type_str   = activity.activity_type.as_ref().to_owned();
    let date_str   = encode_date(activity.date);
    let person_str = activity.person_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (activity_id, agent_id, activity_type, date, person_id)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, agent_str, type_str, date_str, person_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(activity)
  }

  async fn activities(&self, agent_ids: &[Uuid], range: DateRange) -> Result<Vec<Activity>> {
    if agent_ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut params = vec![encode_date(range.start), encode_date(range.end)];
    params.extend(agent_ids.iter().copied().map(encode_uuid));

    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT activity_id, agent_id, activity_type, date, person_id
           FROM activities
           WHERE date >= ? AND date <= ?
             AND agent_id IN ({})
           ORDER BY date, rowid",
          placeholders(params.len() - 2)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawActivity {
              activity_id:   row.get(0)?,
              agent_id:      row.get(1)?,
              activity_type: row.get(2)?,
              date:          row.get(3)?,
              person_id:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  async fn record_crm_event(
    &self,
    agent_id:   Uuid,
    kind:       CrmEventKind,
    created_at: DateTime<Utc>,
  ) -> Result<CrmEvent> {
    let event = CrmEvent { event_id: Uuid::new_v4(), agent_id, kind, created_at };

    let id_str    = encode_uuid(event.event_id);
    let agent_str = encode_uuid(agent_id);
    let kind_str  = kind.as_ref().to_owned();
    let at_str    = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO crm_events (event_id, agent_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, agent_str, kind_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn crm_events(
    &self,
    kind:      CrmEventKind,
    agent_ids: &[Uuid],
    from:      DateTime<Utc>,
    to:        DateTime<Utc>,
  ) -> Result<Vec<CrmEvent>> {
    if agent_ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut params = vec![kind.as_ref().to_owned(), encode_dt(from), encode_dt(to)];
    params.extend(agent_ids.iter().copied().map(encode_uuid));

    let raws: Vec<RawCrmEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT event_id, agent_id, kind, created_at
           FROM crm_events
           WHERE kind = ? AND created_at >= ? AND created_at < ?
             AND agent_id IN ({})
           ORDER BY created_at, rowid",
          placeholders(params.len() - 3)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawCrmEvent {
              event_id:   row.get(0)?,
              agent_id:   row.get(1)?,
              kind:       row.get(2)?,
              created_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCrmEvent::into_event).collect()
  }

  // ── Organizations and transactions ────────────────────────────────────────

  async fn add_organization(&self, name: String, royalty_percentage: f64) -> Result<Organization> {
    let org = Organization { organization_id: Uuid::new_v4(), name, royalty_percentage };

    let id_str = encode_uuid(org.organization_id);
    let name   = org.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO organizations (organization_id, name, royalty_percentage)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, royalty_percentage],
        )?;
        Ok(())
      })
      .await?;

    Ok(org)
  }

  async fn get_organization(&self, organization_id: Uuid) -> Result<Option<Organization>> {
    let id_str = encode_uuid(organization_id);

    let raw: Option<RawOrganization> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT organization_id, name, royalty_percentage
             FROM organizations WHERE organization_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawOrganization {
                organization_id:    row.get(0)?,
                name:               row.get(1)?,
                royalty_percentage: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawOrganization::into_organization).transpose()
  }

  async fn record_transaction(
    &self,
    input:      NewTransaction,
    commission: CommissionRecord,
  ) -> Result<Transaction> {
    let tx = Transaction {
      transaction_id:                Uuid::new_v4(),
      agent_id:                      input.agent_id,
      organization_id:               input.organization_id,
      sides:                         input.sides,
      actual_price:                  input.actual_price,
      commission_percentage:         input.commission_percentage,
      agent_split_percentage:        input.agent_split_percentage,
      transaction_date:              input.transaction_date,
      gross_commission:              commission.split.gross_commission,
      master_amount:                 commission.split.master_amount,
      agent_amount:                  commission.split.agent_amount,
      office_amount:                 commission.split.office_amount,
      royalty_percentage_at_closure: Some(commission.royalty_percentage_at_closure),
      buyer_person_id:               input.buyer_person_id,
      seller_person_id:              input.seller_person_id,
    };

    let id_str     = encode_uuid(tx.transaction_id);
    let agent_str  = encode_uuid(tx.agent_id);
    let org_str    = encode_uuid(tx.organization_id);
    let sides      = i64::from(tx.sides.get());
    let date_str   = encode_date(tx.transaction_date);
    let buyer_str  = tx.buyer_person_id.map(encode_uuid);
    let seller_str = tx.seller_person_id.map(encode_uuid);
    let row        = tx.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO transactions ({})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            RawTransaction::COLUMNS
          ),
          rusqlite::params![
            id_str,
            agent_str,
            org_str,
            sides,
            row.actual_price,
            row.commission_percentage,
            row.agent_split_percentage,
            date_str,
            row.gross_commission,
            row.master_amount,
            row.agent_amount,
            row.office_amount,
            row.royalty_percentage_at_closure,
            buyer_str,
            seller_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(tx)
  }

  async fn get_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(transaction_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_transaction(conn, &id_str)?))
      .await?;
    raw.map(RawTransaction::into_transaction).transpose()
  }

  async fn transactions(&self, agent_ids: &[Uuid], range: DateRange) -> Result<Vec<Transaction>> {
    if agent_ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut params = vec![encode_date(range.start), encode_date(range.end)];
    params.extend(agent_ids.iter().copied().map(encode_uuid));

    let raws: Vec<RawTransaction> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM transactions
           WHERE transaction_date >= ? AND transaction_date <= ?
             AND agent_id IN ({})
           ORDER BY transaction_date, rowid",
          RawTransaction::COLUMNS,
          placeholders(params.len() - 2)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawTransaction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransaction::into_transaction).collect()
  }

  async fn record_commission(
    &self,
    transaction_id: Uuid,
    commission:     CommissionRecord,
  ) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(transaction_id);
    let split  = commission.split;
    let rate   = commission.royalty_percentage_at_closure;

    let raw: Option<RawTransaction> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE transactions
           SET gross_commission = ?2, master_amount = ?3, agent_amount = ?4,
               office_amount = ?5, royalty_percentage_at_closure = ?6
           WHERE transaction_id = ?1",
          rusqlite::params![
            id_str,
            split.gross_commission,
            split.master_amount,
            split.agent_amount,
            split.office_amount,
            rate,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_transaction(conn, &id_str)?)
      })
      .await?;

    raw.map(RawTransaction::into_transaction).transpose()
  }

  // ── Objectives ────────────────────────────────────────────────────────────

  async fn upsert_objective(&self, objective: AgentObjective) -> Result<()> {
    let id_str = encode_uuid(objective.agent_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO agent_objectives
             (agent_id, year, weekly_pl_pb_target, required_prelistings_weekly)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (agent_id, year) DO UPDATE
             SET weekly_pl_pb_target = excluded.weekly_pl_pb_target,
                 required_prelistings_weekly = excluded.required_prelistings_weekly",
          rusqlite::params![
            id_str,
            objective.year,
            objective.weekly_pl_pb_target,
            objective.required_prelistings_weekly,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn objectives(&self, year: i32) -> Result<Vec<AgentObjective>> {
    let raws: Vec<RawObjective> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT agent_id, year, weekly_pl_pb_target, required_prelistings_weekly
           FROM agent_objectives WHERE year = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![year], |row| {
            Ok(RawObjective {
              agent_id:                    row.get(0)?,
              year:                        row.get(1)?,
              weekly_pl_pb_target:         row.get(2)?,
              required_prelistings_weekly: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObjective::into_objective).collect()
  }
}
