//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use podio_core::{
  commission::CommissionRecord,
  config::ScoringConfig,
  model::{
    Activity, ActivityType, AgentObjective, AgentProfile, CrmEvent, CrmEventKind, DateRange,
    NewActivity, NewTransaction, Organization, Team, TeamMember, Transaction,
  },
  store::BrokerageStore,
};
use podio_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{api_router, competition::evaluation_day};

fn utc() -> FixedOffset { FixedOffset::east_opt(0).unwrap() }

async fn make_app() -> (Router, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let app = api_router(store.clone(), Arc::new(ScoringConfig::default()), utc());
  (app, store)
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  headers: Vec<(header::HeaderName, String)>,
  body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  // Extractor rejections answer in plain text.
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes)
      .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
  };
  (status, headers, value)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Competition ─────────────────────────────────────────────────────────────

/// Two agents over two full weeks in March 2025.
async fn seed_competition(store: &SqliteStore) -> (Uuid, Uuid) {
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  store.upsert_member(a, Team::Negro).await.unwrap();
  store.upsert_member(b, Team::Dorado).await.unwrap();

  for (agent, kind, date) in [
    (a, ActivityType::PreListing, day(2025, 3, 4)),
    (a, ActivityType::Showing, day(2025, 3, 11)),
    (b, ActivityType::Listing, day(2025, 3, 5)),
    (b, ActivityType::GreenMeeting, day(2025, 3, 12)),
  ] {
    store
      .record_activity(NewActivity::new(agent, kind, date))
      .await
      .unwrap();
  }
  store
    .record_crm_event(
      a,
      CrmEventKind::NewContact,
      Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap(),
    )
    .await
    .unwrap();
  (a, b)
}

#[tokio::test]
async fn competition_scores_teams_weeks_and_mvp() {
  let (app, store) = make_app().await;
  let (_, b) = seed_competition(&store).await;

  let (status, headers, body) = send(
    &app,
    "GET",
    "/competition?start=2025-03-03&end=2025-03-16",
    vec![],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(headers.contains_key(header::ETAG));

  assert_eq!(body["negro"]["totalPoints"], 52);
  assert_eq!(body["dorado"]["totalPoints"], 55);
  assert_eq!(body["negro"]["memberCount"], 1);

  let weeks = body["weeklyResults"].as_array().unwrap();
  assert_eq!(weeks.len(), 2);
  assert_eq!(weeks[0]["weekNumber"], 1);
  assert_eq!(weeks[0]["negroTotal"], 42);
  assert_eq!(weeks[0]["doradoTotal"], 50);
  assert_eq!(weeks[1]["negroTotal"], 10);
  assert_eq!(weeks[1]["doradoTotal"], 5);

  assert_eq!(body["mvp"]["agentId"], b.to_string());
}

#[tokio::test]
async fn competition_honours_if_none_match() {
  let (app, store) = make_app().await;
  seed_competition(&store).await;
  let uri = "/competition?start=2025-03-03&end=2025-03-16";

  let (_, headers, _) = send(&app, "GET", uri, vec![], None).await;
  let etag = headers[header::ETAG].to_str().unwrap().to_string();

  let (status, _, body) =
    send(&app, "GET", uri, vec![(header::IF_NONE_MATCH, etag.clone())], None).await;
  assert_eq!(status, StatusCode::NOT_MODIFIED);
  assert_eq!(body, Value::Null);

  // New data means a new tag.
  let a = store.active_roster().await.unwrap()[0].agent_id;
  store
    .record_activity(NewActivity::new(a, ActivityType::Listing, day(2025, 3, 6)))
    .await
    .unwrap();
  let (status, headers, _) =
    send(&app, "GET", uri, vec![(header::IF_NONE_MATCH, etag.clone())], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_ne!(headers[header::ETAG].to_str().unwrap(), etag);
}

#[tokio::test]
async fn competition_with_empty_roster_is_all_zero() {
  let (app, _) = make_app().await;
  let (status, _, body) = send(
    &app,
    "GET",
    "/competition?start=2025-03-03&end=2025-03-09",
    vec![],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["negro"]["totalPoints"], 0);
  assert_eq!(body["dorado"]["totalPoints"], 0);
  assert_eq!(body["weeklyResults"], json!([]));
  assert_eq!(body["mvp"], Value::Null);
}

#[tokio::test]
async fn competition_rejects_inverted_range() {
  let (app, _) = make_app().await;
  let (status, _, body) = send(
    &app,
    "GET",
    "/competition?start=2025-03-16&end=2025-03-03",
    vec![],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn etag_changes_with_scoring_rules() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  seed_competition(&store).await;
  let uri = "/competition?start=2025-03-03&end=2025-03-16";

  let season_one = api_router(store.clone(), Arc::new(ScoringConfig::default()), utc());
  let mut rules = ScoringConfig::default();
  rules.points.pre_listing = 999;
  let season_two = api_router(store.clone(), Arc::new(rules), utc());

  let (_, headers, body) = send(&season_one, "GET", uri, vec![], None).await;
  let old_tag = headers[header::ETAG].to_str().unwrap().to_string();
  assert_eq!(body["negro"]["totalPoints"], 52);

  let (status, headers, body) = send(
    &season_two,
    "GET",
    uri,
    vec![(header::IF_NONE_MATCH, old_tag.clone())],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_ne!(headers[header::ETAG].to_str().unwrap(), old_tag);
  assert_eq!(body["negro"]["totalPoints"], 52 - 40 + 999);
}

#[tokio::test]
async fn moved_agent_counts_entirely_for_new_team() {
  let (app, store) = make_app().await;
  let (a, _) = seed_competition(&store).await;

  let (status, _, _) = send(
    &app,
    "PATCH",
    &format!("/roster/{a}"),
    vec![],
    Some(json!({ "team": "dorado" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, _, body) = send(
    &app,
    "GET",
    "/competition?start=2025-03-03&end=2025-03-16",
    vec![],
    None,
  )
  .await;
  assert_eq!(body["negro"]["totalPoints"], 0);
  assert_eq!(body["negro"]["memberCount"], 0);
  assert_eq!(body["dorado"]["totalPoints"], 52 + 55);
  assert_eq!(body["weeklyResults"][0]["negroTotal"], 0);
  assert_eq!(body["weeklyResults"][0]["doradoTotal"], 42 + 50);
}

#[test]
fn evaluation_day_follows_the_offset() {
  // Monday 01:00 UTC is still Sunday evening three hours west.
  let now: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
  assert_eq!(evaluation_day(now, utc()), day(2025, 3, 10));
  let west = FixedOffset::west_opt(3 * 3600).unwrap();
  assert_eq!(evaluation_day(now, west), day(2025, 3, 9));
}

/// Delegates to `SqliteStore` except that CRM reads always fail.
struct CrmDown {
  inner: SqliteStore,
}

impl BrokerageStore for CrmDown {
  type Error = podio_store_sqlite::Error;

  async fn active_roster(&self) -> Result<Vec<TeamMember>, Self::Error> {
    self.inner.active_roster().await
  }

  async fn get_member(&self, agent_id: Uuid) -> Result<Option<TeamMember>, Self::Error> {
    self.inner.get_member(agent_id).await
  }

  async fn upsert_member(&self, agent_id: Uuid, team: Team) -> Result<TeamMember, Self::Error> {
    self.inner.upsert_member(agent_id, team).await
  }

  async fn move_member(
    &self,
    agent_id: Uuid,
    team: Team,
  ) -> Result<Option<TeamMember>, Self::Error> {
    self.inner.move_member(agent_id, team).await
  }

  async fn deactivate_member(&self, agent_id: Uuid) -> Result<Option<TeamMember>, Self::Error> {
    self.inner.deactivate_member(agent_id).await
  }

  async fn add_profile(&self, profile: AgentProfile) -> Result<(), Self::Error> {
    self.inner.add_profile(profile).await
  }

  async fn profiles(&self, agent_ids: &[Uuid]) -> Result<Vec<AgentProfile>, Self::Error> {
    self.inner.profiles(agent_ids).await
  }

  async fn record_activity(&self, input: NewActivity) -> Result<Activity, Self::Error> {
    self.inner.record_activity(input).await
  }

  async fn activities(
    &self,
    agent_ids: &[Uuid],
    range: DateRange,
  ) -> Result<Vec<Activity>, Self::Error> {
    self.inner.activities(agent_ids, range).await
  }

  async fn record_crm_event(
    &self,
    agent_id: Uuid,
    kind: CrmEventKind,
    created_at: DateTime<Utc>,
  ) -> Result<CrmEvent, Self::Error> {
    self.inner.record_crm_event(agent_id, kind, created_at).await
  }

  async fn crm_events(
    &self,
    _kind: CrmEventKind,
    _agent_ids: &[Uuid],
    _from: DateTime<Utc>,
    _to: DateTime<Utc>,
  ) -> Result<Vec<CrmEvent>, Self::Error> {
    Err(podio_store_sqlite::Error::InvalidValue("crm unavailable".into()))
  }

  async fn add_organization(
    &self,
    name: String,
    royalty_percentage: f64,
  ) -> Result<Organization, Self::Error> {
    self.inner.add_organization(name, royalty_percentage).await
  }

  async fn get_organization(
    &self,
    organization_id: Uuid,
  ) -> Result<Option<Organization>, Self::Error> {
    self.inner.get_organization(organization_id).await
  }

  async fn record_transaction(
    &self,
    input: NewTransaction,
    commission: CommissionRecord,
  ) -> Result<Transaction, Self::Error> {
    self.inner.record_transaction(input, commission).await
  }

  async fn get_transaction(
    &self,
    transaction_id: Uuid,
  ) -> Result<Option<Transaction>, Self::Error> {
    self.inner.get_transaction(transaction_id).await
  }

  async fn transactions(
    &self,
    agent_ids: &[Uuid],
    range: DateRange,
  ) -> Result<Vec<Transaction>, Self::Error> {
    self.inner.transactions(agent_ids, range).await
  }

  async fn record_commission(
    &self,
    transaction_id: Uuid,
    commission: CommissionRecord,
  ) -> Result<Option<Transaction>, Self::Error> {
    self.inner.record_commission(transaction_id, commission).await
  }

  async fn upsert_objective(&self, objective: AgentObjective) -> Result<(), Self::Error> {
    self.inner.upsert_objective(objective).await
  }

  async fn objectives(&self, year: i32) -> Result<Vec<AgentObjective>, Self::Error> {
    self.inner.objectives(year).await
  }
}

#[tokio::test]
async fn failed_read_aborts_the_whole_competition() {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  seed_competition(&inner).await;
  let store = Arc::new(CrmDown { inner });
  let app = api_router(store, Arc::new(ScoringConfig::default()), utc());

  let (status, headers, body) = send(
    &app,
    "GET",
    "/competition?start=2025-03-03&end=2025-03-16",
    vec![],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(!headers.contains_key(header::ETAG));
  assert!(body["error"].as_str().unwrap().contains("crm unavailable"));
  assert!(body.get("negro").is_none());
  assert!(body.get("weeklyResults").is_none());
}

// ── Roster ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_join_move_and_deactivate() {
  let (app, _) = make_app().await;
  let a = Uuid::new_v4();
  let path = format!("/roster/{a}");

  let (status, _, body) =
    send(&app, "PUT", &path, vec![], Some(json!({ "team": "negro" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["team"], "negro");

  let (status, _, body) =
    send(&app, "PATCH", &path, vec![], Some(json!({ "team": "dorado" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["team"], "dorado");

  let (_, _, body) = send(&app, "GET", "/roster", vec![], None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (status, _, body) = send(&app, "DELETE", &path, vec![], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["is_active"], false);

  let (_, _, body) = send(&app, "GET", "/roster", vec![], None).await;
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn roster_changes_to_unknown_agent_are_404() {
  let (app, _) = make_app().await;
  let path = format!("/roster/{}", Uuid::new_v4());

  let (status, _, _) =
    send(&app, "PATCH", &path, vec![], Some(json!({ "team": "dorado" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _, _) = send(&app, "DELETE", &path, vec![], None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roster_rejects_unknown_team() {
  let (app, _) = make_app().await;
  let path = format!("/roster/{}", Uuid::new_v4());
  let (status, _, _) =
    send(&app, "PUT", &path, vec![], Some(json!({ "team": "rojo" }))).await;
  assert!(status.is_client_error());
}

// ── Commission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_returns_split_without_storing() {
  let (app, _) = make_app().await;
  let (status, _, body) = send(
    &app,
    "POST",
    "/commission/preview",
    vec![],
    Some(json!({
      "actual_price": 100000.0,
      "sides": 1,
      "commission_percentage": 3.0,
      "agent_split_percentage": 50.0,
      "royalty_percentage": 10.0,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let gross = body["gross_commission"].as_f64().unwrap();
  let master = body["master_amount"].as_f64().unwrap();
  let agent = body["agent_amount"].as_f64().unwrap();
  let office = body["office_amount"].as_f64().unwrap();
  assert!((gross - 3_000.0).abs() < 1e-6);
  assert!((master - 300.0).abs() < 1e-6);
  assert!((agent - 1_500.0).abs() < 1e-6);
  assert!((master + agent + office - gross).abs() < 1e-9);
}

#[tokio::test]
async fn preview_rejects_out_of_range_inputs() {
  let (app, _) = make_app().await;
  for body in [
    json!({
      "actual_price": -1.0, "sides": 1, "commission_percentage": 3.0,
      "agent_split_percentage": 50.0, "royalty_percentage": 10.0,
    }),
    json!({
      "actual_price": 1.0, "sides": 1, "commission_percentage": 3.0,
      "agent_split_percentage": 150.0, "royalty_percentage": 10.0,
    }),
  ] {
    let (status, _, _) =
      send(&app, "POST", "/commission/preview", vec![], Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  let (status, _, _) = send(
    &app,
    "POST",
    "/commission/preview",
    vec![],
    Some(json!({
      "actual_price": 1.0, "sides": 3, "commission_percentage": 3.0,
      "agent_split_percentage": 50.0, "royalty_percentage": 10.0,
    })),
  )
  .await;
  assert!(status.is_client_error());
}

// ── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn closing_a_transaction_snapshots_royalty() {
  let (app, store) = make_app().await;
  let org = store.add_organization("Centro".into(), 6.0).await.unwrap();
  let agent = Uuid::new_v4();

  let (status, _, body) = send(
    &app,
    "POST",
    "/transactions",
    vec![],
    Some(json!({
      "agent_id": agent,
      "organization_id": org.organization_id,
      "sides": 2,
      "actual_price": 150000.0,
      "commission_percentage": 3.0,
      "agent_split_percentage": 40.0,
      "transaction_date": "2025-03-12",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!((body["gross_commission"].as_f64().unwrap() - 9_000.0).abs() < 1e-6);
  assert!((body["master_amount"].as_f64().unwrap() - 540.0).abs() < 1e-6);
  assert_eq!(body["royalty_percentage_at_closure"], 6.0);

  let id = body["transaction_id"].as_str().unwrap().to_string();

  // Override the royalty and re-split.
  let (status, _, body) = send(
    &app,
    "POST",
    &format!("/transactions/{id}/commission"),
    vec![],
    Some(json!({ "royalty_percentage": 10.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!((body["master_amount"].as_f64().unwrap() - 900.0).abs() < 1e-6);
  assert_eq!(body["royalty_percentage_at_closure"], 10.0);

  let (status, _, body) =
    send(&app, "GET", &format!("/transactions/{id}"), vec![], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["royalty_percentage_at_closure"], 10.0);
}

#[tokio::test]
async fn closing_against_unknown_organization_is_rejected() {
  let (app, _) = make_app().await;
  let (status, _, _) = send(
    &app,
    "POST",
    "/transactions",
    vec![],
    Some(json!({
      "agent_id": Uuid::new_v4(),
      "organization_id": Uuid::new_v4(),
      "sides": 1,
      "actual_price": 1000.0,
      "commission_percentage": 3.0,
      "agent_split_percentage": 40.0,
      "transaction_date": "2025-03-12",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recompute_unknown_transaction_is_404() {
  let (app, _) = make_app().await;
  let (status, _, _) = send(
    &app,
    "POST",
    &format!("/transactions/{}/commission", Uuid::new_v4()),
    vec![],
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
