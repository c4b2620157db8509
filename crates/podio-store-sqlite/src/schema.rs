//! SQL schema for the Podio SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    agent_id    TEXT PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL
);

-- One current-state row per agent. Rows are deactivated, never deleted.
CREATE TABLE IF NOT EXISTS team_members (
    agent_id   TEXT PRIMARY KEY,
    team       TEXT NOT NULL,   -- 'negro' | 'dorado'
    is_active  INTEGER NOT NULL DEFAULT 1,
    joined_at  TEXT NOT NULL,   -- RFC 3339 UTC
    CHECK (team IN ('negro', 'dorado'))
);

CREATE TABLE IF NOT EXISTS organizations (
    organization_id     TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    royalty_percentage  REAL NOT NULL
);

-- Activities are append-only.
CREATE TABLE IF NOT EXISTS activities (
    activity_id    TEXT PRIMARY KEY,
    agent_id       TEXT NOT NULL,
    activity_type  TEXT NOT NULL,
    date           TEXT NOT NULL,   -- YYYY-MM-DD
    person_id      TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id                 TEXT PRIMARY KEY,
    agent_id                       TEXT NOT NULL,
    organization_id                TEXT NOT NULL REFERENCES organizations(organization_id),
    sides                          INTEGER NOT NULL,
    actual_price                   REAL NOT NULL,
    commission_percentage          REAL NOT NULL,
    agent_split_percentage         REAL NOT NULL,
    transaction_date               TEXT NOT NULL,   -- YYYY-MM-DD
    gross_commission               REAL NOT NULL,
    master_amount                  REAL NOT NULL,
    agent_amount                   REAL NOT NULL,
    office_amount                  REAL NOT NULL,
    royalty_percentage_at_closure  REAL,
    buyer_person_id                TEXT,
    seller_person_id               TEXT,
    CHECK (sides IN (1, 2))
);

-- New-contact and new-search events from the CRM, keyed by creation time.
CREATE TABLE IF NOT EXISTS crm_events (
    event_id    TEXT PRIMARY KEY,
    agent_id    TEXT NOT NULL,
    kind        TEXT NOT NULL,   -- 'new_contact' | 'new_search'
    created_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS agent_objectives (
    agent_id                     TEXT NOT NULL,
    year                         INTEGER NOT NULL,
    weekly_pl_pb_target          INTEGER NOT NULL,
    required_prelistings_weekly  INTEGER NOT NULL,
    PRIMARY KEY (agent_id, year)
);

CREATE INDEX IF NOT EXISTS activities_agent_date_idx   ON activities(agent_id, date);
CREATE INDEX IF NOT EXISTS transactions_agent_date_idx ON transactions(agent_id, transaction_date);
CREATE INDEX IF NOT EXISTS crm_events_kind_created_idx ON crm_events(kind, created_at);

PRAGMA user_version = 1;
";
