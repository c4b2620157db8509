//! The competition scoring engine.
//!
//! [`compute`] is a pure function of a [`CompetitionSnapshot`]: every row it
//! needs is loaded up front, so all totals in one result agree with each
//! other. Range-wide totals are computed once; weekly totals re-filter the
//! same rows for each [`WeekWindow`].
//!
//! Team attribution uses the roster as it is at query time. An agent who
//! switched teams mid-range has all of their range counted for their current
//! team.
//!
//! Ties for MVP are broken by pre-listing count, then by roster order.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  config::ScoringConfig,
  model::{
    Activity, ActivityType, AgentObjective, AgentProfile, CrmEvent, DateRange,
    Team, TeamMember, Transaction,
  },
  score::{
    ActivityCounts, AgentScore, CompetitionData, Mvp, PerfectWeekAward,
    PointBreakdown, TeamScore, WeeklyResult,
  },
  week::{WeekWindow, week_windows},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// Everything the engine reads for one query, fetched before scoring starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionSnapshot {
  pub range:        DateRange,
  /// Roster in iteration order; this order is the final MVP tie-break.
  pub roster:       Vec<TeamMember>,
  pub profiles:     Vec<AgentProfile>,
  pub activities:   Vec<Activity>,
  pub transactions: Vec<Transaction>,
  pub crm_events:   Vec<CrmEvent>,
  pub objectives:   Vec<AgentObjective>,
}

impl CompetitionSnapshot {
  pub fn new(range: DateRange) -> Self {
    Self {
      range,
      roster: Vec::new(),
      profiles: Vec::new(),
      activities: Vec::new(),
      transactions: Vec::new(),
      crm_events: Vec::new(),
      objectives: Vec::new(),
    }
  }
}

// ─── Referral credits ────────────────────────────────────────────────────────

/// A referral bonus earned by `agent_id` for `person_id`, dated by the
/// agent's earliest qualifying activity for that person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralCredit {
  pub agent_id:  Uuid,
  pub person_id: Uuid,
  pub date:      NaiveDate,
}

/// At most one credit per `(agent, person)`: the agent must have tagged the
/// person as referred and logged at least one qualifying activity for them,
/// in either order, anywhere in `activities`.
pub fn referral_credits(
  activities: &[&Activity],
  config: &ScoringConfig,
) -> Vec<ReferralCredit> {
  let mut earliest: HashMap<(Uuid, Uuid), NaiveDate> = HashMap::new();
  let mut referred: Vec<(Uuid, Uuid)> = Vec::new();
  let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();

  for activity in activities {
    let Some(person_id) = activity.person_id else { continue };
    let key = (activity.agent_id, person_id);

    if activity.activity_type == ActivityType::Referred && seen.insert(key) {
      referred.push(key);
    }
    if config.qualifies_referral(activity.activity_type) {
      earliest
        .entry(key)
        .and_modify(|d| *d = (*d).min(activity.date))
        .or_insert(activity.date);
    }
  }

  referred
    .into_iter()
    .filter_map(|(agent_id, person_id)| {
      earliest
        .get(&(agent_id, person_id))
        .map(|&date| ReferralCredit { agent_id, person_id, date })
    })
    .collect()
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Rows already restricted to the range and to active roster members.
struct Rows<'a> {
  activities:   Vec<&'a Activity>,
  transactions: Vec<&'a Transaction>,
  crm_events:   Vec<&'a CrmEvent>,
  referrals:    Vec<ReferralCredit>,
}

impl Rows<'_> {
  /// Tally counts per roster slot for every row whose date passes `keep`.
  fn tally(
    &self,
    slots: &HashMap<Uuid, usize>,
    keep: impl Fn(NaiveDate) -> bool,
  ) -> Vec<ActivityCounts> {
    let mut counts = vec![ActivityCounts::default(); slots.len()];

    for a in self.activities.iter().filter(|a| keep(a.date)) {
      counts[slots[&a.agent_id]].record_activity(a.activity_type);
    }
    for t in self.transactions.iter().filter(|t| keep(t.transaction_date)) {
      counts[slots[&t.agent_id]].record_closing(t.sides);
    }
    for e in self.crm_events.iter().filter(|e| keep(e.date())) {
      counts[slots[&e.agent_id]].record_crm_event(e.kind);
    }
    for r in self.referrals.iter().filter(|r| keep(r.date)) {
      counts[slots[&r.agent_id]].referral_bonuses += 1;
    }
    counts
  }
}

struct Member<'a> {
  entry:        &'a TeamMember,
  display_name: Option<String>,
  objective:    Option<&'a AgentObjective>,
}

/// An agent without a configured objective (both weekly targets above zero)
/// can never have a perfect week, even if one target is zero.
fn is_perfect_week(
  counts: &ActivityCounts,
  objective: Option<&AgentObjective>,
  config: &ScoringConfig,
) -> bool {
  let Some(objective) = objective.filter(|o| o.is_configured()) else {
    return false;
  };
  let rules = &config.perfect_week;

  counts.green_meetings >= rules.green_meetings
    && i64::from(counts.critical()) >= i64::from(objective.weekly_pl_pb_target)
    && i64::from(counts.pre_listings)
      >= i64::from(objective.required_prelistings_weekly)
    && counts.referred >= rules.referred
}

/// Highest `(points, pre_listings)`; the first of a perfect tie wins. Only
/// reported when the winner scored above zero.
fn pick_mvp<'a, 'm: 'a>(
  candidates: impl Iterator<Item = (&'a Member<'m>, i64, u32)>,
) -> Option<Mvp> {
  let mut best: Option<(&'a Member<'m>, i64, u32)> = None;
  for (member, points, pre_listings) in candidates {
    let better = match best {
      None => true,
      Some((_, best_points, best_pl)) => {
        points > best_points || (points == best_points && pre_listings > best_pl)
      }
    };
    if better {
      best = Some((member, points, pre_listings));
    }
  }

  best
    .filter(|(_, points, _)| *points > 0)
    .map(|(member, points, pre_listings)| Mvp {
      agent_id: member.entry.agent_id,
      display_name: member.display_name.clone(),
      team: member.entry.team,
      points,
      pre_listings,
    })
}

/// Score the competition for `snapshot.range`.
///
/// Weeks whose Monday falls after `today` are left out of
/// `weekly_results` entirely.
pub fn compute(
  snapshot: &CompetitionSnapshot,
  config: &ScoringConfig,
  today: NaiveDate,
) -> CompetitionData {
  let range = snapshot.range;

  // Active members, first row per agent wins.
  let mut slots: HashMap<Uuid, usize> = HashMap::new();
  let mut roster: Vec<&TeamMember> = Vec::new();
  for entry in snapshot.roster.iter().filter(|m| m.is_active) {
    if !slots.contains_key(&entry.agent_id) {
      slots.insert(entry.agent_id, roster.len());
      roster.push(entry);
    }
  }

  if roster.is_empty() {
    return CompetitionData::empty(range);
  }

  let names: HashMap<Uuid, String> = snapshot
    .profiles
    .iter()
    .map(|p| (p.agent_id, p.display_name()))
    .collect();

  let year = config.objective_year.unwrap_or_else(|| range.end.year());
  let mut objectives: HashMap<Uuid, &AgentObjective> = HashMap::new();
  for o in snapshot.objectives.iter().filter(|o| o.year == year) {
    objectives.entry(o.agent_id).or_insert(o);
  }

  let members: Vec<Member> = roster
    .into_iter()
    .map(|entry| Member {
      entry,
      display_name: names.get(&entry.agent_id).cloned(),
      objective: objectives.get(&entry.agent_id).copied(),
    })
    .collect();

  let in_scope =
    |agent_id: &Uuid, date: NaiveDate| slots.contains_key(agent_id) && range.contains(date);

  let activities: Vec<&Activity> = snapshot
    .activities
    .iter()
    .filter(|a| in_scope(&a.agent_id, a.date))
    .collect();
  let referrals = referral_credits(&activities, config);
  let rows = Rows {
    activities,
    transactions: snapshot
      .transactions
      .iter()
      .filter(|t| in_scope(&t.agent_id, t.transaction_date))
      .collect(),
    crm_events: snapshot
      .crm_events
      .iter()
      .filter(|e| in_scope(&e.agent_id, e.date()))
      .collect(),
    referrals,
  };

  let mut totals = rows.tally(&slots, |_| true);

  // ── Weekly breakdown ──────────────────────────────────────────────────────

  let weeks: Vec<WeekWindow> = week_windows(&range)
    .into_iter()
    .filter(|w| w.start <= today)
    .collect();

  let mut weekly_results = Vec::with_capacity(weeks.len());
  for week in &weeks {
    let counts = rows.tally(&slots, |d| week.contains(d));

    let mut negro_total = 0;
    let mut dorado_total = 0;
    let mut perfect_weeks = Vec::new();
    let mut weekly_points = Vec::with_capacity(members.len());

    for (slot, member) in members.iter().enumerate() {
      let c = &counts[slot];
      let mut points = PointBreakdown::score(c, config).total();
      weekly_points.push(points);

      if is_perfect_week(c, member.objective, config) {
        totals[slot].perfect_weeks += 1;
        points += config.perfect_week.bonus;
        perfect_weeks.push(PerfectWeekAward {
          agent_id:     member.entry.agent_id,
          display_name: member.display_name.clone(),
          team:         member.entry.team,
        });
      }

      match member.entry.team {
        Team::Negro => negro_total += points,
        Team::Dorado => dorado_total += points,
      }
    }

    let mvp = pick_mvp(
      members
        .iter()
        .enumerate()
        .map(|(slot, m)| (m, weekly_points[slot], counts[slot].pre_listings)),
    );

    weekly_results.push(WeeklyResult {
      week_start: week.start,
      week_end: week.end,
      week_number: week.number,
      negro_total,
      dorado_total,
      mvp,
      perfect_weeks,
    });
  }

  // ── Range-wide totals ─────────────────────────────────────────────────────

  let mut negro = TeamScore::empty(Team::Negro);
  let mut dorado = TeamScore::empty(Team::Dorado);
  let mut scores = Vec::with_capacity(members.len());

  for (slot, member) in members.iter().enumerate() {
    let counts = totals[slot].clone();
    let breakdown = PointBreakdown::score(&counts, config);
    let total_points = breakdown.total();

    let team = match member.entry.team {
      Team::Negro => &mut negro,
      Team::Dorado => &mut dorado,
    };
    team.member_count += 1;
    team.total_points += total_points;
    team.breakdown.accumulate(&breakdown);

    scores.push(AgentScore {
      agent_id: member.entry.agent_id,
      display_name: member.display_name.clone(),
      team: member.entry.team,
      breakdown,
      counts,
      total_points,
    });
  }

  for t in &rows.transactions {
    match members[slots[&t.agent_id]].entry.team {
      Team::Negro => negro.revenue += t.gross_commission,
      Team::Dorado => dorado.revenue += t.gross_commission,
    }
  }

  let mvp = pick_mvp(
    members
      .iter()
      .zip(&scores)
      .map(|(m, s)| (m, s.total_points, s.counts.pre_listings)),
  );

  CompetitionData { range, negro, dorado, weekly_results, mvp, members: scores }
}
