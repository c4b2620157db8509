//! Monday-anchored week windows.
//!
//! Every window is exactly seven days, Monday through Sunday. Consecutive
//! windows never overlap and never leave a gap. All arithmetic is on
//! [`NaiveDate`], which carries no time of day, so daylight-saving shifts
//! cannot move a day across a boundary.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::DateRange;

/// The Monday of the ISO week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
  let back = match date.weekday() {
    Weekday::Sun => 6,
    other => u64::from(other.number_from_monday() - 1),
  };
  date - Days::new(back)
}

/// The Sunday closing the week that starts on `monday`.
pub fn sunday_of(monday: NaiveDate) -> NaiveDate { monday + Days::new(6) }

/// Mondays of every week from the one containing `start` up to `end`.
///
/// Returns an empty list when `start > end`.
pub fn mondays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  if start > end {
    return Vec::new();
  }
  let mut mondays = Vec::new();
  let mut current = monday_of(start);
  while current <= end {
    mondays.push(current);
    current = current + Days::new(7);
  }
  mondays
}

/// One Monday..Sunday week inside a scoring range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
  /// 1-based position within the range.
  pub number: u32,
  pub start:  NaiveDate,
  pub end:    NaiveDate,
}

impl WeekWindow {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }
}

/// Partition `range` into the weeks it touches.
pub fn week_windows(range: &DateRange) -> Vec<WeekWindow> {
  mondays_between(range.start, range.end)
    .into_iter()
    .zip(1..)
    .map(|(monday, number)| WeekWindow {
      number,
      start: monday,
      end: sunday_of(monday),
    })
    .collect()
}
