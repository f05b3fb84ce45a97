//! Next-occurrence calculation.
//!
//! The calendar search walks outward from a reference instant, largest
//! unit first: a month outside the month set advances to the first of
//! the next month, a day that cannot match advances to the next
//! midnight, and within a matching day the smallest matching time of
//! day at or after the cursor wins. Advancing a coarser unit resets
//! every finer unit to its minimum. The search is bounded so
//! expressions that can never match (day 31 in February) fail instead
//! of looping forever.

use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike,
};
use std::collections::BTreeSet;
use thiserror::Error;

use super::expression::CronExpression;

/// How many month boundaries the search may cross before giving up.
pub const MAX_MONTH_ADVANCES: u32 = 48;

/// The calendar search exhausted its horizon without finding a match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cron expression '{expression}' has no matching instant within {horizon} months")]
pub struct UnsatisfiableSchedule {
    /// The expression that never matched.
    pub expression: String,
    /// The search horizon, in month advances.
    pub horizon: u32,
}

impl CronExpression {
    /// First instant strictly after `after` that matches every field.
    ///
    /// Day matching requires the day-of-month AND the day-of-week sets
    /// to both contain the candidate day. POSIX cron takes the union of
    /// the two when both are restricted; the intersection is kept here
    /// deliberately, since switching would move the firing dates of
    /// every schedule that restricts both fields.
    pub fn next_after(&self, after: NaiveDateTime) -> Result<NaiveDateTime, UnsatisfiableSchedule> {
        // Candidates are whole seconds, strictly after the reference.
        let mut cursor = after
            .with_nanosecond(0)
            .unwrap_or(after)
            .checked_add_signed(TimeDelta::seconds(1))
            .ok_or_else(|| self.unsatisfiable())?;
        let mut month_advances = 0u32;

        loop {
            if !self.months().contains(&cursor.month()) {
                cursor = start_of_next_month(cursor.date()).ok_or_else(|| self.unsatisfiable())?;
                month_advances += 1;
                if month_advances > MAX_MONTH_ADVANCES {
                    return Err(self.unsatisfiable());
                }
                continue;
            }

            let weekday = cursor.weekday().num_days_from_sunday();
            if self.days_of_month().contains(&cursor.day())
                && self.days_of_week().contains(&weekday)
            {
                if let Some(time) = self.next_time_of_day(cursor.time()) {
                    return Ok(cursor.date().and_time(time));
                }
            }

            let next = start_of_next_day(cursor.date()).ok_or_else(|| self.unsatisfiable())?;
            if next.month() != cursor.month() {
                month_advances += 1;
                if month_advances > MAX_MONTH_ADVANCES {
                    return Err(self.unsatisfiable());
                }
            }
            cursor = next;
        }
    }

    /// Strictly positive milliseconds until the next occurrence.
    ///
    /// The delay is measured against the wall clock at the moment each
    /// candidate is resolved, not against `from`; a candidate that has
    /// already passed by then is skipped and the search continues.
    pub fn next_delay_ms(&self, from: DateTime<Local>) -> Result<f64, UnsatisfiableSchedule> {
        let mut cursor = from.naive_local();
        loop {
            let occurrence = self.next_after(cursor)?;
            // A local wall-clock time can be skipped entirely by a DST
            // jump; ambiguous times resolve to the earlier instant.
            if let Some(instant) = Local.from_local_datetime(&occurrence).earliest() {
                let delay = instant.signed_duration_since(Local::now());
                let millis = match delay.num_microseconds() {
                    Some(us) => us as f64 / 1_000.0,
                    None => delay.num_milliseconds() as f64,
                };
                if millis > 0.0 {
                    return Ok(millis);
                }
            }
            cursor = occurrence;
        }
    }

    /// Smallest matching time of day at or after `from`, if any is left
    /// in the day.
    fn next_time_of_day(&self, from: NaiveTime) -> Option<NaiveTime> {
        let (hour, minute, second) = (from.hour(), from.minute(), from.second());

        if self.hours().contains(&hour) {
            if self.minutes().contains(&minute) {
                if let Some(&s) = self.seconds().range(second..).next() {
                    return NaiveTime::from_hms_opt(hour, minute, s);
                }
            }
            if let Some(&m) = self.minutes().range(minute + 1..).next() {
                return NaiveTime::from_hms_opt(hour, m, first(self.seconds()));
            }
        }
        if let Some(&h) = self.hours().range(hour + 1..).next() {
            return NaiveTime::from_hms_opt(h, first(self.minutes()), first(self.seconds()));
        }
        None
    }

    fn unsatisfiable(&self) -> UnsatisfiableSchedule {
        UnsatisfiableSchedule {
            expression: self.expression().to_string(),
            horizon: MAX_MONTH_ADVANCES,
        }
    }
}

// Field sets are non-empty by construction; the fallback is never taken.
fn first(set: &BTreeSet<u32>) -> u32 {
    set.iter().next().copied().unwrap_or(0)
}

fn start_of_next_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.succ_opt().map(|d| d.and_time(NaiveTime::MIN))
}

fn start_of_next_month(date: NaiveDate) -> Option<NaiveDateTime> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.and_time(NaiveTime::MIN))
}
