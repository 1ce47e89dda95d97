//! Recurring-task next-occurrence calculation
//!
//! A recurring task carries an `isRecurring` flag and an optional
//! `recurringPattern`. The next due date is never stored; it is recomputed
//! from the current date every time it is needed.
//!
//! # Calculation by frequency
//!
//! - `daily`: today + `interval` days
//! - `weekly` with weekdays: nearest configured weekday strictly after today,
//!   wrapping into the following week (`interval` is not applied)
//! - `weekly` without weekdays: today + 7 × `interval` days
//! - `monthly`: month advanced by `interval`, overflowing days roll forward
//! - `yearly`: year advanced by one (`interval` is not applied)
//!
//! Stored values are never rejected: weekday numbers outside 0..=6 are
//! skipped and an interval below 1 counts as 0. These, and the two places
//! where `interval` is ignored, are reported through
//! [`RecurringPattern::anomalies`] and logged when an occurrence is computed.
//! No occurrence later than `endDate` is ever produced.

use crate::time::{add_months_rollover, add_years_rollover, format_iso_date, iso_date_opt};
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How often a task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(Error::InvalidInput(format!("unknown frequency: {other}"))),
        }
    }
}

fn default_interval() -> i64 {
    1
}

/// Description of how a task repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    pub frequency: Frequency,

    /// Every N units of `frequency`; values below 1 are kept as stored
    #[serde(default = "default_interval")]
    pub interval: i64,

    /// Weekday numbers, 0 = Sunday through 6 = Saturday (weekly only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<i64>>,

    /// No occurrence later than this date is computed
    #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Inconsistency in a stored pattern that the calculator tolerates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternAnomaly {
    /// Weekly pattern with explicit weekdays: the interval is not applied
    WeeklyIntervalIgnored { interval: i64 },
    /// Yearly pattern: the year always advances by one
    YearlyIntervalIgnored { interval: i64 },
    /// Interval below 1, applied as 0
    NonPositiveInterval { interval: i64 },
    /// Weekday number outside 0..=6, skipped by the calculator
    InvalidWeekday(i64),
    /// Weekdays set on a pattern that is not weekly
    WeekdaysWithoutWeekly,
}

impl fmt::Display for PatternAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternAnomaly::WeeklyIntervalIgnored { interval } => write!(
                f,
                "weekly interval {} ignored because explicit weekdays are set",
                interval
            ),
            PatternAnomaly::YearlyIntervalIgnored { interval } => {
                write!(f, "yearly interval {} ignored, advancing one year", interval)
            }
            PatternAnomaly::NonPositiveInterval { interval } => {
                write!(f, "interval {} is below 1, applied as 0", interval)
            }
            PatternAnomaly::InvalidWeekday(day) => write!(f, "weekday {} is not in 0..=6", day),
            PatternAnomaly::WeekdaysWithoutWeekly => {
                write!(f, "weekdays are only used by weekly patterns")
            }
        }
    }
}

impl RecurringPattern {
    pub fn new(frequency: Frequency, interval: i64) -> Self {
        Self {
            frequency,
            interval,
            days_of_week: None,
            end_date: None,
        }
    }

    pub fn with_days(mut self, days: &[i64]) -> Self {
        self.days_of_week = Some(days.to_vec());
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Configured weekdays in 0..=6, sorted and deduplicated
    fn valid_weekdays(&self) -> Vec<u8> {
        let mut days: Vec<u8> = self
            .days_of_week
            .iter()
            .flatten()
            .filter_map(|day| u8::try_from(*day).ok())
            .filter(|day| *day <= 6)
            .collect();
        days.sort_unstable();
        days.dedup();
        days
    }

    /// Interval as applied by the calculator
    fn applied_interval(&self) -> i64 {
        self.interval.max(0)
    }

    fn has_weekdays(&self) -> bool {
        self.days_of_week.as_ref().is_some_and(|days| !days.is_empty())
    }

    /// Report every place where this pattern is not applied as written
    pub fn anomalies(&self) -> Vec<PatternAnomaly> {
        let mut found = Vec::new();

        for day in self.days_of_week.iter().flatten() {
            if !(0..=6).contains(day) {
                found.push(PatternAnomaly::InvalidWeekday(*day));
            }
        }

        if self.interval < 1 {
            found.push(PatternAnomaly::NonPositiveInterval {
                interval: self.interval,
            });
        }

        match self.frequency {
            Frequency::Weekly if self.interval > 1 && !self.valid_weekdays().is_empty() => {
                found.push(PatternAnomaly::WeeklyIntervalIgnored {
                    interval: self.interval,
                });
            }
            Frequency::Yearly if self.interval > 1 => {
                found.push(PatternAnomaly::YearlyIntervalIgnored {
                    interval: self.interval,
                });
            }
            _ => {}
        }

        if self.frequency != Frequency::Weekly && self.has_weekdays() {
            found.push(PatternAnomaly::WeekdaysWithoutWeekly);
        }

        found
    }

    /// Strict check applied when a task is created.
    ///
    /// The calculator never calls this; stored patterns are used as they are.
    pub fn validate(&self) -> Result<()> {
        if self.interval < 1 {
            return Err(Error::InvalidInput(
                "recurrence interval must be at least 1".to_string(),
            ));
        }
        if let Some(day) = self
            .days_of_week
            .iter()
            .flatten()
            .find(|day| !(0..=6).contains(*day))
        {
            return Err(Error::InvalidInput(format!(
                "weekday {} is out of range (0 = Sunday .. 6 = Saturday)",
                day
            )));
        }
        if self.frequency != Frequency::Weekly && self.has_weekdays() {
            return Err(Error::InvalidInput(format!(
                "weekdays cannot be used with {} recurrence",
                self.frequency
            )));
        }
        Ok(())
    }

    /// Next due date after `today`, ignoring the recurring flag.
    ///
    /// `None` once the end date has passed or when the next date would
    /// fall after it.
    pub fn next_after(&self, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(end) = self.end_date {
            if end < today {
                return None;
            }
        }

        let next = self.step_from(today)?;
        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    fn step_from(&self, today: NaiveDate) -> Option<NaiveDate> {
        let interval = self.applied_interval();
        match self.frequency {
            Frequency::Daily => today.checked_add_signed(Duration::try_days(interval)?),
            Frequency::Weekly => {
                let days = self.valid_weekdays();
                if days.is_empty() {
                    return today.checked_add_signed(Duration::try_weeks(interval)?);
                }
                let current = today.weekday().num_days_from_sunday() as u8;
                let delta = match days.iter().find(|day| **day > current) {
                    Some(day) => day - current,
                    None => days[0] + 7 - current,
                };
                today.checked_add_signed(Duration::days(delta as i64))
            }
            Frequency::Monthly => add_months_rollover(today, u32::try_from(interval).ok()?),
            Frequency::Yearly => add_years_rollover(today, 1),
        }
    }
}

/// Recurrence fields carried by a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(default)]
    pub is_recurring: bool,

    /// Inert unless `is_recurring` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
}

impl Recurrence {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn every(pattern: RecurringPattern) -> Self {
        Self {
            is_recurring: true,
            recurring_pattern: Some(pattern),
        }
    }

    /// The pattern in effect, if any
    pub fn active_pattern(&self) -> Option<&RecurringPattern> {
        if self.is_recurring {
            self.recurring_pattern.as_ref()
        } else {
            None
        }
    }
}

/// Compute the next date on which a recurring task is due.
///
/// Returns `None` when recurrence is disabled, no pattern is set, the
/// pattern's end date is earlier than `today`, or the next date would fall
/// after the end date.
pub fn next_occurrence(recurrence: &Recurrence, today: NaiveDate) -> Option<NaiveDate> {
    let pattern = recurrence.active_pattern()?;

    let anomalies = pattern.anomalies();
    if !anomalies.is_empty() {
        let details: Vec<String> = anomalies.iter().map(ToString::to_string).collect();
        warn!(
            frequency = %pattern.frequency,
            interval = pattern.interval,
            "Recurring pattern not applied as written: {}",
            details.join("; ")
        );
    }

    pattern.next_after(today)
}

/// [`next_occurrence`] formatted as `YYYY-MM-DD`
pub fn next_occurrence_iso(recurrence: &Recurrence, today: NaiveDate) -> Option<String> {
    next_occurrence(recurrence, today).map(format_iso_date)
}

/// [`next_occurrence`] relative to the local wall-clock date
pub fn next_occurrence_now(recurrence: &Recurrence) -> Option<NaiveDate> {
    next_occurrence(recurrence, crate::time::today())
}
