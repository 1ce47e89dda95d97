//! Date and timestamp utilities

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, NaiveDate, Utc};

/// ISO-8601 calendar date format (`YYYY-MM-DD`)
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date on the local wall clock
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format a date as `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, ISO_DATE_FORMAT).ok()
}

/// Advance `date` by `months` calendar months with day-of-month rollover.
///
/// The day is not clamped: an overflowing day carries into the following
/// month, so 2026-01-31 + 1 month is 2026-03-03.
pub fn add_months_rollover(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let month_index = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = month_index.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(ChronoDuration::days(date.day0() as i64))
}

/// Advance `date` by `years` with the same rollover (Feb 29 + 1 year is Mar 1)
pub fn add_years_rollover(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    add_months_rollover(date, years.checked_mul(12)?)
}

/// Serde adapter for optional ISO dates accepting full timestamps on input
pub mod iso_date_opt {
    use super::{format_iso_date, parse_iso_date};
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&format_iso_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_iso_date(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid ISO date: {s}"))),
        }
    }
}
