//! Due-date badge text
//!
//! Turns a computed due date into the short label shown next to a task.

use chrono::{Datelike, NaiveDate};

/// Days ahead still described as "In N days"
const DAYS_LABEL_MAX: i64 = 6;
/// Days ahead still described as "Next week"
const NEXT_WEEK_MAX: i64 = 13;

/// Format a due date relative to `today`.
///
/// - before today: `Overdue`
/// - today / tomorrow: `Today` / `Tomorrow`
/// - 2 to 6 days ahead: `In N days`
/// - 7 to 13 days ahead: `Next week`
/// - later: short date, with the year only when it differs from today's
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use hearth_common::badge::due_badge;
///
/// let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
/// let next = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
/// assert_eq!(due_badge(next, today), "Tomorrow");
///
/// let later = NaiveDate::from_ymd_opt(2027, 3, 3).unwrap();
/// assert_eq!(due_badge(later, today), "Mar 3, 2027");
/// ```
pub fn due_badge(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();

    if days < 0 {
        "Overdue".to_string()
    } else if days == 0 {
        "Today".to_string()
    } else if days == 1 {
        "Tomorrow".to_string()
    } else if days <= DAYS_LABEL_MAX {
        format!("In {} days", days)
    } else if days <= NEXT_WEEK_MAX {
        "Next week".to_string()
    } else if due.year() == today.year() {
        format!("{} {}", due.format("%b"), due.day())
    } else {
        format!("{} {}, {}", due.format("%b"), due.day(), due.year())
    }
}

/// Badge for an optional date; tasks with no date read `No due date`
pub fn due_badge_opt(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        Some(date) => due_badge(date, today),
        None => "No due date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_near_labels() {
        let today = date(2026, 1, 10);
        assert_eq!(due_badge(date(2026, 1, 9), today), "Overdue");
        assert_eq!(due_badge(today, today), "Today");
        assert_eq!(due_badge(date(2026, 1, 11), today), "Tomorrow");
        assert_eq!(due_badge(date(2026, 1, 12), today), "In 2 days");
        assert_eq!(due_badge(date(2026, 1, 16), today), "In 6 days");
    }

    #[test]
    fn test_next_week_window() {
        let today = date(2026, 1, 10);
        assert_eq!(due_badge(date(2026, 1, 17), today), "Next week");
        assert_eq!(due_badge(date(2026, 1, 23), today), "Next week");
        assert_eq!(due_badge(date(2026, 1, 24), today), "Jan 24");
    }

    #[test]
    fn test_year_shown_only_when_different() {
        let today = date(2026, 12, 1);
        assert_eq!(due_badge(date(2026, 12, 25), today), "Dec 25");
        assert_eq!(due_badge(date(2027, 1, 5), today), "Jan 5, 2027");
    }

    #[test]
    fn test_missing_date() {
        assert_eq!(due_badge_opt(None, date(2026, 1, 10)), "No due date");
        assert_eq!(due_badge_opt(Some(date(2026, 1, 10)), date(2026, 1, 10)), "Today");
    }
}
