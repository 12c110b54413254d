//! Free-text due-date parsing.
//!
//! All calendar math happens in the user's local time; callers convert the
//! result to UTC for storage. `now` is a parameter so behavior is
//! deterministic under test.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%d.%m.%Y %H:%M", "%d/%m/%Y %H:%M"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a human-entered due date relative to the local `now`.
///
/// Accepted forms: "tomorrow", "day after tomorrow", "in N days", absolute
/// dates in ISO / dot / slash notation with an optional `HH:MM`, and a bare
/// `HH:MM` (rolled to tomorrow when already past). Date-only input gets an
/// end-of-day (23:59) due time. Absolute dates before the local today are
/// rejected, as is anything unparseable.
pub fn parse_due_date(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let input = input.trim().to_lowercase();
    let today = now.date();

    // Relative keywords
    if input == "tomorrow" {
        return Some(end_of_day(today + Duration::days(1)));
    }
    if input == "day after tomorrow" {
        return Some(end_of_day(today + Duration::days(2)));
    }

    // "in N days"
    if let Some(rest) = input.strip_prefix("in ") {
        let number = rest
            .trim()
            .strip_suffix("days")
            .or_else(|| rest.trim().strip_suffix("day"))
            .unwrap_or(rest)
            .trim();
        if let Ok(days) = number.parse::<i64>() {
            if days >= 0 {
                return Some(end_of_day(today + Duration::days(days)));
            }
        }
        return None;
    }

    // Absolute date with time
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&input, format) {
            return accept_absolute(parsed, today);
        }
    }

    // Absolute date only: due at end of day
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&input, format) {
            return accept_absolute(end_of_day(parsed), today);
        }
    }

    // Bare time of day: today, or tomorrow when already past
    if let Ok(time) = NaiveTime::parse_from_str(&input, "%H:%M") {
        let mut due = today.and_time(time);
        if due < now {
            due += Duration::days(1);
        }
        return Some(due);
    }

    None
}

/// Date-only comparison: anything due today is still acceptable.
fn accept_absolute(due: NaiveDateTime, today: NaiveDate) -> Option<NaiveDateTime> {
    if due.date() < today {
        return None;
    }
    Some(due)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN))
}
