//! Day key derivation and re-parsing.
//!
//! A day key is the human-readable map key of the schedule: the English
//! weekday name followed by a fixed `DD.MM.YYYY` date, e.g.
//! `"Monday 10.03.2025"`. The date suffix keeps the key re-parseable, so
//! a day referenced before it exists (picked from a list of historical
//! keys) can be reconstructed into an approximate date.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Key for the calendar day containing `date`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%A %d.%m.%Y").to_string()
}

/// Key for the local calendar day containing the instant `at`.
pub fn day_key_for(at: DateTime<Utc>) -> String {
    day_key(at.with_timezone(&Local).date_naive())
}

/// Extract the `DD.MM.YYYY` suffix of a day key.
///
/// Returns `None` when no parseable date suffix is present; callers fall
/// back to "now" in that case.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    let suffix = key.split_whitespace().last()?;
    NaiveDate::parse_from_str(suffix, "%d.%m.%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_combines_weekday_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(day_key(date), "Monday 10.03.2025");
    }

    #[test]
    fn parse_recovers_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(parse_day_key(&day_key(date)), Some(date));
    }

    #[test]
    fn parse_tolerates_extra_words() {
        assert_eq!(
            parse_day_key("some day 01.02.2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_day_key("not a key"), None);
        assert_eq!(parse_day_key(""), None);
        assert_eq!(parse_day_key("Monday 99.99.9999"), None);
    }
}
