use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::team::Countdown;

/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), or a
/// plain `YYYY-MM-DD` date at midnight UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn time_until(target: &str, now: DateTime<Utc>) -> Countdown {
    let past = Countdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        is_past: true,
    };
    let Some(target) = parse_datetime(target) else {
        return past;
    };
    let diff = (target - now).num_seconds();
    if diff <= 0 {
        return past;
    }
    Countdown {
        days: diff / 86_400,
        hours: (diff % 86_400) / 3_600,
        minutes: (diff % 3_600) / 60,
        seconds: diff % 60,
        is_past: false,
    }
}

/// "Sat, Mar 1, 2025"
pub fn format_race_date(date: &str) -> String {
    parse_datetime(date)
        .map(|dt| dt.format("%a, %b %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// "Sat, Mar 1, 7:00 PM UTC"
pub fn format_race_date_time(date: &str) -> String {
    parse_datetime(date)
        .map(|dt| dt.format("%a, %b %-d, %-I:%M %p UTC").to_string())
        .unwrap_or_else(|| date.to_string())
}

pub fn position_label(position: i32) -> &'static str {
    match position {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        p if p <= 5 => "🏆",
        p if p <= 10 => "✅",
        _ => "🏁",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_the_common_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
        assert_eq!(parse_datetime("2025-03-01T19:00:00Z"), Some(expected));
        assert_eq!(parse_datetime("2025-03-01T20:00:00+01:00"), Some(expected));
        assert_eq!(parse_datetime("2025-03-01T19:00:00"), Some(expected));
        assert_eq!(
            parse_datetime("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime("next saturday"), None);
    }

    #[test]
    fn countdown_splits_remaining_time() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let countdown = time_until("2025-03-03T15:30:45Z", now);
        assert_eq!(
            countdown,
            Countdown {
                days: 2,
                hours: 3,
                minutes: 30,
                seconds: 45,
                is_past: false
            }
        );
    }

    #[test]
    fn countdown_for_past_or_unknown_dates_is_zeroed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert!(time_until("2025-03-01T12:00:00Z", now).is_past);
        assert!(time_until("2024-12-31", now).is_past);
        let unknown = time_until("tbd", now);
        assert!(unknown.is_past);
        assert_eq!(unknown.days, 0);
    }

    #[test]
    fn race_dates_are_formatted_for_display() {
        assert_eq!(format_race_date("2025-03-01T19:00:00Z"), "Sat, Mar 1, 2025");
        assert_eq!(format_race_date_time("2025-03-01T19:00:00Z"), "Sat, Mar 1, 7:00 PM UTC");
        assert_eq!(format_race_date("TBD"), "TBD");
    }

    #[test]
    fn finishing_positions_get_badges() {
        assert_eq!(position_label(1), "🥇");
        assert_eq!(position_label(3), "🥉");
        assert_eq!(position_label(4), "🏆");
        assert_eq!(position_label(10), "✅");
        assert_eq!(position_label(11), "🏁");
    }
}
