//! Date arguments for the run-history and log filters.
//!
//! Accepted forms, all read as UTC:
//! - `now`
//! - a span back from now: `30m`, `24h`, `7d`, `2w`
//! - RFC 3339 (`2026-03-10T12:00:00Z`)
//! - `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`
//! - `YYYY-MM-DD`, the start of that day for a lower bound and the start of
//!   the next day for an upper bound

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse an inclusive lower bound.
pub fn parse_start(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, Utc::now(), false)
}

/// Parse an exclusive upper bound.
pub fn parse_end(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, Utc::now(), true)
}

fn parse_bound(value: &str, now: DateTime<Utc>, upper: bool) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if value.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Some(span) = parse_span(value) {
        return Ok(now - span);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let day = if upper { date.succ_opt() } else { Some(date) };
        let midnight = day
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| format!("date out of range: {value}"))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    Err(format!(
        "invalid date '{value}' (expected YYYY-MM-DD, 'YYYY-MM-DD HH:MM:SS', RFC 3339, now or a span such as 24h)"
    ))
}

fn parse_span(value: &str) -> Option<Duration> {
    let (split, unit) = value.char_indices().last()?;
    let amount: i64 = value[..split].parse().ok()?;
    if amount < 0 {
        return None;
    }
    match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        'w' => Duration::try_weeks(amount),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_bounds_cover_whole_day() {
        assert_eq!(
            parse_bound("2026-03-01", now(), false).unwrap(),
            at("2026-03-01T00:00:00Z")
        );
        assert_eq!(
            parse_bound("2026-03-01", now(), true).unwrap(),
            at("2026-03-02T00:00:00Z")
        );
    }

    #[test]
    fn test_datetime_forms() {
        assert_eq!(
            parse_bound("2026-03-01 08:30:00", now(), false).unwrap(),
            at("2026-03-01T08:30:00Z")
        );
        assert_eq!(
            parse_bound("2026-03-01T08:30:00", now(), true).unwrap(),
            at("2026-03-01T08:30:00Z")
        );
        assert_eq!(
            parse_bound("2026-03-01T10:30:00+02:00", now(), false).unwrap(),
            at("2026-03-01T08:30:00Z")
        );
    }

    #[test]
    fn test_relative_spans() {
        assert_eq!(parse_bound("now", now(), true).unwrap(), now());
        assert_eq!(
            parse_bound("24h", now(), false).unwrap(),
            at("2026-03-09T12:00:00Z")
        );
        assert_eq!(
            parse_bound("2w", now(), false).unwrap(),
            at("2026-02-24T12:00:00Z")
        );
        assert_eq!(
            parse_bound("90m", now(), false).unwrap(),
            at("2026-03-10T10:30:00Z")
        );
    }

    #[test]
    fn test_invalid_dates_rejected() {
        for value in ["yesterday", "2026-13-01", "10y", "", "-5d", "h"] {
            assert!(parse_bound(value, now(), false).is_err(), "accepted {value:?}");
        }
    }
}
