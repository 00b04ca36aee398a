use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};

use super::{DateRange, EventsError};

const DEFAULT_RANGE_MONTHS: u32 = 1;

/// Longest canonical form of a date-only value (`YYYY-MM-DD`). Anything
/// shorter than 11 characters carries no time component.
const DATE_ONLY_MAX_LEN: usize = 11;

/// Normalizes a possibly-partial `(start, end)` pair into an absolute UTC
/// range. Both values must be supplied together; with neither, the range
/// defaults to the last month. A date-only `end` is advanced to the start of
/// the following day so the range covers the whole end date.
pub fn resolve(start: Option<&str>, end: Option<&str>) -> Result<DateRange, EventsError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange {
            start: parse_timestamp(start)?,
            end: parse_end_timestamp(end)?,
        }),
        (Some(start), None) => Err(EventsError::InvalidRange {
            supplied: "start",
            value: start.to_string(),
        }),
        (None, Some(end)) => Err(EventsError::InvalidRange {
            supplied: "end",
            value: end.to_string(),
        }),
        (None, None) => {
            let now = Utc::now();
            let start = now
                .checked_sub_months(Months::new(DEFAULT_RANGE_MONTHS))
                .unwrap_or(now);
            Ok(DateRange { start, end: now })
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EventsError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // Offset-less timestamps are read as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    parse_date(raw)?
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| EventsError::InvalidDateFormat(raw.to_string()))
}

fn parse_end_timestamp(raw: &str) -> Result<DateTime<Utc>, EventsError> {
    let raw = raw.trim();
    if raw.len() < DATE_ONLY_MAX_LEN {
        return parse_date(raw)?
            .succ_opt()
            .and_then(|next_day| next_day.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
            .ok_or_else(|| EventsError::InvalidDateFormat(raw.to_string()));
    }
    parse_timestamp(raw)
}

fn parse_date(raw: &str) -> Result<NaiveDate, EventsError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| EventsError::InvalidDateFormat(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn defaults_to_the_last_month() {
        let range = resolve(None, None).unwrap();
        let now = Utc::now();

        assert!(now - range.end < Duration::seconds(5));
        let expected_start = range.end - Months::new(1);
        assert!((range.start - expected_start).num_seconds().abs() < 5);
    }

    #[test]
    fn rejects_one_sided_ranges() {
        let err = resolve(Some("2019-09-22"), None).unwrap_err();
        assert!(matches!(
            err,
            EventsError::InvalidRange {
                supplied: "start",
                ..
            }
        ));

        let err = resolve(None, Some("2019-09-25")).unwrap_err();
        assert!(matches!(
            err,
            EventsError::InvalidRange { supplied: "end", .. }
        ));
    }

    #[test]
    fn rejects_unparsable_dates() {
        let err = resolve(Some("not-a-date"), Some("2019-09-25")).unwrap_err();
        assert!(matches!(err, EventsError::InvalidDateFormat(_)));

        let err = resolve(Some("2019-09-22"), Some("22.09.2019")).unwrap_err();
        assert!(matches!(err, EventsError::InvalidDateFormat(_)));
    }

    #[test]
    fn expands_date_only_end_to_the_following_midnight() {
        let range = resolve(Some("2019-09-22"), Some("2019-09-25")).unwrap();

        assert_eq!(
            range.start,
            Utc.with_ymd_and_hms(2019, 9, 22, 0, 0, 0).unwrap()
        );
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2019, 9, 26, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn keeps_full_timestamps_unmodified() {
        let range = resolve(
            Some("2019-09-22T06:30:00Z"),
            Some("2019-09-25T18:15:00+02:00"),
        )
        .unwrap();

        assert_eq!(
            range.start,
            Utc.with_ymd_and_hms(2019, 9, 22, 6, 30, 0).unwrap()
        );
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2019, 9, 25, 16, 15, 0).unwrap()
        );
    }

    #[test]
    fn reads_offsetless_timestamps_as_utc() {
        let range = resolve(
            Some("2019-09-22T06:30:00"),
            Some("2019-09-25T18:15:00"),
        )
        .unwrap();

        assert_eq!(
            range.start,
            Utc.with_ymd_and_hms(2019, 9, 22, 6, 30, 0).unwrap()
        );
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2019, 9, 25, 18, 15, 0).unwrap()
        );
    }
}
