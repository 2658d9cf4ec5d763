//! Parsing of viewer-typed date bounds and formatting of reading times.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};

/// Date-time layouts accepted for viewer-supplied bounds, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which side of a date window a bound sits on.
///
/// A date-only start covers the day from midnight; a date-only end covers
/// the day up to its last instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Start,
    End,
}

/// Parse a viewer-supplied bound like "2024-03-01" or "2024-03-01T14:30".
///
/// Naive values are interpreted in `offset`. RFC 3339 strings carry their
/// own offset. Returns `None` for blank or unparsable input.
pub fn parse_bound(s: &str, side: BoundSide, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_to_utc(naive, offset);
        }
    }

    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    let naive = match side {
        BoundSide::Start => date.and_time(NaiveTime::MIN),
        BoundSide::End => date.succ_opt()?.and_time(NaiveTime::MIN) - TimeDelta::nanoseconds(1),
    };
    local_to_utc(naive, offset)
}

fn local_to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build a fixed offset from minutes east of UTC, falling back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(utc_offset)
}

/// The zero offset.
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Format a timestamp for a log entry, e.g. "14:30 | 01 March 2024".
pub fn format_log_entry(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format("%H:%M | %d %B %Y").to_string()
}

/// Format a timestamp for a detail line, e.g. "14:30 01-March-2024".
pub fn format_detail(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format("%H:%M %d-%B-%Y").to_string()
}

/// Axis label granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    /// "March-2024"
    MonthYear,
    /// "01 Mar"
    DayMonth,
}

impl AxisScale {
    /// Choose a scale for a series spanning `first..=last`.
    ///
    /// Series shorter than roughly two months are labelled by day.
    pub fn for_span(first: DateTime<Utc>, last: DateTime<Utc>) -> Self {
        if last - first < TimeDelta::days(60) {
            AxisScale::DayMonth
        } else {
            AxisScale::MonthYear
        }
    }
}

/// Format a timestamp for a chart axis label.
pub fn format_axis_label(ts: DateTime<Utc>, scale: AxisScale, offset: FixedOffset) -> String {
    let local = ts.with_timezone(&offset);
    match scale {
        AxisScale::MonthYear => local.format("%B-%Y").to_string(),
        AxisScale::DayMonth => local.format("%d %b").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_date_only_bounds() {
        let start = parse_bound("2024-03-01", BoundSide::Start, utc_offset()).unwrap();
        assert_eq!(start, utc(2024, 3, 1, 0, 0, 0));

        let end = parse_bound("2024-03-01", BoundSide::End, utc_offset()).unwrap();
        assert!(end > utc(2024, 3, 1, 23, 59, 59));
        assert!(end < utc(2024, 3, 2, 0, 0, 0));
    }

    #[test]
    fn test_parse_datetime_bounds() {
        let expected = utc(2024, 3, 1, 14, 30, 0);
        for s in ["2024-03-01T14:30", "2024-03-01 14:30", "2024-03-01T14:30:00"] {
            assert_eq!(parse_bound(s, BoundSide::Start, utc_offset()), Some(expected), "{s}");
        }
        assert_eq!(
            parse_bound("2024-03-01T14:30:00+07:00", BoundSide::End, utc_offset()),
            Some(utc(2024, 3, 1, 7, 30, 0))
        );
    }

    #[test]
    fn test_parse_applies_offset() {
        let wib = offset_from_minutes(7 * 60);
        assert_eq!(
            parse_bound("2024-03-01T07:00", BoundSide::Start, wib),
            Some(utc(2024, 3, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_invalid_bounds() {
        for s in ["", "   ", "yesterday", "2024-13-01", "2024-02-30", "01/03/2024"] {
            assert_eq!(parse_bound(s, BoundSide::Start, utc_offset()), None, "{s}");
        }
    }

    #[test]
    fn test_format() {
        let ts = utc(2024, 3, 1, 14, 5, 0);
        assert_eq!(format_log_entry(ts, utc_offset()), "14:05 | 01 March 2024");
        assert_eq!(format_detail(ts, utc_offset()), "14:05 01-March-2024");
        assert_eq!(format_axis_label(ts, AxisScale::MonthYear, utc_offset()), "March-2024");
        assert_eq!(format_axis_label(ts, AxisScale::DayMonth, utc_offset()), "01 Mar");
    }

    #[test]
    fn test_axis_scale() {
        let first = utc(2024, 1, 1, 0, 0, 0);
        assert_eq!(AxisScale::for_span(first, utc(2024, 1, 20, 0, 0, 0)), AxisScale::DayMonth);
        assert_eq!(AxisScale::for_span(first, utc(2024, 6, 1, 0, 0, 0)), AxisScale::MonthYear);
    }
}
