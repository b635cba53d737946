use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn format_time_of_day(value: Time) -> String {
    value.format(format_description!("[hour]:[minute]:[second]")).unwrap_or_else(|_| value.to_string())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Parses a wall-clock time in `HH:MM` or `HH:MM:SS` form. Only the
/// time-of-day component is kept so stored values compare time-only.
pub(crate) fn parse_time_of_day(value: &str) -> Option<Time> {
    let trimmed = value.trim();
    Time::parse(trimmed, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(trimmed, format_description!("[hour]:[minute]")))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_date_accepts_iso_days() {
        let parsed = parse_date("2025-03-04").expect("date");
        assert_eq!(parsed, Date::from_calendar_date(2025, time::Month::March, 4).unwrap());
        assert!(parse_date("04/03/2025").is_none());
        assert!(parse_date("2025-13-01").is_none());
    }

    #[test]
    fn parse_time_of_day_accepts_short_and_long_forms() {
        assert_eq!(parse_time_of_day("07:45"), Some(Time::from_hms(7, 45, 0).unwrap()));
        assert_eq!(parse_time_of_day("07:45:30"), Some(Time::from_hms(7, 45, 30).unwrap()));
        assert!(parse_time_of_day("25:00").is_none());
        assert!(parse_time_of_day("soon").is_none());
    }

    #[test]
    fn format_date_roundtrips() {
        let date = Date::from_calendar_date(2025, time::Month::August, 7).unwrap();
        assert_eq!(format_date(date), "2025-08-07");
    }
}
