use sqlx::PgPool;
use time::Date;

use crate::repositories;

pub(crate) const GRADES_OPEN: &str = "GRADES_OPEN";
pub(crate) const CURRENT_PERIOD: &str = "CURRENT_PERIOD";

/// Academic period derived from the calendar: first half of the year is
/// period 1, second half is period 2. This key is computed, never stored;
/// writes to it are rejected at the API layer.
pub(crate) fn period_for_date(date: Date) -> i32 {
    if u8::from(date.month()) <= 6 {
        1
    } else {
        2
    }
}

pub(crate) fn current_period() -> i32 {
    period_for_date(time::OffsetDateTime::now_utc().date())
}

pub(crate) fn is_computed_key(key: &str) -> bool {
    key == CURRENT_PERIOD
}

pub(crate) fn default_for_key(key: &str) -> Option<String> {
    match key {
        GRADES_OPEN => Some("true".to_string()),
        CURRENT_PERIOD => Some(current_period().to_string()),
        _ => None,
    }
}

/// The effective value for a key: computed keys always reflect the
/// computation, everything else falls back to the stored value and then the
/// default.
pub(crate) async fn effective_value(
    pool: &PgPool,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    if is_computed_key(key) {
        return Ok(default_for_key(key));
    }

    let stored = repositories::settings::find_by_key(pool, key).await?;
    Ok(stored.map(|setting| setting.value).or_else(|| default_for_key(key)))
}

pub(crate) async fn grades_open(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let value = effective_value(pool, GRADES_OPEN).await?.unwrap_or_else(|| "true".to_string());
    Ok(!matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn first_half_of_year_is_period_one() {
        let date = Date::from_calendar_date(2025, Month::January, 15).unwrap();
        assert_eq!(period_for_date(date), 1);
        let date = Date::from_calendar_date(2025, Month::June, 30).unwrap();
        assert_eq!(period_for_date(date), 1);
    }

    #[test]
    fn second_half_of_year_is_period_two() {
        let date = Date::from_calendar_date(2025, Month::July, 1).unwrap();
        assert_eq!(period_for_date(date), 2);
        let date = Date::from_calendar_date(2025, Month::December, 31).unwrap();
        assert_eq!(period_for_date(date), 2);
    }

    #[test]
    fn current_period_is_a_computed_key() {
        assert!(is_computed_key(CURRENT_PERIOD));
        assert!(!is_computed_key(GRADES_OPEN));
        assert!(!is_computed_key("ENROLLMENT_OPEN"));
    }

    #[test]
    fn grades_open_defaults_to_true() {
        assert_eq!(default_for_key(GRADES_OPEN).as_deref(), Some("true"));
        assert_eq!(default_for_key("UNKNOWN"), None);
    }
}
