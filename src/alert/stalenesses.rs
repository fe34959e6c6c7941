/// Tank reading staleness detection and card health.
///
/// Tank controllers push a reading every few minutes. A controller that has
/// gone quiet still shows its last level on the dashboard, so the card has to
/// call out how old that level is.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This keeps staleness deterministic in tests.

use chrono::{DateTime, Utc};

use crate::alert::kpi_status::is_missing_volume;
use crate::model::TankReading;

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

/// Minutes elapsed between the reading's last update and `now`, with one
/// decimal of precision kept for the card tooltip.
///
/// Returns an error when the reading has no timestamp or it cannot be parsed.
pub fn minutes_since_update_at(reading: &TankReading, now: DateTime<Utc>) -> Result<f64, String> {
    if reading.last_updated.is_empty() {
        return Err("reading has no last-update timestamp".to_string());
    }
    let at = reading
        .last_updated_at
        .ok_or_else(|| format!("unparseable timestamp '{}'", reading.last_updated))?;
    Ok((now - at).num_milliseconds() as f64 / 60_000.0)
}

/// Returns `true` if the reading is at least `max_age_minutes` old.
///
/// The card border turns red at the threshold itself:
///   age >= max_age_minutes  →  stale
///
/// Returns an error if the timestamp is missing or unparseable. Callers
/// should treat that as stale.
pub fn is_stale_at(
    reading: &TankReading,
    max_age_minutes: u64,
    now: DateTime<Utc>,
) -> Result<bool, String> {
    let age = minutes_since_update_at(reading, now)?;
    Ok(age >= max_age_minutes as f64)
}

/// Convenience wrapper that uses the real current time.
pub fn is_stale(reading: &TankReading, max_age_minutes: u64) -> Result<bool, String> {
    is_stale_at(reading, max_age_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Card health
// ---------------------------------------------------------------------------

/// Whether a tank card should be drawn with the red "needs attention"
/// border: backend stale flag, no timestamp, time-stale, no volume reading,
/// or an inactive flow.
pub fn card_needs_attention_at(
    reading: &TankReading,
    max_age_minutes: u64,
    now: DateTime<Utc>,
) -> bool {
    let flow_inactive = reading
        .flow_text
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("inactive"));

    reading.stale_flag == Some(true)
        || is_stale_at(reading, max_age_minutes, now).unwrap_or(true)
        || is_missing_volume(reading.current_level)
        || flow_inactive
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn reading_at(datetime: &str) -> TankReading {
        TankReading::from_record(
            &json!({
                "tank_no": "CS21",
                "location": "Battery-5",
                "currentLevel": 4200.0,
                "flow_status": "Normal",
                "last_updated": datetime,
            }),
            0,
        )
    }

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_minutes_since_update() {
        let reading = reading_at("2024-05-01T12:45:30Z");
        let age = minutes_since_update_at(&reading, fixed_now()).expect("valid timestamp");
        assert!((age - 14.5).abs() < 1e-9, "expected 14.5 minutes, got {}", age);
    }

    #[test]
    fn test_reading_below_threshold_is_not_stale() {
        let reading = reading_at("2024-05-01T12:30:00Z");
        let stale = is_stale_at(&reading, 60, fixed_now()).expect("valid timestamp");
        assert!(!stale, "30-minute-old reading is not stale under a 60-min threshold");
    }

    #[test]
    fn test_reading_exactly_at_threshold_is_stale() {
        let reading = reading_at("2024-05-01T12:00:00Z");
        let stale = is_stale_at(&reading, 60, fixed_now()).expect("valid timestamp");
        assert!(stale, "a reading exactly 60 minutes old already turns the card red");
    }

    #[test]
    fn test_ist_offset_parsed_correctly() {
        // 18:25 +05:30 == 12:55 UTC, five minutes before now.
        let reading = reading_at("2024-05-01T18:25:00+05:30");
        let stale = is_stale_at(&reading, 15, fixed_now()).expect("offset timestamp should parse");
        assert!(!stale);
    }

    #[test]
    fn test_missing_or_invalid_timestamp_is_error() {
        assert!(is_stale_at(&reading_at(""), 60, fixed_now()).is_err());
        assert!(is_stale_at(&reading_at("yesterday"), 60, fixed_now()).is_err());
    }

    #[test]
    fn test_healthy_card_needs_no_attention() {
        let reading = reading_at("2024-05-01T12:50:00Z");
        assert!(!card_needs_attention_at(&reading, 60, fixed_now()));
    }

    #[test]
    fn test_card_attention_triggers() {
        let now = fixed_now();
        assert!(card_needs_attention_at(&reading_at("2024-05-01T09:00:00Z"), 60, now), "time-stale");
        assert!(card_needs_attention_at(&reading_at(""), 60, now), "no timestamp");
        assert!(card_needs_attention_at(&reading_at("garbage"), 60, now), "unparseable counts as stale");

        let mut no_volume = reading_at("2024-05-01T12:50:00Z");
        no_volume.current_level = None;
        assert!(card_needs_attention_at(&no_volume, 60, now), "no volume");

        let mut inactive = reading_at("2024-05-01T12:50:00Z");
        inactive.flow_text = Some("Inactive".to_string());
        assert!(card_needs_attention_at(&inactive, 60, now), "inactive flow");

        let mut flagged = reading_at("2024-05-01T12:50:00Z");
        flagged.stale_flag = Some(true);
        assert!(card_needs_attention_at(&flagged, 60, now), "backend stale flag");
    }
}
