/// Tank registry for the plant monitoring dashboard.
///
/// Defines the tanks offered in the analytics history selector. Selector
/// values are `"{tank_no}_{location}"`; the history endpoint only wants the
/// tank number, so callers go through `parse_tank_value` rather than
/// splitting strings themselves.

use chrono::{DateTime, Duration, Utc};

// ---------------------------------------------------------------------------
// Tank metadata
// ---------------------------------------------------------------------------

/// One selectable tank.
pub struct TankOption {
    /// Tank number as the backend knows it.
    pub tank_no: &'static str,
    /// Plant area the tank serves.
    pub location: &'static str,
}

impl TankOption {
    /// Selector value, e.g. `"CS21_Battery-5"`.
    pub fn value(&self) -> String {
        format!("{}_{}", self.tank_no, self.location)
    }

    /// Selector label, e.g. `"CS21 - Battery-5"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.tank_no, self.location)
    }
}

/// Tanks offered for history analysis, in selector order. The first entry is
/// the default selection.
pub static TANK_REGISTRY: &[TankOption] = &[
    TankOption { tank_no: "CS21", location: "Battery-5" },
    TankOption { tank_no: "CS21B", location: "Battery-5" },
    TankOption { tank_no: "BS-11", location: "Battery-5 WF" },
    TankOption { tank_no: "BS-10", location: "Battery-5 WF" },
    TankOption { tank_no: "BS-7A", location: "Battery-3 WF" },
    TankOption { tank_no: "BS-7B", location: "Battery-2 WF" },
    TankOption { tank_no: "CS-23B", location: "Sinter Plant R" },
    TankOption { tank_no: "BS-6", location: "Power Plant of" },
    TankOption { tank_no: "LS-1", location: "M. Gas Holder" },
    TankOption { tank_no: "MS-14", location: "ERS" },
    TankOption { tank_no: "FIRE-TANK", location: "Propane Gas" },
];

/// Days of history shown when the analytics view opens.
pub const DEFAULT_HISTORY_DAYS: i64 = 3;

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Tank number part of a selector value. A value with no `_` is taken to be
/// a bare tank number.
pub fn parse_tank_value(value: &str) -> &str {
    value.split('_').next().unwrap_or(value)
}

pub fn all_tank_numbers() -> Vec<&'static str> {
    TANK_REGISTRY.iter().map(|t| t.tank_no).collect()
}

/// Looks a tank up by number or by full selector value.
pub fn find_tank(key: &str) -> Option<&'static TankOption> {
    let tank_no = parse_tank_value(key.trim());
    TANK_REGISTRY.iter().find(|t| t.tank_no == tank_no)
}

pub fn default_tank() -> Option<&'static TankOption> {
    TANK_REGISTRY.first()
}

/// `(start, end)` as `yyyy-mm-dd` for the default history window ending
/// on `now`'s date.
pub fn default_history_range_at(now: DateTime<Utc>) -> (String, String) {
    let start = now - Duration::days(DEFAULT_HISTORY_DAYS);
    (
        start.format("%Y-%m-%d").to_string(),
        now.format("%Y-%m-%d").to_string(),
    )
}

pub fn default_history_range() -> (String, String) {
    default_history_range_at(Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_no_duplicate_tank_numbers() {
        let numbers = all_tank_numbers();
        let unique: HashSet<_> = numbers.iter().collect();
        assert_eq!(numbers.len(), unique.len(), "registry contains a duplicate tank number");
    }

    #[test]
    fn test_registry_values_and_labels() {
        let first = default_tank().unwrap();
        assert_eq!(first.value(), "CS21_Battery-5");
        assert_eq!(first.label(), "CS21 - Battery-5");
        assert_eq!(TANK_REGISTRY.len(), 11);
    }

    #[test]
    fn test_tank_numbers_contain_no_separator() {
        for tank in TANK_REGISTRY {
            assert!(
                !tank.tank_no.contains('_'),
                "{} would not survive parse_tank_value",
                tank.tank_no
            );
        }
    }

    #[test]
    fn test_parse_tank_value() {
        assert_eq!(parse_tank_value("BS-7A_Battery-3 WF"), "BS-7A");
        assert_eq!(parse_tank_value("FIRE-TANK_Propane Gas"), "FIRE-TANK");
        assert_eq!(parse_tank_value("MS-14"), "MS-14");
        assert_eq!(parse_tank_value(""), "");
    }

    #[test]
    fn test_find_tank_by_number_or_value() {
        assert_eq!(find_tank("LS-1").map(|t| t.location), Some("M. Gas Holder"));
        assert_eq!(find_tank("CS-23B_Sinter Plant R").map(|t| t.tank_no), Some("CS-23B"));
        assert!(find_tank("XX-99").is_none());
    }

    #[test]
    fn test_every_value_parses_back_to_its_tank() {
        for tank in TANK_REGISTRY {
            let found = find_tank(&tank.value()).map(|t| t.tank_no);
            assert_eq!(found, Some(tank.tank_no));
        }
    }

    #[test]
    fn test_default_history_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
        assert_eq!(
            default_history_range_at(now),
            ("2024-02-28".to_string(), "2024-03-02".to_string()),
            "three days back across a leap-year month end"
        );
    }
}
