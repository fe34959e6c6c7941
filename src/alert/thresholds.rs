//! Safe-limit checking for a tank's current level.
//!
//! Each tank master row may configure a safe minimum and maximum in litres.
//! These drive the High/Low pill on the tank card and the green/red level
//! indicator; they are independent of the status text the backend sends.

use serde::Serialize;

use crate::model::TankReading;

/// Where a level sits relative to the configured safe limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelBand {
    High,
    Low,
    Normal,
}

impl std::fmt::Display for LevelBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelBand::High => write!(f, "High level"),
            LevelBand::Low => write!(f, "Low level"),
            LevelBand::Normal => write!(f, "Normal"),
        }
    }
}

/// High when the level reaches the max limit, Low when it falls to the min
/// limit. Either limit may be unset; a missing level is always Normal.
pub fn check_safe_limits(level: Option<f64>, safe_min: Option<f64>, safe_max: Option<f64>) -> LevelBand {
    let Some(level) = level else {
        return LevelBand::Normal;
    };
    if safe_max.is_some_and(|max| level >= max) {
        LevelBand::High
    } else if safe_min.is_some_and(|min| level <= min) {
        LevelBand::Low
    } else {
        LevelBand::Normal
    }
}

pub fn level_band(reading: &TankReading) -> LevelBand {
    check_safe_limits(reading.current_level, reading.safe_min_l, reading.safe_max_l)
}

/// Safe limits expressed as a percentage of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafeBand {
    pub min_pct: f64,
    pub max_pct: f64,
}

/// Only defined when both limits exist, `max > min` and the capacity is
/// positive.
pub fn safe_band_percent(reading: &TankReading) -> Option<SafeBand> {
    let (min, max) = (reading.safe_min_l?, reading.safe_max_l?);
    let capacity = reading.capacity.filter(|c| *c > 0.0)?;
    if max <= min {
        return None;
    }
    Some(SafeBand {
        min_pct: min / capacity * 100.0,
        max_pct: max / capacity * 100.0,
    })
}

/// `Some(true)` inside the band, `Some(false)` outside, `None` when no band
/// is configured or the fill percentage is unknown.
pub fn in_safe_band(reading: &TankReading) -> Option<bool> {
    let band = safe_band_percent(reading)?;
    let fill = reading.fill_percentage?;
    Some(fill >= band.min_pct && fill <= band.max_pct)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_at_max_is_high() {
        assert_eq!(check_safe_limits(Some(900.0), Some(100.0), Some(900.0)), LevelBand::High);
    }

    #[test]
    fn test_level_at_min_is_low() {
        assert_eq!(check_safe_limits(Some(100.0), Some(100.0), Some(900.0)), LevelBand::Low);
    }

    #[test]
    fn test_level_inside_limits_is_normal() {
        assert_eq!(check_safe_limits(Some(500.0), Some(100.0), Some(900.0)), LevelBand::Normal);
    }

    #[test]
    fn test_missing_level_or_limits_is_normal() {
        assert_eq!(check_safe_limits(None, Some(100.0), Some(900.0)), LevelBand::Normal);
        assert_eq!(check_safe_limits(Some(5.0), None, None), LevelBand::Normal);
    }

    #[test]
    fn test_band_display_matches_alert_messages() {
        assert_eq!(LevelBand::High.to_string(), "High level");
        assert_eq!(LevelBand::Low.to_string(), "Low level");
    }

    #[test]
    fn test_safe_band_percent_and_membership() {
        let reading = TankReading::from_record(
            &json!({
                "currentLevel": 5000,
                "capacity": 10000,
                "limits_l": { "min_l": 2000, "max_l": 8000 }
            }),
            0,
        );
        let band = safe_band_percent(&reading).expect("band should be defined");
        assert_eq!(band, SafeBand { min_pct: 20.0, max_pct: 80.0 });
        assert_eq!(in_safe_band(&reading), Some(true));
        assert_eq!(level_band(&reading), LevelBand::Normal);
    }

    #[test]
    fn test_inverted_limits_have_no_band() {
        let reading = TankReading::from_record(
            &json!({ "currentLevel": 5, "capacity": 10, "safe_min_level_l": 8, "safe_max_level_l": 2 }),
            0,
        );
        assert!(safe_band_percent(&reading).is_none());
        assert_eq!(in_safe_band(&reading), None);
    }
}
