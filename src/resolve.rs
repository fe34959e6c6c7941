//! Field resolution for loosely-typed backend records.
//!
//! The backend has renamed most of its fields at least once and old devices
//! still report under the old names, so every logical value is looked up
//! through an ordered list of candidate keys. The lists below are the only
//! place that precedence is defined; call sites never chain fallbacks
//! themselves.
//!
//! Absence is a normal outcome: lookups return `None` or an empty string and
//! never error.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Precedence lists
// ---------------------------------------------------------------------------

pub const CURRENT_LEVEL_KEYS: &[&str] = &[
    "currentLevel",
    "current_level",
    "current_level_l",
    "effective.volume_l",
    "rawVolume",
    "volumeLitres",
];

pub const CAPACITY_KEYS: &[&str] = &[
    "tank_volume",
    "capacity_litre",
    "capacityLitres",
    "capacity",
    "geometry.capacity_l",
];

pub const FILL_PERCENT_KEYS: &[&str] = &[
    "fillPercentage",
    "fill_percentage",
    "fillPct",
    "effective.fill_percentage",
];

pub const TANK_ID_KEYS: &[&str] = &["id", "tank_id", "tankId", "tank_no", "tankNo"];
pub const TANK_NO_KEYS: &[&str] = &["tank_no", "tankNo", "tank_number", "tank"];
pub const NAME_KEYS: &[&str] = &["name", "tank_name", "tankName"];
pub const LOCATION_KEYS: &[&str] = &["location", "site", "area", "plant", "place"];

pub const TANK_STATUS_KEYS: &[&str] = &["tank_status", "tankStatus", "status"];
pub const FLOW_STATUS_KEYS: &[&str] = &["flow_status", "flowStatus", "flow"];

pub const LAST_UPDATED_KEYS: &[&str] = &[
    "current_time",
    "last_updated",
    "last_update",
    "lastUpdate",
    "updated_at",
    "timestamp",
    "time",
    "date_time",
];

pub const ALERT_MESSAGE_KEYS: &[&str] = &[
    "alert_message",
    "alertMessage",
    "tank_alert_message",
    "reason",
    "issue",
    "problem",
];

pub const STALE_KEYS: &[&str] = &["stale"];

pub const SAFE_MAX_KEYS: &[&str] = &[
    "safe_max_level_l",
    "safeMaxLevelL",
    "upper_safe_limit_pct",
    "upper_safe_limit_l",
    "limits_l.max_l",
];

pub const SAFE_MIN_KEYS: &[&str] = &[
    "safe_min_level_l",
    "safeMinLevelL",
    "lower_safe_limit_pct",
    "lower_safe_limit_l",
    "limits_l.min_l",
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Follows a dotted key path (`effective.volume_l`) into nested objects.
/// `null` counts as absent.
fn lookup<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    let mut cur = record;
    for part in key.split('.') {
        cur = cur.get(part)?;
    }
    if cur.is_null() { None } else { Some(cur) }
}

/// First candidate key that is present and not `null`, whatever its type.
pub fn pick_value<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| lookup(record, k))
}

/// Interprets a JSON value as a finite number. Numeric strings are parsed.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() { Some(n) } else { None }
}

/// First candidate whose value is a finite number.
pub fn pick_number(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| lookup(record, k))
        .find_map(as_number)
}

/// First candidate that is a non-blank string (trimmed) or a finite number
/// (rendered as text). Empty string when nothing qualifies.
pub fn pick_string(record: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| lookup(record, k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|_| n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Interprets booleans, `0`/`1` and the usual yes/no strings.
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// First candidate that reads as a boolean.
pub fn pick_flag(record: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .filter_map(|k| lookup(record, k))
        .find_map(as_flag)
}

// ---------------------------------------------------------------------------
// Derived identity
// ---------------------------------------------------------------------------

/// Stable identifier for a tank record, falling back to its 1-based
/// position in the response.
pub fn tank_id(record: &Value, index: usize) -> String {
    let id = pick_string(record, TANK_ID_KEYS);
    if id.is_empty() {
        format!("tank-{}", index + 1)
    } else {
        id
    }
}

/// Human-readable label: explicit name, else `"{location} : {tank_no}"`,
/// else `"Tank {tank_no}"`, else `"Tank"`.
pub fn tank_label(record: &Value) -> String {
    let name = pick_string(record, NAME_KEYS);
    if !name.is_empty() {
        return name;
    }

    let tank_no = pick_string(record, TANK_NO_KEYS);
    let location = pick_string(record, LOCATION_KEYS);
    match (location.is_empty(), tank_no.is_empty()) {
        (false, false) => format!("{} : {}", location, tank_no),
        (_, false) => format!("Tank {}", tank_no),
        _ => "Tank".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
