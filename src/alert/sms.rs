//! SMS fan-out preview.
//!
//! Each tank whose alert message is exactly "High level" or "Low level" is
//! expanded into one row per recipient, as the SMS gateway would send it.
//! Every other message, including other warnings, sends nothing.

use serde::Serialize;
use serde_json::Value;

use crate::model::parse_timestamp;
use crate::resolve::pick_string;

/// Recipients used when the roster has not been loaded.
pub const DEFAULT_RECIPIENTS: &[&str] = &[
    "Shri S. Bhowmick",
    "Shri U. Barman",
    "Shri R. Das",
    "Shri A. Ghosh",
];

pub const SMS_TRIGGERS: &[&str] = &["High level", "Low level"];

const SMS_TANK_KEYS: &[&str] = &["tank_no", "tankNo"];
const SMS_MESSAGE_KEYS: &[&str] = &["tank_alert_message", "alert_message", "alertMessage"];
const SMS_TIME_KEYS: &[&str] = &["last_updated", "lastUpdated", "updated_at"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsPreview {
    pub user: String,
    pub tank: String,
    pub alert_type: String,
    pub status: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, or `"-"`.
    pub time: String,
}

fn format_sms_time(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// One row per (triggering tank, recipient), tanks in input order.
pub fn sms_fanout<S: AsRef<str>>(tanks: &[Value], recipients: &[S]) -> Vec<SmsPreview> {
    let mut out = Vec::new();
    for tank in tanks {
        let message = pick_string(tank, SMS_MESSAGE_KEYS);
        if !SMS_TRIGGERS.contains(&message.as_str()) {
            continue;
        }
        let tank_no = pick_string(tank, SMS_TANK_KEYS);
        let time = format_sms_time(&pick_string(tank, SMS_TIME_KEYS));
        for user in recipients {
            out.push(SmsPreview {
                user: user.as_ref().to_string(),
                tank: tank_no.clone(),
                alert_type: message.clone(),
                status: "Sent".to_string(),
                time: time.clone(),
            });
        }
    }
    out
}

/// Case-insensitive match against any column.
pub fn filter_previews<'a>(rows: &'a [SmsPreview], query: &str) -> Vec<&'a SmsPreview> {
    let q = query.trim().to_lowercase();
    rows.iter()
        .filter(|r| {
            q.is_empty()
                || [&r.user, &r.tank, &r.alert_type, &r.status, &r.time]
                    .iter()
                    .any(|v| v.to_lowercase().contains(&q))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_high_and_low_fan_out() {
        let tanks = vec![
            json!({ "tank_no": "CS21", "tank_alert_message": "High level", "last_updated": "2024-05-01T10:15:30.000Z" }),
            json!({ "tank_no": "BS-6", "tank_alert_message": "Warning" }),
            json!({ "tank_no": "LS-1", "tank_alert_message": "Low level" }),
            json!({ "tank_no": "MS-14" }),
        ];
        let rows = sms_fanout(&tanks, DEFAULT_RECIPIENTS);
        assert_eq!(rows.len(), 8, "two triggering tanks times four recipients");
        assert_eq!(rows[0].tank, "CS21");
        assert_eq!(rows[0].user, "Shri S. Bhowmick");
        assert_eq!(rows[0].time, "2024-05-01 10:15:30");
        assert_eq!(rows[0].status, "Sent");
        assert_eq!(rows[4].tank, "LS-1");
        assert_eq!(rows[4].time, "-");
    }

    #[test]
    fn test_no_recipients_no_rows() {
        let tanks = vec![json!({ "tank_no": "CS21", "tank_alert_message": "High level" })];
        let none: [&str; 0] = [];
        assert!(sms_fanout(&tanks, &none).is_empty());
    }

    #[test]
    fn test_filter_previews() {
        let tanks = vec![json!({ "tank_no": "CS21", "tank_alert_message": "Low level" })];
        let rows = sms_fanout(&tanks, &["Shri R. Das".to_string()]);
        assert_eq!(filter_previews(&rows, "das").len(), 1);
        assert_eq!(filter_previews(&rows, "LOW").len(), 1);
        assert!(filter_previews(&rows, "high").is_empty());
        assert_eq!(filter_previews(&rows, "").len(), 1);
    }
}
