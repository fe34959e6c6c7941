//! The bell's "Issues Detected" list.
//!
//! Built straight from raw tank-current rows so it agrees with the KPI issue
//! count: a row is listed only when its status text carries a real issue
//! keyword. Missing volume never puts a tank on this list.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::alert::kpi_status::is_issue_status;
use crate::model::parse_timestamp;
use crate::resolve::pick_string;

const ISSUE_ID_KEYS: &[&str] = &["tank_id", "tankId", "id", "tank_no", "tankNo", "tank"];
const ISSUE_NAME_KEYS: &[&str] = &["tank_name", "tankName", "name"];
const ISSUE_STATUS_KEYS: &[&str] = &["tank_status", "status", "alert_status", "state", "remark", "message"];
const ISSUE_TEXT_KEYS: &[&str] = &["alert_message", "alertMessage", "reason", "issue", "problem", "message", "remark"];
const ISSUE_TIME_KEYS: &[&str] = &[
    "time",
    "timestamp",
    "ts",
    "last_time",
    "lastTime",
    "updated_at",
    "updatedAt",
    "created_at",
    "createdAt",
    "server_time",
    "serverTime",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Raw time text, or `"Time: Not available"`.
    pub when_text: String,
    pub happened_at: Option<DateTime<Utc>>,
    pub issue_text: String,
}

/// 0 = critical/alarm, 1 = fault, 2 = warning, 3 = anything else.
pub fn severity_rank(status: &str) -> u8 {
    let s = status.to_lowercase();
    if s.contains("critical") || s.contains("alarm") {
        0
    } else if s.contains("fault") {
        1
    } else if s.contains("warning") {
        2
    } else {
        3
    }
}

fn issue_row(row: &Value) -> Option<IssueRow> {
    let status = pick_string(row, ISSUE_STATUS_KEYS);
    if !is_issue_status(&status) {
        return None;
    }

    let name_field = pick_string(row, ISSUE_NAME_KEYS);
    let id = {
        let id = pick_string(row, ISSUE_ID_KEYS);
        if !id.is_empty() {
            id
        } else if !name_field.is_empty() {
            name_field.clone()
        } else {
            "tank".to_string()
        }
    };
    let name = if name_field.is_empty() { format!("Tank {}", id) } else { name_field };

    let when = pick_string(row, ISSUE_TIME_KEYS);
    let message = pick_string(row, ISSUE_TEXT_KEYS);

    Some(IssueRow {
        happened_at: parse_timestamp(&when),
        when_text: if when.is_empty() { "Time: Not available".to_string() } else { when },
        issue_text: if message.is_empty() { status.clone() } else { message },
        status,
        id,
        name,
    })
}

/// Issue rows ranked most severe first, then newest first, then by name.
pub fn issue_rows(rows: &[Value]) -> Vec<IssueRow> {
    let mut out: Vec<IssueRow> = rows.iter().filter_map(issue_row).collect();

    out.sort_by(|a, b| {
        severity_rank(&a.status)
            .cmp(&severity_rank(&b.status))
            .then_with(|| match (a.happened_at, b.happened_at) {
                (Some(ta), Some(tb)) => tb.cmp(&ta),
                _ => Ordering::Equal,
            })
            .then_with(|| a.name.cmp(&b.name))
    });

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
