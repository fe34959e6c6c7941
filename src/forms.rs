/// Tank-master parameters: row normalization, the add/edit form and table
/// paging.
///
/// The master list arrives with several generations of field names; rows are
/// normalized once here. Form input is validated locally and turned into a
/// `SaveTankPayload`; a `ValidationError` never reaches the backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ValidationError;
use crate::resolve::{pick_number, pick_string};

const MASTER_TANK_NO_KEYS: &[&str] = &["tank_no", "tankNo", "tank_name", "tankName"];
const MASTER_SIM_KEYS: &[&str] = &["sim_number", "simNumber"];
const MASTER_IMEI_KEYS: &[&str] = &["imei_number", "imeiNumber"];
const MASTER_SSID_KEYS: &[&str] = &["ssid", "SSID"];
const MASTER_ULTRASONIC_KEYS: &[&str] = &["ultrasonic_status", "ultrasonicStatus", "status"];
const MASTER_TANK_STATUS_KEYS: &[&str] = &["tank_status", "tankStatus", "status"];
const MASTER_SAFE_MAX_KEYS: &[&str] = &[
    "safe_max_level_l",
    "safeMaxLevelL",
    "upper_safe_limit_pct",
    "upper_safe_limit_l",
];
const MASTER_SAFE_MIN_KEYS: &[&str] = &[
    "safe_min_level_l",
    "safeMinLevelL",
    "lower_safe_limit_pct",
    "lower_safe_limit_l",
];
const MASTER_INSTALL_KEYS: &[&str] = &["installation_date", "installationDate", "install_year", "installYear"];

/// Buttons shown in a pager strip.
pub const PAGE_BUTTONS: usize = 7;

// ============================================================================
// Master rows
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTankRow {
    pub tank_no: String,
    pub sim_number: String,
    pub imei_number: String,
    pub ssid: String,
    pub ultrasonic_status: String,
    pub tank_status: String,
    pub safe_max_level_l: Option<f64>,
    pub safe_min_level_l: Option<f64>,
    /// `dd/mm/yyyy` for display.
    pub install_date: Option<String>,
}

pub fn normalize_master_row(row: &Value) -> NormalizedTankRow {
    let install = pick_string(row, MASTER_INSTALL_KEYS);
    NormalizedTankRow {
        tank_no: pick_string(row, MASTER_TANK_NO_KEYS),
        sim_number: pick_string(row, MASTER_SIM_KEYS),
        imei_number: pick_string(row, MASTER_IMEI_KEYS),
        ssid: pick_string(row, MASTER_SSID_KEYS),
        ultrasonic_status: pick_string(row, MASTER_ULTRASONIC_KEYS),
        tank_status: pick_string(row, MASTER_TANK_STATUS_KEYS),
        safe_max_level_l: pick_number(row, MASTER_SAFE_MAX_KEYS),
        safe_min_level_l: pick_number(row, MASTER_SAFE_MIN_KEYS),
        install_date: if install.is_empty() { None } else { Some(format_ddmmyyyy(&install)) },
    }
}

pub fn normalize_master_rows(rows: &[Value]) -> Vec<NormalizedTankRow> {
    rows.iter().map(normalize_master_row).collect()
}

/// Case-insensitive substring search over the text columns. A blank query
/// keeps every row.
pub fn filter_master_rows<'a>(rows: &'a [NormalizedTankRow], query: &str) -> Vec<&'a NormalizedTankRow> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|r| {
            [
                &r.tank_no,
                &r.sim_number,
                &r.imei_number,
                &r.ssid,
                &r.ultrasonic_status,
                &r.tank_status,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&q))
        })
        .collect()
}

// ============================================================================
// Dates
// ============================================================================

/// Display form `dd/mm/yyyy`. Accepts `yyyy-mm-dd`, `dd-mm-yyyy` or either
/// with `/`, optionally followed by a time part. Anything else comes back
/// as given; blank input is `"-"`.
pub fn format_ddmmyyyy(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return "-".to_string();
    }

    let date = s.split(['T', ' ']).next().unwrap_or(s);
    let parts: Vec<&str> = date.split(['-', '/']).collect();
    if parts.len() != 3 {
        return date.to_string();
    }

    let (day, month, year) = if parts[0].len() == 4 {
        (parts[2], parts[1], parts[0])
    } else {
        (parts[0], parts[1], parts[2])
    };
    format!("{:0>2}/{:0>2}/{}", day, month, year)
}

/// Backend form `yyyy-mm-dd` from `yyyy-mm-dd` or `d/m/yyyy`. Blank input is
/// `Ok(None)`; anything that is not a real calendar date is rejected.
pub fn to_backend_date(value: &str) -> Result<Option<String>, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(v, "%d/%m/%Y"))
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|_| ValidationError::InvalidDate(v.to_string()))
}

// ============================================================================
// Form
// ============================================================================

/// Body of `POST /tank-master`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveTankPayload {
    pub tank_no: String,
    pub sim_number: String,
    pub imei_number: String,
    pub ssid: String,
    pub ultrasonic_status: String,
    pub safe_max_level_l: Option<f64>,
    pub safe_min_level_l: Option<f64>,
    pub installation_date: Option<String>,
}

/// Raw text of the add/edit dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TankForm {
    pub tank_no: String,
    pub sim_number: String,
    pub imei_number: String,
    pub ssid: String,
    pub safe_max_level: String,
    pub safe_min_level: String,
    pub ultrasonic_status: String,
    pub install_date: String,
}

fn parse_limit(field: &'static str, text: &str) -> Result<Option<f64>, ValidationError> {
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(ValidationError::NotNumeric { field, value: text.to_string() }),
    }
}

impl TankForm {
    /// Pre-fills the edit dialog; the display date goes back to `yyyy-mm-dd`.
    pub fn from_row(row: &NormalizedTankRow) -> Self {
        let install_date = match row.install_date.as_deref() {
            Some(d) => to_backend_date(d).ok().flatten().unwrap_or_else(|| d.to_string()),
            None => String::new(),
        };
        TankForm {
            tank_no: row.tank_no.clone(),
            sim_number: row.sim_number.clone(),
            imei_number: row.imei_number.clone(),
            ssid: row.ssid.clone(),
            safe_max_level: row.safe_max_level_l.map(|n| n.to_string()).unwrap_or_default(),
            safe_min_level: row.safe_min_level_l.map(|n| n.to_string()).unwrap_or_default(),
            ultrasonic_status: row.ultrasonic_status.clone(),
            install_date,
        }
    }

    /// Trims every field and checks it. The first problem found is returned.
    pub fn validate(&self) -> Result<SaveTankPayload, ValidationError> {
        let tank_no = self.tank_no.trim();
        if tank_no.is_empty() {
            return Err(ValidationError::Required("Tank No"));
        }

        let safe_max = parse_limit("Safe Max Level", self.safe_max_level.trim())?;
        let safe_min = parse_limit("Safe Min Level", self.safe_min_level.trim())?;
        if let (Some(min), Some(max)) = (safe_min, safe_max) {
            if min > max {
                return Err(ValidationError::LimitsInverted { min, max });
            }
        }

        Ok(SaveTankPayload {
            tank_no: tank_no.to_string(),
            sim_number: self.sim_number.trim().to_string(),
            imei_number: self.imei_number.trim().to_string(),
            ssid: self.ssid.trim().to_string(),
            ultrasonic_status: self.ultrasonic_status.trim().to_string(),
            safe_max_level_l: safe_max,
            safe_min_level_l: safe_min,
            installation_date: to_backend_date(&self.install_date)?,
        })
    }
}

// ============================================================================
// Paging
// ============================================================================

/// The slice of a client-side table shown on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based, clamped into range.
    pub page: usize,
    /// At least 1, even for an empty table.
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

pub fn paginate(total_items: usize, page: usize, page_size: usize) -> PageWindow {
    let size = page_size.max(1);
    let total_pages = total_items.div_ceil(size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * size).min(total_items);
    let end = (start + size).min(total_items);
    PageWindow { page, total_pages, start, end }
}

/// Up to seven page numbers centred on `page`, shifted to stay in range.
/// A `page` past the end is treated as the last page.
pub fn visible_pages(page: usize, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    let page = page.clamp(1, total_pages);
    let half = PAGE_BUTTONS / 2;
    let mut start = page.saturating_sub(half).max(1);
    let end = (start + PAGE_BUTTONS - 1).min(total_pages);
    if end - start < PAGE_BUTTONS - 1 {
        start = (end + 1).saturating_sub(PAGE_BUTTONS).max(1);
    }
    (start..=end).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_master_row_aliases() {
        let row = normalize_master_row(&json!({
            "tankName": "BS-6",
            "simNumber": "8991",
            "SSID": "plant-wifi",
            "status": "Active",
            "upper_safe_limit_l": "950",
            "lower_safe_limit_pct": 10,
            "install_year": "2023-04-05T00:00:00.000Z"
        }));
        assert_eq!(row.tank_no, "BS-6");
        assert_eq!(row.sim_number, "8991");
        assert_eq!(row.imei_number, "");
        assert_eq!(row.ssid, "plant-wifi");
        assert_eq!(row.ultrasonic_status, "Active", "status doubles as ultrasonic status");
        assert_eq!(row.tank_status, "Active");
        assert_eq!(row.safe_max_level_l, Some(950.0));
        assert_eq!(row.safe_min_level_l, Some(10.0));
        assert_eq!(row.install_date.as_deref(), Some("05/04/2023"));
    }

    #[test]
    fn test_format_ddmmyyyy() {
        assert_eq!(format_ddmmyyyy("2024-1-9"), "09/01/2024");
        assert_eq!(format_ddmmyyyy("9-1-2024 10:00"), "09/01/2024");
        assert_eq!(format_ddmmyyyy("05/04/2023"), "05/04/2023");
        assert_eq!(format_ddmmyyyy("2023"), "2023", "unrecognized shapes pass through");
        assert_eq!(format_ddmmyyyy("  "), "-");
    }

    #[test]
    fn test_to_backend_date() {
        assert_eq!(to_backend_date("2024-03-07"), Ok(Some("2024-03-07".to_string())));
        assert_eq!(to_backend_date("7/3/2024"), Ok(Some("2024-03-07".to_string())));
        assert_eq!(to_backend_date(""), Ok(None));
        assert_eq!(
            to_backend_date("31/02/2024"),
            Err(ValidationError::InvalidDate("31/02/2024".to_string()))
        );
    }

    #[test]
    fn test_form_validation_builds_payload() {
        let form = TankForm {
            tank_no: "  MS-14 ".to_string(),
            safe_max_level: "900".to_string(),
            safe_min_level: "".to_string(),
            install_date: "01/12/2022".to_string(),
            ..TankForm::default()
        };
        let payload = form.validate().unwrap();
        assert_eq!(payload.tank_no, "MS-14");
        assert_eq!(payload.safe_max_level_l, Some(900.0));
        assert_eq!(payload.safe_min_level_l, None, "empty limit is sent as null");
        assert_eq!(payload.installation_date.as_deref(), Some("2022-12-01"));
    }

    #[test]
    fn test_form_validation_errors() {
        let missing = TankForm { tank_no: "   ".to_string(), ..TankForm::default() };
        assert_eq!(missing.validate(), Err(ValidationError::Required("Tank No")));

        let bad_number = TankForm {
            tank_no: "A".to_string(),
            safe_max_level: "12a".to_string(),
            ..TankForm::default()
        };
        assert_eq!(
            bad_number.validate(),
            Err(ValidationError::NotNumeric { field: "Safe Max Level", value: "12a".to_string() })
        );

        let inverted = TankForm {
            tank_no: "A".to_string(),
            safe_max_level: "100".to_string(),
            safe_min_level: "200".to_string(),
            ..TankForm::default()
        };
        assert_eq!(inverted.validate(), Err(ValidationError::LimitsInverted { min: 200.0, max: 100.0 }));
    }

    #[test]
    fn test_edit_form_round_trips_display_date() {
        let row = NormalizedTankRow {
            tank_no: "LS-1".to_string(),
            safe_max_level_l: Some(800.5),
            install_date: Some("05/04/2023".to_string()),
            ..NormalizedTankRow::default()
        };
        let form = TankForm::from_row(&row);
        assert_eq!(form.install_date, "2023-04-05");
        assert_eq!(form.safe_max_level, "800.5");
        assert_eq!(form.safe_min_level, "");
    }

    #[test]
    fn test_search_filter() {
        let rows = normalize_master_rows(&[
            json!({ "tank_no": "CS21", "ssid": "north" }),
            json!({ "tank_no": "BS-6", "imei_number": "3567" }),
        ]);
        assert_eq!(filter_master_rows(&rows, "").len(), 2);
        assert_eq!(filter_master_rows(&rows, "NORTH")[0].tank_no, "CS21");
        assert_eq!(filter_master_rows(&rows, "3567")[0].tank_no, "BS-6");
        assert!(filter_master_rows(&rows, "zzz").is_empty());
    }

    #[test]
    fn test_paginate() {
        assert_eq!(paginate(0, 1, 10), PageWindow { page: 1, total_pages: 1, start: 0, end: 0 });
        assert_eq!(paginate(25, 3, 10), PageWindow { page: 3, total_pages: 3, start: 20, end: 25 });
        assert_eq!(paginate(25, 9, 10).page, 3, "page is clamped to the last page");
        assert_eq!(paginate(25, 0, 10).page, 1);
    }

    #[test]
    fn test_visible_pages() {
        assert_eq!(visible_pages(1, 3), vec![1, 2, 3]);
        assert_eq!(visible_pages(1, 20), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(visible_pages(10, 20), vec![7, 8, 9, 10, 11, 12, 13]);
        assert_eq!(visible_pages(20, 20), vec![14, 15, 16, 17, 18, 19, 20]);
        assert!(visible_pages(1, 0).is_empty());
    }

    #[test]
    fn test_visible_pages_after_page_count_shrinks() {
        assert_eq!(visible_pages(12, 3), vec![1, 2, 3], "page past the end clamps to the last page");
        assert_eq!(visible_pages(50, 9), vec![3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(visible_pages(0, 2), vec![1, 2]);
    }
}
