/// Tank backend REST client
///
/// Blocking client for the dashboard backend. Every list endpoint goes
/// through the envelope parser, so callers get `Vec<Value>` (or typed pages)
/// and never look at response shapes themselves.
///
/// Endpoints (all under the configured base URL):
/// - `GET  /tank-current/all`            live tank list
/// - `GET  /tank-master?debug=1`         tank configuration master
/// - `GET  /tanks/history`               level history for one tank
/// - `GET  /notifications`               alert records
/// - `GET  /reports/{period}?format=pdf` PDF report download
/// - `GET  /reports/export-csv`          raw transaction CSV download
/// - `GET  /tank/logs`                   paginated offline/online log
/// - `GET  /tank/sms-logs`               paginated SMS dispatch log
/// - `GET  /user`, `PUT /user/{id}`      SMS recipient roster
/// - `POST /tank-master`                 save one tank parameter row

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alert::notifications::normalize_notifications;
use crate::forms::SaveTankPayload;
use crate::ingest::envelope::{
    check_logical, excerpt, parse_envelope, parse_json_body, unwrap_list, HTTP_EXCERPT_CHARS,
    JSON_EXCERPT_CHARS,
};
use crate::logging::{self, Endpoint};
use crate::model::{ApiError, NotificationRecord, ShapeError};

pub const DEFAULT_API_BASE: &str = "http://119.18.62.146:3000/api";

// ============================================================================
// Typed payloads
// ============================================================================

/// One offline/online transition from `/tank/logs`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OfflineLogEntry {
    #[serde(default)]
    pub tankname: String,
    #[serde(default)]
    pub offline_time: Option<String>,
    #[serde(default)]
    pub online_time: Option<String>,
    /// Text or minutes, depending on the backend version.
    #[serde(default)]
    pub duration: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SmsUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// One dispatched SMS from `/tank/sms-logs`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SmsLogEntry {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub tank_name: String,
    pub user: SmsUser,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(rename = "totalRecords", default)]
    pub total_records: usize,
    #[serde(rename = "totalPages", default)]
    pub total_pages: usize,
}

/// A paginated list response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// SMS recipient as stored by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    #[serde(deserialize_with = "numeric_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUpdate {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}_report.pdf", self.as_str())
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Drops parameters whose value is empty.
pub fn build_query<'a>(params: &[(&'a str, String)]) -> Vec<(&'a str, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (*k, v.clone()))
        .collect()
}

/// Strips trailing slashes from a configured base URL.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Roster ids arrive as numbers or numeric strings.
fn numeric_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("id {} is not an integer", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("id '{}' is not numeric", s))),
        other => Err(serde::de::Error::custom(format!("unusable id {}", other))),
    }
}

/// Decodes roster rows one by one; a row that cannot be decoded is logged
/// and skipped instead of failing the whole roster.
pub fn parse_users(source: Endpoint, rows: Vec<Value>) -> Vec<User> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<User>(row) {
            Ok(user) => Some(user),
            Err(e) => {
                logging::warn(source, None, &format!("skipping roster row {}: {}", i, e));
                None
            }
        })
        .collect()
}

/// Decodes a typed body from an already-checked JSON value.
fn decode<T: DeserializeOwned>(json: Value) -> Result<T, ApiError> {
    check_logical(&json)?;
    serde_json::from_value(json)
        .map_err(|e| ShapeError::InvalidJson(excerpt(&e.to_string(), JSON_EXCERPT_CHARS)).into())
}

/// Parses a page body, logging and degrading shape problems to an empty page.
pub fn parse_page<T: DeserializeOwned>(source: Endpoint, json: Value) -> Result<Page<T>, ApiError> {
    match decode::<Page<T>>(json) {
        Err(e) if e.is_shape() => {
            logging::warn(source, None, &format!("treating page as empty: {}", e));
            Ok(Page { data: Vec::new(), pagination: Pagination::default() })
        }
        other => other,
    }
}

struct RawResponse {
    status: u16,
    content_type: String,
    body: String,
    url: String,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(ApiClient { client, base: normalize_base(base) })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<RawResponse, ApiError> {
        let response = request.header("Accept", "application/json").send()?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text()?;
        Ok(RawResponse { status, content_type, body, url })
    }

    fn get_raw(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError> {
        let url = self.url(path);
        logging::debug(Endpoint::System, None, &format!("GET {}", url));
        self.send(self.client.get(&url).query(&build_query(query)))
    }

    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let raw = self.get_raw(path, query)?;
        parse_json_body(raw.status, &raw.content_type, &raw.body, &raw.url)
    }

    /// GET a list endpoint. Shape problems come back as an empty list.
    fn get_list(
        &self,
        source: Endpoint,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, ApiError> {
        let result = self
            .get_raw(path, query)
            .and_then(|raw| parse_envelope(raw.status, &raw.content_type, &raw.body, &raw.url));
        unwrap_list(source, result)
    }

    fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        let response = self.client.get(&url).query(&build_query(query)).send()?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let url = response.url().to_string();
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Http {
                status,
                url,
                body_excerpt: excerpt(&body, HTTP_EXCERPT_CHARS),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    // ------------------------------------------------------------------------
    // Tanks
    // ------------------------------------------------------------------------

    pub fn get_tanks(&self) -> Result<Vec<Value>, ApiError> {
        self.get_list(Endpoint::Tanks, "/tank-current/all", &[])
    }

    pub fn get_tank_master(&self) -> Result<Vec<Value>, ApiError> {
        self.get_list(Endpoint::TankMaster, "/tank-master", &[("debug", "1".to_string())])
    }

    /// History rows for one tank. `start`/`end` are passed through as given;
    /// empty values are left off the query.
    pub fn get_tank_history(&self, tank_no: &str, start: &str, end: &str) -> Result<Vec<Value>, ApiError> {
        self.get_list(
            Endpoint::History,
            "/tanks/history",
            &[
                ("tank_no", tank_no.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
            ],
        )
    }

    /// Normalized notification records, in backend order.
    pub fn get_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        let rows = self.get_list(Endpoint::Notifications, "/notifications", &[])?;
        Ok(normalize_notifications(&rows))
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    pub fn download_report(&self, period: ReportPeriod) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(
            &format!("/reports/{}", period.as_str()),
            &[("format", "pdf".to_string())],
        )
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, ApiError> {
        self.get_bytes("/reports/export-csv", &[])
    }

    pub fn get_offline_logs(&self, page: usize, limit: usize) -> Result<Page<OfflineLogEntry>, ApiError> {
        let json = self.get_json(
            "/tank/logs",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )?;
        parse_page(Endpoint::OfflineLog, json)
    }

    pub fn get_sms_logs(&self, page: usize, limit: usize) -> Result<Page<SmsLogEntry>, ApiError> {
        let json = self.get_json(
            "/tank/sms-logs",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )?;
        parse_page(Endpoint::SmsLog, json)
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub fn get_users(&self) -> Result<Vec<User>, ApiError> {
        let rows = self.get_list(Endpoint::Users, "/user", &[])?;
        Ok(parse_users(Endpoint::Users, rows))
    }

    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), ApiError> {
        let url = self.url(&format!("/user/{}", id));
        let raw = self.send(self.client.put(&url).json(update))?;
        let json = parse_json_body(raw.status, &raw.content_type, &raw.body, &raw.url)?;
        check_logical(&json)
    }

    // ------------------------------------------------------------------------
    // Tank master writes
    // ------------------------------------------------------------------------

    /// Saves one tank parameter row. Only the status is checked; a JSON body
    /// is additionally checked for `{ok:false}`.
    pub fn save_tank_master(&self, payload: &SaveTankPayload) -> Result<(), ApiError> {
        let url = self.url("/tank-master");
        let raw = self.send(self.client.post(&url).json(payload))?;
        if !(200..300).contains(&raw.status) {
            return Err(ApiError::Http {
                status: raw.status,
                url: raw.url,
                body_excerpt: excerpt(&raw.body, HTTP_EXCERPT_CHARS),
            });
        }
        if let Ok(json) = serde_json::from_str::<Value>(&raw.body) {
            check_logical(&json)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
