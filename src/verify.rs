//! Endpoint Verification Module
//!
//! Probes each read endpoint of the configured backend and reports which
//! ones answer with usable data. Run this against a new deployment before
//! pointing the pollers at it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ingest::api::ApiClient;
use crate::logging::{self, Endpoint};
use crate::model::ApiError;
use crate::tanks;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub api_base: String,
    pub results: Vec<EndpointVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointVerification {
    pub name: String,
    pub path: String,
    pub status: VerificationStatus,
    pub record_count: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    /// Answered with at least one record.
    Success,
    /// Answered correctly but with nothing in it.
    PartialSuccess,
    Failed,
}

// ============================================================================
// Probing
// ============================================================================

/// Turns one probe outcome (record count or error) into a result row.
pub fn classify_probe(name: &str, path: &str, outcome: Result<usize, ApiError>) -> EndpointVerification {
    let (status, record_count, error_message) = match outcome {
        Ok(0) => (VerificationStatus::PartialSuccess, 0, None),
        Ok(n) => (VerificationStatus::Success, n, None),
        Err(e) => (VerificationStatus::Failed, 0, Some(e.to_string())),
    };
    EndpointVerification {
        name: name.to_string(),
        path: path.to_string(),
        status,
        record_count,
        error_message,
    }
}

pub fn summarize(results: &[EndpointVerification]) -> VerificationSummary {
    let failed = results
        .iter()
        .filter(|r| r.status == VerificationStatus::Failed)
        .count();
    VerificationSummary {
        total: results.len(),
        working: results.len() - failed,
        failed,
    }
}

pub fn run_full_verification(client: &ApiClient) -> VerificationReport {
    let (start, end) = tanks::default_history_range();
    let history_tank = tanks::default_tank().map(|t| t.tank_no).unwrap_or("");

    let probes: Vec<(&str, &str, Result<usize, ApiError>)> = vec![
        ("Tank list", "/tank-current/all", client.get_tanks().map(|r| r.len())),
        ("Tank master", "/tank-master", client.get_tank_master().map(|r| r.len())),
        (
            "Tank history",
            "/tanks/history",
            client.get_tank_history(history_tank, &start, &end).map(|r| r.len()),
        ),
        ("Notifications", "/notifications", client.get_notifications().map(|r| r.len())),
        ("Offline log", "/tank/logs", client.get_offline_logs(1, 10).map(|p| p.data.len())),
        ("SMS log", "/tank/sms-logs", client.get_sms_logs(1, 10).map(|p| p.data.len())),
        ("Users", "/user", client.get_users().map(|u| u.len())),
    ];

    let mut results = Vec::with_capacity(probes.len());
    for (name, path, outcome) in probes {
        let result = classify_probe(name, path, outcome);
        match result.status {
            VerificationStatus::Success => {
                logging::info(Endpoint::System, None, &format!("{} ... OK ({} records)", path, result.record_count));
            }
            VerificationStatus::PartialSuccess => {
                logging::warn(Endpoint::System, None, &format!("{} ... responsive but empty", path));
            }
            VerificationStatus::Failed => {
                logging::error(
                    Endpoint::System,
                    None,
                    &format!("{} ... FAILED: {}", path, result.error_message.as_deref().unwrap_or("Unknown")),
                );
            }
        }
        results.push(result);
    }

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        api_base: client.base().to_string(),
        summary: summarize(&results),
        results,
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("ENDPOINT VERIFICATION SUMMARY ({})", report.api_base);
    println!("═══════════════════════════════════════════════════════════");
    for r in &report.results {
        let mark = match r.status {
            VerificationStatus::Success => "✓",
            VerificationStatus::PartialSuccess => "⚠",
            VerificationStatus::Failed => "✗",
        };
        println!("  {} {:<16} {:<20} {} records", mark, r.name, r.path, r.record_count);
    }
    println!();

    let success_rate = if report.summary.total > 0 {
        (report.summary.working as f64 / report.summary.total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Overall Success Rate: {:.1}% ({}/{})",
        success_rate, report.summary.working, report.summary.total
    );
    println!("═══════════════════════════════════════════════════════════");
}

// ============================================================================
// Tests
// ============================================================================
