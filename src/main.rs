/// tankmon daemon
///
/// Usage:
///   tankmon            poll the backend until interrupted
///   tankmon once       run one tank cycle, print the summary, exit
///   tankmon verify     probe every read endpoint and print a report

use std::process::ExitCode;
use std::thread;

use chrono::Utc;

use tankmon_service::alert::stalenesses::card_needs_attention_at;
use tankmon_service::alert::tracker::{bell_count, classify_all, tracker_counts, TrackerAlert};
use tankmon_service::analysis::issues::{issue_rows, IssueRow};
use tankmon_service::analysis::kpi::{aggregate, KpiSummary, MetricKey};
use tankmon_service::config::DashboardConfig;
use tankmon_service::ingest::api::ApiClient;
use tankmon_service::logging::{self, init_logger, Endpoint};
use tankmon_service::model::{ApiError, TankReading};
use tankmon_service::poller::Poller;
use tankmon_service::verify;

/// What one tank poll cycle hands to the dashboard.
#[derive(Debug, Clone)]
struct TankCycle {
    summary: KpiSummary,
    alerts: Vec<TrackerAlert>,
    needs_attention: usize,
}

fn tank_cycle(client: &ApiClient, stale_after_minutes: u64) -> Result<TankCycle, ApiError> {
    let readings = TankReading::from_records(&client.get_tanks()?);
    let now = Utc::now();

    let summary = aggregate(&readings);
    let alerts = classify_all(&readings);
    let needs_attention = readings
        .iter()
        .filter(|r| card_needs_attention_at(r, stale_after_minutes, now))
        .count();

    logging::log_poll_summary(Endpoint::Tanks, summary.total, summary.offline, summary.issues);
    let (ok, warning, inactive) = tracker_counts(&alerts);
    logging::debug(
        Endpoint::Tanks,
        None,
        &format!(
            "tracker: {} ok, {} warning, {} inactive (bell {}); {} cards need attention",
            ok,
            warning,
            inactive,
            bell_count(&alerts),
            needs_attention
        ),
    );

    Ok(TankCycle { summary, alerts, needs_attention })
}

fn issues_cycle(client: &ApiClient) -> Result<Vec<IssueRow>, ApiError> {
    let rows = issue_rows(&client.get_tanks()?);
    for row in &rows {
        logging::debug(Endpoint::Tanks, Some(row.id.as_str()), &format!("{}: {}", row.status, row.issue_text));
    }
    Ok(rows)
}

fn run_daemon(config: &DashboardConfig, client: ApiClient) -> ! {
    let stale_after = config.stale_after_minutes;

    let tank_client = client.clone();
    let tanks = Poller::start("tank list", Endpoint::Tanks, config.tank_interval(), move || {
        tank_cycle(&tank_client, stale_after)
    });
    let issues = Poller::start("issues", Endpoint::Tanks, config.issues_interval(), move || {
        issues_cycle(&client)
    });

    loop {
        thread::sleep(config.tank_interval());

        let tank_state = tanks.snapshot();
        if let Some(err) = &tank_state.error {
            logging::warn(Endpoint::Tanks, None, &format!("banner: {}", err));
        }
        if let Some(cycle) = &tank_state.data {
            logging::info(
                Endpoint::System,
                None,
                &format!(
                    "{} | {} | {} | {} | bell {}",
                    cycle.summary.title(MetricKey::Total),
                    cycle.summary.title(MetricKey::Online),
                    cycle.summary.title(MetricKey::Offline),
                    cycle.summary.title(MetricKey::Issues),
                    bell_count(&cycle.alerts),
                ),
            );
            if cycle.needs_attention > 0 {
                logging::warn(
                    Endpoint::Tanks,
                    None,
                    &format!("{} tank cards need attention", cycle.needs_attention),
                );
            }
        }

        let issue_state = issues.snapshot();
        if let Some(rows) = issue_state.data {
            if !rows.is_empty() {
                logging::info(Endpoint::System, None, &format!("{} issues detected", rows.len()));
            }
        }
    }
}

fn main() -> ExitCode {
    let config = match DashboardConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("tankmon: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logger(config.min_log_level(), config.log_file.as_deref(), config.console_timestamps);
    logging::info(Endpoint::System, None, &format!("tankmon starting against {}", config.api_base));

    let client = match ApiClient::new(&config.api_base, config.request_timeout()) {
        Ok(c) => c,
        Err(e) => {
            logging::error(Endpoint::System, None, &format!("cannot build HTTP client: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match std::env::args().nth(1).as_deref() {
        Some("verify") => {
            let report = verify::run_full_verification(&client);
            verify::print_summary(&report);
            if report.summary.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Some("once") => match tank_cycle(&client, config.stale_after_minutes) {
            Ok(cycle) => {
                match serde_json::to_string_pretty(&cycle.summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => logging::error(Endpoint::System, None, &format!("cannot render summary: {}", e)),
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                logging::log_api_failure(Endpoint::Tanks, "tank poll", &e);
                ExitCode::FAILURE
            }
        },
        Some(other) => {
            eprintln!("tankmon: unknown command '{}' (expected 'once' or 'verify')", other);
            ExitCode::FAILURE
        }
        None => run_daemon(&config, client),
    }
}
