//! Tank status classification and alert filtering.
//!
//! Two classification rule sets live side by side and are deliberately kept
//! apart:
//! - `tracker` — the three-state Normal / Warning / Inactive view used by the
//!   tank tracker and bell dropdown.
//! - `kpi_status` — the online/offline split plus an independent issue flag
//!   used by the KPI cards and their drill-down lists.
//!
//! They disagree on purpose in places (the tracker treats "high"/"low" as
//! warnings, the KPI view does not) and must not be merged.
//!
//! `notifications` cleans the alert feed, `sms` previews SMS fan-out, and
//! `thresholds`/`stalenesses` drive per-card health.

pub mod kpi_status;
pub mod notifications;
pub mod sms;
pub mod stalenesses;
pub mod thresholds;
pub mod tracker;
