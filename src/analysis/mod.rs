/// Derived views over a poll's worth of tank readings.
///
/// Everything here is pure and synchronous: each function takes the readings
/// of one poll cycle (or one queried history range) and returns a fresh
/// result. Nothing is carried between cycles.
///
/// Submodules:
/// - `sanitize` — spike rejection and exponential smoothing of level series.
/// - `kpi` — online/offline/issue counts and drill-down rows.
/// - `issues` — the ranked "Issues Detected" list behind the bell.

pub mod issues;
pub mod kpi;
pub mod sanitize;
