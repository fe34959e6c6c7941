/// Tank monitoring service library.
///
/// Normalizes the backend's loosely-shaped tank records, classifies them for
/// the tracker and KPI views, sanitizes level history, and polls the REST
/// backend on fixed intervals.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod export;
pub mod forms;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod poller;
pub mod resolve;
pub mod tanks;
pub mod verify;
