/// Backend access for the tank dashboard.
///
/// Submodules:
/// - `envelope` — turns a raw HTTP response into a list of records or a typed error.
/// - `api` — blocking REST client for every backend endpoint the dashboard uses.

pub mod api;
pub mod envelope;
