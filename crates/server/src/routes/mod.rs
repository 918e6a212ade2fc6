use axum::http::HeaderMap;

pub mod categories;
pub mod columns;
pub mod health;
pub mod mappings;
pub mod projects;
pub mod sources;
pub mod tasks;
pub mod tracker;

/// Acting user for timeline attribution and tracker credential lookup.
/// Authentication happens upstream; the proxy forwards the identity here.
pub(crate) fn acting_user(headers: &HeaderMap) -> String {
    headers
        .get("x-user-email")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "anonymous".to_string())
}
