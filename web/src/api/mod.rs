//! API client for the LocalChat backend.

mod client;
mod streaming;

pub use client::*;
pub use streaming::*;

/// Backend base URL; override at build time with `LOCALCHAT_API_URL`.
pub fn api_base() -> &'static str {
    option_env!("LOCALCHAT_API_URL").unwrap_or("/api")
}

/// Join the base URL and an endpoint path.
pub fn endpoint(path: &str) -> String {
    join_url(api_base(), path)
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
