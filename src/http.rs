//! Shared HTTP client construction.

use crate::error::Result;
use std::time::Duration;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("ipwatch/", env!("CARGO_PKG_VERSION"));

/// Build a client whose every request is bounded by `timeout`.
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}
