//! Shared HTTP client construction.

use std::time::Duration;

use crate::error::LlmError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client used by providers.
///
/// 30s connect timeout, `timeout` for the whole request, rustls TLS,
/// `mindflow/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns [`LlmError::Http`] if the TLS backend cannot be initialized.
pub fn default_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(concat!("mindflow/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}
