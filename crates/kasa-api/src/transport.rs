// Shared transport configuration for building the reqwest::Client.
//
// One client is built per process and cloned into the session and every
// device, so all gateway traffic shares a single connection pool.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::Error;

/// User agent of the Android Kasa app. The gateway rejects unknown clients.
pub const MOBILE_USER_AGENT: &str = "Dalvik/2.1.0 (Linux; U; Android 6.0.1; A0001 Build/M4B30X)";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall request timeout. `None` keeps reqwest's defaults.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: MOBILE_USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Every request carries `Content-Type: application/json` and the
    /// configured user agent.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .default_headers(headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(Error::Transport)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_mobile_agent_and_no_timeout() {
        let config = TransportConfig::default();
        assert_eq!(config.user_agent, MOBILE_USER_AGENT);
        assert!(config.timeout.is_none());
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn with_timeout_overrides_default() {
        let config = TransportConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
