use thiserror::Error;

/// Top-level error type for the `kasa-api` crate.
///
/// Closed taxonomy covering every failure mode of the cloud gateway:
/// transport, gateway-reported errors, payload decoding, and local
/// validation. Nothing is retried internally; every variant is handed
/// straight back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, TLS, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error (bad cloud URL or device gateway URL).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Gateway ─────────────────────────────────────────────────────
    /// Nonzero `error_code` in the response envelope. Login rejections,
    /// expired tokens, and offline devices all surface here.
    #[error("Cloud API error {code}: {message}")]
    Api { code: i64, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON decoding failed, with the raw payload for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Validation ──────────────────────────────────────────────────
    /// Preferred-state index outside the device's current preset list.
    #[error("Invalid preferred state index {index} (device has {len})")]
    PreferredStateOutOfRange { index: usize, len: usize },
}

impl Error {
    /// Returns `true` if the gateway rejected the request with an error code.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Extract the gateway error code, if available.
    pub fn api_error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn decode(err: &serde_json::Error, body: impl Into<String>) -> Self {
        let body = body.into();
        let preview = &body[..floor_char_boundary(&body, 200)];
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
