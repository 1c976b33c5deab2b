//! CLI error types with miette diagnostics.
//!
//! Maps `kasa_api::Error` and `kasa_config::ConfigError` into user-facing
//! errors with actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use kasa_config::{ConfigError, VaultError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the cloud gateway at {url}")]
    #[diagnostic(
        code(kasa::connection_failed),
        help(
            "Check your network connection.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(kasa::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    #[error("HTTP error: {0}")]
    #[diagnostic(code(kasa::http))]
    Http(Box<dyn std::error::Error + Send + Sync>),

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login rejected by the cloud ({code}): {message}")]
    #[diagnostic(
        code(kasa::auth_failed),
        help(
            "Check your TP-Link account username and password.\n\
             Store new ones with: kasa config set-credentials"
        )
    )]
    AuthFailed { code: i64, message: String },

    #[error("No credentials stored")]
    #[diagnostic(
        code(kasa::no_credentials),
        help(
            "Store them with: kasa config set-credentials\n\
             Or set KASA_USERNAME and KASA_PASSWORD."
        )
    )]
    NoCredentials,

    #[error("Could not decrypt the stored credentials")]
    #[diagnostic(
        code(kasa::decryption_failed),
        help(
            "The passphrase is wrong or the settings file is corrupted.\n\
             Start over with: kasa config reset"
        )
    )]
    DecryptionFailed,

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Bulb '{alias}' not found")]
    #[diagnostic(
        code(kasa::not_found),
        help("Aliases match exactly. Run: kasa devices list")
    )]
    NotFound { alias: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Cloud API error ({code}): {message}")]
    #[diagnostic(code(kasa::api_error))]
    ApiError { code: i64, message: String },

    #[error("Unexpected response from the cloud: {message}")]
    #[diagnostic(code(kasa::decode), help("Run with -vvv to see the raw response."))]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kasa::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(kasa::config))]
    Config(Box<figment::Error>),

    #[error("Credential vault error: {0}")]
    #[diagnostic(code(kasa::vault))]
    Vault(VaultError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {reason}")]
    #[diagnostic(
        code(kasa::prompt),
        help(
            "Running without a terminal? Set KASA_PASSPHRASE, KASA_USERNAME\n\
             and KASA_PASSWORD instead."
        )
    )]
    Prompt { reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(kasa::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(kasa::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Http(_) => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials | Self::DecryptionFailed => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Like `From<kasa_api::Error>`, but a gateway rejection is a failed login.
    pub fn from_login(err: kasa_api::Error) -> Self {
        match err {
            kasa_api::Error::Api { code, message } => Self::AuthFailed { code, message },
            other => other.into(),
        }
    }
}

// ── kasa_api::Error → CliError ───────────────────────────────────────

impl From<kasa_api::Error> for CliError {
    fn from(err: kasa_api::Error) -> Self {
        match err {
            kasa_api::Error::Transport(e) if e.is_timeout() => Self::Timeout,
            kasa_api::Error::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), |u| u.origin().ascii_serialization()),
                source: Box::new(e),
            },
            kasa_api::Error::Transport(e) => Self::Http(Box::new(e)),
            kasa_api::Error::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            kasa_api::Error::Api { code, message } => Self::ApiError { code, message },
            kasa_api::Error::Deserialization { message, body } => {
                tracing::trace!(%body, "undecodable response");
                Self::Decode { message }
            }
            kasa_api::Error::PreferredStateOutOfRange { index, len } => Self::Validation {
                field: "index".into(),
                reason: if len == 0 {
                    format!("{index} is out of range, the bulb has no presets")
                } else {
                    format!("{index} is out of range, expected 0..={}", len - 1)
                },
            },
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Serialization(e) => Self::Json(e),
            ConfigError::Vault(VaultError::DecryptionFailed) => Self::DecryptionFailed,
            ConfigError::Vault(e) => Self::Vault(e),
            ConfigError::NoCredentials => Self::NoCredentials,
            ConfigError::Prompt(reason) => Self::Prompt { reason },
            ConfigError::Locked => Self::Prompt {
                reason: "this command needs the vault passphrase".into(),
            },
        }
    }
}
