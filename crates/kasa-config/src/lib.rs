//! Settings and credentials for Kasa tools.
//!
//! JSON settings file, the passphrase-keyed credential vault, and
//! resolution of the cloud credential from either the stored blob or a
//! caller-supplied provider. The passphrase itself is never persisted;
//! callers obtain it through a [`PassphraseProvider`].

pub mod vault;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use vault::{Credential, VaultError};

/// File name of the settings record inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("no credentials stored")]
    NoCredentials,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("settings were opened without a passphrase")]
    Locked,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings file ───────────────────────────────────────────────────

/// The persisted settings record.
///
/// ```json
/// { "encrypted_auth": "<base64>", "auto_connect": false }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Vault blob of the cloud credential; empty when none is stored.
    #[serde(default)]
    pub encrypted_auth: String,

    /// Log in automatically on startup.
    #[serde(default)]
    pub auto_connect: bool,
}

/// Resolve the settings file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "kasa", "kasa").map_or_else(
        || dirs_fallback().join(CONFIG_FILE),
        |dirs| dirs.config_dir().join(CONFIG_FILE),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kasa");
    p
}

/// Load settings from `path`, then `KASA_ENCRYPTED_AUTH` / `KASA_AUTO_CONNECT`.
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let settings: Settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed("KASA_").only(&["encrypted_auth", "auto_connect"]))
        .extract()?;
    debug!(
        path = %path.display(),
        has_credential = !settings.encrypted_auth.is_empty(),
        "settings loaded"
    );
    Ok(settings)
}

/// Write settings as pretty JSON, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "settings written");
    Ok(())
}

/// Remove the settings file. A file that is already gone is not an error.
pub fn delete_settings(path: &Path) -> Result<(), ConfigError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "settings deleted");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Providers ───────────────────────────────────────────────────────

/// Supplies the vault passphrase (prompt, environment, keychain, ...).
pub trait PassphraseProvider {
    fn passphrase(&self) -> Result<SecretString, ConfigError>;
}

/// Supplies a cloud credential when none is stored.
pub trait CredentialProvider {
    fn credential(&self) -> Result<Credential, ConfigError>;
}

// ── Configuration ───────────────────────────────────────────────────

/// Credential returned by [`Configuration::resolve_credential`].
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub credential: Credential,
    /// True when the credential came from the provider rather than the
    /// settings file. Its blob is held in memory only until
    /// [`Configuration::save`] is called.
    pub fresh: bool,
}

/// In-memory configuration: passphrase, settings, and where they live.
///
/// Opened with [`load_locked`](Self::load_locked) it has no passphrase:
/// the auto-connect flag and file lifecycle work, credential access
/// returns [`ConfigError::Locked`].
#[derive(Debug)]
pub struct Configuration {
    passphrase: Option<SecretString>,
    settings: Settings,
    path: PathBuf,
}

impl Configuration {
    /// Load settings from `path`; a missing file starts from defaults.
    pub fn load(path: impl Into<PathBuf>, passphrase: SecretString) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = load_settings(&path)?;
        Ok(Self {
            passphrase: Some(passphrase),
            settings,
            path,
        })
    }

    /// Load settings from `path` without a passphrase.
    pub fn load_locked(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::locked(path);
        config.settings = load_settings(&config.path)?;
        Ok(config)
    }

    /// Default settings and no passphrase, without touching the filesystem.
    pub fn locked(path: impl Into<PathBuf>) -> Self {
        Self {
            passphrase: None,
            settings: Settings::default(),
            path: path.into(),
        }
    }

    /// Start from default settings without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>, passphrase: SecretString) -> Self {
        Self {
            passphrase: Some(passphrase),
            settings: Settings::default(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn auto_connect(&self) -> bool {
        self.settings.auto_connect
    }

    /// Set the auto-connect flag and persist it.
    pub fn set_auto_connect(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.settings.auto_connect = enabled;
        self.save()
    }

    fn passphrase(&self) -> Result<&SecretString, ConfigError> {
        self.passphrase.as_ref().ok_or(ConfigError::Locked)
    }

    pub fn has_credential(&self) -> bool {
        !self.settings.encrypted_auth.is_empty()
    }

    /// Decrypt the stored credential, if any.
    pub fn stored_credential(&self) -> Result<Option<Credential>, ConfigError> {
        if !self.has_credential() {
            return Ok(None);
        }
        let credential = vault::decrypt(self.passphrase()?, &self.settings.encrypted_auth)?;
        Ok(Some(credential))
    }

    /// Encrypt `credential` into the in-memory settings without saving.
    pub fn store_credential(&mut self, credential: &Credential) -> Result<(), ConfigError> {
        self.settings.encrypted_auth = vault::encrypt(self.passphrase()?, credential)?;
        Ok(())
    }

    /// Encrypt `credential` and persist the settings file.
    pub fn set_credential(&mut self, credential: &Credential) -> Result<(), ConfigError> {
        self.store_credential(credential)?;
        self.save()
    }

    /// Return the stored credential, or ask `provider` for one.
    ///
    /// A provided credential is encrypted into memory and reported as
    /// fresh; persist it with [`save`](Self::save) once it has been shown
    /// to work. A stored blob that fails to decrypt is an error, not a
    /// reason to prompt.
    pub fn resolve_credential(
        &mut self,
        provider: &dyn CredentialProvider,
    ) -> Result<ResolvedCredential, ConfigError> {
        if let Some(credential) = self.stored_credential()? {
            return Ok(ResolvedCredential {
                credential,
                fresh: false,
            });
        }

        debug!("no stored credential, asking provider");
        let credential = provider.credential()?;
        self.store_credential(&credential)?;
        Ok(ResolvedCredential {
            credential,
            fresh: true,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        save_settings(&self.path, &self.settings)
    }

    /// Remove the settings file and clear the in-memory record.
    pub fn delete(&mut self) -> Result<(), ConfigError> {
        delete_settings(&self.path)?;
        self.settings = Settings::default();
        Ok(())
    }
}
