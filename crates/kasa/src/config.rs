//! CLI configuration: settings path resolution and interactive providers.
//!
//! Implements the `kasa_config` provider traits with environment variables
//! first and terminal prompts second, so the binary also runs unattended.

use std::io::IsTerminal;
use std::path::PathBuf;

use dialoguer::Input;
use secrecy::SecretString;

use kasa_config::{ConfigError, Configuration, Credential, CredentialProvider, PassphraseProvider};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub const PASSPHRASE_ENV: &str = "KASA_PASSPHRASE";
pub const USERNAME_ENV: &str = "KASA_USERNAME";
pub const PASSWORD_ENV: &str = "KASA_PASSWORD";

/// Settings file path: `--config` / `KASA_CONFIG`, else the platform default.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(kasa_config::config_path)
}

/// Ask for the passphrase and load the settings it unlocks.
pub fn load_configuration(global: &GlobalOpts) -> Result<Configuration, CliError> {
    let passphrase = PromptPassphrase.passphrase()?;
    Ok(Configuration::load(settings_path(global), passphrase)?)
}

fn prompt_err(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Prompt(e.to_string())
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ── Providers ───────────────────────────────────────────────────────

/// `KASA_PASSPHRASE`, else a hidden terminal prompt.
pub struct PromptPassphrase;

impl PassphraseProvider for PromptPassphrase {
    fn passphrase(&self) -> Result<SecretString, ConfigError> {
        if let Some(passphrase) = env_nonempty(PASSPHRASE_ENV) {
            return Ok(SecretString::from(passphrase));
        }
        if !std::io::stdin().is_terminal() {
            return Err(ConfigError::Prompt(format!(
                "no terminal to ask for the passphrase and {PASSPHRASE_ENV} is not set"
            )));
        }

        let passphrase = rpassword::prompt_password("Passphrase: ").map_err(prompt_err)?;
        if passphrase.is_empty() {
            return Err(ConfigError::Prompt("passphrase cannot be empty".into()));
        }
        Ok(SecretString::from(passphrase))
    }
}

/// `KASA_USERNAME` + `KASA_PASSWORD`, else username and password prompts.
pub struct PromptCredentials;

impl CredentialProvider for PromptCredentials {
    fn credential(&self) -> Result<Credential, ConfigError> {
        if let (Some(username), Some(password)) =
            (env_nonempty(USERNAME_ENV), env_nonempty(PASSWORD_ENV))
        {
            return Ok(Credential::new(username, password));
        }
        if !std::io::stdin().is_terminal() {
            return Err(ConfigError::NoCredentials);
        }

        let username: String = Input::new()
            .with_prompt("TP-Link account (email)")
            .interact_text()
            .map_err(prompt_err)?;
        let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

        if username.trim().is_empty() || password.is_empty() {
            return Err(ConfigError::Prompt(
                "username and password cannot be empty".into(),
            ));
        }
        Ok(Credential::new(username.trim(), password))
    }
}
