//! Config subcommand handlers.
//!
//! Only `set-credentials` needs the passphrase; the other commands read and
//! write the settings file without touching the vault.

use std::io::IsTerminal;

use dialoguer::Confirm;
use kasa_api::Session;
use kasa_config::{Configuration, CredentialProvider};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::build_client;
use crate::config::{self, PromptCredentials};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SettingsView {
    path: String,
    exists: bool,
    auto_connect: bool,
    credential_stored: bool,
}

fn detail(v: &SettingsView) -> String {
    [
        format!("Path:         {}", v.path),
        format!("Exists:       {}", v.exists),
        format!("Auto-connect: {}", if v.auto_connect { "on" } else { "off" }),
        format!(
            "Credential:   {}",
            if v.credential_stored {
                "stored (encrypted)"
            } else {
                "none"
            }
        ),
    ]
    .join("\n")
}

fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Prompt {
            reason: e.to_string(),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::settings_path(global);

    match args.command {
        ConfigCommand::AutoConnect { state } => {
            let mut configuration = Configuration::load_locked(&path)?;
            configuration.set_auto_connect(state.enabled())?;
            if !global.quiet {
                let word = if configuration.auto_connect() { "on" } else { "off" };
                eprintln!("Auto-connect is now {word}");
            }
            Ok(())
        }

        ConfigCommand::SetCredentials => {
            let mut configuration = config::load_configuration(global)?;
            let credential = PromptCredentials.credential()?;

            // Verify before overwriting whatever is stored.
            Session::authenticate(
                build_client(global)?,
                &credential.username,
                &credential.password,
            )
            .await
            .map_err(CliError::from_login)?;

            configuration.set_credential(&credential)?;
            if !global.quiet {
                eprintln!("Credentials saved to {}", configuration.path().display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let configuration = Configuration::load_locked(&path)?;
            let view = SettingsView {
                path: path.display().to_string(),
                exists: path.exists(),
                auto_connect: configuration.auto_connect(),
                credential_stored: configuration.has_credential(),
            };
            let out = output::render_single(&global.output, &view, detail, |v| v.path.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Reset => {
            if !confirm(
                "Delete the settings file and the stored credential?",
                global.yes,
            )? {
                return Ok(());
            }
            // Skip loading so a malformed file can still be removed.
            Configuration::locked(&path).delete()?;
            if !global.quiet {
                eprintln!("Settings deleted");
            }
            Ok(())
        }
    }
}
