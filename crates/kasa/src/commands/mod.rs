//! Command dispatch and the shared login flow.

pub mod config_cmd;
pub mod devices;

use std::time::Duration;

use kasa_api::{ClientIdentity, CloudClient, Session, TransportConfig};
use tracing::info;
use url::Url;

use crate::cli::GlobalOpts;
use crate::config::{self, PromptCredentials};
use crate::error::CliError;

/// Build the cloud client from global flags.
pub fn build_client(global: &GlobalOpts) -> Result<CloudClient, CliError> {
    let mut transport = TransportConfig::default();
    if global.timeout > 0 {
        transport = transport.with_timeout(Duration::from_secs(global.timeout));
    }

    let base_url = Url::parse(&global.cloud_url).map_err(|e| CliError::Validation {
        field: "cloud-url".into(),
        reason: format!("{e}: {}", global.cloud_url),
    })?;

    Ok(CloudClient::with_client(
        transport.build_client()?,
        base_url,
        ClientIdentity::default(),
    ))
}

/// Resolve the credential, log in, and persist a freshly entered
/// credential only once the cloud has accepted it.
pub async fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let mut configuration = config::load_configuration(global)?;
    let resolved = configuration.resolve_credential(&PromptCredentials)?;
    let client = build_client(global)?;

    let session = Session::authenticate(
        client,
        &resolved.credential.username,
        &resolved.credential.password,
    )
    .await
    .map_err(CliError::from_login)?;

    if resolved.fresh {
        configuration.save()?;
        info!(path = %configuration.path().display(), "credentials saved");
    }
    Ok(session)
}
