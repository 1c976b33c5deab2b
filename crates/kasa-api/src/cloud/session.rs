// Cloud session: login and device discovery
//
// A `Session` exists only after the gateway accepted a login. It owns the
// bearer token and the last enumerated device list; nothing is persisted.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::auth::SessionAuth;
use crate::cloud::client::CloudClient;
use crate::cloud::device::Device;
use crate::cloud::models::{DeviceInfo, LoginReply, LoginResult};
use crate::codec::transcode;
use crate::error::Error;

/// An authenticated session with the cloud gateway.
///
/// The token is fixed for the session's lifetime; there is no refresh. A
/// revoked or expired token surfaces as `Error::Api` on the next call.
#[derive(Debug)]
pub struct Session {
    client: CloudClient,
    auth: SessionAuth,
    account: LoginResult,
    devices: Vec<Device>,
}

impl Session {
    /// Log in with a username and password.
    ///
    /// Generates a fresh terminal id, sends
    /// `{"method":"login","url":...,"params":{appType, cloudUserName,
    /// cloudPassword, terminalUUID}}` and keeps the returned token. A
    /// rejected login returns `Error::Api` and no session.
    pub async fn authenticate(
        client: CloudClient,
        username: &str,
        password: &SecretString,
    ) -> Result<Self, Error> {
        let auth = SessionAuth::generate();
        let body = json!({
            "method": "login",
            "url": client.base_url().as_str().trim_end_matches('/'),
            "params": {
                "appType": client.identity().app_name,
                "cloudUserName": username,
                "cloudPassword": password.expose_secret(),
                "terminalUUID": auth.terminal_id(),
            },
        });

        debug!(terminal_id = auth.terminal_id(), "logging in");
        let result = client.post_cloud(&auth, &body).await?;
        let LoginReply { account, token } = transcode(result)?;
        info!(account_id = %account.account_id, "login successful");

        Ok(Self {
            client,
            auth: auth.with_token(token),
            account,
            devices: Vec::new(),
        })
    }

    pub fn terminal_id(&self) -> &str {
        self.auth.terminal_id()
    }

    pub fn token(&self) -> &SecretString {
        self.auth.token()
    }

    /// Account details returned by the login call.
    pub fn account(&self) -> &LoginResult {
        &self.account
    }

    pub fn client(&self) -> &CloudClient {
        &self.client
    }

    /// Devices from the last [`list_devices`](Self::list_devices) call.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    /// Enumerate the account's devices and resync each one.
    ///
    /// Replaces the previously enumerated list. A record that cannot be
    /// decoded fails the whole call. A device whose initial resync fails is
    /// kept with its discovery-record state and a warning is logged.
    pub async fn list_devices(&mut self) -> Result<&mut [Device], Error> {
        debug!("listing devices");
        let result = self
            .client
            .post_cloud(&self.auth, &json!({ "method": "getDeviceList" }))
            .await?;

        let records: Vec<DeviceInfo> = match result {
            Value::Object(mut map) => match map.remove("deviceList") {
                Some(Value::Null) | None => Vec::new(),
                Some(list) => transcode(list)?,
            },
            Value::Null => Vec::new(),
            other => {
                return Err(Error::Deserialization {
                    message: "getDeviceList result is not an object".into(),
                    body: other.to_string(),
                });
            }
        };

        let mut devices = Vec::with_capacity(records.len());
        for record in records {
            let mut device = Device::new(self.client.clone(), self.auth.clone(), record);
            if let Err(error) = device.resync().await {
                warn!(
                    device_id = device.id(),
                    alias = device.alias(),
                    %error,
                    "initial resync failed, keeping discovery state"
                );
            }
            devices.push(device);
        }

        info!(count = devices.len(), "devices enumerated");
        self.devices = devices;
        Ok(&mut self.devices)
    }

    /// Find a device by exact display alias in the last enumerated list.
    pub fn find_device(&self, alias: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.alias() == alias)
    }

    pub fn find_device_mut(&mut self, alias: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.alias() == alias)
    }
}
