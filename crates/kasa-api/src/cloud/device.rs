// Device protocol client
//
// Bulb commands never go to the bulb directly. They are serialized to a
// JSON string, wrapped in a `passthrough` envelope, and POSTed to the
// device's own gateway URL. The gateway relays the bulb's reply back as a
// JSON string inside `result.responseData`.

use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::auth::SessionAuth;
use crate::cloud::client::{CloudClient, RequestScope};
use crate::cloud::models::{DeviceInfo, PreferredState, SysInfo, SysInfoResponse};
use crate::codec::{transcode, unwrap_passthrough};
use crate::error::Error;

/// Brightness sent with plain on/off commands.
pub const FULL_BRIGHTNESS: i64 = 100;

/// One cloud-registered smart bulb.
///
/// Brightness and connectivity are only trustworthy right after a
/// successful resync. Every mutating command resyncs on success; a failed
/// command leaves all fields untouched.
#[derive(Debug, Clone)]
pub struct Device {
    client: CloudClient,
    auth: SessionAuth,
    info: DeviceInfo,
    brightness: i64,
    return_brightness: Option<i64>,
    preferred_states: Vec<PreferredState>,
}

impl Device {
    /// Wrap a discovery record. No network call is made; callers resync.
    pub fn new(client: CloudClient, auth: SessionAuth, info: DeviceInfo) -> Self {
        Self {
            client,
            auth,
            info,
            brightness: 0,
            return_brightness: None,
            preferred_states: Vec::new(),
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.info.device_id
    }

    pub fn firmware_version(&self) -> &str {
        &self.info.fw_ver
    }

    pub fn role(&self) -> &str {
        &self.info.role
    }

    pub fn mac(&self) -> &str {
        &self.info.device_mac
    }

    pub fn model(&self) -> &str {
        &self.info.device_model
    }

    /// Model description, e.g. "Smart Wi-Fi LED Bulb with Dimmable Light".
    pub fn name(&self) -> &str {
        &self.info.device_name
    }

    pub fn device_type(&self) -> &str {
        &self.info.device_type
    }

    /// Per-device gateway URL passthrough commands are sent to.
    pub fn app_server_url(&self) -> &str {
        &self.info.app_server_url
    }

    // ── State ────────────────────────────────────────────────────────

    pub fn alias(&self) -> &str {
        &self.info.alias
    }

    pub fn status(&self) -> i64 {
        self.info.status
    }

    pub fn is_connected(&self) -> bool {
        self.info.status == 1
    }

    pub fn is_disconnected(&self) -> bool {
        self.info.status == 0
    }

    pub fn brightness(&self) -> i64 {
        self.brightness
    }

    /// Brightness an off bulb will come back on at, from the last resync.
    pub fn return_brightness(&self) -> Option<i64> {
        self.return_brightness
    }

    pub fn preferred_states(&self) -> &[PreferredState] {
        &self.preferred_states
    }

    /// Menu-style label: `"Lamp [ON 80%]"`.
    pub fn human_name(&self) -> String {
        let status = if self.is_connected() { "ON" } else { "OFF" };
        format!("{} [{status} {}%]", self.info.alias, self.brightness)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch the bulb on at full brightness, then resync.
    pub async fn turn_on(&mut self) -> Result<(), Error> {
        debug!(device_id = self.id(), "turning on");
        self.transition(1, FULL_BRIGHTNESS).await?;
        self.resync().await
    }

    /// Switch the bulb off, then resync.
    pub async fn turn_off(&mut self) -> Result<(), Error> {
        debug!(device_id = self.id(), "turning off");
        self.transition(0, FULL_BRIGHTNESS).await?;
        self.resync().await
    }

    /// Switch the bulb on at the brightness of preset `index`, then resync.
    ///
    /// `index` is a position in [`preferred_states`](Self::preferred_states),
    /// not the preset's own `index` field.
    pub async fn apply_preferred_state(&mut self, index: usize) -> Result<(), Error> {
        let state = self.preferred_states.get(index).ok_or(
            Error::PreferredStateOutOfRange {
                index,
                len: self.preferred_states.len(),
            },
        )?;
        let brightness = state.brightness();

        debug!(device_id = self.id(), index, brightness, "applying preferred state");
        self.transition(1, brightness).await?;
        self.resync().await
    }

    /// Fetch the bulb's `get_sysinfo` report.
    pub async fn system_info(&self) -> Result<SysInfo, Error> {
        let reply = self
            .passthrough(&json!({ "system": { "get_sysinfo": {} } }))
            .await?;
        let response: SysInfoResponse = transcode(reply)?;
        Ok(response.system.get_sysinfo)
    }

    /// Refresh mutable fields from a fresh `get_sysinfo` report.
    ///
    /// Alias, status, brightness, and presets are always overwritten.
    /// Identity fields are overwritten only when the report carries them;
    /// firmware version, role, and gateway URL come from discovery only.
    pub async fn resync(&mut self) -> Result<(), Error> {
        let info = self.system_info().await?;
        self.apply_sysinfo(info);
        Ok(())
    }

    fn apply_sysinfo(&mut self, info: SysInfo) {
        let status = info.on_off();
        let brightness = info.brightness();
        let return_brightness = info.return_brightness();

        self.info.alias = info.alias;
        self.info.status = status;
        overwrite_if_reported(&mut self.info.device_id, info.device_id);
        overwrite_if_reported(&mut self.info.device_mac, info.mic_mac);
        overwrite_if_reported(&mut self.info.device_name, info.description);
        overwrite_if_reported(&mut self.info.device_type, info.mic_type);
        overwrite_if_reported(&mut self.info.device_model, info.model);
        self.brightness = brightness;
        self.return_brightness = return_brightness;
        self.preferred_states = info.preferred_states;
    }

    /// Send a `transition_light_state` command. Does not resync.
    async fn transition(&self, on_off: i64, brightness: i64) -> Result<Value, Error> {
        self.passthrough(&json!({
            "smartlife.iot.smartbulb.lightingservice": {
                "transition_light_state": {
                    "brightness": brightness,
                    "on_off": on_off,
                },
            },
        }))
        .await
    }

    /// Send a raw bulb command through the gateway and return the bulb's
    /// decoded reply.
    pub async fn passthrough(&self, command: &Value) -> Result<Value, Error> {
        let url = Url::parse(&self.info.app_server_url)?;
        let body = json!({
            "method": "passthrough",
            "params": {
                "deviceId": self.info.device_id,
                "requestData": command.to_string(),
            },
        });

        let result = self
            .client
            .post(url, &self.auth, &body, RequestScope::Device)
            .await?;
        unwrap_passthrough(result)
    }
}

fn overwrite_if_reported(field: &mut String, reported: String) {
    if !reported.is_empty() {
        *field = reported;
    }
}
