// Cloud gateway wire types
//
// Models for the gateway envelope, login reply, discovery records, and the
// bulb's `get_sysinfo` report. Fields use `#[serde(default)]` liberally
// because firmware versions disagree about which fields they send.

use serde::{Deserialize, Deserializer, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard gateway response envelope.
///
/// ```json
/// { "error_code": 0, "msg": "optional", "result": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub result: serde_json::Value,
}

// ── Login ────────────────────────────────────────────────────────────

/// Account fields of a successful `login` call. The token is split off
/// into [`SessionAuth`](crate::SessionAuth) and never kept here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub reg_time: String,
    #[serde(default)]
    pub email: String,
}

/// Full `login` result as sent by the gateway.
#[derive(Deserialize)]
pub(crate) struct LoginReply {
    #[serde(flatten)]
    pub account: LoginResult,
    pub token: String,
}

// ── Discovery ────────────────────────────────────────────────────────

/// One entry of `getDeviceList.deviceList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub fw_ver: String,
    #[serde(default)]
    pub alias: String,
    /// 1 when the bulb reports itself on, 0 otherwise.
    #[serde(default)]
    pub status: i64,
    /// Sent as a number by current gateways, as a string by older ones.
    #[serde(default, deserialize_with = "string_or_number")]
    pub role: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub device_mac: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub device_model: String,
    /// Per-device gateway URL that passthrough commands go to.
    #[serde(default)]
    pub app_server_url: String,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ── System info ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtrlProtocol {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Brightness and colour settings shared by light state and presets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSettings {
    #[serde(default)]
    pub brightness: i64,
    #[serde(default)]
    pub color_temp: i64,
    #[serde(default)]
    pub hue: i64,
    #[serde(default)]
    pub saturation: i64,
    #[serde(default)]
    pub mode: String,
}

/// A named lighting preset stored on the bulb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredState {
    #[serde(flatten)]
    pub settings: LightSettings,
    #[serde(default)]
    pub index: i64,
}

impl PreferredState {
    pub fn brightness(&self) -> i64 {
        self.settings.brightness
    }
}

/// Current light state. While the bulb is off, firmware reports the
/// settings it will return to under `dft_on_state` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(flatten)]
    pub settings: LightSettings,
    #[serde(default)]
    pub on_off: i64,
    #[serde(default)]
    pub dft_on_state: Option<LightSettings>,
}

/// Bulb report from `{"system":{"get_sysinfo":{}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysInfo {
    #[serde(default)]
    pub active_mode: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub ctrl_protocols: Option<CtrlProtocol>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "dev_state")]
    pub device_state: String,
    #[serde(default, rename = "deviceId")]
    pub device_id: String,
    #[serde(default, rename = "disco_ver")]
    pub disco_version: String,
    #[serde(default)]
    pub err_code: i64,
    #[serde(default, rename = "heapsize")]
    pub heap_size: i64,
    #[serde(default, rename = "hwId")]
    pub hw_id: String,
    #[serde(default)]
    pub hw_ver: String,
    #[serde(default)]
    pub is_color: i64,
    #[serde(default)]
    pub is_dimmable: i64,
    #[serde(default)]
    pub is_factory: bool,
    #[serde(default)]
    pub is_variable_color_temp: i64,
    #[serde(default)]
    pub light_state: Option<LightState>,
    #[serde(default)]
    pub mic_mac: String,
    #[serde(default)]
    pub mic_type: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, rename = "oemId")]
    pub oem_id: String,
    #[serde(default, rename = "preferred_state")]
    pub preferred_states: Vec<PreferredState>,
    #[serde(default)]
    pub rssi: i64,
    #[serde(default)]
    pub sw_ver: String,
}

impl SysInfo {
    /// `on_off` of the light state; a report without one reads as off.
    pub fn on_off(&self) -> i64 {
        self.light_state.as_ref().map_or(0, |s| s.on_off)
    }

    pub fn brightness(&self) -> i64 {
        self.light_state.as_ref().map_or(0, |s| s.settings.brightness)
    }

    /// Brightness the bulb returns to when switched on, if it reported one.
    pub fn return_brightness(&self) -> Option<i64> {
        self.light_state
            .as_ref()
            .and_then(|s| s.dft_on_state.as_ref())
            .map(|s| s.brightness)
    }
}

/// `{"get_sysinfo": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct SysInfoWrapper {
    pub get_sysinfo: SysInfo,
}

/// `{"system": {"get_sysinfo": {...}}}`
#[derive(Debug, Deserialize)]
pub(crate) struct SysInfoResponse {
    pub system: SysInfoWrapper,
}
