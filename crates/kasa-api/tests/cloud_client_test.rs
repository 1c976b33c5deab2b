#![allow(clippy::unwrap_used)]
// Integration tests for `Session` and `Device` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kasa_api::{
    ClientIdentity, CloudClient, Device, Error, MOBILE_USER_AGENT, Session, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

const DEVICE_PATH: &str = "/eu";

async fn setup() -> (MockServer, CloudClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let http = TransportConfig::default().build_client().unwrap();
    let client = CloudClient::with_client(http, base_url, ClientIdentity::default());
    (server, client)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error_code": 0, "result": result }))
}

fn sysinfo(on_off: i64, brightness: i64) -> Value {
    json!({
        "system": {
            "get_sysinfo": {
                "alias": "Lamp",
                "deviceId": "8012ABCD",
                "mic_mac": "50C7BF000000",
                "description": "Smart Wi-Fi LED Bulb with Dimmable Light",
                "mic_type": "IOT.SMARTBULB",
                "model": "KL110(EU)",
                "sw_ver": "1.8.6 Build 180809 Rel.091659",
                "light_state": { "on_off": on_off, "brightness": brightness, "mode": "normal" },
                "preferred_state": [
                    { "index": 0, "brightness": 50, "color_temp": 2700, "hue": 0, "saturation": 0 },
                    { "index": 1, "brightness": 25, "color_temp": 2700, "hue": 0, "saturation": 0 }
                ]
            }
        }
    })
}

/// Passthrough reply in the gateway's usual shape: the bulb's reply as a
/// JSON string under `responseData`.
fn relayed(reply: &Value) -> ResponseTemplate {
    ok(json!({ "responseData": reply.to_string() }))
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "login" })))
        .respond_with(ok(json!({
            "accountId": "1234",
            "regTime": "2018-01-01 00:00:00",
            "email": "a@b.com",
            "token": token
        })))
        .mount(server)
        .await;
}

async fn mount_device_list(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getDeviceList" })))
        .respond_with(ok(json!({
            "deviceList": [{
                "fwVer": "1.8.6 Build 180809 Rel.091659",
                "alias": "Lamp",
                "status": 1,
                "role": 0,
                "deviceId": "8012ABCD",
                "deviceMac": "50C7BF000000",
                "deviceName": "Smart Wi-Fi LED Bulb with Dimmable Light",
                "deviceType": "IOT.SMARTBULB",
                "deviceModel": "KL110(EU)",
                "appServerUrl": format!("{}{DEVICE_PATH}", server.uri())
            }]
        })))
        .mount(server)
        .await;
}

fn inner_command(request: &wiremock::Request) -> Value {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    let raw = body["params"]["requestData"].as_str().unwrap();
    serde_json::from_str(raw).unwrap()
}

async fn logged_in(server: &MockServer, client: CloudClient) -> Session {
    mount_login(server, "abc123").await;
    Session::authenticate(client, "a@b.com", &secret("secret"))
        .await
        .unwrap()
}

fn snapshot(device: &Device) -> (String, String, String, bool, i64, usize) {
    (
        device.id().to_owned(),
        device.alias().to_owned(),
        device.mac().to_owned(),
        device.is_connected(),
        device.brightness(),
        device.preferred_states().len(),
    )
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(query_param("appName", "Kasa_Android"))
        .and(query_param("appVer", "1.4.4.607"))
        .and(query_param("netType", "wifi"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", MOBILE_USER_AGENT))
        .and(body_partial_json(json!({
            "method": "login",
            "params": {
                "appType": "Kasa_Android",
                "cloudUserName": "a@b.com",
                "cloudPassword": "secret"
            }
        })))
        .respond_with(ok(json!({
            "accountId": "1234",
            "regTime": "2018-01-01 00:00:00",
            "email": "a@b.com",
            "token": "abc123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::authenticate(client, "a@b.com", &secret("secret"))
        .await
        .unwrap();

    assert_eq!(session.token().expose_secret(), "abc123");
    assert_eq!(session.account().email, "a@b.com");
    assert!(session.devices().is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["params"]["terminalUUID"], session.terminal_id());
    let query: Vec<(String, String)> = requests[0].url.query_pairs().into_owned().collect();
    assert!(query.contains(&("termID".into(), session.terminal_id().into())));
    assert!(!query.iter().any(|(k, _)| k == "token"));
}

#[tokio::test]
async fn test_session_debug_hides_token() {
    let (server, client) = setup().await;
    let session = logged_in(&server, client).await;

    let rendered = format!("{session:?}");
    assert!(!rendered.contains("abc123"));
    assert!(rendered.contains("a@b.com"));
    assert_eq!(session.token().expose_secret(), "abc123");
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": -20601,
            "msg": "Incorrect email or password"
        })))
        .mount(&server)
        .await;

    let result = Session::authenticate(client, "a@b.com", &secret("wrong")).await;

    match result {
        Err(Error::Api { code, ref message }) => {
            assert_eq!(code, -20601);
            assert_eq!(message, "Incorrect email or password");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_code_wins_over_http_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error_code": -1,
            "msg": "internal"
        })))
        .mount(&server)
        .await;

    let result = Session::authenticate(client, "a@b.com", &secret("secret")).await;
    assert!(
        matches!(result, Err(Error::Api { code: -1, .. })),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_undecodable_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = Session::authenticate(client, "a@b.com", &secret("secret")).await;
    match result {
        Err(Error::Deserialization { message, body }) => {
            assert!(message.contains("502"), "got: {message}");
            assert_eq!(body, "<html>Bad Gateway</html>");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Discovery tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_syncs_each_device() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(query_param("token", "abc123"))
        .and(header("cache-control", "no-cache"))
        .and(body_partial_json(json!({
            "method": "passthrough",
            "params": { "deviceId": "8012ABCD" }
        })))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(0, 50)))
        .mount(&server)
        .await;

    let devices = session.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    let lamp = &devices[0];
    assert_eq!(lamp.alias(), "Lamp");
    assert_eq!(lamp.model(), "KL110(EU)");
    assert_eq!(lamp.firmware_version(), "1.8.6 Build 180809 Rel.091659");
    assert!(lamp.is_disconnected());
    assert_eq!(lamp.brightness(), 50);
    assert_eq!(lamp.preferred_states().len(), 2);
    assert_eq!(lamp.human_name(), "Lamp [OFF 50%]");
}

#[tokio::test]
async fn test_list_devices_replaces_previous_list() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(relayed(&sysinfo(1, 100)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    session.list_devices().await.unwrap();

    assert_eq!(session.devices().len(), 1);
}

#[tokio::test]
async fn test_list_devices_keeps_device_when_sync_fails() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": -20571,
            "msg": "Device is offline"
        })))
        .mount(&server)
        .await;

    let devices = session.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].alias(), "Lamp");
    assert!(devices[0].is_connected(), "discovery status kept");
    assert!(devices[0].preferred_states().is_empty());
}

#[tokio::test]
async fn test_list_devices_bad_record_fails_call() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getDeviceList" })))
        .respond_with(ok(json!({ "deviceList": [{ "alias": 7 }] })))
        .mount(&server)
        .await;

    let result = session.list_devices().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_list_devices_empty_account() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getDeviceList" })))
        .respond_with(ok(json!({ "deviceList": [] })))
        .mount(&server)
        .await;

    assert!(session.list_devices().await.unwrap().is_empty());
    assert!(session.find_device("Lamp").is_none());
}

#[tokio::test]
async fn test_find_device_exact_alias() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(relayed(&sysinfo(1, 100)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();

    assert!(session.find_device("Lamp").is_some());
    assert!(session.find_device("lamp").is_none());
    assert!(session.find_device_mut("Lamp ").is_none());
}

// ── Passthrough tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_double_encoded_and_plain_replies_agree() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    // First sync sees the usual string-encoded reply, the second sees the
    // same report carried directly as the result object.
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(relayed(&sysinfo(1, 70)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(ok(sysinfo(1, 70)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let via_string = snapshot(&session.devices()[0]);

    let lamp = session.find_device_mut("Lamp").unwrap();
    lamp.resync().await.unwrap();
    let via_object = snapshot(lamp);

    assert_eq!(via_string, via_object);
    assert_eq!(via_object.4, 70);
}

#[tokio::test]
async fn test_turn_on_sends_transition_then_resyncs() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    assert_eq!(session.token().expose_secret(), "abc123");
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(0, 100)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("transition_light_state"))
        .respond_with(relayed(&json!({
            "smartlife.iot.smartbulb.lightingservice": {
                "transition_light_state": { "on_off": 1, "brightness": 100, "err_code": 0 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(1, 100)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let lamp = session.find_device_mut("Lamp").unwrap();
    assert!(!lamp.is_connected());

    lamp.turn_on().await.unwrap();

    assert!(lamp.is_connected());
    assert_eq!(lamp.brightness(), 100);

    let requests = server.received_requests().await.unwrap();
    let commands: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == DEVICE_PATH)
        .map(inner_command)
        .collect();
    assert_eq!(
        commands,
        vec![
            json!({ "system": { "get_sysinfo": {} } }),
            json!({
                "smartlife.iot.smartbulb.lightingservice": {
                    "transition_light_state": { "brightness": 100, "on_off": 1 }
                }
            }),
            json!({ "system": { "get_sysinfo": {} } }),
        ]
    );
}

#[tokio::test]
async fn test_turn_off_reflects_gateway_state() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("transition_light_state"))
        .respond_with(relayed(&json!({})))
        .mount(&server)
        .await;
    // The gateway ignores the request and still reports the bulb on.
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(1, 30)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let lamp = session.find_device_mut("Lamp").unwrap();
    lamp.turn_off().await.unwrap();

    assert!(lamp.is_connected());
    assert_eq!(lamp.brightness(), 30);

    let requests = server.received_requests().await.unwrap();
    let transition = requests
        .iter()
        .filter(|r| r.url.path() == DEVICE_PATH)
        .map(inner_command)
        .find(|c| c.get("smartlife.iot.smartbulb.lightingservice").is_some())
        .unwrap();
    let state = &transition["smartlife.iot.smartbulb.lightingservice"]["transition_light_state"];
    assert_eq!(state["on_off"], 0);
    assert_eq!(state["brightness"], 100);
}

#[tokio::test]
async fn test_apply_preferred_state_uses_preset_brightness() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("transition_light_state"))
        .respond_with(relayed(&json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(1, 25)))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let lamp = session.find_device_mut("Lamp").unwrap();

    let err = lamp.apply_preferred_state(2).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PreferredStateOutOfRange { index: 2, len: 2 }
    ));

    lamp.apply_preferred_state(1).await.unwrap();
    assert_eq!(lamp.brightness(), 25);

    let requests = server.received_requests().await.unwrap();
    let transition = requests
        .iter()
        .filter(|r| r.url.path() == DEVICE_PATH)
        .map(inner_command)
        .find(|c| c.get("smartlife.iot.smartbulb.lightingservice").is_some())
        .unwrap();
    assert_eq!(
        transition,
        json!({
            "smartlife.iot.smartbulb.lightingservice": {
                "transition_light_state": { "brightness": 25, "on_off": 1 }
            }
        })
    );
}

#[tokio::test]
async fn test_failed_command_leaves_state_untouched() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("transition_light_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": -20002,
            "msg": "Request timeout"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .and(body_string_contains("get_sysinfo"))
        .respond_with(relayed(&sysinfo(0, 50)))
        .expect(1)
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let lamp = session.find_device_mut("Lamp").unwrap();
    let before = snapshot(lamp);

    let err = lamp.turn_on().await.unwrap_err();

    assert!(matches!(err, Error::Api { code: -20002, .. }));
    assert_eq!(snapshot(lamp), before);
}

#[tokio::test]
async fn test_system_info_rejects_malformed_response_data() {
    let (server, client) = setup().await;
    let mut session = logged_in(&server, client).await;
    mount_device_list(&server).await;

    Mock::given(method("POST"))
        .and(path(DEVICE_PATH))
        .respond_with(ok(json!({ "responseData": "{\"system\":{\"get_sysinfo\":" })))
        .mount(&server)
        .await;

    session.list_devices().await.unwrap();
    let lamp = &session.devices()[0];

    let result = lamp.system_info().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
