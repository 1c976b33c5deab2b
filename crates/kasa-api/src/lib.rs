// kasa-api: Async Rust client for the Kasa cloud gateway (session, discovery, passthrough)

pub mod auth;
pub mod cloud;
pub mod codec;
pub mod error;
pub mod transport;

pub use auth::{ClientIdentity, DEFAULT_CLOUD_URL, SessionAuth};
pub use cloud::models::{DeviceInfo, LightSettings, LightState, LoginResult, PreferredState, SysInfo};
pub use cloud::{CloudClient, Device, RequestScope, Session};
pub use error::Error;
pub use transport::{MOBILE_USER_AGENT, TransportConfig};
