// Cloud gateway client modules
//
// Envelope transport, login/discovery session, and the per-device
// passthrough protocol. All requests share the `{ method, params }` body
// and `{ error_code, msg, result }` reply shape.

pub mod client;
pub mod device;
pub mod models;
pub mod session;

pub use client::{CloudClient, RequestScope};
pub use device::Device;
pub use session::Session;
