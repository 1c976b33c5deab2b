// Cloud gateway HTTP client
//
// Wraps `reqwest::Client` with the gateway's request envelope: identity
// query parameters, JSON body, and `{ error_code, msg, result }` unwrapping.
// Session and device operations are implemented as thin layers on top in
// their own modules.

use reqwest::header::CACHE_CONTROL;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{ClientIdentity, DEFAULT_CLOUD_URL, SessionAuth};
use crate::cloud::models::Envelope;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Which endpoint family a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Login and discovery on the fixed cloud URL.
    Cloud,
    /// Passthrough on a device's own gateway URL. Sent with
    /// `cache-control: no-cache`.
    Device,
}

/// Raw HTTP client for the Kasa cloud gateway.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so a
/// session and all of its devices share one connection pool.
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    identity: ClientIdentity,
}

impl CloudClient {
    /// Create a client for the public cloud endpoint with default identity.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Url::parse(DEFAULT_CLOUD_URL)?;
        Ok(Self::with_client(http, base_url, ClientIdentity::default()))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this to point at a different gateway (e.g. a regional endpoint
    /// or a mock server in tests).
    pub fn with_client(http: reqwest::Client, base_url: Url, identity: ClientIdentity) -> Self {
        Self {
            http,
            base_url,
            identity,
        }
    }

    /// The cloud endpoint used for login and discovery.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a body to the cloud endpoint and unwrap the envelope.
    pub(crate) async fn post_cloud(
        &self,
        auth: &SessionAuth,
        body: &(impl Serialize + Sync),
    ) -> Result<serde_json::Value, Error> {
        self.post(self.base_url.clone(), auth, body, RequestScope::Cloud)
            .await
    }

    /// POST a body to `url` with identity query parameters and unwrap the
    /// `{ error_code, msg, result }` envelope, returning `result`.
    pub(crate) async fn post(
        &self,
        url: Url,
        auth: &SessionAuth,
        body: &(impl Serialize + Sync),
        scope: RequestScope,
    ) -> Result<serde_json::Value, Error> {
        debug!(?scope, "POST {}", url);

        let mut builder = self
            .http
            .post(url)
            .query(&self.identity.query(auth))
            .json(body);
        if scope == RequestScope::Device {
            builder = builder.header(CACHE_CONTROL, "no-cache");
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        Self::parse_envelope(resp).await
    }

    /// Parse the envelope, returning `result` on success or `Error::Api`
    /// if `error_code != 0`.
    ///
    /// HTTP status is not checked on its own: a decodable error-coded body
    /// carries more information than the status line.
    async fn parse_envelope(resp: reqwest::Response) -> Result<serde_json::Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, body_len = body.len(), "gateway response");

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                Error::decode(&e, body.clone())
            } else {
                Error::Deserialization {
                    message: format!("HTTP {status} with undecodable body: {e}"),
                    body: body.clone(),
                }
            }
        })?;

        if envelope.error_code != 0 {
            let code = envelope.error_code;
            return Err(Error::Api {
                code,
                message: envelope
                    .msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("error_code={code}")),
            });
        }

        Ok(envelope.result)
    }
}
