use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Default cloud gateway endpoint for login and discovery.
pub const DEFAULT_CLOUD_URL: &str = "https://wap.tplinkcloud.com/";

/// Fixed client-identity parameters sent on every gateway request.
///
/// The gateway only answers clients that look like the official Android
/// app, so the defaults mirror what that app reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Also sent as `appType` in the login body.
    pub app_name: String,
    pub app_ver: String,
    /// OS platform string, e.g. `Android+6.0.1`.
    pub ospf: String,
    pub net_type: String,
    pub locale: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            app_name: "Kasa_Android".into(),
            app_ver: "1.4.4.607".into(),
            ospf: "Android+6.0.1".into(),
            net_type: "wifi".into(),
            locale: "es_ES".into(),
        }
    }
}

impl ClientIdentity {
    /// Query parameters for a request made on behalf of `auth`.
    ///
    /// `token` is appended only once the session holds one.
    pub(crate) fn query(&self, auth: &SessionAuth) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("appName", self.app_name.clone()),
            ("termID", auth.terminal_id.clone()),
            ("appVer", self.app_ver.clone()),
            ("ospf", self.ospf.clone()),
            ("netType", self.net_type.clone()),
            ("locale", self.locale.clone()),
        ];
        if auth.has_token() {
            params.push(("token", auth.token.expose_secret().to_owned()));
        }
        params
    }
}

/// Per-login authentication state: terminal id plus bearer token.
///
/// The terminal id is a random UUID generated once per login. The token is
/// empty until the gateway accepts the login and never changes afterwards.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    terminal_id: String,
    token: SecretString,
}

impl SessionAuth {
    /// Fresh, unauthenticated state with a new random terminal id.
    pub fn generate() -> Self {
        Self {
            terminal_id: Uuid::new_v4().to_string(),
            token: SecretString::from(String::new()),
        }
    }

    pub(crate) fn with_token(self, token: String) -> Self {
        Self {
            terminal_id: self.terminal_id,
            token: SecretString::from(token),
        }
    }

    pub fn terminal_id(&self) -> &str {
        &self.terminal_id
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }
}
