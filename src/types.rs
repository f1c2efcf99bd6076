use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ClientSecrets, Error, Result};
use crate::scopes::ScopeSet;

/// Persisted token material, in Google's "authorized user" layout.
///
/// Everything a consumer needs to refresh the access token on its own is
/// stored alongside it: the token endpoint, the client credentials and the
/// refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The access token used to authenticate API requests
    #[serde(rename = "token")]
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// When the access token expires (UTC); absent when the token endpoint
    /// did not report a lifetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Scopes granted to this token
    pub scopes: ScopeSet,
    /// Token endpoint to use for refreshing
    pub token_uri: String,
    /// OAuth client the token was issued to
    pub client_id: String,
    /// Secret of that client, needed for refresh requests
    pub client_secret: String,
}

impl TokenRecord {
    /// Check if the token is expired or will expire soon (within 5 minutes)
    ///
    /// A record without an expiry is never considered expired.
    pub fn is_expired(&self) -> bool {
        self.expires_in()
            .is_some_and(|left| left <= Duration::from_secs(300))
    }

    /// Get the duration until the token expires
    ///
    /// Returns `Duration::ZERO` if the token is already expired and `None`
    /// if the expiry is unknown.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expiry
            .map(|expiry| (expiry - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}

/// Authorization request information
///
/// Contains the authorization URL and the values needed to validate the
/// callback and redeem the code.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The URL the user should visit to authorize the application
    pub authorization_url: String,
    /// The PKCE verifier used to exchange the authorization code for tokens
    pub pkce_verifier: String,
    /// The CSRF state token for security validation
    pub state: String,
    /// Redirect URI the request was built for; must be repeated on exchange
    pub redirect_uri: String,
}

/// Settings for one run of the installed-application flow
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Scopes to request
    pub scopes: ScopeSet,
    /// How long to wait for the browser redirect; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Whether to launch the system browser
    pub open_browser: bool,
    /// Address the loopback listener binds to
    pub bind_host: String,
    /// Listener port; 0 picks a free ephemeral port
    pub port: u16,
    /// Host name used in the redirect URI
    pub redirect_host: String,
    /// Page shown in the browser after a successful redirect
    pub success_html: String,
    /// Page shown in the browser when the redirect carries an error
    pub failure_html: String,
}

pub(crate) const DEFAULT_SUCCESS_HTML: &str = r#"<html>
    <head><title>Authorization Successful</title></head>
    <body>
        <h1>Authorization Successful!</h1>
        <p>The authentication flow has completed. You can close this window and return to the terminal.</p>
    </body>
</html>"#;

pub(crate) const DEFAULT_FAILURE_HTML: &str = r#"<html>
    <head><title>Authorization Failed</title></head>
    <body>
        <h1>Authorization Failed</h1>
        <p>No token was saved. You can close this window and check the terminal.</p>
    </body>
</html>"#;

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            scopes: ScopeSet::default(),
            timeout: None,
            open_browser: true,
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            redirect_host: "localhost".to_string(),
            success_html: DEFAULT_SUCCESS_HTML.to_string(),
            failure_html: DEFAULT_FAILURE_HTML.to_string(),
        }
    }
}

impl FlowConfig {
    /// Create a new config builder
    pub fn builder() -> FlowConfigBuilder {
        FlowConfigBuilder::default()
    }
}

/// Builder for FlowConfig
#[derive(Debug, Clone, Default)]
pub struct FlowConfigBuilder {
    scopes: Option<ScopeSet>,
    timeout: Option<Duration>,
    open_browser: Option<bool>,
    port: Option<u16>,
    redirect_host: Option<String>,
    success_html: Option<String>,
    failure_html: Option<String>,
}

impl FlowConfigBuilder {
    /// Set the scopes to request
    pub fn scopes(mut self, scopes: ScopeSet) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Give up waiting for the redirect after `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable launching the system browser
    pub fn open_browser(mut self, open: bool) -> Self {
        self.open_browser = Some(open);
        self
    }

    /// Listen on a fixed port instead of an ephemeral one
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Host name to put in the redirect URI (default `localhost`)
    pub fn redirect_host(mut self, host: impl Into<String>) -> Self {
        self.redirect_host = Some(host.into());
        self
    }

    /// Page shown in the browser once the code is received
    pub fn success_html(mut self, html: impl Into<String>) -> Self {
        self.success_html = Some(html.into());
        self
    }

    /// Page shown in the browser when the redirect is rejected
    pub fn failure_html(mut self, html: impl Into<String>) -> Self {
        self.failure_html = Some(html.into());
        self
    }

    /// Build the FlowConfig
    pub fn build(self) -> FlowConfig {
        let defaults = FlowConfig::default();
        FlowConfig {
            scopes: self.scopes.unwrap_or(defaults.scopes),
            timeout: self.timeout.or(defaults.timeout),
            open_browser: self.open_browser.unwrap_or(defaults.open_browser),
            bind_host: defaults.bind_host,
            port: self.port.unwrap_or(defaults.port),
            redirect_host: self.redirect_host.unwrap_or(defaults.redirect_host),
            success_html: self.success_html.unwrap_or(defaults.success_html),
            failure_html: self.failure_html.unwrap_or(defaults.failure_html),
        }
    }
}

/// Token response from the token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Turn the response into a record. Absent `scope` means the requested
    /// scopes were granted as-is (RFC 6749 section 5.1); absent `expires_in`
    /// leaves the expiry unset.
    pub(crate) fn into_record(
        self,
        requested: &ScopeSet,
        secrets: &ClientSecrets,
    ) -> Result<TokenRecord> {
        let expiry = self.expires_in.map(expiry_after).transpose()?;
        let scopes = self
            .scope
            .as_deref()
            .map(ScopeSet::parse)
            .unwrap_or_else(|| requested.clone());

        Ok(TokenRecord {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expiry,
            scopes,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
        })
    }
}

fn expiry_after(expires_in: i64) -> Result<DateTime<Utc>> {
    chrono::TimeDelta::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| {
            Error::InvalidTokenResponse(format!("expires_in out of range: {expires_in}"))
        })
}

/// Generate a random state string for CSRF protection
pub(crate) fn generate_random_state() -> String {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a PKCE `(challenge, verifier)` pair using S256
pub(crate) fn generate_pkce_pair() -> (String, String) {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = general_purpose::URL_SAFE_NO_PAD.encode(digest);
    (challenge, verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose};

    fn secrets() -> ClientSecrets {
        ClientSecrets {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            auth_uri: "https://accounts.example/auth".to_string(),
            token_uri: "https://accounts.example/token".to_string(),
            redirect_uris: vec![],
            project_id: None,
        }
    }

    #[test]
    fn pkce_challenge_is_sha256_of_verifier() {
        let (challenge, verifier) = generate_pkce_pair();
        let expected = general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        assert_eq!(challenge, expected);
        assert_eq!(verifier.len(), 43);
    }

    #[test]
    fn state_is_random() {
        assert_ne!(generate_random_state(), generate_random_state());
    }

    #[test]
    fn missing_scope_falls_back_to_requested() {
        let requested = ScopeSet::new(["a", "b"]);
        let response = TokenResponse {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_in: Some(60),
            scope: None,
            token_type: None,
        };
        let record = response.into_record(&requested, &secrets()).unwrap();
        assert_eq!(record.scopes, requested);
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.token_uri, "https://accounts.example/token");
        assert!(record.is_expired());
    }

    #[test]
    fn record_uses_authorized_user_field_names() {
        let record = TokenResponse {
            access_token: "T1".to_string(),
            refresh_token: Some("R1".to_string()),
            expires_in: Some(3600),
            scope: Some("a b".to_string()),
            token_type: Some("Bearer".to_string()),
        }
        .into_record(&ScopeSet::new(["a", "b"]), &secrets())
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["token"], "T1");
        assert_eq!(value["refresh_token"], "R1");
        assert_eq!(value["scopes"], serde_json::json!(["a", "b"]));
        assert!(value.get("access_token").is_none());
        assert!(!record.is_expired());
        assert!(record.expires_in().unwrap() > Duration::from_secs(3500));
    }

    fn response_expiring_in(expires_in: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: "T1".to_string(),
            refresh_token: None,
            expires_in,
            scope: None,
            token_type: None,
        }
    }

    #[test]
    fn huge_expires_in_is_an_error() {
        let result = response_expiring_in(Some(i64::MAX))
            .into_record(&ScopeSet::new(["a"]), &secrets());
        assert!(matches!(result, Err(Error::InvalidTokenResponse(_))));

        let result = response_expiring_in(Some(i64::MIN))
            .into_record(&ScopeSet::new(["a"]), &secrets());
        assert!(matches!(result, Err(Error::InvalidTokenResponse(_))));
    }

    #[test]
    fn missing_expires_in_leaves_expiry_unset() {
        let record = response_expiring_in(None)
            .into_record(&ScopeSet::new(["a"]), &secrets())
            .unwrap();
        assert_eq!(record.expiry, None);
        assert_eq!(record.expires_in(), None);
        assert!(!record.is_expired());

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("expiry").is_none());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = FlowConfig::builder()
            .timeout(Duration::from_secs(5))
            .open_browser(false)
            .port(8085)
            .build();
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.open_browser);
        assert_eq!(config.port, 8085);
        assert_eq!(config.scopes, ScopeSet::default());
        assert_eq!(config.bind_host, "127.0.0.1");
    }
}
