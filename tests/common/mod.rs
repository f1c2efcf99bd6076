#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use google_token_bootstrap::bootstrap::BootstrapConfig;
use google_token_bootstrap::{FlowConfig, Result, ScopeSet, UserAgent};
use url::Url;

pub const SCOPES: [&str; 5] = google_token_bootstrap::DEFAULT_SCOPES;

/// What the simulated user does on the consent screen
#[derive(Debug, Clone)]
pub enum Consent {
    Approve { code: String },
    Deny { error: String },
    ForgeState { code: String },
    Ignore,
}

/// Stands in for a browser: reads the authorization URL and replays the
/// provider's redirect against the loopback listener from another thread.
pub struct SimulatedBrowser {
    pub consent: Consent,
}

impl SimulatedBrowser {
    pub fn approving(code: &str) -> Self {
        Self {
            consent: Consent::Approve {
                code: code.to_string(),
            },
        }
    }

    pub fn denying(error: &str) -> Self {
        Self {
            consent: Consent::Deny {
                error: error.to_string(),
            },
        }
    }
}

impl UserAgent for SimulatedBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let url = Url::parse(url)?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        };
        let requested = ScopeSet::parse(&param("scope"));
        assert!(requested.same_set(&ScopeSet::new(SCOPES)));

        let mut redirect = Url::parse(&param("redirect_uri"))?;
        let state = param("state");
        match &self.consent {
            Consent::Approve { code } => {
                redirect
                    .query_pairs_mut()
                    .append_pair("state", &state)
                    .append_pair("code", code)
                    .append_pair("scope", &requested.to_param());
            }
            Consent::Deny { error } => {
                redirect
                    .query_pairs_mut()
                    .append_pair("error", error)
                    .append_pair("state", &state);
            }
            Consent::ForgeState { code } => {
                redirect
                    .query_pairs_mut()
                    .append_pair("state", "forged")
                    .append_pair("code", code);
            }
            Consent::Ignore => return Ok(()),
        }

        std::thread::spawn(move || {
            let _ = reqwest::blocking::get(redirect.as_str());
        });
        Ok(())
    }
}

pub fn write_credentials(dir: &Path, token_uri: &str) {
    let json = serde_json::json!({
        "installed": {
            "client_id": "test-client.apps.googleusercontent.com",
            "project_id": "token-bootstrap-test",
            "auth_uri": "https://accounts.example.test/o/oauth2/auth",
            "token_uri": token_uri,
            "client_secret": "test-secret",
            "redirect_uris": ["http://localhost"]
        }
    });
    std::fs::write(dir.join("credentials.json"), json.to_string()).unwrap();
}

pub fn config_in(dir: &Path) -> BootstrapConfig {
    BootstrapConfig {
        credentials_path: dir.join("credentials.json"),
        token_path: dir.join("token.json"),
        flow: FlowConfig::builder()
            .redirect_host("127.0.0.1")
            .timeout(Duration::from_secs(10))
            .build(),
    }
}

pub fn token_body(scope: &str) -> String {
    serde_json::json!({
        "access_token": "T1",
        "refresh_token": "R1",
        "expires_in": 3600,
        "scope": scope,
        "token_type": "Bearer"
    })
    .to_string()
}
