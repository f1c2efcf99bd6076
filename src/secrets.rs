//! Loading of the provider-issued client descriptor (`credentials.json`).

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

/// Default location of the client descriptor, relative to the working directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// OAuth client identity as downloaded from the Google Cloud console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (empty for clients issued without one)
    #[serde(default)]
    pub client_secret: String,
    /// Authorization endpoint URL
    pub auth_uri: String,
    /// Token exchange endpoint URL
    pub token_uri: String,
    /// Redirect URIs registered for the client
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Cloud project the client belongs to
    #[serde(default)]
    pub project_id: Option<String>,
}

/// The downloaded file wraps the client under `installed` (desktop clients)
/// or `web`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretsFile {
    Installed(ClientSecrets),
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Parse and validate the JSON content of a client secrets file.
    pub(crate) fn from_json(content: &str) -> std::result::Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(content).map_err(|e| {
            format!("expected a single \"installed\" or \"web\" client object: {e}")
        })?;
        let secrets = match file {
            ClientSecretsFile::Installed(secrets) | ClientSecretsFile::Web(secrets) => secrets,
        };
        secrets.validate()?;
        Ok(secrets)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is empty".to_string());
        }
        Url::parse(&self.auth_uri).map_err(|e| format!("auth_uri is not a URL: {e}"))?;
        Url::parse(&self.token_uri).map_err(|e| format!("token_uri is not a URL: {e}"))?;
        Ok(())
    }
}

/// Read the client descriptor at `path`.
///
/// A missing file is reported as [`Error::MissingClientSecrets`] so callers
/// can print [`provisioning_guidance`] instead of a generic I/O error.
pub fn load_client_secrets(path: impl AsRef<Path>) -> Result<ClientSecrets> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingClientSecrets {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Error::InvalidClientSecrets {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let secrets =
        ClientSecrets::from_json(&content).map_err(|reason| Error::InvalidClientSecrets {
            path: path.to_path_buf(),
            reason,
        })?;
    tracing::debug!(path = %path.display(), client_id = %secrets.client_id, "loaded client secrets");
    Ok(secrets)
}

/// Operator instructions for obtaining a client descriptor.
pub fn provisioning_guidance(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| CREDENTIALS_FILE.to_string());
    format!(
        "Error: {file_name} not found.\n\
         \n\
         To get {file_name}:\n\
         1. Go to https://console.cloud.google.com/\n\
         2. Create/select a project\n\
         3. Enable Google Sheets, Docs, and Drive APIs\n\
         4. Go to Credentials > Create Credentials > OAuth client ID\n\
         5. Select 'Desktop app' and download the JSON\n\
         6. Rename to {file_name} and place in this directory\n"
    )
}
