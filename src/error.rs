use std::path::PathBuf;

use thiserror::Error;

/// Error types for the installed-application token bootstrap
#[derive(Error, Debug)]
pub enum Error {
    #[error("Client secrets file not found: {}", .path.display())]
    MissingClientSecrets { path: PathBuf },

    #[error("Invalid client secrets file {}: {reason}", .path.display())]
    InvalidClientSecrets { path: PathBuf, reason: String },

    #[error("Authorization denied by provider: {error}{}", detail(.description))]
    Authorization {
        error: String,
        description: Option<String>,
    },

    #[error("State mismatch on OAuth callback - possible CSRF attack")]
    StateMismatch,

    #[error("OAuth callback did not include an authorization code")]
    MissingCode,

    #[error("Timed out waiting for the OAuth callback")]
    CallbackTimeout,

    #[error("Callback server error: {0}")]
    CallbackServer(String),

    #[error("Granted scopes differ from requested scopes: requested [{requested}], granted [{granted}]")]
    ScopeMismatch { requested: String, granted: String },

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to write token file {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[cfg(feature = "browser")]
    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for outcomes decided by the user or the provider during consent,
    /// as opposed to local or transport failures.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            Error::Authorization { .. }
                | Error::StateMismatch
                | Error::MissingCode
                | Error::ScopeMismatch { .. }
        )
    }
}

fn detail(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_error_includes_description() {
        let err = Error::Authorization {
            error: "access_denied".to_string(),
            description: Some("user said no".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Authorization denied by provider: access_denied (user said no)"
        );
        assert!(err.is_authorization_failure());
    }

    #[test]
    fn persist_error_is_not_an_authorization_failure() {
        let err = Error::Persist {
            path: PathBuf::from("token.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_authorization_failure());
        assert!(err.to_string().starts_with("Failed to write token file token.json"));
    }
}
