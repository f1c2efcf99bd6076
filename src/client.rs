use url::Url;

use crate::scopes::ScopeSet;
use crate::types::{AuthorizationRequest, TokenResponse};
use crate::{ClientSecrets, Error, Result, TokenRecord};

/// Blocking OAuth client for an installed (desktop) Google application
///
/// Builds authorization URLs with PKCE and redeems authorization codes at the
/// token endpoint named in the client descriptor.
///
/// # Example
///
/// ```no_run
/// use google_token_bootstrap::{OAuthClient, ScopeSet, load_client_secrets};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let secrets = load_client_secrets("credentials.json")?;
///     let client = OAuthClient::new(secrets, ScopeSet::default())?;
///     let request = client.authorization_request("http://localhost:8080/")?;
///
///     println!("Visit: {}", request.authorization_url);
///     // The browser is redirected back with ?code=...
///
///     let record = client.exchange_code("code", &request)?;
///     println!("Expires in: {:?}", record.expires_in());
///     Ok(())
/// }
/// ```
pub struct OAuthClient {
    secrets: ClientSecrets,
    scopes: ScopeSet,
    http: reqwest::blocking::Client,
}

impl OAuthClient {
    /// Create a new client for the given descriptor and scope set
    ///
    /// # Errors
    ///
    /// Returns an error if the scope set is empty or the HTTP client cannot
    /// be constructed
    pub fn new(secrets: ClientSecrets, scopes: ScopeSet) -> Result<Self> {
        if scopes.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one scope must be requested".to_string(),
            ));
        }
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            secrets,
            scopes,
            http,
        })
    }

    /// Scopes requested by this client
    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    /// The client descriptor this client was built from
    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    /// Build the authorization URL the user should visit
    ///
    /// Generates a fresh PKCE pair and CSRF state. Offline access is
    /// requested and consent is forced so the provider issues a refresh
    /// token on every run.
    pub fn authorization_request(&self, redirect_uri: &str) -> Result<AuthorizationRequest> {
        let state = crate::types::generate_random_state();
        let (pkce_challenge, pkce_verifier) = crate::types::generate_pkce_pair();

        let mut url = Url::parse(&self.secrets.auth_uri)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.secrets.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.scopes.to_param())
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(AuthorizationRequest {
            authorization_url: url.to_string(),
            pkce_verifier,
            state,
            redirect_uri: redirect_uri.to_string(),
        })
    }

    /// Exchange an authorization code for a token record
    ///
    /// # Arguments
    ///
    /// * `code` - The authorization code from the OAuth callback
    /// * `request` - The request the code was issued for
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint cannot be reached, answers
    /// with a non-success status or a malformed body, or grants a scope set
    /// different from the requested one
    pub fn exchange_code(&self, code: &str, request: &AuthorizationRequest) -> Result<TokenRecord> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("code_verifier", request.pkce_verifier.as_str()),
        ];

        tracing::info!(token_uri = %self.secrets.token_uri, "exchanging authorization code");
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(Error::Http { status, body });
        }

        let token_response: TokenResponse = response.json()?;
        let record = token_response.into_record(&self.scopes, &self.secrets)?;

        if !record.scopes.same_set(&self.scopes) {
            return Err(Error::ScopeMismatch {
                requested: self.scopes.to_param(),
                granted: record.scopes.to_param(),
            });
        }
        if record.refresh_token.is_none() {
            tracing::warn!("token endpoint did not return a refresh token");
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuthClient {
        let secrets = ClientSecrets {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            auth_uri: "https://accounts.example/o/oauth2/auth".to_string(),
            token_uri: "https://accounts.example/token".to_string(),
            redirect_uris: vec!["http://localhost".to_string()],
            project_id: None,
        };
        OAuthClient::new(secrets, ScopeSet::new(["s1", "s2"])).unwrap()
    }

    #[test]
    fn authorization_url_carries_all_parameters() {
        let request = client()
            .authorization_request("http://localhost:4242/")
            .unwrap();
        let url = Url::parse(&request.authorization_url).unwrap();
        let pairs: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/o/oauth2/auth");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "cid");
        assert_eq!(pairs["redirect_uri"], "http://localhost:4242/");
        assert_eq!(pairs["scope"], "s1 s2");
        assert_eq!(pairs["state"], request.state);
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["access_type"], "offline");
        assert!(!pairs.contains_key("client_secret"));
        assert_eq!(request.redirect_uri, "http://localhost:4242/");
    }

    #[test]
    fn empty_scope_set_is_rejected() {
        let secrets = client().secrets().clone();
        let result = OAuthClient::new(secrets, ScopeSet::new(Vec::<String>::new()));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
