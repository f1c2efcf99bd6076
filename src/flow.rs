//! The installed-application authorization flow.
//!
//! One call to [`InstalledAppFlow::run_local_server`] walks the whole grant:
//! build the authorization request, bind the loopback listener, send the
//! user to the provider, wait for the redirect and redeem the code. Nothing
//! is written to disk here; persisting the record is left to the caller.

use std::io::Write;

use crate::browser::UserAgent;
use crate::server::{CallbackEvent, CallbackListener};
use crate::{ClientSecrets, Error, FlowConfig, OAuthClient, Result, TokenRecord};

/// Authorization-code grant runner for a desktop client
pub struct InstalledAppFlow {
    client: OAuthClient,
    config: FlowConfig,
}

impl InstalledAppFlow {
    /// Create a flow for `secrets` using the scopes and options in `config`
    pub fn new(secrets: ClientSecrets, config: FlowConfig) -> Result<Self> {
        let client = OAuthClient::new(secrets, config.scopes.clone())?;
        Ok(Self { client, config })
    }

    /// Settings this flow runs with
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Run the flow and return the freshly issued token record
    ///
    /// Blocks the calling thread until the provider redirects back to the
    /// loopback listener, or until the configured timeout elapses. The
    /// authorization URL is written to `out` so the user can open it by hand.
    ///
    /// # Errors
    ///
    /// Fails without side effects when the listener cannot be bound, the
    /// redirect carries an error or a bad state, the timeout elapses, or the
    /// token exchange fails.
    pub fn run_local_server(
        &self,
        user_agent: &dyn UserAgent,
        out: &mut dyn Write,
    ) -> Result<TokenRecord> {
        let listener = CallbackListener::bind(&self.config.bind_host, self.config.port)?;
        let redirect_uri = listener.redirect_uri(&self.config.redirect_host);
        let request = self.client.authorization_request(&redirect_uri)?;
        tracing::debug!(%redirect_uri, url = %request.authorization_url, "authorization request built");

        writeln!(
            out,
            "Please visit this URL to authorize this application: {}",
            request.authorization_url
        )
        .and_then(|()| out.flush())
        .map_err(Error::Output)?;
        if self.config.open_browser {
            if let Err(e) = user_agent.open(&request.authorization_url) {
                tracing::warn!(error = %e, "could not open a browser; use the URL above");
            }
        }

        tracing::info!(
            timeout = ?self.config.timeout,
            "waiting for the authorization redirect"
        );
        let code = listener.wait_for_code(&request.state, self.config.timeout, |event| {
            match event {
                CallbackEvent::Success => self.config.success_html.clone(),
                _ => self.config.failure_html.clone(),
            }
        })?;
        tracing::info!("authorization code received");

        self.client.exchange_code(&code, &request)
    }
}
