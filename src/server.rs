use std::time::{Duration, Instant};

use tiny_http::{Header, Response, Server};

use crate::{Error, Result};

const CALLBACK_PATH: &str = "/";

/// What happened on the OAuth callback, passed to the HTML renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// An authorization code was received
    Success,
    /// The provider redirected with an `error` parameter
    Error { reason: String },
    /// The `state` parameter did not match the one sent
    StateMismatch,
    /// Neither a code nor an error was present
    MissingCode,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Loopback HTTP listener that catches a single OAuth redirect
///
/// Binding happens up front so the chosen port can be embedded in the
/// redirect URI before the browser is sent to the provider.
pub struct CallbackListener {
    server: Server,
    port: u16,
}

impl CallbackListener {
    /// Bind the listener; port 0 picks a free ephemeral port
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallbackServer`] if the address cannot be bound
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let server = Server::http(&addr).map_err(|e| {
            Error::CallbackServer(format!("Failed to bind to {}: {}", addr, e))
        })?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| Error::CallbackServer(format!("{addr} is not an IP listener")))?;

        tracing::info!(port, "callback listener bound");
        Ok(Self { server, port })
    }

    /// Port the listener is bound to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI to register with the provider for this listener
    pub fn redirect_uri(&self, host: &str) -> String {
        format!("http://{}:{}{}", host, self.port, CALLBACK_PATH)
    }

    /// Block until the provider redirects back, returning the authorization code
    ///
    /// Requests for other paths are answered with 404 and ignored. The
    /// browser receives the page produced by `render` for the callback
    /// outcome. The listener is closed when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The redirect carries an `error` parameter
    /// - The state token doesn't match
    /// - No code is present
    /// - `timeout` elapses first
    pub fn wait_for_code<F>(
        self,
        expected_state: &str,
        timeout: Option<Duration>,
        render: F,
    ) -> Result<String>
    where
        F: Fn(&CallbackEvent) -> String,
    {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let request = match deadline {
                None => self.server.recv().map(Some),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(Error::CallbackTimeout);
                    }
                    self.server.recv_timeout(remaining)
                }
            }
            .map_err(|e| Error::CallbackServer(format!("Failed to receive request: {}", e)))?;

            let Some(request) = request else {
                continue;
            };

            let Some(query) = parse_callback(request.url()) else {
                tracing::debug!(url = %request.url(), "ignoring request outside the callback path");
                let _ = request.respond(Response::from_string("Not Found").with_status_code(404));
                continue;
            };

            let outcome = classify(query, expected_state);
            let (event, status) = match &outcome {
                Ok(_) => (CallbackEvent::Success, 200),
                Err(Error::Authorization { error, .. }) => (
                    CallbackEvent::Error {
                        reason: error.clone(),
                    },
                    400,
                ),
                Err(Error::StateMismatch) => (CallbackEvent::StateMismatch, 400),
                Err(_) => (CallbackEvent::MissingCode, 400),
            };

            let mut response = Response::from_string(render(&event)).with_status_code(status);
            if let Ok(header) = "Content-Type: text/html; charset=utf-8".parse::<Header>() {
                response = response.with_header(header);
            }
            if let Err(e) = request.respond(response) {
                tracing::warn!(error = %e, "failed to answer the browser");
            }

            return outcome;
        }
    }
}

/// Extract callback parameters from a request target; `None` when the path
/// is not the callback path.
fn parse_callback(target: &str) -> Option<CallbackQuery> {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        return None;
    }

    let mut parsed = CallbackQuery::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Some(value.into_owned());
        match key.as_ref() {
            "code" => parsed.code = value,
            "state" => parsed.state = value,
            "error" => parsed.error = value,
            "error_description" => parsed.error_description = value,
            _ => {}
        }
    }
    Some(parsed)
}

fn classify(query: CallbackQuery, expected_state: &str) -> Result<String> {
    if let Some(error) = query.error {
        return Err(Error::Authorization {
            error,
            description: query.error_description,
        });
    }

    if query.state.as_deref().unwrap_or("") != expected_state {
        return Err(Error::StateMismatch);
    }

    query.code.ok_or(Error::MissingCode)
}
