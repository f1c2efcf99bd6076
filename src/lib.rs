//! # google-token-bootstrap
//!
//! One-shot OAuth 2.0 bootstrap for Google APIs using the installed-application
//! (desktop) flow with a loopback redirect.
//!
//! The crate reads a client descriptor (`credentials.json`), sends the user
//! through Google's consent screen, catches the redirect on a local port,
//! redeems the code and writes the result to `token.json`. A separate client
//! then points `GOOGLE_TOKEN_PATH` at that file and handles refresh itself.
//!
//! ## Features
//!
//! - **Blocking API**: no async runtime required
//! - **PKCE Support**: S256 code challenge on every authorization request
//! - **Loopback Listener**: ephemeral-port callback server with CSRF state check
//! - **Browser Integration**: auto-open browser for authorization (default)
//! - **Atomic Storage**: the token file is replaced in a single rename
//!
//! ## Quick Start
//!
//! ```no_run
//! use google_token_bootstrap::{
//!     FlowConfig, InstalledAppFlow, SystemBrowser, load_client_secrets, save_token_record,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let secrets = load_client_secrets("credentials.json")?;
//!     let flow = InstalledAppFlow::new(secrets, FlowConfig::default())?;
//!     let record = flow.run_local_server(&SystemBrowser, &mut std::io::stdout())?;
//!     save_token_record("token.json", &record)?;
//!     Ok(())
//! }
//! ```

mod browser;
mod client;
mod error;
mod flow;
mod scopes;
mod secrets;
mod server;
mod storage;
mod types;

pub mod bootstrap;

// Public API exports
pub use browser::{SystemBrowser, UserAgent, open_browser};
pub use client::OAuthClient;
pub use error::{Error, Result};
pub use flow::InstalledAppFlow;
pub use scopes::{DEFAULT_SCOPES, ScopeSet};
pub use secrets::{CREDENTIALS_FILE, ClientSecrets, load_client_secrets, provisioning_guidance};
pub use server::{CallbackEvent, CallbackListener};
pub use storage::{TOKEN_FILE, TOKEN_PATH_ENV, load_token_record, save_token_record};
pub use types::{AuthorizationRequest, FlowConfig, FlowConfigBuilder, TokenRecord};
