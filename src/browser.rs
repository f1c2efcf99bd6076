use crate::{Error, Result};

/// Something that can take the user to the authorization URL
///
/// The flow calls [`UserAgent::open`] once the loopback listener is ready.
/// Implementations must not block waiting for the redirect; the flow does
/// that itself.
pub trait UserAgent {
    fn open(&self, url: &str) -> Result<()>;
}

/// The user's default web browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl UserAgent for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open_browser(url)
    }
}

/// Open a URL in the user's default web browser
///
/// # Errors
///
/// Returns an error if the browser cannot be launched
///
/// # Example
///
/// ```no_run
/// use google_token_bootstrap::open_browser;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// open_browser("https://accounts.google.com/o/oauth2/auth?client_id=...")?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "browser")]
pub fn open_browser(url: &str) -> Result<()> {
    webbrowser::open(url)
        .map_err(|e| Error::BrowserLaunch(format!("Failed to open browser: {}", e)))
}

#[cfg(not(feature = "browser"))]
pub fn open_browser(_url: &str) -> Result<()> {
    Err(Error::InvalidConfig(
        "built without the `browser` feature".to_string(),
    ))
}
