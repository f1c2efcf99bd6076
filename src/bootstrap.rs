//! End-to-end bootstrap: descriptor → consent flow → token file.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::browser::UserAgent;
use crate::flow::InstalledAppFlow;
use crate::secrets::{CREDENTIALS_FILE, load_client_secrets, provisioning_guidance};
use crate::storage::{TOKEN_FILE, TOKEN_PATH_ENV, save_token_record};
use crate::{Error, FlowConfig, Result};

/// Where to read the descriptor, where to write the token, and how to run the flow
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub flow: FlowConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(CREDENTIALS_FILE),
            token_path: PathBuf::from(TOKEN_FILE),
            flow: FlowConfig::default(),
        }
    }
}

/// How a bootstrap run ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The descriptor was absent; provisioning guidance was written instead
    MissingCredentials,
    /// A token record was written to `path` (absolute)
    Saved { path: PathBuf },
}

/// Run the bootstrap, writing operator-facing messages to `out`.
///
/// A missing descriptor is not an error: guidance is printed and
/// [`Outcome::MissingCredentials`] returned before any listener is bound or
/// request made. Every other failure is returned as an error and leaves the
/// token file untouched.
pub fn run(
    config: &BootstrapConfig,
    user_agent: &dyn UserAgent,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let secrets = match load_client_secrets(&config.credentials_path) {
        Ok(secrets) => secrets,
        Err(Error::MissingClientSecrets { path }) => {
            tracing::warn!(path = %path.display(), "client secrets file missing");
            write_lines(out, &provisioning_guidance(&path))?;
            return Ok(Outcome::MissingCredentials);
        }
        Err(e) => return Err(e),
    };

    let path = absolute(&config.token_path)?;
    let flow = InstalledAppFlow::new(secrets, config.flow.clone())?;
    let record = flow.run_local_server(user_agent, out)?;
    save_token_record(&path, &record)?;

    write_lines(out, &success_banner(&path))?;
    Ok(Outcome::Saved { path })
}

fn success_banner(path: &Path) -> String {
    let rule = "=".repeat(50);
    format!(
        "\n{rule}\n\
         TOKEN GENERATED SUCCESSFULLY\n\
         {rule}\n\
         \n\
         Credentials saved to {}\n\
         \n\
         Set {TOKEN_PATH_ENV} environment variable to use this token:\n  \
         export {TOKEN_PATH_ENV}={}\n\
         {rule}\n",
        path.display(),
        path.display(),
    )
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| Error::Persist {
        path: path.to_path_buf(),
        source,
    })
}

fn write_lines(out: &mut dyn Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(Error::Output)
}
