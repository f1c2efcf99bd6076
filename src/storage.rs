use std::io::Write;
use std::path::Path;

use crate::{Error, Result, TokenRecord};

/// Default location of the token record, relative to the working directory.
pub const TOKEN_FILE: &str = "token.json";

/// Environment variable downstream clients read to locate the token record.
pub const TOKEN_PATH_ENV: &str = "GOOGLE_TOKEN_PATH";

/// Save the token record, replacing any previous file in one step.
///
/// The content is written to a temporary file in the same directory and
/// renamed over `path`, so readers see either the old record or the new one.
/// On Unix the file is readable by its owner only.
pub fn save_token_record(path: impl AsRef<Path>, record: &TokenRecord) -> Result<()> {
    let path = path.as_ref();
    let persist_err = |source: std::io::Error| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    let content = serde_json::to_string_pretty(record)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".token-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(persist_err)?;
    tmp.write_all(content.as_bytes()).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(persist_err)?;
    }

    tmp.persist(path).map_err(|e| persist_err(e.error))?;
    tracing::info!(path = %path.display(), "token record saved");
    Ok(())
}

/// Load a token record written by [`save_token_record`]
pub fn load_token_record(path: impl AsRef<Path>) -> Result<TokenRecord> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
