use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::cache::token::CachedToken;

/// File backed cache holding one token per location.
///
/// The location is the cache key: enterprise and user tokens live in
/// different files and never see each other.
pub struct TokenCache;

impl TokenCache {
    /// Read the token stored at `location`.
    ///
    /// Never fails: a missing, unreadable or malformed file is a cache miss.
    pub async fn load(location: &Path) -> Option<CachedToken> {
        let content = match fs::read_to_string(location).await {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %location.display(), error = %err, "token cache miss");
                return None;
            }
        };

        match serde_json::from_str::<CachedToken>(&content) {
            Ok(token) if !token.access_token.is_empty() => Some(token),
            Ok(_) => {
                debug!(path = %location.display(), "cached token is empty");
                None
            }
            Err(err) => {
                debug!(path = %location.display(), error = %err, "cached token is malformed");
                None
            }
        }
    }

    /// Replace the token stored at `location`.
    ///
    /// Parent directories are created as needed. The content goes to an owner
    /// only (0600) sibling file first and is renamed over the target, so a
    /// reader sees either the old or the new token.
    pub async fn store(location: &Path, token: &CachedToken) -> io::Result<()> {
        if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(token).map_err(io::Error::other)?;
        let tmp = tmp_path(location);

        let written = write_owner_only(&tmp, &content).await;
        let renamed = match written {
            Ok(()) => fs::rename(&tmp, location).await,
            Err(err) => Err(err),
        };
        if renamed.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        renamed?;

        debug!(path = %location.display(), expires_at = token.expires_at, "token cached");
        Ok(())
    }
}

async fn write_owner_only(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // mode() only applies on creation; a stale tmp file keeps its old bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}

/// Unique per call: writers outside one issuer's lock never share a tmp file.
fn tmp_path(location: &Path) -> PathBuf {
    let mut name = location
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("token"));
    name.push(format!(".{}.{}.tmp", std::process::id(), Uuid::new_v4().simple()));
    location.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_paths_are_unique_siblings() {
        let location = Path::new("/var/cache/box/user.json");
        let a = tmp_path(location);
        let b = tmp_path(location);
        assert_ne!(a, b);
        assert_eq!(a.parent(), location.parent());
        assert!(a.to_string_lossy().ends_with(".tmp"));
    }
}
