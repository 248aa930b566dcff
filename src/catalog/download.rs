//! Keeps a local copy of `usb.ids` fresh, re-downloading it only when the server's copy is newer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::DateTime;
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::LAST_MODIFIED;
use reqwest::StatusCode;

use super::{CatalogError, IdentifierCatalog};

/// A remote `usb.ids`, and where we cache it.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    /// The URL the database is served from.
    pub url: String,

    /// The local copy; also what we load from.
    pub cache_path: PathBuf,
}

impl CatalogSource {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
        }
    }

    /// Downloads the database if the server's copy is newer than ours (or we have none).
    /// Returns true iff the local copy was replaced.
    pub fn refresh(&self) -> Result<bool, CatalogError> {
        let client = Client::new();

        // Ask the server how old its copy is...
        let response = client.head(&self.url).send()?;
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .ok_or(CatalogError::MissingTimestamp)?
            .to_str()
            .map_err(|e| CatalogError::BadTimestamp(e.to_string()))?;
        let remote = parse_last_modified(last_modified)?;

        // ... and only fetch it if ours is older.
        if !needs_refresh(local_timestamp(&self.cache_path), remote) {
            info!("Cached USB IDs at {} are up to date", self.cache_path.display());
            return Ok(false);
        }

        info!("Downloading USB IDs from {}", self.url);
        let response = client.get(&self.url).send()?;
        if response.status() != StatusCode::OK {
            return Err(CatalogError::Download(response.status().as_u16()));
        }
        let contents = response.bytes()?;

        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.cache_path, &contents)?;

        Ok(true)
    }

    /// Refreshes the local copy if we can, then loads it.
    ///
    /// A failed refresh isn't fatal: we'll happily use a stale copy.
    pub fn load(&self) -> Result<IdentifierCatalog, CatalogError> {
        if let Err(e) = self.refresh() {
            warn!("Could not refresh USB IDs: {}", e);
        }

        IdentifierCatalog::load(&self.cache_path)
    }
}

/// Returns the modification time of the local copy in seconds since the epoch,
/// or zero if there's no local copy.
fn local_timestamp(path: &Path) -> i64 {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|age| age.as_secs() as i64)
        .unwrap_or(0)
}

/// Parses an HTTP Last-Modified date (e.g. `Sat, 05 Oct 2024 20:34:03 GMT`)
/// into seconds since the epoch.
pub fn parse_last_modified(value: &str) -> Result<i64, CatalogError> {
    DateTime::parse_from_rfc2822(value)
        .map(|date| date.timestamp())
        .map_err(|_| CatalogError::BadTimestamp(value.to_string()))
}

/// Returns true iff a local copy last modified at `local` is older than the remote one.
pub fn needs_refresh(local: i64, remote: i64) -> bool {
    local < remote
}
