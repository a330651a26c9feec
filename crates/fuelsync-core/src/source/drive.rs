//! Backups synced to Google Drive.
//!
//! Uses the Drive v3 REST API with a bearer access token taken from a cached
//! token file. Obtaining or refreshing that token happens outside this tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use csv::StringRecord;
use reqwest::Client;
use serde::Deserialize;

use super::{backup_archive_name, backup_csv_name, read_backup_archive, BackupSource};
use crate::error::{Error, Result};
use crate::util::ensure_success;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

#[derive(Clone)]
pub struct DriveBackupSource {
    api_base: String,
    folder_id: String,
    token_file: PathBuf,
    client: Client,
}

impl std::fmt::Debug for DriveBackupSource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DriveBackupSource")
            .field("api_base", &self.api_base)
            .field("folder_id", &self.folder_id)
            .field("token_file", &self.token_file)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct CachedToken {
    access_token: Option<String>,
    token: Option<String>,
}

impl DriveBackupSource {
    pub fn new(
        folder_id: impl Into<String>,
        token_file: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_base: DRIVE_API_BASE.to_string(),
            folder_id: folder_id.into(),
            token_file: token_file.into(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Point at a different Drive API root (used by tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn find_file(&self, token: &str, name: &str) -> Result<Option<DriveFile>> {
        let query = format!(
            "'{}' in parents and trashed=false and name='{}'",
            escape_query_value(&self.folder_id),
            escape_query_value(name)
        );
        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .send()
            .await?;
        let listing = ensure_success(response, "Google Drive")
            .await?
            .json::<FileList>()
            .await?;
        Ok(listing.files.into_iter().next())
    }

    async fn download(&self, token: &str, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(format!("{}/files/{file_id}", self.api_base))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let bytes = ensure_success(response, "Google Drive")
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

impl BackupSource for DriveBackupSource {
    async fn fetch(&self, fuelio_id: u32) -> Result<Vec<StringRecord>> {
        let token = read_access_token(&self.token_file)?;
        let archive_name = backup_archive_name(fuelio_id);

        let file = self.find_file(&token, &archive_name).await?.ok_or_else(|| {
            Error::NotFound(format!(
                "no backup found for Fuelio vehicle {fuelio_id} ({archive_name})"
            ))
        })?;
        tracing::debug!("Downloading {} ({})", file.name, file.id);

        let bytes = self.download(&token, &file.id).await?;
        read_backup_archive(&bytes, &backup_csv_name(fuelio_id))
    }
}

/// Read a cached access token: either JSON with `access_token`/`token`, or
/// the bare token as text.
pub fn read_access_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        Error::Configuration(format!(
            "cannot read cached Google Drive token at {}: {error}",
            path.display()
        ))
    })?;
    let raw = raw.trim();

    let token = if raw.starts_with('{') {
        let cached: CachedToken = serde_json::from_str(raw)?;
        cached.access_token.or(cached.token).unwrap_or_default()
    } else {
        raw.to_string()
    };

    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(Error::Configuration(format!(
            "cached Google Drive token at {} is empty",
            path.display()
        )));
    }
    Ok(token)
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
