//! Fuelio backup sources.
//!
//! Fuelio's cloud sync leaves one `vehicle-<id>-sync.csv.zip` per vehicle.
//! A [`BackupSource`] fetches that archive and hands back the raw CSV rows.

mod directory;
mod drive;
pub mod fuelio;

use std::io::{Cursor, Read};

use csv::StringRecord;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::config::{AuthType, SyncConfig};
use crate::error::{Error, Result};

pub use directory::DirectoryBackupSource;
pub use drive::DriveBackupSource;

/// Produces the raw extract rows for a Fuelio vehicle.
#[allow(async_fn_in_trait)]
pub trait BackupSource {
    /// Fetch every row of the vehicle's extract, in file order.
    ///
    /// Fails with [`Error::NotFound`] when no backup exists for the vehicle.
    async fn fetch(&self, fuelio_id: u32) -> Result<Vec<StringRecord>>;
}

/// Backup source selected by `auth_type`.
pub enum BackupSourceKind {
    Drive(DriveBackupSource),
    Directory(DirectoryBackupSource),
}

impl BackupSourceKind {
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        match config.auth_type()? {
            AuthType::Client => {
                let folder_id = config.drive_folder_id.clone().ok_or_else(|| {
                    Error::Configuration("drive_folder_id is required".to_string())
                })?;
                Ok(Self::Drive(DriveBackupSource::new(
                    folder_id,
                    config.token_file_path(),
                    config.request_timeout(),
                )?))
            }
            AuthType::Local => {
                let dir = config.backup_dir_path().ok_or_else(|| {
                    Error::Configuration("backup_dir is required".to_string())
                })?;
                Ok(Self::Directory(DirectoryBackupSource::new(dir)))
            }
        }
    }
}

impl BackupSource for BackupSourceKind {
    async fn fetch(&self, fuelio_id: u32) -> Result<Vec<StringRecord>> {
        match self {
            Self::Drive(source) => source.fetch(fuelio_id).await,
            Self::Directory(source) => source.fetch(fuelio_id).await,
        }
    }
}

/// Name of the CSV extract inside a vehicle's backup archive
pub fn backup_csv_name(fuelio_id: u32) -> String {
    format!("vehicle-{fuelio_id}-sync.csv")
}

/// Name of a vehicle's backup archive
pub fn backup_archive_name(fuelio_id: u32) -> String {
    format!("{}.zip", backup_csv_name(fuelio_id))
}

/// Read every row of a Fuelio CSV extract. Sections differ in width.
pub fn read_csv_rows(bytes: &[u8]) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Extract `csv_name` from an in-memory zip archive and read its rows.
pub fn read_backup_archive(bytes: &[u8], csv_name: &str) -> Result<Vec<StringRecord>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let nested_suffix = format!("/{csv_name}");
    let entry_name = archive
        .file_names()
        .find(|name| *name == csv_name || name.ends_with(&nested_suffix))
        .map(str::to_string)
        .ok_or_else(|| Error::NotFound(format!("{csv_name} is not in the backup archive")))?;

    let mut entry = archive.by_name(&entry_name).map_err(|error| match error {
        ZipError::FileNotFound => {
            Error::NotFound(format!("{csv_name} is not in the backup archive"))
        }
        other => Error::Archive(other),
    })?;
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents)?;
    read_csv_rows(&contents)
}
