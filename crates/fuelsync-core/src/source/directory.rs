//! Backups synced to a local directory.

use std::path::PathBuf;

use csv::StringRecord;

use super::{
    backup_archive_name, backup_csv_name, read_backup_archive, read_csv_rows, BackupSource,
};
use crate::error::{Error, Result};

/// Reads `vehicle-<id>-sync.csv.zip`, or an already unpacked
/// `vehicle-<id>-sync.csv`, from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryBackupSource {
    dir: PathBuf,
}

impl DirectoryBackupSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BackupSource for DirectoryBackupSource {
    async fn fetch(&self, fuelio_id: u32) -> Result<Vec<StringRecord>> {
        let archive = self.dir.join(backup_archive_name(fuelio_id));
        if archive.is_file() {
            tracing::debug!("Reading backup archive {}", archive.display());
            let bytes = std::fs::read(&archive)?;
            return read_backup_archive(&bytes, &backup_csv_name(fuelio_id));
        }

        let plain = self.dir.join(backup_csv_name(fuelio_id));
        if plain.is_file() {
            tracing::debug!("Reading unpacked backup {}", plain.display());
            return read_csv_rows(&std::fs::read(&plain)?);
        }

        Err(Error::NotFound(format!(
            "no backup found for Fuelio vehicle {fuelio_id} in {}",
            self.dir.display()
        )))
    }
}
