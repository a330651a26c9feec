use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fuelsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Sync failed for {failed} of {total} vehicle pairing(s)")]
    VehiclesFailed { failed: usize, total: usize },
}
