use fuelsync_core::config::{AuthType, SyncConfig};

use crate::error::CliError;

pub fn run_check_config(config: &SyncConfig) -> Result<(), CliError> {
    for line in describe_config(config)? {
        println!("{line}");
    }
    Ok(())
}

/// Human-readable summary of a validated config. Never includes secrets.
pub fn describe_config(config: &SyncConfig) -> Result<Vec<String>, CliError> {
    let source = match config.auth_type()? {
        AuthType::Client => format!(
            "Google Drive folder {} (token {})",
            config.drive_folder_id.as_deref().unwrap_or_default(),
            config.token_file_path().display()
        ),
        AuthType::Local => format!(
            "directory {}",
            config
                .backup_dir_path()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default()
        ),
    };

    let mut lines = vec![
        format!(
            "Lubelogger: {} as {}",
            config.lubelogger_url, config.lubelogger_username
        ),
        format!("Fuelio backups: {source}"),
    ];
    lines.extend(config.sync_vehicles.iter().map(|pairing| {
        format!(
            "Pairing: Fuelio vehicle {} -> Lubelogger vehicle {}",
            pairing.fuelio_id, pairing.lubelogger_id
        )
    }));
    Ok(lines)
}
