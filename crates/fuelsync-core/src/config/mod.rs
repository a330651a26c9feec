//! Sync configuration.
//!
//! A single `config.yml` in the configuration directory names the Lubelogger
//! credentials, where Fuelio backups come from, and which vehicles to pair.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const CONFIG_FILE_NAMES: [&str; 2] = ["config.yml", "config.yaml"];

const ENV_LUBELOGGER_URL: &str = "LUBELOGGER_URL";
const ENV_LUBELOGGER_USERNAME: &str = "LUBELOGGER_USERNAME";
const ENV_LUBELOGGER_PASSWORD: &str = "LUBELOGGER_PASSWORD";

const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_FILE: &str = "cached_creds.json";

/// Where Fuelio backups are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// Google Drive, authorized with a cached access token file
    Client,
    /// A local directory holding the synced backup files
    Local,
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "local" => Ok(Self::Local),
            "service" => Err(Error::Configuration(
                "auth_type 'service' is not supported; use 'client' with a cached access token"
                    .to_string(),
            )),
            other => Err(Error::Configuration(format!(
                "unknown auth_type '{other}' (expected 'client' or 'local')"
            ))),
        }
    }
}

/// One Fuelio vehicle mapped onto one Lubelogger vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VehiclePairing {
    pub fuelio_id: u32,
    pub lubelogger_id: i64,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub lubelogger_url: String,
    #[serde(default)]
    pub lubelogger_username: String,
    #[serde(default)]
    pub lubelogger_password: String,
    #[serde(default = "default_date_format")]
    pub lubelogger_date_format: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_auth_type")]
    pub auth_type: String,
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    #[serde(default)]
    pub drive_token_file: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub sync_vehicles: Vec<VehiclePairing>,
    #[serde(skip)]
    config_dir: PathBuf,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncConfig")
            .field("lubelogger_url", &self.lubelogger_url)
            .field("lubelogger_username", &self.lubelogger_username)
            .field("lubelogger_password", &"[REDACTED]")
            .field("lubelogger_date_format", &self.lubelogger_date_format)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("auth_type", &self.auth_type)
            .field("drive_folder_id", &self.drive_folder_id)
            .field("drive_token_file", &self.drive_token_file)
            .field("backup_dir", &self.backup_dir)
            .field("log_level", &self.log_level)
            .field("debug", &self.debug)
            .field("sync_vehicles", &self.sync_vehicles)
            .finish()
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_auth_type() -> String {
    "client".to_string()
}

impl SyncConfig {
    /// Load, apply environment overrides, normalize and validate.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let mut config = Self::load_from_dir(config_dir)?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Read the config file from a directory without validating it.
    pub fn load_from_dir(config_dir: &Path) -> Result<Self> {
        let path = Self::find_config_file(config_dir)?;
        let raw = std::fs::read_to_string(&path).map_err(|error| {
            Error::Configuration(format!("failed to read {}: {error}", path.display()))
        })?;
        Self::from_yaml_str(&raw, config_dir)
    }

    pub fn from_yaml_str(raw: &str, config_dir: &Path) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(raw)?;
        config.config_dir = config_dir.to_path_buf();
        Ok(config)
    }

    fn find_config_file(config_dir: &Path) -> Result<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| config_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "no {} found in {}",
                    CONFIG_FILE_NAMES.join(" or "),
                    config_dir.display()
                ))
            })
    }

    /// Override credentials from the environment (e.g. a `.env` file).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = normalize_text_option(lookup(ENV_LUBELOGGER_URL)) {
            self.lubelogger_url = url;
        }
        if let Some(username) = normalize_text_option(lookup(ENV_LUBELOGGER_USERNAME)) {
            self.lubelogger_username = username;
        }
        if let Some(password) = lookup(ENV_LUBELOGGER_PASSWORD).filter(|value| !value.is_empty())
        {
            self.lubelogger_password = password;
        }
    }

    fn normalize(&mut self) {
        self.lubelogger_url = self.lubelogger_url.trim().trim_end_matches('/').to_string();
        self.lubelogger_username = self.lubelogger_username.trim().to_string();
        self.drive_folder_id = normalize_text_option(self.drive_folder_id.take());
        self.log_level = normalize_text_option(self.log_level.take());
    }

    /// Check everything needed before any network I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.lubelogger_url.is_empty() {
            return Err(Error::Configuration(
                "lubelogger_url is required".to_string(),
            ));
        }
        if !is_http_url(&self.lubelogger_url) {
            return Err(Error::Configuration(
                "lubelogger_url must include http:// or https://".to_string(),
            ));
        }
        if self.lubelogger_username.is_empty() || self.lubelogger_password.is_empty() {
            return Err(Error::Configuration(
                "lubelogger_username and lubelogger_password are required".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        validate_date_format(&self.lubelogger_date_format)?;

        match self.auth_type()? {
            AuthType::Client if self.drive_folder_id.is_none() => {
                return Err(Error::Configuration(
                    "drive_folder_id is required when auth_type is 'client'".to_string(),
                ));
            }
            AuthType::Local if self.backup_dir.is_none() => {
                return Err(Error::Configuration(
                    "backup_dir is required when auth_type is 'local'".to_string(),
                ));
            }
            _ => {}
        }

        if self.sync_vehicles.is_empty() {
            return Err(Error::Configuration(
                "sync_vehicles must list at least one fuelio_id/lubelogger_id pairing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn auth_type(&self) -> Result<AuthType> {
        self.auth_type.parse()
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Cached Drive access token file, relative paths resolved against the config dir.
    pub fn token_file_path(&self) -> PathBuf {
        let file = self
            .drive_token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
        self.resolve(file)
    }

    pub fn backup_dir_path(&self) -> Option<PathBuf> {
        self.backup_dir.clone().map(|dir| self.resolve(dir))
    }

    /// Level requested by the config file; `debug: true` wins over `log_level`.
    pub fn log_level_name(&self) -> Option<String> {
        if self.debug {
            Some("debug".to_string())
        } else {
            self.log_level.clone()
        }
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.config_dir.join(path)
        }
    }
}

fn validate_date_format(format: &str) -> Result<()> {
    if format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    {
        return Err(Error::Configuration(format!(
            "invalid lubelogger_date_format '{format}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ErrorKind;

    const VALID: &str = r"
lubelogger_url: https://lubelogger.example.com/
lubelogger_username: admin
lubelogger_password: hunter2
drive_folder_id: folder-123
auth_type: client
log_level: warning
sync_vehicles:
  - fuelio_id: 1
    lubelogger_id: 3
  - fuelio_id: 2
    lubelogger_id: 4
";

    fn parse(raw: &str) -> SyncConfig {
        let mut config = SyncConfig::from_yaml_str(raw, Path::new("/etc/fuelsync")).unwrap();
        config.normalize();
        config
    }

    #[test]
    fn parses_pairings_and_defaults() {
        let config = parse(VALID);
        config.validate().unwrap();
        assert_eq!(config.lubelogger_url, "https://lubelogger.example.com");
        assert_eq!(config.lubelogger_date_format, "%d/%m/%Y");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.auth_type().unwrap(), AuthType::Client);
        assert_eq!(
            config.sync_vehicles,
            vec![
                VehiclePairing {
                    fuelio_id: 1,
                    lubelogger_id: 3
                },
                VehiclePairing {
                    fuelio_id: 2,
                    lubelogger_id: 4
                },
            ]
        );
        assert_eq!(
            config.token_file_path(),
            PathBuf::from("/etc/fuelsync/cached_creds.json")
        );
    }

    #[test]
    fn unknown_auth_type_is_configuration_error() {
        let config = parse(&VALID.replace("auth_type: client", "auth_type: oauth"));
        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(error.to_string().contains("unknown auth_type 'oauth'"));
    }

    #[test]
    fn service_auth_type_points_to_cached_client_token() {
        let config = parse(&VALID.replace("auth_type: client", "auth_type: service"));
        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        let message = error.to_string();
        assert!(message.contains("'service' is not supported"));
        assert!(message.contains("'client'"));
    }

    #[test]
    fn missing_pairings_is_configuration_error() {
        let raw = VALID.split("sync_vehicles:").next().unwrap();
        let error = parse(raw).validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(error.to_string().contains("sync_vehicles"));
    }

    #[test]
    fn local_mode_requires_backup_dir() {
        let config = parse(&VALID.replace("auth_type: client", "auth_type: local"));
        assert!(config.validate().is_err());

        let config = parse(&VALID.replace(
            "auth_type: client",
            "auth_type: local\nbackup_dir: backups",
        ));
        config.validate().unwrap();
        assert_eq!(
            config.backup_dir_path(),
            Some(PathBuf::from("/etc/fuelsync/backups"))
        );
    }

    #[test]
    fn rejects_invalid_url_and_date_format() {
        let config = parse(&VALID.replace("https://", ""));
        assert!(config.validate().is_err());

        let config = parse(&format!("{VALID}lubelogger_date_format: \"%Q\"\n"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_credentials() {
        let mut config = parse(VALID);
        config.apply_env_overrides(|key| match key {
            "LUBELOGGER_PASSWORD" => Some("from-env".to_string()),
            "LUBELOGGER_URL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.lubelogger_password, "from-env");
        assert_eq!(config.lubelogger_url, "https://lubelogger.example.com");
    }

    #[test]
    fn debug_flag_wins_over_log_level() {
        let config = parse(VALID);
        assert_eq!(config.log_level_name().as_deref(), Some("warning"));

        let config = parse(&format!("{VALID}debug: true\n"));
        assert_eq!(config.log_level_name().as_deref(), Some("debug"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", parse(VALID));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_dir_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = SyncConfig::load_from_dir(dir.path()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);

        std::fs::write(dir.path().join("config.yaml"), VALID).unwrap();
        let config = SyncConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.config_dir(), dir.path());
    }
}
