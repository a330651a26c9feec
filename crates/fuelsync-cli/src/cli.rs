use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "fuelsync")]
#[command(about = "Add missing Fuelio fuel fillups to Lubelogger")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding config.yml
    #[arg(env = "CONFIG_DIR", default_value = "./config", value_name = "CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Report what would be added without adding anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log verbosity (overrides RUST_LOG and the config file)
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Only sync the pairing for this Fuelio vehicle ID
    #[arg(long, global = true, value_name = "FUELIO_ID")]
    pub vehicle: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync every configured vehicle pairing (default)
    Sync,
    /// Validate the configuration without touching the network
    CheckConfig,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Name understood by `tracing_subscriber::EnvFilter`.
    pub const fn filter_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }

    /// Parse a level name from the config file.
    pub fn from_config_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).ok()
    }
}
