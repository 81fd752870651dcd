//! CLI argument definitions for the Helpdesk binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3040;

/// Helpdesk - education support assistant with a chat API and terminal shell.
#[derive(Parser, Debug)]
#[command(name = "helpdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", env = "HELPDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", env = "HELPDESK_PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Chat in the terminal instead of serving HTTP.
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,

    /// Write the default configuration to the config path and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,

    /// Let --init-config replace an existing file.
    #[arg(long = "force", requires = "init_config")]
    pub force: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag / HELPDESK_CONFIG > ~/.helpdesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag / HELPDESK_PORT > config file value > 3040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        match self.port {
            Some(p) => p,
            None if config_port != 0 => config_port,
            None => DEFAULT_PORT,
        }
    }

    /// Resolve the tracing filter when `RUST_LOG` is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
    } else {
        std::env::var("HOME")
    };
    match home {
        Ok(home) => PathBuf::from(home).join(".helpdesk").join("config.toml"),
        Err(_) => PathBuf::from("helpdesk.toml"),
    }
}
