//! Resolved run configuration.
//!
//! CLI flags win over the optional TOML config file; defaults fill the rest.
//! Missing required settings (channel, directory, gateway URL, API token)
//! are fatal before any pass starts.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::cli::Cli;

pub const DEFAULT_MAX_PASS_ATTEMPTS: u32 = 3;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// File-sourced defaults; every field optional, CLI flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub channel: Option<String>,
    pub directory: Option<String>,
    pub gateway_url: Option<String>,
    pub api_token: Option<String>,
    pub max_pass_attempts: Option<u32>,
    pub heartbeat_interval: Option<u64>,
    pub page_size: Option<u32>,
}

pub struct Config {
    pub channel: String,
    pub directory: PathBuf,
    pub gateway_url: String,
    pub api_token: String,
    pub max_pass_attempts: u32,
    pub heartbeat_interval: Duration,
    pub page_size: u32,
    pub watch_with_interval: Option<u64>,
    pub dry_run: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("channel", &self.channel)
            .field("directory", &self.directory)
            .field("gateway_url", &self.gateway_url)
            .field("api_token", &"<redacted>")
            .field("max_pass_attempts", &self.max_pass_attempts)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = load_file(&cli.config)?;

        let channel = cli
            .channel
            .or(file.channel)
            .context("missing required setting: channel (--channel or config file)")?;
        let directory = cli
            .directory
            .or(file.directory)
            .context("missing required setting: directory (--directory or config file)")?;
        let gateway_url = cli
            .gateway_url
            .or(file.gateway_url)
            .context("missing required setting: gateway URL (--gateway-url or config file)")?;
        let api_token = cli.api_token.or(file.api_token).context(
            "missing required setting: API token \
             (--api-token, VIDMIRROR_API_TOKEN, or config file)",
        )?;

        Ok(Self {
            channel,
            directory: expand_tilde(&directory),
            gateway_url,
            api_token,
            max_pass_attempts: cli
                .max_pass_attempts
                .or(file.max_pass_attempts)
                .unwrap_or(DEFAULT_MAX_PASS_ATTEMPTS),
            heartbeat_interval: Duration::from_secs(
                cli.heartbeat_interval
                    .or(file.heartbeat_interval)
                    .unwrap_or(DEFAULT_HEARTBEAT_SECS),
            ),
            page_size: cli.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            watch_with_interval: cli.watch_with_interval,
            dry_run: cli.dry_run,
        })
    }
}

/// Read the TOML config file. A missing file is not an error — the CLI may
/// carry everything — but an unreadable or malformed one is fatal.
fn load_file(path: &str) -> anyhow::Result<FileConfig> {
    match std::fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).with_context(|| format!("invalid config file {}", path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path, "no config file, using CLI settings only");
            Ok(FileConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("cannot read config file {}", path)),
    }
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
