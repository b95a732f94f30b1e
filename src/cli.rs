use clap::Parser;

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "vidmirror",
    about = "Mirror a channel feed's video attachments into a local directory"
)]
pub struct Cli {
    /// Channel to mirror (numeric id or @name)
    #[arg(short = 'c', long)]
    pub channel: Option<String>,

    /// Local directory for downloaded videos
    #[arg(short = 'd', long)]
    pub directory: Option<String>,

    /// Base URL of the feed gateway
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Gateway API token.
    /// WARNING: passing via --api-token is visible in process listings.
    /// Prefer the VIDMIRROR_API_TOKEN environment variable or the config file.
    #[arg(long, env = "VIDMIRROR_API_TOKEN")]
    pub api_token: Option<String>,

    /// TOML config file supplying defaults for the flags above
    #[arg(long, default_value = "vidmirror.toml")]
    pub config: String,

    /// Whole-pass attempts before giving up (rate-limit waits don't count)
    #[arg(long)]
    pub max_pass_attempts: Option<u32>,

    /// Seconds between liveness heartbeat lines
    #[arg(long)]
    pub heartbeat_interval: Option<u64>,

    /// Messages per listing page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Run continuously, waiting N seconds between runs
    #[arg(long)]
    pub watch_with_interval: Option<u64>,

    /// Log what would be downloaded without writing any files
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
