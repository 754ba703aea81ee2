// src/config.rs
use crate::api_client::DEFAULT_API_URL;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(name = "ytrss-cli", version, about = "Turn YouTube videos into podcast episodes from the terminal")]
pub struct Config {
    /// Base URL of the ytrss API.
    #[arg(long, env = "YTRSS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// Log file path. Defaults to ytrss.log in the user data directory.
    #[arg(long, env = "YTRSS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(long, env = "YTRSS_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Skip the self-update check on startup.
    #[arg(long, env = "YTRSS_NO_UPDATE")]
    pub no_update: bool,
}
