use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use ytrss::api_client::{HttpApiClient, PodcastApi};
use ytrss::app::App;
use ytrss::config::Config;
use ytrss::credentials::{CredentialStore, FileCredentialStore};
use ytrss::logging;
use ytrss::terminal_ui;
use ytrss::updater::{GithubReleaseUpdater, UpdateOutcome, UpdateService};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    let log_path = config.log_file.clone().unwrap_or_else(logging::default_log_path);
    if let Err(e) = logging::init(config.log_level, &log_path) {
        eprintln!("Logging disabled, could not open {}: {}", log_path.display(), e);
    }
    info!("ytrss-cli {} starting, API at {}", VERSION, config.api_url);

    if !config.no_update {
        match self_update().await {
            Ok(UpdateOutcome::Updated { version }) => {
                println!("Updated to version {}. Please restart ytrss-cli to use it.", version);
                return ExitCode::SUCCESS;
            }
            Ok(UpdateOutcome::NoCompatibleAsset { version }) => {
                warn!("Version {} is available but has no build for this platform", version);
            }
            Ok(_) => {}
            Err(e) => warn!("Update check failed, continuing with {}: {:#}", VERSION, e),
        }
    }

    match run(config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn self_update() -> Result<UpdateOutcome> {
    let updater = GithubReleaseUpdater::new()?;
    Ok(updater.check_and_update(VERSION).await?)
}

async fn run(config: Config) -> Result<u8> {
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::in_config_dir().context("locating the credential store")?);
    let api: Arc<dyn PodcastApi> = Arc::new(
        HttpApiClient::new(config.api_url, credentials.clone()).context("building the HTTP client")?,
    );

    let app = App::new(credentials.clone());
    let app = terminal_ui::start_ui(app, api, credentials).await.context("running the terminal UI")?;

    info!("ytrss-cli exiting");
    Ok(app.exit_code())
}
