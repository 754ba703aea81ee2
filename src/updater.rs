// src/updater.rs
use crate::errors::UpdateError;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const REPO_OWNER: &str = "lsherman98";
pub const REPO_NAME: &str = "ytrss-cli";
const GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Development build; nothing was looked up.
    Skipped,
    UpToDate,
    /// A newer release exists but ships no binary for this platform.
    NoCompatibleAsset { version: String },
    /// The executable on disk was replaced; a restart picks it up.
    Updated { version: String },
}

#[async_trait]
pub trait UpdateService: Send + Sync {
    async fn check_and_update(&self, current_version: &str) -> Result<UpdateOutcome, UpdateError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

pub struct GithubReleaseUpdater {
    client: Client,
    api_base: String,
    dev_build: bool,
    executable: Option<PathBuf>,
}

impl GithubReleaseUpdater {
    pub fn new() -> Result<Self, UpdateError> {
        let client = Client::builder()
            .user_agent(concat!("ytrss-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: GITHUB_API.to_string(),
            dev_build: cfg!(debug_assertions),
            executable: None,
        })
    }

    pub fn with_dev_build(mut self, dev_build: bool) -> Self {
        self.dev_build = dev_build;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Replace this file instead of the running executable.
    pub fn with_executable(mut self, path: PathBuf) -> Self {
        self.executable = Some(path);
        self
    }

    async fn latest_release(&self) -> Result<Release, UpdateError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            REPO_OWNER,
            REPO_NAME
        );
        debug!("Checking for updates at {}", url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(UpdateError::NoRelease);
        }
        Ok(response.error_for_status()?.json::<Release>().await?)
    }

    async fn download(&self, asset: &ReleaseAsset) -> Result<Vec<u8>, UpdateError> {
        info!("Downloading {} from {}", asset.name, asset.browser_download_url);
        let bytes = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UpdateService for GithubReleaseUpdater {
    async fn check_and_update(&self, current_version: &str) -> Result<UpdateOutcome, UpdateError> {
        if self.dev_build || current_version == "0.0.0" {
            debug!("Development build, skipping update check");
            return Ok(UpdateOutcome::Skipped);
        }

        let release = self.latest_release().await?;
        if !is_newer(&release.tag_name, current_version)? {
            debug!("Version {} is current (latest {})", current_version, release.tag_name);
            return Ok(UpdateOutcome::UpToDate);
        }

        let version = release.tag_name.trim_start_matches('v').to_string();
        info!("New version available: {} (current: {})", version, current_version);

        let Some(asset) = select_asset(&release.assets, &asset_name()) else {
            info!("Release {} has no asset named {}", version, asset_name());
            return Ok(UpdateOutcome::NoCompatibleAsset { version });
        };

        let bytes = self.download(asset).await?;
        let target = match &self.executable {
            Some(path) => path.clone(),
            None => std::env::current_exe()?,
        };
        install_binary(&target, &bytes).await?;
        info!("Updated {} to {}", target.display(), version);
        Ok(UpdateOutcome::Updated { version })
    }
}

/// `v1.4.2-rc.1` -> `(1, 4, 2)`. Missing minor/patch parts count as 0.
pub fn parse_version(raw: &str) -> Result<(u64, u64, u64), UpdateError> {
    let trimmed = raw.trim().trim_start_matches('v');
    let core = trimmed.split(['-', '+']).next().unwrap_or_default();
    let parts = core
        .split('.')
        .map(|p| p.parse::<u64>().map_err(|_| UpdateError::Version(raw.to_string())))
        .collect::<Result<Vec<u64>, UpdateError>>()?;
    match parts.as_slice() {
        [major] => Ok((*major, 0, 0)),
        [major, minor] => Ok((*major, *minor, 0)),
        [major, minor, patch] => Ok((*major, *minor, *patch)),
        _ => Err(UpdateError::Version(raw.to_string())),
    }
}

pub fn is_newer(latest: &str, current: &str) -> Result<bool, UpdateError> {
    Ok(parse_version(latest)? > parse_version(current)?)
}

/// Release binaries are named `ytrss-cli_<os>_<arch>`, spelled `darwin`, `amd64`, `arm64`.
pub fn asset_name() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    };
    let ext = if cfg!(windows) { ".exe" } else { "" };
    format!("{}_{}_{}{}", REPO_NAME, os, arch, ext)
}

pub fn select_asset<'a>(assets: &'a [ReleaseAsset], name: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.name == name)
}

/// Writes next to `target` and renames over it, so a failed download never
/// leaves a truncated executable behind.
async fn install_binary(target: &Path, bytes: &[u8]) -> Result<(), UpdateError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| REPO_NAME.to_string());
    let staging = target.with_file_name(format!(".{}.download", file_name));

    tokio::fs::write(&staging, bytes).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).await?;
    }
    if let Err(e) = tokio::fs::rename(&staging, target).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}
