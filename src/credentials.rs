// src/credentials.rs
use crate::errors::CredentialError;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const SERVICE_NAME: &str = "ytrss-cli";
pub const ACCOUNT_NAME: &str = "api_key";

/// Storage for the single API secret.
///
/// Implementations are synchronous; the event loop calls `set`/`clear` directly
/// and the startup check runs `get` on the blocking pool.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, CredentialError>;
    fn set(&self, secret: &str) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

type CredentialFile = BTreeMap<String, BTreeMap<String, String>>;

// ===== File backed store
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/ytrss-cli/credentials.json`
    pub fn in_config_dir() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(dir.join(SERVICE_NAME).join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<CredentialFile, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(CredentialFile::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialFile::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(&self, data: &CredentialFile) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, json)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        let data = self.read_file()?;
        Ok(data
            .get(SERVICE_NAME)
            .and_then(|accounts| accounts.get(ACCOUNT_NAME))
            .filter(|secret| !secret.is_empty())
            .cloned())
    }

    fn set(&self, secret: &str) -> Result<(), CredentialError> {
        let mut data = self.read_file()?;
        data.entry(SERVICE_NAME.to_string())
            .or_default()
            .insert(ACCOUNT_NAME.to_string(), secret.to_string());
        self.write_file(&data)?;
        info!("Credential stored in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut data = self.read_file()?;
        let removed = data
            .get_mut(SERVICE_NAME)
            .and_then(|accounts| accounts.remove(ACCOUNT_NAME))
            .is_some();
        if !removed {
            debug!("Credential clear requested but nothing was stored");
            return Ok(());
        }
        if data.get(SERVICE_NAME).is_some_and(|accounts| accounts.is_empty()) {
            data.remove(SERVICE_NAME);
        }
        self.write_file(&data)?;
        info!("Credential cleared from {}", self.path.display());
        Ok(())
    }
}

// ===== In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryCredentialStore {
    secret: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: &str) -> Self {
        Self { secret: Mutex::new(Some(secret.to_string())) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.secret.lock().map(|s| s.clone()).unwrap_or_default())
    }

    fn set(&self, secret: &str) -> Result<(), CredentialError> {
        if let Ok(mut guard) = self.secret.lock() {
            *guard = Some(secret.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        if let Ok(mut guard) = self.secret.lock() {
            *guard = None;
        }
        Ok(())
    }
}
