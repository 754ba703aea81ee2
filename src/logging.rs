// src/logging.rs
use crate::credentials::SERVICE_NAME;
use log::LevelFilter;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "ytrss.log";

/// `<data_dir>/ytrss-cli/ytrss.log`, falling back to the temp dir when the
/// platform has no data directory.
pub fn default_log_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join(SERVICE_NAME).join(LOG_FILE_NAME)
}

/// Installs the global logger. Output only ever goes to the file since the
/// terminal belongs to the UI.
pub fn init(level: LevelFilter, path: &Path) -> Result<(), fern::InitError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", level.min(LevelFilter::Warn))
        .level_for("hyper_util", level.min(LevelFilter::Warn))
        .level_for("reqwest", level.min(LevelFilter::Warn))
        .chain(fern::log_file(path)?)
        .apply()?;
    Ok(())
}
