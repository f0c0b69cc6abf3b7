use crate::{AppConfig, DCompareError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "dcompare.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

/// Load the configuration from the portable or platform location.
///
/// A missing file yields the defaults.
pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, DCompareError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    load_config_from(&path, portable)
}

/// Load the configuration from an explicit path.
pub fn load_config_from(path: &Path, portable: bool) -> Result<LoadedConfig, DCompareError> {
    let exists = path.exists();

    let mut config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| DCompareError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    config.portable_mode = portable;

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
        portable,
    })
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), DCompareError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "aecs4u", "dcompare")
        .ok_or_else(|| DCompareError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
