//! Configuration file discovery and creation.
//!
//! # Configuration File Format
//!
//! ```toml
//! [entrez]
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//! tool = "hcls-research"
//! api_key = "your-ncbi-api-key"
//! request_delay_ms = 1000
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [agents]
//! model = "gemini-2.5-flash"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use super::{Config, ConfigError};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "hcls-research";

/// Default location of the configuration file in the user's config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Look for a configuration file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(format!("{}.toml", APP_DIR_NAME));
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

/// Write the default configuration to `path`, creating parent directories.
///
/// Refuses to overwrite an existing file.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Io(format!(
            "refusing to overwrite existing file: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
    }

    let mut config = Config::default();
    // Never persist a key picked up from the environment.
    config.entrez.api_key = None;

    std::fs::write(path, config.to_toml()?).map_err(|e| ConfigError::Io(e.to_string()))
}
