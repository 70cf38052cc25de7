// YAML configuration

use chrono::format::{Item, StrftimeItems};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR: &str = "hiretrack";
const CONFIG_FILENAME: &str = "hiretrack.yml";
const DEFAULT_PAGE_SIZE: usize = crate::view::DEFAULT_PAGE_SIZE.get();
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Settings read from `hiretrack.yml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `.hiretrack/` store (default: current directory)
    pub store_path: PathBuf,

    /// Rows per list page
    pub page_size: usize,

    /// chrono format used when printing times
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the user config dir when none is given.
    ///
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(config_path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("Config::load: no config dir, using defaults");
            return Ok(Self::default());
        };

        if !config_path.exists() {
            debug!(path = %config_path.display(), "Config::load: no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path.display()))?;
        let config = Self::parse(&content).context(format!("Invalid config file: {}", config_path.display()))?;

        debug!(path = %config_path.display(), ?config, "Config::load: loaded");
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn parse(content: &str) -> Result<Self> {
        // an empty file deserializes as unit, not as an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/hiretrack/hiretrack.yml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(eyre!("page_size must be at least 1"));
        }
        if self.date_format.trim().is_empty() {
            return Err(eyre!("date_format cannot be empty"));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(eyre!("date_format is not a valid strftime pattern: {}", self.date_format));
        }
        Ok(())
    }

    /// Page size as handed to list views
    pub fn page_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.page_size).ok_or_else(|| eyre!("page_size must be at least 1"))
    }

    /// Save to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create config dir: {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
