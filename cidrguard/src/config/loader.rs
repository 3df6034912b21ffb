//! Configuration file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;
use crate::store::sqlite::{default_data_dir, DATA_DIR_ENV};

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "cidrguard.yaml";

/// Loads configuration from disk and the environment.
///
/// # Examples
///
/// ```no_run
/// use cidrguard::config::ConfigLoader;
///
/// let config = ConfigLoader::load(None).unwrap();
/// println!("{} initial CIDR(s)", config.cidrs.len());
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads, overrides, and validates the configuration.
    ///
    /// Reads `{data_dir}/cidrguard.yaml`. Without an explicit `data_dir` the
    /// directory is `$CIDRGUARD_DATA_DIR` or `~/.cidrguard`. A missing file
    /// yields the defaults. `CIDRGUARD_*` environment variables are applied
    /// on top before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, if
    /// an environment override is invalid, or if validation fails.
    pub fn load(data_dir: Option<&Path>) -> Result<Config> {
        let path = Self::config_path(data_dir)?;

        let mut config = if path.exists() {
            log::debug!("loading configuration from {}", path.display());
            Self::load_file(&path)?
        } else {
            Config::default()
        };

        EnvironmentConfig::apply_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Returns the configuration file path for a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is given, `CIDRGUARD_DATA_DIR` is
    /// unset, and the home directory cannot be determined.
    pub fn config_path(data_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => match std::env::var(DATA_DIR_ENV) {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => default_data_dir()?,
            },
        };
        Ok(dir.join(CONFIG_FILE))
    }
}
