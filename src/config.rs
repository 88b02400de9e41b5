//! Configuration management for AnLocales
//!
//! Handles platform paths and the read-only `settings.json` that names the
//! default and fallback locales.

use crate::error::{ConfigError, ConfigResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform data/cache/config dirs
pub const APP_ID: &str = "anlocales";

/// Locale used when neither settings nor the environment name one
pub const DEFAULT_LOCALE: &str = "en-US";

/// Environment variable overriding the locale data directory
pub const LOCALES_PATH_ENV: &str = "ANLOCALES_LOCALES_PATH";

/// Environment variables consulted for the system locale, in order
pub const SYSTEM_LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Locale data installed for all users
#[cfg(windows)]
pub const SYSTEM_LOCALES_DIR: &str = "C:\\ProgramData\\anlocales\\locales";

/// Locale data installed for all users
#[cfg(not(windows))]
pub const SYSTEM_LOCALES_DIR: &str = "/usr/share/anlocales/locales";

/// Base directory when the platform reports none
const FALLBACK_BASE: &str = "/tmp/anlocales";

/// Contents of `settings.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Locale returned by `default_locale`
    pub default_locale: String,

    /// Locale consulted when a lookup misses
    pub fallback_locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            fallback_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`load`](Self::load), but logs failures and falls back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring settings: {}", e);
            Self::default()
        })
    }

    fn validate(&self) -> ConfigResult<()> {
        for (key, value) in [
            ("default_locale", &self.default_locale),
            ("fallback_locale", &self.fallback_locale),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Filesystem locations used by a manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerPaths {
    /// Directory holding one subdirectory per locale
    pub locales: PathBuf,
    /// Scratch directory
    pub temp: PathBuf,
    /// Path of `settings.json`
    pub settings: PathBuf,
}

impl ManagerPaths {
    pub fn new(
        locales: impl Into<PathBuf>,
        temp: impl Into<PathBuf>,
        settings: impl Into<PathBuf>,
    ) -> Self {
        Self {
            locales: locales.into(),
            temp: temp.into(),
            settings: settings.into(),
        }
    }

    /// Platform defaults, honouring `ANLOCALES_LOCALES_PATH`
    pub fn platform() -> Self {
        let locales = std::env::var_os(LOCALES_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                Self::data_dir()
                    .unwrap_or_else(|_| PathBuf::from(FALLBACK_BASE))
                    .join("locales")
            });
        let temp = Self::cache_dir()
            .unwrap_or_else(|_| PathBuf::from(FALLBACK_BASE))
            .join("temp");
        let settings = Self::config_dir()
            .unwrap_or_else(|_| PathBuf::from(FALLBACK_BASE))
            .join("settings.json");

        Self {
            locales,
            temp,
            settings,
        }
    }

    /// Directories searched for locale data: `locales` first, then the
    /// system-wide install unless `ANLOCALES_LOCALES_PATH` pins one
    pub fn locale_roots(&self) -> Vec<PathBuf> {
        let pinned = std::env::var_os(LOCALES_PATH_ENV).is_some_and(|value| !value.is_empty());
        self.locale_roots_with(if pinned {
            None
        } else {
            Some(Path::new(SYSTEM_LOCALES_DIR))
        })
    }

    fn locale_roots_with(&self, system: Option<&Path>) -> Vec<PathBuf> {
        let mut roots = vec![self.locales.clone()];
        if let Some(system) = system.filter(|system| *system != self.locales.as_path()) {
            roots.push(system.to_path_buf());
        }
        roots
    }

    /// Create the locale and temp directories, logging failures
    pub fn ensure_dirs(&self) {
        for dir in [&self.locales, &self.temp] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("Could not create directory {}: {}", dir.display(), e);
            }
        }
    }

    /// Get the configuration directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Get the data directory path
    pub fn data_dir() -> ConfigResult<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Get the cache directory path
    pub fn cache_dir() -> ConfigResult<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }
}

/// System locale name from the process environment
pub fn system_locale() -> Option<String> {
    system_locale_from(|name| std::env::var(name).ok())
}

/// First usable value of `LC_ALL`, `LC_MESSAGES`, `LANG` as seen by `lookup`.
/// Empty values and the `C`/`POSIX` locales are skipped.
pub fn system_locale_from<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    SYSTEM_LOCALE_VARS
        .iter()
        .filter_map(|&name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| {
            let base = value.split(['.', '@']).next().unwrap_or_default();
            !base.is_empty() && base != "C" && base != "POSIX"
        })
}
