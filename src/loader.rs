//! Locale bundle sources
//!
//! A [`LocaleLoader`] turns a locale id into a [`RawLocale`]. The store
//! validates what comes back; loaders only find bytes and decode JSON or
//! TOML.

use crate::catalog::StringEntry;
use crate::data_format::{DataFormat, RawLocale};
use crate::error::{DataError, DataResult, LocaleError, LocaleResult};
use crate::locale_id::LocaleId;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Maximum size of a single data file (4 MiB)
pub const MAX_DATA_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Name of the formatting data file inside a locale directory
pub const DATA_FORMAT_FILE: &str = "data_format.json";

/// Optional TOML translation file inside a locale directory
pub const LOCALE_TOML_FILE: &str = "locale.toml";

/// Optional JSON translation file; its keys override `locale.toml`
pub const STRINGS_FILE: &str = "strings.json";

/// Source of raw locale bundles
pub trait LocaleLoader: Send + Sync {
    /// Fetch the bundle for exactly `id`; no parent lookup.
    ///
    /// Returns [`LocaleError::NotFound`] when no bundle exists and
    /// [`LocaleError::Load`] when one exists but cannot be read or decoded.
    fn fetch(&self, id: &LocaleId) -> LocaleResult<RawLocale>;

    /// Ids this loader can serve, sorted
    fn available(&self) -> Vec<LocaleId>;
}

/// Loads bundles from `<root>/<id>/` directories
///
/// Each directory holds `data_format.json` plus optional `locale.toml` and
/// `strings.json` translations. With several roots the first one holding a
/// bundle for an id wins.
#[derive(Debug, Clone)]
pub struct FsLoader {
    roots: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Search `roots` in order
    pub fn with_roots(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self { roots: unique }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory holding `id`'s bundle, trying the canonical then the POSIX
    /// name under each root
    fn locale_dir(&self, id: &LocaleId) -> Option<PathBuf> {
        let canonical = id.as_str().to_string();
        let posix = id.posix_name();
        let mut names = vec![canonical];
        if !names.contains(&posix) {
            names.push(posix);
        }

        self.roots
            .iter()
            .flat_map(|root| names.iter().map(move |name| root.join(name)))
            .find(|dir| dir.join(DATA_FORMAT_FILE).is_file())
    }
}

impl LocaleLoader for FsLoader {
    fn fetch(&self, id: &LocaleId) -> LocaleResult<RawLocale> {
        let dir = self.locale_dir(id).ok_or_else(|| LocaleError::NotFound {
            name: id.to_string(),
        })?;
        debug!("Reading locale {} from {}", id, dir.display());

        let format: DataFormat =
            read_json(&dir.join(DATA_FORMAT_FILE)).map_err(|e| LocaleError::load(id.as_str(), e))?;

        let mut strings: HashMap<String, StringEntry> = HashMap::new();
        let toml_path = dir.join(LOCALE_TOML_FILE);
        if toml_path.is_file() {
            let entries: HashMap<String, StringEntry> =
                read_toml(&toml_path).map_err(|e| LocaleError::load(id.as_str(), e))?;
            strings.extend(entries);
        }
        let json_path = dir.join(STRINGS_FILE);
        if json_path.is_file() {
            let entries: HashMap<String, StringEntry> =
                read_json(&json_path).map_err(|e| LocaleError::load(id.as_str(), e))?;
            strings.extend(entries);
        }
        if strings.is_empty() {
            debug!("Locale {} has no translations", id);
        }

        Ok(RawLocale { format, strings })
    }

    fn available(&self) -> Vec<LocaleId> {
        let mut ids: Vec<LocaleId> = self
            .roots
            .iter()
            .flat_map(|root| WalkDir::new(root).min_depth(1).max_depth(1))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.path().join(DATA_FORMAT_FILE).is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy();
                match LocaleId::parse(&name) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        warn!("Ignoring locale directory with invalid name: {}", name);
                        None
                    }
                }
            })
            .collect();

        ids.sort();
        ids.dedup();
        ids
    }
}

/// Bundles held in memory, keyed by canonical id
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    bundles: HashMap<LocaleId, RawLocale>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: LocaleId, bundle: RawLocale) {
        self.bundles.insert(id, bundle);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, id: LocaleId, bundle: RawLocale) -> Self {
        self.insert(id, bundle);
        self
    }
}

impl LocaleLoader for MemoryLoader {
    fn fetch(&self, id: &LocaleId) -> LocaleResult<RawLocale> {
        self.bundles
            .get(id)
            .cloned()
            .ok_or_else(|| LocaleError::NotFound {
                name: id.to_string(),
            })
    }

    fn available(&self) -> Vec<LocaleId> {
        let mut ids: Vec<LocaleId> = self.bundles.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Read a bounded UTF-8 data file, dropping a leading BOM
pub fn read_data_file(path: &Path) -> DataResult<String> {
    let metadata = std::fs::metadata(path).map_err(|e| DataError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let size = metadata.len();
    if size > MAX_DATA_FILE_SIZE {
        return Err(DataError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: MAX_DATA_FILE_SIZE,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| DataError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let content = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes[..]);
    match std::str::from_utf8(content) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(DataError::EncodingError {
            path: path.to_path_buf(),
        }),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    let content = read_data_file(path)?;
    serde_json::from_str(&content).map_err(|e| DataError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    let content = read_data_file(path)?;
    toml::from_str(&content).map_err(|e| DataError::TomlError {
        path: path.to_path_buf(),
        source: e,
    })
}
