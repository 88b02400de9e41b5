//! Locale manager: paths, settings, loading and fallback resolution

use crate::config::{self, ManagerPaths, Settings, DEFAULT_LOCALE};
use crate::error::{LocaleError, LocaleResult};
use crate::loader::{FsLoader, LocaleLoader};
use crate::locale::{Locale, LocaleData};
use crate::locale_id::LocaleId;
use crate::store::LocaleDataStore;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entry point for loading locales
///
/// Cloning shares the cache. Dropping the last clone leaves every issued
/// [`Locale`] usable.
#[derive(Debug, Clone)]
pub struct LocaleManager {
    inner: Arc<ManagerInner>,
}

#[derive(Debug)]
struct ManagerInner {
    paths: ManagerPaths,
    settings: Settings,
    store: LocaleDataStore,
    /// Fallback chain per loaded id, built on its first load
    chains: Mutex<HashMap<LocaleId, Vec<Arc<LocaleData>>>>,
}

impl LocaleManager {
    /// Manager over the platform directories, creating them if needed.
    /// Locale data is also looked up in the system-wide install.
    pub fn new() -> Self {
        let paths = ManagerPaths::platform();
        paths.ensure_dirs();
        let loader = Arc::new(FsLoader::with_roots(paths.locale_roots()));
        Self::with_loader(paths, loader)
    }

    /// Manager over explicit locale, temp and settings paths
    pub fn with_paths(
        locales: impl Into<PathBuf>,
        temp: impl Into<PathBuf>,
        settings: impl Into<PathBuf>,
    ) -> Self {
        let paths = ManagerPaths::new(locales, temp, settings);
        let loader = Arc::new(FsLoader::new(paths.locales.clone()));
        Self::with_loader(paths, loader)
    }

    /// Manager reading locale bundles through `loader`
    pub fn with_loader(paths: ManagerPaths, loader: Arc<dyn LocaleLoader>) -> Self {
        let settings = Settings::load_or_default(&paths.settings);
        info!(
            "Locale manager: data {}, default {}, fallback {}",
            paths.locales.display(),
            settings.default_locale,
            settings.fallback_locale
        );

        Self {
            inner: Arc::new(ManagerInner {
                paths,
                settings,
                store: LocaleDataStore::new(loader),
                chains: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn paths(&self) -> &ManagerPaths {
        &self.inner.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Load exactly `name`
    ///
    /// Fails with [`LocaleError::NotFound`] when no data exists for the
    /// canonical id, [`LocaleError::Load`] when it exists but is unusable.
    pub fn load(&self, name: &str) -> LocaleResult<Locale> {
        let id = LocaleId::parse(name)?;
        let data = self.inner.store.get(&id)?;
        let fallbacks = self.fallback_chain(&id);
        debug!(
            "Loaded locale {} with fallbacks [{}]",
            id,
            fallbacks
                .iter()
                .map(|d| d.id().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Locale::new(data, fallbacks))
    }

    /// [`load`](Self::load) on a blocking worker thread
    ///
    /// Dropping the returned future does not stop the parse; its result
    /// still lands in the cache.
    pub async fn load_async(&self, name: &str) -> LocaleResult<Locale> {
        let manager = self.clone();
        let owned = name.to_string();
        tokio::task::spawn_blocking(move || manager.load(&owned))
            .await
            .map_err(|e| LocaleError::TaskFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?
    }

    /// `name`, else its closest parent with data, else the fallback locale
    pub fn resolve(&self, name: &str) -> Locale {
        self.try_resolve(name).unwrap_or_else(|| {
            debug!("No data for {} or its parents, using fallback", name);
            self.fallback_locale()
        })
    }

    /// Locale named by settings, else the system locale, else `en-US`
    pub fn default_locale(&self) -> Locale {
        let candidates = [
            Some(self.inner.settings.default_locale.clone()),
            config::system_locale(),
            Some(DEFAULT_LOCALE.to_string()),
        ];

        candidates
            .into_iter()
            .flatten()
            .find_map(|name| self.try_resolve(&name))
            .unwrap_or_else(|| self.fallback_locale())
    }

    /// Locale named by settings `fallback_locale`, else the embedded root
    pub fn fallback_locale(&self) -> Locale {
        self.try_resolve(&self.inner.settings.fallback_locale)
            .unwrap_or_else(|| Locale::root(self.inner.store.root()))
    }

    /// Locales the data source can serve
    pub fn available_locales(&self) -> Vec<LocaleId> {
        self.inner.store.loader().available()
    }

    /// Locales currently parsed and cached
    pub fn cached_locales(&self) -> Vec<LocaleId> {
        self.inner.store.cached()
    }

    /// Evict all cached data and fallback chains; issued handles are unaffected
    pub fn clear_cache(&self) {
        self.chains().clear();
        self.inner.store.clear();
    }

    fn try_resolve(&self, name: &str) -> Option<Locale> {
        let id = match LocaleId::parse(name) {
            Ok(id) => id,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        id.ancestry()
            .iter()
            .find_map(|candidate| match self.load(candidate.as_str()) {
                Ok(locale) => Some(locale),
                Err(LocaleError::NotFound { .. }) => None,
                Err(e) => {
                    warn!("{}", e.detailed_message());
                    None
                }
            })
    }

    /// Fallback chain of `id`, built once and reused until the cache is cleared
    fn fallback_chain(&self, id: &LocaleId) -> Vec<Arc<LocaleData>> {
        if let Some(chain) = self.chains().get(id) {
            return chain.clone();
        }

        let chain = self.build_fallback_chain(id);
        self.chains().entry(id.clone()).or_insert(chain).clone()
    }

    fn chains(&self) -> MutexGuard<'_, HashMap<LocaleId, Vec<Arc<LocaleData>>>> {
        self.inner.chains.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parents with data, then the configured fallback and its parents, then root
    fn build_fallback_chain(&self, id: &LocaleId) -> Vec<Arc<LocaleData>> {
        if id.is_root() {
            return Vec::new();
        }

        let mut seen = vec![id.clone()];
        let mut chain = Vec::new();

        let fallback_ids = LocaleId::parse(&self.inner.settings.fallback_locale)
            .map(|fallback| fallback.ancestry())
            .unwrap_or_default();

        for candidate in id.ancestry().into_iter().skip(1).chain(fallback_ids) {
            if seen.contains(&candidate) {
                continue;
            }
            match self.inner.store.get(&candidate) {
                Ok(data) => chain.push(data),
                Err(LocaleError::NotFound { .. }) => {}
                Err(e) => warn!("Skipping fallback {}: {}", candidate, e.detailed_message()),
            }
            seen.push(candidate);
        }

        chain.push(self.inner.store.root());
        chain
    }
}

impl Default for LocaleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_format::{DataFormat, RawLocale};
    use crate::loader::tests::{write_locale, EN_FORMAT};
    use crate::loader::{MemoryLoader, LOCALE_TOML_FILE};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const FR_FORMAT: &str = r#"{
        "LC_TIME": {
            "days": ["dimanche", "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi"],
            "months": ["janvier", "février", "mars", "avril", "mai", "juin", "juillet",
                       "août", "septembre", "octobre", "novembre", "décembre"],
            "date_fmt": "%-d %B %Y"
        },
        "LC_NUMERIC": { "decimal_point": ",", "thousands_sep": " ", "grouping": [3] },
        "LC_MONETARY": {
            "currency_symbol": "€",
            "int_curr_symbol": "EUR ",
            "mon_decimal_point": ",",
            "mon_thousands_sep": " ",
            "frac_digits": 2,
            "cs_precedes": false,
            "sep_by_space": true
        },
        "LC_COLLATE": { "sort_order": "tailored", "rules": "&e < é" }
    }"#;

    /// Data dir with `en-US`, `fr` and a broken `de`
    fn fixture() -> (TempDir, LocaleManager) {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("locales");
        write_locale(
            &data,
            "en_US",
            EN_FORMAT,
            Some(r#"{
                "hello": "Hello",
                "only.english": "English only",
                "files": { "one": "{count} file", "other": "{count} files" }
            }"#),
        );
        write_locale(
            &data,
            "fr",
            FR_FORMAT,
            Some(r#"{
                "hello": "Bonjour",
                "files": { "one": "{count} fichier", "other": "{count} fichiers" }
            }"#),
        );
        write_locale(&data, "de", r#"{ "LC_TIME": 1 }"#, None);

        let manager = LocaleManager::with_paths(
            data,
            temp.path().join("temp"),
            temp.path().join("settings.json"),
        );
        (temp, manager)
    }

    #[test]
    fn test_translate_known_and_unknown_keys() {
        let (_temp, manager) = fixture();
        let fr = manager.load("fr").unwrap();
        let hello = fr.translate("hello");
        assert!(!hello.is_empty());
        assert_ne!(hello, "hello");
        assert_eq!(fr.translate("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_same_name_loads_share_data() {
        let (_temp, manager) = fixture();
        let a = manager.load("en-US").unwrap();
        let b = manager.load("EN_us.UTF-8").unwrap();
        assert!(Arc::ptr_eq(a.data(), b.data()));
        assert_eq!(a.name(), "en-US");
        assert_eq!(manager.cached_locales().len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let (_temp, manager) = fixture();
        assert!(matches!(
            manager.load("zz"),
            Err(LocaleError::NotFound { .. })
        ));
        assert!(matches!(
            manager.load("not a locale"),
            Err(LocaleError::InvalidLocaleId(_))
        ));
        assert!(matches!(manager.load("de"), Err(LocaleError::Load { .. })));
    }

    #[test]
    fn test_fallback_chain_reaches_configured_fallback() {
        let (_temp, manager) = fixture();
        let fr = manager.load("fr").unwrap();
        let chain: Vec<&str> = fr.fallback_chain().iter().map(|id| id.as_str()).collect();
        assert_eq!(chain, vec!["en-US", "root"]);
        assert_eq!(fr.translate("only.english"), "English only");
    }

    #[test]
    fn test_resolve_walks_parents() {
        let (_temp, manager) = fixture();
        assert!(manager.load("fr-CA").is_err());
        assert_eq!(manager.resolve("fr-CA").name(), "fr");
        assert_eq!(manager.resolve("zz").name(), "en-US");
        assert_eq!(manager.resolve("??").name(), "en-US");
    }

    #[test]
    fn test_locale_specific_formatting() {
        let (_temp, manager) = fixture();
        let fr = manager.load("fr").unwrap();
        assert_eq!(fr.format_money(1234.5), "1 234,50 €");
        assert_eq!(fr.format_numeric(1234.5), "1 234,5");
        assert_eq!(fr.format_date(2024, 8, 1).unwrap(), "1 août 2024");
        assert_eq!(fr.plural_word("files", 0), "{count} fichier");
        assert_eq!(fr.format_plural("files", 2, &[]), "2 fichiers");
        assert_eq!(fr.compare("é", "f"), std::cmp::Ordering::Less);

        let en = manager.load("en-US").unwrap();
        assert_eq!(en.format_plural("files", 0, &[]), "0 files");
    }

    #[test]
    fn test_settings_drive_default_and_fallback() {
        let (temp, _) = fixture();
        fs::write(
            temp.path().join("settings.json"),
            r#"{ "default_locale": "fr_FR", "fallback_locale": "it" }"#,
        )
        .unwrap();
        let manager = LocaleManager::with_paths(
            temp.path().join("locales"),
            temp.path().join("temp"),
            temp.path().join("settings.json"),
        );

        assert_eq!(manager.default_locale().name(), "fr");
        assert!(manager.fallback_locale().id().is_root());

        let fr = manager.load("fr").unwrap();
        let chain: Vec<&str> = fr.fallback_chain().iter().map(|id| id.as_str()).collect();
        assert_eq!(chain, vec!["root"]);
        assert_eq!(fr.translate("only.english"), "only.english");
    }

    #[test]
    fn test_handles_outlive_manager_and_cache() {
        let (_temp, manager) = fixture();
        let fr = manager.load("fr").unwrap();
        manager.clear_cache();
        assert!(manager.cached_locales().is_empty());
        drop(manager);
        assert_eq!(fr.translate("hello"), "Bonjour");
    }

    /// `data_format.json` as written by earlier releases: every category
    /// required, gettext plural rules, translations in `locale.toml`
    const LEGACY_FORMAT: &str = r#"{
        "LC_TIME": {
            "days": ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"],
            "months": ["January", "February", "March", "April", "May", "June", "July",
                       "August", "September", "October", "November", "December"],
            "date_fmt": "%m/%d/%Y"
        },
        "LC_NUMERIC": { "decimal_point": ".", "thousands_sep": ",", "grouping": [3, 3] },
        "LC_MONETARY": {
            "currency_symbol": "$",
            "int_curr_symbol": "USD",
            "mon_decimal_point": ".",
            "mon_thousands_sep": ",",
            "positive_sign": "",
            "negative_sign": "-",
            "frac_digits": 2
        },
        "LC_COLLATE": { "sort_order": "unicode" },
        "PLURAL_RULES": "n != 1"
    }"#;

    #[test]
    fn test_legacy_bundle_loads() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("locales");
        write_locale(&data, "en_US", LEGACY_FORMAT, None);
        fs::write(
            data.join("en_US").join(LOCALE_TOML_FILE),
            "greeting = \"Hello\"\nfarewell = \"Goodbye\"\n",
        )
        .unwrap();
        let manager = LocaleManager::with_paths(
            data,
            temp.path().join("temp"),
            temp.path().join("settings.json"),
        );

        let en = manager.load("en_US").unwrap();
        assert_eq!(en.name(), "en-US");
        assert_eq!(en.translate("greeting"), "Hello");
        assert_eq!(en.translate("farewell"), "Goodbye");
        assert!(!en.plural(1));
        assert!(en.plural(2));
        assert_eq!(en.format_date(2024, 3, 7).unwrap(), "03/07/2024");
        assert_eq!(en.format_money(1234.5), "$1,234.50");
        assert_eq!(manager.default_locale().name(), "en-US");
    }

    /// Memory loader that counts fetches
    struct CountingLoader {
        inner: MemoryLoader,
        fetches: AtomicUsize,
    }

    impl LocaleLoader for CountingLoader {
        fn fetch(&self, id: &LocaleId) -> LocaleResult<RawLocale> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(id)
        }

        fn available(&self) -> Vec<LocaleId> {
            self.inner.available()
        }
    }

    #[test]
    fn test_fallback_chain_is_built_once() {
        let temp = TempDir::new().unwrap();
        let bundle = || RawLocale {
            format: serde_json::from_str::<DataFormat>(EN_FORMAT).unwrap(),
            strings: Default::default(),
        };
        let loader = Arc::new(CountingLoader {
            inner: MemoryLoader::new()
                .with(LocaleId::parse("fr-CA").unwrap(), bundle())
                .with(LocaleId::parse("en-US").unwrap(), bundle()),
            fetches: AtomicUsize::new(0),
        });
        let paths = ManagerPaths::new(
            temp.path().join("locales"),
            temp.path().join("temp"),
            temp.path().join("settings.json"),
        );
        let manager = LocaleManager::with_loader(paths, loader.clone());

        // fr-CA, then fr (missing), en-US and en (missing)
        let first = manager.load("fr-CA").unwrap();
        assert_eq!(loader.fetches.load(Ordering::SeqCst), 4);
        let second = manager.load("fr-CA").unwrap();
        assert_eq!(loader.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(first.fallback_chain(), second.fallback_chain());

        let cached: Vec<String> = manager
            .cached_locales()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(cached, vec!["en-US", "fr-CA"]);

        manager.clear_cache();
        manager.load("fr-CA").unwrap();
        assert_eq!(loader.fetches.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_available_locales() {
        let (_temp, manager) = fixture();
        let names: Vec<String> = manager
            .available_locales()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(names, vec!["de", "en-US", "fr"]);
    }

    #[tokio::test]
    async fn test_load_async() {
        let (_temp, manager) = fixture();
        let fr = manager.load_async("fr").await.unwrap();
        assert_eq!(fr.translate("hello"), "Bonjour");
        assert!(matches!(
            manager.load_async("zz").await,
            Err(LocaleError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_async_load_still_populates_cache() {
        let (_temp, manager) = fixture();
        let pending = manager.load_async("en-US");
        let _ = tokio::time::timeout(Duration::from_nanos(1), pending).await;

        for _ in 0..200 {
            if !manager.cached_locales().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let cached: Vec<String> = manager
            .cached_locales()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert!(cached.contains(&"en-US".to_string()));
    }
}
