//! AnLocales - locale data engine
//!
//! Loads per-locale data (translations, plural rules, collation tailoring,
//! date/number/money patterns) and answers queries against it:
//!
//! ```no_run
//! use anlocales::LocaleManager;
//!
//! let manager = LocaleManager::new();
//! let locale = manager.resolve("fr_FR.UTF-8");
//! println!("{}", locale.translate("greeting"));
//! println!("{}", locale.format_money(1234.5));
//! ```
//!
//! The [`ffi`] module exposes the same operations through a C ABI.

pub mod catalog;
pub mod collation;
pub mod config;
pub mod data_format;
pub mod decimal;
pub mod error;
pub mod ffi;
pub mod format;
pub mod loader;
pub mod locale;
pub mod locale_id;
pub mod manager;
pub mod plural;
pub mod store;

pub use catalog::{interpolate, PluralForms, StringEntry, TranslationCatalog};
pub use collation::CollationTable;
pub use config::{ManagerPaths, Settings};
pub use decimal::Decimal;
pub use error::{DataError, LocaleError, LocaleResult};
pub use loader::{FsLoader, LocaleLoader, MemoryLoader};
pub use locale::{Locale, LocaleData};
pub use locale_id::LocaleId;
pub use manager::LocaleManager;
pub use plural::{PluralCategory, PluralOperands, PluralRuleSet};

/// Default log filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "warn,anlocales=info";

/// Initialize `env_logger`; later calls are no-ops
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
